//! Command line arguments

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "prestoctl",
    version,
    about = "Configure and inspect a Presto cluster",
    after_help = "EXAMPLES:\n    \
        prestoctl config show slave1\n    \
        prestoctl config check\n    \
        prestoctl status --json\n    \
        prestoctl collect query-info 20150512_235353_00001_8x4mn\n    \
        prestoctl serve --addr 0.0.0.0:8090"
)]
pub struct Cli {
    /// Topology file ({"coordinator": ..., "workers": [...]})
    #[arg(long, env = "PRESTOCTL_TOPOLOGY", value_name = "FILE", global = true)]
    pub topology: Option<PathBuf>,

    /// Settings file (defaults to <config dir>/prestoctl/settings.yaml)
    #[arg(long, env = "PRESTOCTL_SETTINGS", value_name = "FILE", global = true)]
    pub settings: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Per-host configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Cluster status, retried until no node is in a transient state
    Status {
        #[arg(long)]
        json: bool,

        /// Single aggregation cycle
        #[arg(long)]
        no_retry: bool,
    },

    /// Diagnostics into the debug directory
    #[command(subcommand)]
    Collect(CollectCommand),

    /// REST API over the same operations
    Serve {
        #[arg(long, default_value = "127.0.0.1:8090", value_name = "ADDR")]
        addr: SocketAddr,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the validated configuration of one host
    Show {
        #[arg(value_name = "HOST")]
        host: String,
    },
    /// Validate every host's configuration
    Check,
}

#[derive(Subcommand, Debug)]
pub enum CollectCommand {
    /// Fetch one query's information from the coordinator
    QueryInfo {
        #[arg(value_name = "QUERY_ID")]
        query_id: String,
    },
    /// Node list, connectors and per-host version details
    SystemInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_flags() {
        let cli = Cli::try_parse_from(["prestoctl", "status", "--json", "--no-retry"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Status {
                json: true,
                no_retry: true
            }
        ));
    }

    #[test]
    fn test_parse_nested_commands() {
        let cli = Cli::try_parse_from(["prestoctl", "config", "show", "slave1"]).unwrap();
        assert!(matches!(cli.command, Command::Config(ConfigCommand::Show { ref host }) if host == "slave1"));

        let cli = Cli::try_parse_from(["prestoctl", "collect", "query-info", "q1", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Collect(CollectCommand::QueryInfo { .. })));
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
