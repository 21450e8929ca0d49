//! prestoctl - Presto cluster administration
//!
//! Entry point: loads `.env`, settings and topology, then dispatches the
//! subcommand. Reports go to stdout, logs to stderr.

mod app;
mod cli;
mod http;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use cli::{Cli, CollectCommand, Command, ConfigCommand};
use parking_lot::Mutex;
use prestoctl_core::collect;
use prestoctl_core::config::load_host_config;
use prestoctl_core::status::{
    JsonRenderer, ReportRenderer, RetryDriver, RetryPolicy, StatusSource, TextRenderer,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // .env optionnel
    dotenvy::dotenv().ok();

    let args = Cli::parse();
    setup_logging(args.verbose);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("prestoctl=debug,prestoctl_core=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: Cli) -> Result<ExitCode> {
    let app = App::load(args.settings.as_deref(), args.topology).await?;

    match args.command {
        Command::Config(ConfigCommand::Show { host }) => {
            let bundle = load_host_config(&app.topology, &host, &app.settings.paths.config_dir)?;
            for (name, content) in bundle.render() {
                println!("{name}:");
                print!("{content}");
                println!();
            }
        }

        Command::Config(ConfigCommand::Check) => {
            for host in app.topology.hosts() {
                if let Err(e) = load_host_config(&app.topology, host, &app.settings.paths.config_dir) {
                    eprintln!("{host}: {e}");
                    return Ok(ExitCode::FAILURE);
                }
                println!("{host}: ok");
            }
        }

        Command::Status { json, no_retry } => {
            let policy = if no_retry {
                RetryPolicy::once()
            } else {
                RetryPolicy::from_settings(&app.settings.status)
            };
            let report = RetryDriver::new(app.aggregator()?, policy).run().await;
            let rendered = if json {
                JsonRenderer.render(&report)?
            } else {
                TextRenderer.render(&report)?
            };
            print!("{rendered}");
        }

        Command::Collect(CollectCommand::QueryInfo { query_id }) => {
            let client = app.coordinator_client()?;
            let path = collect::query_info(&client, &query_id, &app.settings.paths.debug_dir).await?;
            println!("Gathered query information in file: {}", path.display());
        }

        Command::Collect(CollectCommand::SystemInfo) => {
            let client = app.coordinator_client()?;
            let root = collect::system_info(
                &client,
                &app.executor(),
                &app.topology,
                &app.settings.paths.debug_dir,
            )
            .await?;
            println!("System info collected in: {}", root.display());
        }

        Command::Serve { addr } => {
            let source: Arc<dyn StatusSource> = Arc::new(app.aggregator()?);
            let state = http::AppState {
                driver: Arc::new(RetryDriver::new(
                    source,
                    RetryPolicy::from_settings(&app.settings.status),
                )),
                last: Arc::new(Mutex::new(None)),
                topology: Arc::new(app.topology.clone()),
                config_dir: app.settings.paths.config_dir.clone(),
                api_key: std::env::var(http::API_KEY_ENV).ok(),
            };
            info!("starting REST API");
            http::serve(state, addr).await.context("REST API failed")?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
