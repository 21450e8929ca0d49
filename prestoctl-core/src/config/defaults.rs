//! Baseline configuration for a host, computed from the topology alone

use super::bundle::{
    ConfigBundle, ConfigPayload, FlagList, PropertySet, CONFIG_PROPERTIES, JVM_CONFIG,
    NODE_PROPERTIES,
};
use crate::topology::{Role, Topology};

pub const DEFAULT_HTTP_PORT: u16 = 8080;

const NODE_DEFAULTS: &[(&str, &str)] = &[
    ("node.environment", "presto"),
    ("node.data-dir", "/var/lib/presto/data"),
    ("plugin.config-dir", "/etc/presto/catalog"),
    ("plugin.dir", "/usr/lib/presto/lib/plugin"),
];

const JVM_DEFAULTS: &[&str] = &[
    "-server",
    "-Xmx2G",
    "-XX:-UseBiasedLocking",
    "-XX:+UseG1GC",
    "-XX:+ExplicitGCInvokesConcurrent",
    "-XX:+HeapDumpOnOutOfMemoryError",
    "-XX:+UseGCOverheadLimit",
    "-XX:OnOutOfMemoryError=kill -9 %p",
    "-DHADOOP_USER_NAME=hive",
];

const QUERY_MAX_MEMORY: &str = "50GB";
const QUERY_MAX_MEMORY_PER_NODE: &str = "1GB";

/// Discovery URI every node advertises itself to.
pub fn discovery_uri(topology: &Topology) -> String {
    format!("http://{}:{}", topology.coordinator(), DEFAULT_HTTP_PORT)
}

/// Pure function of (topology, host, role). `discovery.uri` always points
/// at the coordinator, never at `host`.
pub fn build_defaults(topology: &Topology, host: &str, role: Role) -> ConfigBundle {
    let node: PropertySet = NODE_DEFAULTS.iter().copied().collect();
    let jvm: FlagList = JVM_DEFAULTS.iter().copied().collect();

    let mut config = PropertySet::new();
    config.insert("coordinator", bool_str(topology.is_coordinator(host)));
    if role == Role::Coordinator {
        config.insert("discovery-server.enabled", "true");
    }
    config.insert("discovery.uri", discovery_uri(topology));
    config.insert("http-server.http.port", DEFAULT_HTTP_PORT.to_string());
    if role == Role::Coordinator {
        config.insert(
            "node-scheduler.include-coordinator",
            bool_str(topology.is_worker(topology.coordinator())),
        );
    }
    config.insert("query.max-memory", QUERY_MAX_MEMORY);
    config.insert("query.max-memory-per-node", QUERY_MAX_MEMORY_PER_NODE);

    ConfigBundle::new()
        .with_file(NODE_PROPERTIES, ConfigPayload::Properties(node))
        .with_file(JVM_CONFIG, ConfigPayload::Flags(jvm))
        .with_file(CONFIG_PROPERTIES, ConfigPayload::Properties(config))
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster() -> Topology {
        Topology::new("a", ["b", "c"]).unwrap()
    }

    #[test]
    fn test_worker_defaults() {
        let t = cluster();
        let bundle = build_defaults(&t, "b", Role::Worker);

        let expected_config: PropertySet = [
            ("coordinator", "false"),
            ("discovery.uri", "http://a:8080"),
            ("http-server.http.port", "8080"),
            ("query.max-memory", "50GB"),
            ("query.max-memory-per-node", "1GB"),
        ]
        .into_iter()
        .collect();
        assert_eq!(bundle.properties(CONFIG_PROPERTIES), Some(&expected_config));

        let node = bundle.properties(NODE_PROPERTIES).unwrap();
        assert_eq!(node.get("node.environment"), Some("presto"));
        assert_eq!(node.get("plugin.dir"), Some("/usr/lib/presto/lib/plugin"));
        assert_eq!(node.len(), 4);

        let jvm = bundle.flags(JVM_CONFIG).unwrap();
        assert_eq!(jvm.flags().len(), 9);
        assert_eq!(jvm.flags()[0], "-server");
        assert_eq!(jvm.flags()[8], "-DHADOOP_USER_NAME=hive");
    }

    #[test]
    fn test_coordinator_flag_follows_host() {
        let t = cluster();
        for host in t.hosts() {
            let role = t.role_of(host).unwrap();
            let bundle = build_defaults(&t, host, role);
            let config = bundle.properties(CONFIG_PROPERTIES).unwrap();
            let expected = if host == "a" { "true" } else { "false" };
            assert_eq!(config.get("coordinator"), Some(expected));
            assert_eq!(config.get("discovery.uri"), Some("http://a:8080"));
        }
    }

    #[test]
    fn test_coordinator_extras() {
        let t = cluster();
        let config = build_defaults(&t, "a", Role::Coordinator);
        let config = config.properties(CONFIG_PROPERTIES).unwrap();
        assert_eq!(config.get("discovery-server.enabled"), Some("true"));
        assert_eq!(config.get("node-scheduler.include-coordinator"), Some("false"));

        let t = Topology::new("a", ["a", "b"]).unwrap();
        let config = build_defaults(&t, "a", Role::Coordinator);
        let config = config.properties(CONFIG_PROPERTIES).unwrap();
        assert_eq!(config.get("node-scheduler.include-coordinator"), Some("true"));
    }

    #[test]
    fn test_jvm_config_independent_of_role() {
        let t = cluster();
        let coordinator = build_defaults(&t, "a", Role::Coordinator);
        let worker = build_defaults(&t, "c", Role::Worker);
        assert_eq!(coordinator.flags(JVM_CONFIG), worker.flags(JVM_CONFIG));
        assert_eq!(
            coordinator.properties(NODE_PROPERTIES),
            worker.properties(NODE_PROPERTIES)
        );
    }
}
