use prestoctl_core::status::node::{
    MSG_COORDINATOR_UNAVAILABLE, MSG_NOT_INSTALLED, MSG_NOT_YET_DISCOVERED,
};
use prestoctl_core::status::{
    NodeCondition, ProcessState, ReportRenderer, TextRenderer, TransientStatus,
};
use prestoctl_core::Role;
use prestoctl_devkit::{discovered, ClusterHarness, HostBehavior};
use std::time::{Duration, Instant};

#[tokio::test]
async fn healthy_cluster_reports_full_detail_coordinator_first() {
    let harness = ClusterHarness::new("master", &["slave1", "slave2", "slave3"]).unwrap();
    let report = harness.collect().await;

    let hosts: Vec<&str> = report.nodes.iter().map(|n| n.host.as_str()).collect();
    assert_eq!(hosts, vec!["master", "slave1", "slave2", "slave3"]);
    assert_eq!(report.nodes[0].role, Role::Coordinator);

    for node in &report.nodes {
        assert!(node.is_healthy(), "{} should be healthy", node.host);
        let presto = node.presto.as_ref().unwrap();
        assert_eq!(presto.version, "0.101");
        assert!(presto.active);
        assert_eq!(presto.connectors, vec!["system", "tpch"]);
        assert!(node.error_message.is_none());
    }
    assert!(report.is_stable());
}

#[tokio::test]
async fn coordinator_failure_dominates_every_host() {
    let harness = ClusterHarness::new("master", &["slave1", "slave2"]).unwrap();
    harness.set_host("slave2", HostBehavior::Unreachable);
    harness.coordinator.set_failing(true);

    let report = harness.collect().await;
    for node in &report.nodes {
        assert_eq!(node.condition, NodeCondition::CoordinatorUnavailable);
        assert_eq!(node.error_message.as_deref(), Some(MSG_COORDINATOR_UNAVAILABLE));
        assert_eq!(node.ip, None);
        assert!(!node.discovered_by_coordinator);
    }

    let down = report.get("slave2").unwrap();
    assert!(!down.reachable);
    assert_eq!(down.label, "slave2(down)");
    assert_eq!(down.process_running, ProcessState::Unknown);

    // the running coordinator that cannot answer is still starting up
    assert_eq!(
        report.get("master").unwrap().transient,
        Some(TransientStatus::CoordinatorStarting)
    );
}

#[tokio::test]
async fn single_unreachable_worker_only_affects_its_entry() {
    let harness = ClusterHarness::new("master", &["slave1", "slave2", "slave3"]).unwrap();
    harness.set_host("slave2", HostBehavior::Unreachable).undiscover("slave2");

    let report = harness.collect().await;
    let down = report.get("slave2").unwrap();
    assert_eq!(down.label, "slave2(down)");
    assert_eq!(down.ip, None);
    assert_eq!(
        down.error_message.as_deref(),
        Some("unable to connect to host slave2: Connection refused")
    );

    for host in ["master", "slave1", "slave3"] {
        let node = report.get(host).unwrap();
        assert!(node.is_healthy());
        assert!(node.ip.is_some());
    }
    assert!(report.is_stable());
}

#[tokio::test]
async fn not_installed_and_not_started_are_distinct() {
    let harness = ClusterHarness::new("master", &["slave1", "slave2"]).unwrap();
    harness
        .set_host("slave1", HostBehavior::NotInstalled)
        .undiscover("slave1");
    harness
        .set_host("slave2", HostBehavior::NotRunning)
        .undiscover("slave2");

    let report = harness.collect().await;
    let missing = report.get("slave1").unwrap();
    assert_eq!(missing.error_message.as_deref(), Some(MSG_NOT_INSTALLED));
    assert_eq!(missing.process_running, ProcessState::NotRunning);

    let stopped = report.get("slave2").unwrap();
    assert_eq!(stopped.error_message.as_deref(), Some(MSG_COORDINATOR_UNAVAILABLE));
    assert_eq!(stopped.ip, None);
    assert!(report.is_stable());
}

#[tokio::test]
async fn retry_converges_once_node_is_discovered() {
    let harness = ClusterHarness::new("master", &["slave1"]).unwrap();
    // first two cycles: the coordinator only knows itself
    let only_master = vec![discovered("master-id", "10.0.0.1")];
    harness
        .coordinator
        .script_nodes(vec![only_master.clone(), only_master]);

    let report = harness.retry_driver(5).run().await;
    assert!(report.is_stable());
    assert!(report.get("slave1").unwrap().is_healthy());
    assert_eq!(harness.coordinator.node_requests(), 3);
}

#[tokio::test]
async fn retry_exhaustion_returns_last_transient_report() {
    let harness = ClusterHarness::new("master", &["slave1"]).unwrap();
    harness.undiscover("slave1");

    let report = harness.retry_driver(3).run().await;
    let node = report.get("slave1").unwrap();
    assert_eq!(node.error_message.as_deref(), Some(MSG_NOT_YET_DISCOVERED));
    assert_eq!(node.transient, Some(TransientStatus::NotYetDiscovered));
    assert_eq!(harness.coordinator.node_requests(), 3);
}

#[tokio::test]
async fn hanging_probe_resolves_to_unreachable() {
    let harness = ClusterHarness::new("master", &["slave1", "slave2"]).unwrap();
    harness.set_host("slave1", HostBehavior::Hangs);

    let start = Instant::now();
    let report = harness.collect().await;
    assert!(start.elapsed() < Duration::from_secs(10));

    let node = report.get("slave1").unwrap();
    assert!(!node.reachable);
    assert!(node
        .error_message
        .as_deref()
        .unwrap()
        .contains("probe timed out"));
    assert!(report.get("slave2").unwrap().is_healthy());
}

#[tokio::test]
async fn hanging_probes_run_in_parallel() {
    let harness = ClusterHarness::new("master", &["slave1", "slave2", "slave3"]).unwrap();
    for host in ["slave1", "slave2", "slave3"] {
        harness.set_host(host, HostBehavior::Hangs);
    }

    let start = Instant::now();
    let report = harness.collect().await;
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(report.nodes.iter().filter(|n| !n.reachable).count(), 3);
}

#[tokio::test]
async fn probe_parallelism_is_bounded() {
    let mut harness = ClusterHarness::new("master", &["slave1", "slave2", "slave3"]).unwrap();
    harness.settings.status.max_parallel_probes = 1;
    for host in ["slave1", "slave2", "slave3"] {
        harness.set_host(host, HostBehavior::Hangs);
    }

    let start = Instant::now();
    let report = harness.collect().await;
    assert!(start.elapsed() >= Duration::from_secs(3));
    assert!(report.get("master").unwrap().is_healthy());
}

#[tokio::test]
async fn probes_every_host_once_per_cycle() {
    let harness = ClusterHarness::new("master", &["master", "slave1"]).unwrap();
    harness.collect().await;
    assert_eq!(harness.remote.calls_for("master").len(), 1);
    assert_eq!(harness.remote.calls_for("slave1").len(), 1);
}

#[tokio::test]
async fn text_report_matches_cli_layout() {
    let harness = ClusterHarness::new("master", &["slave1"]).unwrap();
    harness.set_host("slave1", HostBehavior::Unreachable);

    let text = TextRenderer.render(&harness.collect().await).unwrap();
    assert!(text.contains(
        "Server Status:\n\tmaster(IP: 10.0.0.1, Roles: coordinator): Running\n\tNode URI(http): http://10.0.0.1:8080\n"
    ));
    assert!(text.contains("\tNode is active: True\n\tConnectors:     system, tpch\n"));
    assert!(text.contains(
        "\tslave1(down)(IP: Unknown, Roles: worker): Not Running\n\tunable to connect to host slave1: Connection refused\n"
    ));
}
