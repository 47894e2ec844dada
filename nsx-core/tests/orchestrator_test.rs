mod common;

use common::{fresh_manager, prepared_manager, resolved, with_fabric};
use nsx::{ApiError, DesiredState, ItemState, ObjectKind, Operation};
use nsx_core::client::mock::{Call, Op};
use nsx_core::Orchestrator;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn rejected(status: u16) -> ApiError {
    ApiError::Status {
        status,
        method: "POST".into(),
        path: ObjectKind::ComputeManager.collection_path().into(),
        body: "{\"error_message\": \"rejected\"}".into(),
    }
}

#[tokio::test]
async fn test_full_run_succeeds_and_is_idempotent() {
    let nsx = Arc::new(prepared_manager());
    let config = resolved(&["vcenter-01"], &["edge-01", "edge-02"]);
    let orchestrator = Orchestrator::new(nsx.clone());

    let report = orchestrator.run(&config).await;
    assert!(report.is_success(), "{}", report);
    assert_eq!(report.results().len(), 4);
    assert_eq!(report.results()[0].operation, Operation::ApplyLicense);
    assert!(nsx.eula_accepted());

    let writes_after_first = nsx.writes().len();
    let again = orchestrator.run(&config).await;
    assert!(again.is_success());
    // Only the EULA acceptance is repeated.
    let new_writes: Vec<Call> = nsx.writes().into_iter().skip(writes_after_first).collect();
    assert_eq!(new_writes, vec![Call::AcceptEula]);
}

#[tokio::test]
async fn test_compute_managers_precede_transport_nodes() {
    let nsx = Arc::new(prepared_manager());
    let config = resolved(&["vcenter-01", "vcenter-02"], &["edge-01", "edge-02"]);

    Orchestrator::new(nsx.clone()).run(&config).await;

    let calls = nsx.calls();
    let last_cm = calls
        .iter()
        .rposition(|c| c.kind() == Some(ObjectKind::ComputeManager) && c.is_write())
        .expect("compute manager writes");
    let first_tn = calls
        .iter()
        .position(|c| c.kind() == Some(ObjectKind::TransportNode))
        .expect("transport node calls");
    assert!(last_cm < first_tn);

    let license = calls
        .iter()
        .position(|c| c.kind() == Some(ObjectKind::License))
        .expect("license calls");
    assert!(license < calls.iter().position(|c| c.kind() == Some(ObjectKind::ComputeManager)).unwrap());
}

#[tokio::test]
async fn test_one_failure_does_not_stop_siblings() {
    let nsx = Arc::new(prepared_manager());
    nsx.fail(
        Op::Create,
        Some(ObjectKind::ComputeManager),
        Some("vcenter-02"),
        rejected(400),
    );
    let config = resolved(&["vcenter-01", "vcenter-02", "vcenter-03"], &[]);

    let report = Orchestrator::new(nsx.clone()).run(&config).await;

    let states: Vec<(String, ItemState)> = report
        .results()
        .iter()
        .filter(|r| r.kind == ObjectKind::ComputeManager)
        .map(|r| (r.display_name.clone(), r.state))
        .collect();
    assert_eq!(
        states,
        vec![
            ("vcenter-01".to_string(), ItemState::Succeeded),
            ("vcenter-02".to_string(), ItemState::Failed),
            ("vcenter-03".to_string(), ItemState::Succeeded),
        ]
    );
    assert_eq!(report.failed(), 1);
    assert!(!report.is_success());
    let failure = report.failures().next().expect("one failure");
    assert_eq!(failure.error.as_ref().and_then(ApiError::status), Some(400));
}

#[tokio::test]
async fn test_license_failure_is_recorded_and_run_continues() {
    let nsx = Arc::new(prepared_manager());
    nsx.fail(Op::AcceptEula, None, None, rejected(403));
    let config = resolved(&["vcenter-01"], &["edge-01"]);

    let report = Orchestrator::new(nsx.clone()).run(&config).await;

    assert_eq!(report.results()[0].kind, ObjectKind::License);
    assert_eq!(report.results()[0].state, ItemState::Failed);
    assert_eq!(report.succeeded(), 2);
}

#[tokio::test]
async fn test_edge_with_missing_compute_manager_fails_alone() {
    let nsx = Arc::new(prepared_manager());
    let mut config = resolved(&["vcenter-01"], &["edge-01"]);
    config.transport_nodes[0]
        .node_deployment_info
        .vm_deployment_config
        .compute_manager = "vcenter-99".into();

    let report = Orchestrator::new(nsx.clone()).run(&config).await;

    let edge = &report.results()[2];
    assert_eq!(edge.state, ItemState::Failed);
    assert!(matches!(
        edge.error,
        Some(ApiError::UnresolvedReference {
            kind: ObjectKind::ComputeManager,
            ..
        })
    ));
}

#[tokio::test]
async fn test_cancellation_marks_remaining_items_not_attempted() {
    let nsx = Arc::new(prepared_manager().with_delay(Duration::from_millis(50)));
    let config = resolved(&["vcenter-01", "vcenter-02"], &["edge-01"]);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(120)).await;
        trigger.cancel();
    });

    let report = Orchestrator::new(nsx.clone())
        .run_with_cancel(&config, cancel)
        .await;

    assert_eq!(report.results().len(), 4);
    assert!(report.not_attempted() >= 1);
    assert!(report.results().iter().all(|r| r.state.is_terminal()));
    assert_eq!(
        report.results().last().map(|r| r.state),
        Some(ItemState::NotAttempted)
    );
}

#[tokio::test]
async fn test_cancelled_before_start_attempts_nothing() {
    let nsx = Arc::new(prepared_manager());
    let config = resolved(&["vcenter-01"], &["edge-01"]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = Orchestrator::new(nsx.clone())
        .run_with_cancel(&config, cancel)
        .await;

    assert_eq!(report.not_attempted(), 3);
    assert!(nsx.calls().is_empty());
}

#[tokio::test]
async fn test_absent_items_are_deleted_in_reverse_order() {
    let nsx = Arc::new(prepared_manager());
    let mut config = resolved(&["vcenter-01"], &["edge-01"]);
    let orchestrator = Orchestrator::new(nsx.clone());
    assert!(orchestrator.run(&config).await.is_success());

    config.compute_managers[0].desired_state = DesiredState::Absent;
    config.transport_nodes[0].desired_state = DesiredState::Absent;
    let report = orchestrator.run(&config).await;

    assert!(report.is_success(), "{}", report);
    let deleted: Vec<ObjectKind> = nsx
        .writes()
        .into_iter()
        .filter_map(|call| match call {
            Call::Delete(kind, _) => Some(kind),
            _ => None,
        })
        .collect();
    assert_eq!(deleted, vec![ObjectKind::TransportNode, ObjectKind::ComputeManager]);
    assert!(nsx.objects(ObjectKind::ComputeManager).is_empty());
    assert!(nsx.objects(ObjectKind::TransportNode).is_empty());
}

#[tokio::test]
async fn test_fabric_precedes_edges_and_cluster_follows() {
    let nsx = Arc::new(fresh_manager());
    let config = with_fabric(resolved(&["vcenter-01"], &["edge-01", "edge-02"]), &["edge-01", "edge-02"]);

    let report = Orchestrator::new(nsx.clone()).run(&config).await;

    assert!(report.is_success(), "{}", report);
    let created: Vec<ObjectKind> = nsx
        .writes()
        .into_iter()
        .filter_map(|call| match call {
            Call::Create(kind, _) => Some(kind),
            _ => None,
        })
        .collect();
    assert_eq!(
        created,
        vec![
            ObjectKind::License,
            ObjectKind::TransportZone,
            ObjectKind::IpPool,
            ObjectKind::HostSwitchProfile,
            ObjectKind::ComputeManager,
            ObjectKind::TransportNode,
            ObjectKind::TransportNode,
            ObjectKind::EdgeCluster,
        ]
    );

    let edge = nsx.find(ObjectKind::TransportNode, "edge-02").expect("edge-02");
    let cluster = nsx.find(ObjectKind::EdgeCluster, "Edge-Cluster").expect("cluster");
    assert_eq!(cluster["members"][1]["transport_node_id"], edge["node_id"]);
}

#[tokio::test]
async fn test_cluster_fails_when_a_member_edge_failed() {
    let nsx = Arc::new(prepared_manager());
    nsx.fail(
        Op::Create,
        Some(ObjectKind::TransportNode),
        Some("edge-02"),
        rejected(400),
    );
    let config = with_fabric(resolved(&["vcenter-01"], &["edge-01", "edge-02"]), &["edge-01", "edge-02"]);

    let report = Orchestrator::new(nsx.clone()).run(&config).await;

    let cluster = report.results().last().expect("cluster result");
    assert_eq!(cluster.kind, ObjectKind::EdgeCluster);
    assert_eq!(cluster.state, ItemState::Failed);
    assert!(nsx.find(ObjectKind::EdgeCluster, "Edge-Cluster").is_none());
    assert_eq!(report.failed(), 2);
}
