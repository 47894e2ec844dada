mod common;

use anyhow::Result;
use common::{compute_manager, prepared_manager, transport_node};
use nsx::{ApiError, DesiredState, ObjectKind};
use nsx_core::client::mock::{Call, InMemoryNsx};
use nsx_core::reconcile::{ensure_compute_manager, ensure_present, ensure_transport_node};
use serde_json::json;

#[tokio::test]
async fn test_ensure_present_is_idempotent() -> Result<()> {
    let nsx = InMemoryNsx::new();
    let body = json!({"display_name": "Edge-TEP-IP-Pool", "description": "TEPs"});

    let first = ensure_present(&nsx, ObjectKind::IpPool, &body).await?;
    assert_eq!(nsx.writes().len(), 1);

    let second = ensure_present(&nsx, ObjectKind::IpPool, &body).await?;
    assert_eq!(first, second);
    // Still the single create from the first call.
    assert_eq!(nsx.writes().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_compute_manager_password_change_does_not_update() -> Result<()> {
    let nsx = InMemoryNsx::new();
    let mut spec = compute_manager("vcenter-01");
    ensure_compute_manager(&nsx, &spec).await?;

    spec.credential.password = "rotated".into();
    ensure_compute_manager(&nsx, &spec).await?;

    assert_eq!(nsx.writes().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_compute_manager_server_change_updates_in_place() -> Result<()> {
    let nsx = InMemoryNsx::new();
    let mut spec = compute_manager("vcenter-01");
    let id = ensure_compute_manager(&nsx, &spec).await?;

    spec.server = "vcenter-new.mylab.net".into();
    let updated = ensure_compute_manager(&nsx, &spec).await?;

    assert_eq!(id, updated);
    let stored = nsx.find(ObjectKind::ComputeManager, "vcenter-01").expect("stored");
    assert_eq!(stored["server"], "vcenter-new.mylab.net");
    assert_eq!(stored["_revision"], 1);
    Ok(())
}

#[tokio::test]
async fn test_transport_node_body_uses_resolved_ids() -> Result<()> {
    let nsx = prepared_manager();
    let vc = nsx.seed_named(ObjectKind::ComputeManager, "vcenter-01");

    ensure_transport_node(&nsx, &transport_node("edge-01", "vcenter-01")).await?;

    let created = nsx.find(ObjectKind::TransportNode, "edge-01").expect("created");
    let placement = &created["node_deployment_info"]["deployment_config"]["vm_deployment_config"];
    assert_eq!(placement["vc_id"], vc.as_str());
    let switch = &created["host_switch_spec"]["host_switches"][0];
    assert!(switch["ip_assignment_spec"]["ip_pool_id"]
        .as_str()
        .unwrap()
        .starts_with("ip-pools-"));
    assert_eq!(switch["pnics"][1]["device_name"], "fp-eth1");
    Ok(())
}

#[tokio::test]
async fn test_unknown_reference_fails_without_writes() -> Result<()> {
    let nsx = InMemoryNsx::new();
    nsx.seed_named(ObjectKind::ComputeManager, "vcenter-01");

    let err = ensure_transport_node(&nsx, &transport_node("edge-01", "vcenter-01"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::UnresolvedReference { .. }));
    assert!(nsx.writes().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_absent_transport_node_is_deleted() -> Result<()> {
    let nsx = prepared_manager();
    nsx.seed_named(ObjectKind::TransportNode, "edge-01");

    let mut spec = transport_node("edge-01", "vcenter-01");
    spec.desired_state = DesiredState::Absent;
    let id = ensure_transport_node(&nsx, &spec).await?;

    assert_eq!(id, None);
    assert!(nsx.find(ObjectKind::TransportNode, "edge-01").is_none());
    assert!(matches!(
        nsx.writes().as_slice(),
        [Call::Delete(ObjectKind::TransportNode, _)]
    ));
    // No lookups of referenced objects for a delete.
    assert!(!nsx.calls().contains(&Call::List(ObjectKind::IpPool)));
    Ok(())
}
