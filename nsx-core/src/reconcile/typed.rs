//! Typed entry points used by the orchestrator.

use super::{ensure_absent, ensure_present, resolve_references};
use log::info;
use nsx::{
    ApiError, ComputeManagerSpec, DesiredState, EdgeClusterSpec, IpPoolSpec, LicenseSpec, NsxApi,
    ObjectId, ObjectKind, TransportNodeSpec, TransportZoneSpec, UplinkProfileSpec,
};
use serde_json::{json, Value};

/// Creates or updates `body` when present, deletes `name` when absent.
async fn apply<A>(
    api: &A,
    kind: ObjectKind,
    state: DesiredState,
    name: &str,
    body: impl FnOnce() -> Value,
) -> Result<Option<ObjectId>, ApiError>
where
    A: NsxApi + ?Sized,
{
    match state {
        DesiredState::Present => ensure_present(api, kind, &body()).await.map(Some),
        DesiredState::Absent => ensure_absent(api, kind, name).await.map(|_| None),
    }
}

/// Registers, updates or removes a compute manager.
///
/// Returns the object id for `Present` specs and `None` once an `Absent` spec is
/// satisfied.
pub async fn ensure_compute_manager<A>(
    api: &A,
    spec: &ComputeManagerSpec,
) -> Result<Option<ObjectId>, ApiError>
where
    A: NsxApi + ?Sized,
{
    apply(
        api,
        ObjectKind::ComputeManager,
        spec.desired_state,
        &spec.display_name,
        || spec.to_body(),
    )
    .await
}

pub async fn ensure_transport_zone<A>(
    api: &A,
    spec: &TransportZoneSpec,
) -> Result<Option<ObjectId>, ApiError>
where
    A: NsxApi + ?Sized,
{
    apply(
        api,
        ObjectKind::TransportZone,
        spec.desired_state,
        &spec.display_name,
        || spec.to_body(),
    )
    .await
}

pub async fn ensure_ip_pool<A>(api: &A, spec: &IpPoolSpec) -> Result<Option<ObjectId>, ApiError>
where
    A: NsxApi + ?Sized,
{
    apply(
        api,
        ObjectKind::IpPool,
        spec.desired_state,
        &spec.display_name,
        || spec.to_body(),
    )
    .await
}

pub async fn ensure_uplink_profile<A>(
    api: &A,
    spec: &UplinkProfileSpec,
) -> Result<Option<ObjectId>, ApiError>
where
    A: NsxApi + ?Sized,
{
    apply(
        api,
        ObjectKind::HostSwitchProfile,
        spec.desired_state,
        &spec.display_name,
        || spec.to_body(),
    )
    .await
}

/// Deploys, updates or removes an edge transport node.
///
/// Names referenced by `spec` are resolved before the body is built, so a missing
/// uplink profile, IP pool, transport zone or compute manager fails without any
/// write.
pub async fn ensure_transport_node<A>(
    api: &A,
    spec: &TransportNodeSpec,
) -> Result<Option<ObjectId>, ApiError>
where
    A: NsxApi + ?Sized,
{
    match spec.desired_state {
        DesiredState::Present => {
            let refs = resolve_references(api, &spec.referenced_names()).await?;
            let body = spec.to_body(&refs)?;
            ensure_present(api, ObjectKind::TransportNode, &body)
                .await
                .map(Some)
        }
        DesiredState::Absent => ensure_absent(api, ObjectKind::TransportNode, &spec.display_name)
            .await
            .map(|_| None),
    }
}

/// Groups edges into a cluster. Members and the HA profile are resolved by name
/// first, so edges that failed to deploy fail the cluster without any write.
pub async fn ensure_edge_cluster<A>(
    api: &A,
    spec: &EdgeClusterSpec,
) -> Result<Option<ObjectId>, ApiError>
where
    A: NsxApi + ?Sized,
{
    match spec.desired_state {
        DesiredState::Present => {
            let refs = resolve_references(api, &spec.referenced_names()).await?;
            let body = spec.to_body(&refs)?;
            ensure_present(api, ObjectKind::EdgeCluster, &body)
                .await
                .map(Some)
        }
        DesiredState::Absent => ensure_absent(api, ObjectKind::EdgeCluster, &spec.display_name)
            .await
            .map(|_| None),
    }
}

/// Accepts the EULA when asked to, then installs the license key.
pub async fn ensure_license<A>(api: &A, license: &LicenseSpec) -> Result<ObjectId, ApiError>
where
    A: NsxApi + ?Sized,
{
    if license.accept_eula {
        info!("Accepting the NSX end-user license agreement");
        api.accept_eula().await?;
    }
    ensure_present(
        api,
        ObjectKind::License,
        &json!({ "license_key": license.license_key }),
    )
    .await
}
