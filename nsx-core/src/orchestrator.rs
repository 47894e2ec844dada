use crate::reconcile::{
    ensure_compute_manager, ensure_edge_cluster, ensure_ip_pool, ensure_license,
    ensure_transport_node, ensure_transport_zone, ensure_uplink_profile,
};
use log::{error, info, warn};
use nsx::{
    ApiError, ComputeManagerSpec, DesiredState, EdgeClusterSpec, IpPoolSpec, LicenseSpec, NsxApi,
    ObjectId, ObjectKind, Operation, ResolvedConfig, RunReport, RunResult, TransportNodeSpec,
    TransportZoneSpec, UplinkProfileSpec,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One unit of work, borrowed from the resolved configuration.
enum Item<'a> {
    License(&'a LicenseSpec),
    TransportZone(&'a TransportZoneSpec),
    IpPool(&'a IpPoolSpec),
    UplinkProfile(&'a UplinkProfileSpec),
    ComputeManager(&'a ComputeManagerSpec),
    TransportNode(&'a TransportNodeSpec),
    EdgeCluster(&'a EdgeClusterSpec),
}

impl Item<'_> {
    fn kind(&self) -> ObjectKind {
        match self {
            Item::License(_) => ObjectKind::License,
            Item::TransportZone(_) => ObjectKind::TransportZone,
            Item::IpPool(_) => ObjectKind::IpPool,
            Item::UplinkProfile(_) => ObjectKind::HostSwitchProfile,
            Item::ComputeManager(_) => ObjectKind::ComputeManager,
            Item::TransportNode(_) => ObjectKind::TransportNode,
            Item::EdgeCluster(_) => ObjectKind::EdgeCluster,
        }
    }

    fn name(&self) -> &str {
        match self {
            Item::License(license) => &license.license_key,
            Item::TransportZone(spec) => &spec.display_name,
            Item::IpPool(spec) => &spec.display_name,
            Item::UplinkProfile(spec) => &spec.display_name,
            Item::ComputeManager(spec) => &spec.display_name,
            Item::TransportNode(spec) => &spec.display_name,
            Item::EdgeCluster(spec) => &spec.display_name,
        }
    }

    fn state(&self) -> DesiredState {
        match self {
            Item::License(_) => DesiredState::Present,
            Item::TransportZone(spec) => spec.desired_state,
            Item::IpPool(spec) => spec.desired_state,
            Item::UplinkProfile(spec) => spec.desired_state,
            Item::ComputeManager(spec) => spec.desired_state,
            Item::TransportNode(spec) => spec.desired_state,
            Item::EdgeCluster(spec) => spec.desired_state,
        }
    }

    fn pending(&self) -> RunResult {
        let operation = match (self, self.state()) {
            (Item::License(_), _) => Operation::ApplyLicense,
            (_, DesiredState::Present) => Operation::EnsurePresent,
            (_, DesiredState::Absent) => Operation::EnsureAbsent,
        };
        RunResult::pending(self.kind(), self.kind().redact(self.name()), operation)
    }
}

/// Orders the work of one run.
///
/// The license comes first. Deletes follow, dependents before what they depend on:
/// edge clusters, transport nodes, compute managers, uplink profiles, IP pools and
/// transport zones. Creates and updates then run in the opposite order.
fn plan(config: &ResolvedConfig) -> Vec<Item<'_>> {
    fn absent(item: &Item<'_>) -> bool {
        item.state() == DesiredState::Absent
    }

    let groups: Vec<Vec<Item<'_>>> = vec![
        config.transport_zones.iter().map(Item::TransportZone).collect(),
        config.ip_pools.iter().map(Item::IpPool).collect(),
        config.uplink_profiles.iter().map(Item::UplinkProfile).collect(),
        config.compute_managers.iter().map(Item::ComputeManager).collect(),
        config.transport_nodes.iter().map(Item::TransportNode).collect(),
        config.edge_clusters.iter().map(Item::EdgeCluster).collect(),
    ];

    let mut deletes = Vec::new();
    let mut applies = Vec::new();
    for group in groups {
        let (gone, kept): (Vec<_>, Vec<_>) = group.into_iter().partition(absent);
        deletes.push(gone);
        applies.extend(kept);
    }

    let mut items = vec![Item::License(&config.license)];
    items.extend(deletes.into_iter().rev().flatten());
    items.extend(applies);
    items
}

/// Drives a resolved configuration against an NSX Manager.
///
/// Items run one at a time in the order set by `plan`. An edge whose deployment
/// failed still leaves the next item to run, so the edge cluster then fails on the
/// unresolved member. Failures are recorded in the [`RunReport`] and never stop the
/// run.
pub struct Orchestrator<A: NsxApi> {
    api: Arc<A>,
}

impl<A: NsxApi> Orchestrator<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    pub async fn run(&self, config: &ResolvedConfig) -> RunReport {
        self.run_with_cancel(config, CancellationToken::new()).await
    }

    /// Like [`Orchestrator::run`], stopping early once `cancel` fires.
    ///
    /// The call in flight at that moment is dropped and recorded as `NotAttempted`,
    /// as is every item not yet started.
    pub async fn run_with_cancel(
        &self,
        config: &ResolvedConfig,
        cancel: CancellationToken,
    ) -> RunReport {
        let items = plan(config);

        info!(
            "Orchestrator: starting run with {} item(s) against {}",
            items.len(),
            config.connection.mgmt_ip
        );

        let mut report = RunReport::default();
        for item in &items {
            let mut result = item.pending();
            if cancel.is_cancelled() {
                result.skip();
                report.push(result);
                continue;
            }

            result.start();
            info!("Orchestrator: {} {} '{}'", result.operation, result.kind, result.display_name);

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                outcome = self.execute(item) => Some(outcome),
            };

            match outcome {
                Some(Ok(id)) => {
                    info!("Orchestrator: {} '{}' done", result.kind, result.display_name);
                    result.succeed(id);
                }
                Some(Err(err)) => {
                    error!(
                        "Orchestrator: {} '{}' failed: {}",
                        result.kind, result.display_name, err
                    );
                    result.fail(err);
                }
                None => {
                    warn!(
                        "Orchestrator: cancelled while working on {} '{}'",
                        result.kind, result.display_name
                    );
                    result.skip();
                }
            }
            report.push(result);
        }

        info!("Orchestrator: run finished: {}", report);
        report
    }

    async fn execute(&self, item: &Item<'_>) -> Result<Option<ObjectId>, ApiError> {
        let api = self.api.as_ref();
        match item {
            Item::License(license) => ensure_license(api, license)
                .await
                .map(|key| Some(ObjectId::new(ObjectKind::License.redact(key.as_str())))),
            Item::TransportZone(spec) => ensure_transport_zone(api, spec).await,
            Item::IpPool(spec) => ensure_ip_pool(api, spec).await,
            Item::UplinkProfile(spec) => ensure_uplink_profile(api, spec).await,
            Item::ComputeManager(spec) => ensure_compute_manager(api, spec).await,
            Item::TransportNode(spec) => ensure_transport_node(api, spec).await,
            Item::EdgeCluster(spec) => ensure_edge_cluster(api, spec).await,
        }
    }
}
