use super::compute_manager::ComputeManagerSpec;
use super::connection::NsxConnection;
use super::edge_cluster::EdgeClusterSpec;
use super::fabric::{IpPoolSpec, TransportZoneSpec, UplinkProfileSpec};
use super::transport_node::TransportNodeSpec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseSpec {
    pub license_key: String,
    pub accept_eula: bool,
}

/// The validated result of merging the defaults and user configuration files.
///
/// Everything the orchestrator needs is here; nothing is read from the environment
/// once this is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    pub connection: NsxConnection,
    pub license: LicenseSpec,
    pub compute_managers: Vec<ComputeManagerSpec>,
    #[serde(default)]
    pub transport_zones: Vec<TransportZoneSpec>,
    #[serde(default)]
    pub ip_pools: Vec<IpPoolSpec>,
    #[serde(default)]
    pub uplink_profiles: Vec<UplinkProfileSpec>,
    pub transport_nodes: Vec<TransportNodeSpec>,
    #[serde(default)]
    pub edge_clusters: Vec<EdgeClusterSpec>,
}
