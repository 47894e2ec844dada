//! Untyped view of the merged configuration files.
//!
//! Every scalar is read as a string so that both `validate_certs = false` and the
//! quoted `validate_certs = "false"` style of older files are accepted. Typing and
//! validation happen in [`super::resolve`].

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub nsx_manager: RawNsxManager,
    pub compute_manager_defaults: RawComputeManagerDefaults,
    pub transport_node_defaults: RawTransportNodeDefaults,
    pub compute_managers: Vec<RawComputeManager>,
    pub transport_zones: Vec<RawTransportZone>,
    pub ip_pools: Vec<RawIpPool>,
    pub uplink_profile_defaults: RawUplinkProfileDefaults,
    pub uplink_profiles: Vec<RawUplinkProfile>,
    pub edge_transport_nodes: Vec<RawTransportNode>,
    pub edge_cluster_defaults: RawEdgeClusterDefaults,
    pub edge_clusters: Vec<RawEdgeCluster>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawNsxManager {
    pub mgmt_ip: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub validate_certs: Option<String>,
    pub license_key: Option<String>,
    pub accept_eula: Option<String>,
    pub request_timeout_secs: Option<String>,
    pub max_attempts: Option<String>,
    pub initial_backoff_ms: Option<String>,
    pub max_backoff_ms: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawComputeManagerDefaults {
    /// Prefix for generated display names.
    pub display_name: Option<String>,
    pub origin_type: Option<String>,
    pub credential_type: Option<String>,
    pub set_as_oidc_provider: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawComputeManager {
    pub display_name: Option<String>,
    pub server: Option<String>,
    pub origin_type: Option<String>,
    pub credential_type: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub thumbprint: Option<String>,
    pub set_as_oidc_provider: Option<String>,
    pub desired_state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTransportNodeDefaults {
    /// Prefix for generated display names.
    pub display_name: Option<String>,
    pub compute_manager: Option<String>,
    pub host_switch_name: Option<String>,
    pub uplink_profile: Option<String>,
    pub ip_pool: Option<String>,
    pub transport_zones: Option<Vec<String>>,
    pub number_of_uplinks: Option<String>,
    pub form_factor: Option<String>,
    pub cli_username: Option<String>,
    pub audit_username: Option<String>,
    pub enable_ssh: Option<String>,
    pub allow_ssh_root_login: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTransportNode {
    pub display_name: Option<String>,
    pub desired_state: Option<String>,
    pub compute_manager: Option<String>,
    pub host_switch_name: Option<String>,
    pub uplink_profile: Option<String>,
    pub ip_pool: Option<String>,
    pub transport_zones: Option<Vec<String>>,
    pub number_of_uplinks: Option<String>,
    pub form_factor: Option<String>,
    pub compute_id: Option<String>,
    pub storage_id: Option<String>,
    pub management_network_id: Option<String>,
    pub data_network_ids: Option<Vec<String>>,
    pub hostname: Option<String>,
    pub mgmt_ip: Option<String>,
    pub mgmt_prefix_length: Option<String>,
    pub default_gateway: Option<String>,
    pub system_password: Option<String>,
    pub cli_username: Option<String>,
    pub audit_username: Option<String>,
    pub enable_ssh: Option<String>,
    pub allow_ssh_root_login: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTransportZone {
    pub display_name: Option<String>,
    pub transport_type: Option<String>,
    pub host_switch_name: Option<String>,
    pub desired_state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawIpPool {
    pub display_name: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub gateway: Option<String>,
    pub cidr: Option<String>,
    pub desired_state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawUplinkProfileDefaults {
    pub mtu: Option<String>,
    pub transport_vlan: Option<String>,
    pub teaming_policy: Option<String>,
    pub active_uplinks: Option<Vec<String>>,
    pub standby_uplinks: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawUplinkProfile {
    pub display_name: Option<String>,
    pub mtu: Option<String>,
    pub transport_vlan: Option<String>,
    pub teaming_policy: Option<String>,
    pub active_uplinks: Option<Vec<String>>,
    pub standby_uplinks: Option<Vec<String>>,
    pub desired_state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawEdgeClusterDefaults {
    pub ha_profile: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawEdgeCluster {
    pub display_name: Option<String>,
    pub ha_profile: Option<String>,
    /// Edge display names. Empty or missing means every present edge.
    pub members: Option<Vec<String>>,
    pub desired_state: Option<String>,
}
