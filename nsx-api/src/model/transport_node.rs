//! Edge transport node requests.
//!
//! Specs reference other NSX objects (uplink profiles, IP pools, transport zones and the
//! compute manager hosting the edge VM) by display name. The Manager API wants ids, so a
//! spec is turned into a request body only once those names are resolved into
//! [`References`].

use super::object::{DesiredState, ObjectId, ObjectKind};
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostSwitchType {
    #[default]
    Nvds,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostSwitchMode {
    #[default]
    Standard,
}

/// Edge VM size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormFactor {
    Small,
    Medium,
    #[default]
    Large,
    Xlarge,
}

impl FormFactor {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormFactor::Small => "SMALL",
            FormFactor::Medium => "MEDIUM",
            FormFactor::Large => "LARGE",
            FormFactor::Xlarge => "XLARGE",
        }
    }
}

impl FromStr for FormFactor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SMALL" => Ok(FormFactor::Small),
            "MEDIUM" => Ok(FormFactor::Medium),
            "LARGE" => Ok(FormFactor::Large),
            "XLARGE" => Ok(FormFactor::Xlarge),
            other => Err(format!(
                "unknown form factor '{}', expected SMALL, MEDIUM, LARGE or XLARGE",
                other
            )),
        }
    }
}

/// Only VM edges are deployed by the installer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentType {
    #[default]
    VirtualMachine,
}

/// Physical NIC to uplink mapping on the edge fast path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pnic {
    pub device_name: String,
    pub uplink_name: String,
}

impl Pnic {
    /// Standard edge mapping: `fp-eth0 -> uplink-1`, `fp-eth1 -> uplink-2`, ...
    pub fn for_uplinks(count: u8) -> Vec<Pnic> {
        (0..count)
            .map(|i| Pnic {
                device_name: format!("fp-eth{}", i),
                uplink_name: format!("uplink-{}", i + 1),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSwitch {
    pub host_switch_name: String,
    pub host_switch_type: HostSwitchType,
    pub host_switch_mode: HostSwitchMode,
    /// Display name of the uplink host switch profile.
    pub uplink_profile: String,
    pub pnics: Vec<Pnic>,
    /// Display name of the TEP IP pool.
    pub ip_pool: String,
    /// Display names of the transport zones the switch joins.
    pub transport_zones: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSwitchSpec {
    pub host_switches: Vec<HostSwitch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSubnet {
    pub ip_addresses: Vec<String>,
    pub prefix_length: u8,
}

/// Placement of the edge VM inside vSphere. Ids are vSphere managed object ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmDeploymentConfig {
    /// Display name of the registered compute manager hosting the VM.
    pub compute_manager: String,
    pub compute_id: String,
    pub storage_id: String,
    pub management_network_id: String,
    pub data_network_ids: Vec<String>,
    pub hostname: String,
    pub management_port_subnets: Vec<PortSubnet>,
    pub default_gateway_addresses: Vec<String>,
    pub enable_ssh: bool,
    pub allow_ssh_root_login: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeUserSettings {
    pub cli_username: String,
    pub cli_password: String,
    pub root_password: String,
    pub audit_username: String,
    pub audit_password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDeploymentInfo {
    pub deployment_type: DeploymentType,
    pub form_factor: FormFactor,
    pub vm_deployment_config: VmDeploymentConfig,
    pub node_user_settings: NodeUserSettings,
}

/// An edge transport node to create, update or delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportNodeSpec {
    pub display_name: String,
    pub host_switch_spec: HostSwitchSpec,
    pub node_deployment_info: NodeDeploymentInfo,
    #[serde(default)]
    pub desired_state: DesiredState,
}

/// Name to id lookups gathered from the manager before building a request body.
#[derive(Debug, Clone, Default)]
pub struct References {
    ids: HashMap<(ObjectKind, String), ObjectId>,
}

impl References {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: ObjectKind, name: impl Into<String>, id: ObjectId) {
        self.ids.insert((kind, name.into()), id);
    }

    pub fn contains(&self, kind: ObjectKind, name: &str) -> bool {
        self.ids.contains_key(&(kind, name.to_string()))
    }

    /// Looks a name up, failing with [`ApiError::UnresolvedReference`].
    pub fn id(&self, kind: ObjectKind, name: &str) -> Result<&ObjectId, ApiError> {
        self.ids
            .get(&(kind, name.to_string()))
            .ok_or_else(|| ApiError::UnresolvedReference {
                kind,
                name: name.to_string(),
            })
    }
}

impl TransportNodeSpec {
    /// An absent node only needs its name; the rest is left empty.
    pub fn absent(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            desired_state: DesiredState::Absent,
            ..Default::default()
        }
    }

    /// Every `(kind, display_name)` this spec needs resolved, without duplicates.
    pub fn referenced_names(&self) -> Vec<(ObjectKind, String)> {
        let mut names = vec![(
            ObjectKind::ComputeManager,
            self.node_deployment_info
                .vm_deployment_config
                .compute_manager
                .clone(),
        )];
        for switch in &self.host_switch_spec.host_switches {
            names.push((ObjectKind::HostSwitchProfile, switch.uplink_profile.clone()));
            names.push((ObjectKind::IpPool, switch.ip_pool.clone()));
            for zone in &switch.transport_zones {
                names.push((ObjectKind::TransportZone, zone.clone()));
            }
        }
        let mut seen = Vec::with_capacity(names.len());
        names.retain(|entry| {
            if seen.contains(entry) {
                false
            } else {
                seen.push(entry.clone());
                true
            }
        });
        names
    }

    /// Request body for `POST`/`PUT /api/v1/transport-nodes`.
    pub fn to_body(&self, refs: &References) -> Result<Value, ApiError> {
        let mut host_switches = Vec::with_capacity(self.host_switch_spec.host_switches.len());
        for switch in &self.host_switch_spec.host_switches {
            let profile_id = refs.id(ObjectKind::HostSwitchProfile, &switch.uplink_profile)?;
            let pool_id = refs.id(ObjectKind::IpPool, &switch.ip_pool)?;
            let mut endpoints = Vec::with_capacity(switch.transport_zones.len());
            for zone in &switch.transport_zones {
                let zone_id = refs.id(ObjectKind::TransportZone, zone)?;
                endpoints.push(json!({ "transport_zone_id": zone_id }));
            }

            host_switches.push(json!({
                "host_switch_name": switch.host_switch_name,
                "host_switch_type": switch.host_switch_type,
                "host_switch_mode": switch.host_switch_mode,
                "host_switch_profile_ids": [
                    { "key": "UplinkHostSwitchProfile", "value": profile_id }
                ],
                "pnics": switch.pnics,
                "ip_assignment_spec": {
                    "resource_type": "StaticIpPoolSpec",
                    "ip_pool_id": pool_id,
                },
                "transport_zone_endpoints": endpoints,
            }));
        }

        let info = &self.node_deployment_info;
        let vm = &info.vm_deployment_config;
        let vc_id = refs.id(ObjectKind::ComputeManager, &vm.compute_manager)?;

        Ok(json!({
            "resource_type": "TransportNode",
            "display_name": self.display_name,
            "host_switch_spec": {
                "resource_type": "StandardHostSwitchSpec",
                "host_switches": host_switches,
            },
            "node_deployment_info": {
                "resource_type": "EdgeNode",
                "display_name": self.display_name,
                "deployment_type": info.deployment_type,
                "deployment_config": {
                    "form_factor": info.form_factor.as_str(),
                    "vm_deployment_config": {
                        "placement_type": "VsphereDeploymentConfig",
                        "vc_id": vc_id,
                        "compute_id": vm.compute_id,
                        "storage_id": vm.storage_id,
                        "management_network_id": vm.management_network_id,
                        "data_network_ids": vm.data_network_ids,
                        "hostname": vm.hostname,
                        "management_port_subnets": vm.management_port_subnets,
                        "default_gateway_addresses": vm.default_gateway_addresses,
                        "enable_ssh": vm.enable_ssh,
                        "allow_ssh_root_login": vm.allow_ssh_root_login,
                    },
                    "node_user_settings": info.node_user_settings,
                },
                "node_settings": {
                    "hostname": vm.hostname,
                    "enable_ssh": vm.enable_ssh,
                    "allow_ssh_root_login": vm.allow_ssh_root_login,
                },
            },
        }))
    }
}
