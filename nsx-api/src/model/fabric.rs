//! Fabric objects the edges are built on: transport zones, TEP IP pools and uplink
//! host switch profiles.

use super::object::DesiredState;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;

/// Traffic carried by a transport zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportType {
    #[default]
    Overlay,
    Vlan,
}

impl TransportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportType::Overlay => "OVERLAY",
            TransportType::Vlan => "VLAN",
        }
    }
}

impl FromStr for TransportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OVERLAY" => Ok(TransportType::Overlay),
            "VLAN" => Ok(TransportType::Vlan),
            other => Err(format!(
                "unknown transport type '{}', expected OVERLAY or VLAN",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportZoneSpec {
    pub display_name: String,
    pub transport_type: TransportType,
    /// N-VDS name the zone binds to. Must match the edges' host switch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_switch_name: Option<String>,
    #[serde(default)]
    pub desired_state: DesiredState,
}

impl TransportZoneSpec {
    /// An absent zone only needs its name.
    pub fn absent(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            desired_state: DesiredState::Absent,
            ..Default::default()
        }
    }

    /// Request body for `POST`/`PUT /api/v1/transport-zones`.
    pub fn to_body(&self) -> Value {
        let mut body = json!({
            "display_name": self.display_name,
            "transport_type": self.transport_type.as_str(),
        });
        if let Some(switch) = &self.host_switch_name {
            body["host_switch_name"] = Value::from(switch.as_str());
        }
        body
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpPoolSubnet {
    pub allocation_ranges: Vec<AllocationRange>,
    pub gateway_ip: String,
    pub cidr: String,
}

/// Static pool handing out tunnel endpoint addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpPoolSpec {
    pub display_name: String,
    pub subnets: Vec<IpPoolSubnet>,
    #[serde(default)]
    pub desired_state: DesiredState,
}

impl IpPoolSpec {
    pub fn absent(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            desired_state: DesiredState::Absent,
            ..Default::default()
        }
    }

    /// Request body for `POST`/`PUT /api/v1/pools/ip-pools`.
    pub fn to_body(&self) -> Value {
        json!({
            "display_name": self.display_name,
            "subnets": self.subnets,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamingPolicy {
    #[default]
    FailoverOrder,
    LoadbalanceSrcid,
    LoadbalanceSrcMac,
}

impl TeamingPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamingPolicy::FailoverOrder => "FAILOVER_ORDER",
            TeamingPolicy::LoadbalanceSrcid => "LOADBALANCE_SRCID",
            TeamingPolicy::LoadbalanceSrcMac => "LOADBALANCE_SRC_MAC",
        }
    }
}

impl FromStr for TeamingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FAILOVER_ORDER" => Ok(TeamingPolicy::FailoverOrder),
            "LOADBALANCE_SRCID" => Ok(TeamingPolicy::LoadbalanceSrcid),
            "LOADBALANCE_SRC_MAC" => Ok(TeamingPolicy::LoadbalanceSrcMac),
            other => Err(format!(
                "unknown teaming policy '{}', expected FAILOVER_ORDER, LOADBALANCE_SRCID or LOADBALANCE_SRC_MAC",
                other
            )),
        }
    }
}

/// Uplink host switch profile: MTU, overlay VLAN and NIC teaming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UplinkProfileSpec {
    pub display_name: String,
    pub mtu: u32,
    /// VLAN tagging overlay traffic. 0 leaves it untagged.
    pub transport_vlan: u16,
    pub teaming_policy: TeamingPolicy,
    pub active_uplinks: Vec<String>,
    pub standby_uplinks: Vec<String>,
    #[serde(default)]
    pub desired_state: DesiredState,
}

fn uplinks(names: &[String]) -> Vec<Value> {
    names
        .iter()
        .map(|name| json!({ "uplink_name": name, "uplink_type": "PNIC" }))
        .collect()
}

impl UplinkProfileSpec {
    pub fn absent(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            desired_state: DesiredState::Absent,
            ..Default::default()
        }
    }

    /// Request body for `POST`/`PUT /api/v1/host-switch-profiles`.
    pub fn to_body(&self) -> Value {
        json!({
            "resource_type": "UplinkHostSwitchProfile",
            "display_name": self.display_name,
            "mtu": self.mtu,
            "transport_vlan": self.transport_vlan,
            "teaming": {
                "policy": self.teaming_policy.as_str(),
                "active_list": uplinks(&self.active_uplinks),
                "standby_list": uplinks(&self.standby_uplinks),
            },
        })
    }
}
