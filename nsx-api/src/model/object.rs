//! Identity of NSX objects.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of NSX Manager collections the installer touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    ComputeManager,
    TransportNode,
    HostSwitchProfile,
    IpPool,
    TransportZone,
    EdgeCluster,
    ClusterProfile,
    License,
}

impl ObjectKind {
    /// Manager API collection path for this kind.
    pub fn collection_path(&self) -> &'static str {
        match self {
            ObjectKind::ComputeManager => "/api/v1/fabric/compute-managers",
            ObjectKind::TransportNode => "/api/v1/transport-nodes",
            ObjectKind::HostSwitchProfile => "/api/v1/host-switch-profiles",
            ObjectKind::IpPool => "/api/v1/pools/ip-pools",
            ObjectKind::TransportZone => "/api/v1/transport-zones",
            ObjectKind::EdgeCluster => "/api/v1/edge-clusters",
            ObjectKind::ClusterProfile => "/api/v1/cluster-profiles",
            ObjectKind::License => "/api/v1/licenses",
        }
    }

    /// Query parameters of every `list` call. Profiles shipped with the manager
    /// are hidden unless asked for.
    pub fn list_query(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            ObjectKind::HostSwitchProfile | ObjectKind::ClusterProfile => {
                &[("include_system_owned", "true")]
            }
            _ => &[],
        }
    }

    /// Field used as the natural key when looking objects up.
    pub fn natural_key(&self) -> &'static str {
        match self {
            ObjectKind::License => "license_key",
            _ => "display_name",
        }
    }

    /// Field carrying the server-assigned identifier.
    pub fn id_field(&self) -> &'static str {
        match self {
            ObjectKind::TransportNode => "node_id",
            ObjectKind::License => "license_key",
            _ => "id",
        }
    }

    /// Natural key as written to logs and reports. License keys keep only their
    /// last group.
    pub fn redact(&self, key: &str) -> String {
        match self {
            ObjectKind::License => match key.rsplit_once('-') {
                Some((_, tail)) => format!("*****-{}", tail),
                None => "*****".to_string(),
            },
            _ => key.to_string(),
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ObjectKind::ComputeManager => "compute manager",
            ObjectKind::TransportNode => "transport node",
            ObjectKind::HostSwitchProfile => "host switch profile",
            ObjectKind::IpPool => "IP pool",
            ObjectKind::TransportZone => "transport zone",
            ObjectKind::EdgeCluster => "edge cluster",
            ObjectKind::ClusterProfile => "cluster profile",
            ObjectKind::License => "license",
        };
        f.write_str(label)
    }
}

/// Server-assigned identifier of an NSX object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether an object should exist after the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    #[default]
    Present,
    Absent,
}
