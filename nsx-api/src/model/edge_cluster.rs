//! Edge cluster requests.

use super::object::{DesiredState, ObjectKind};
use super::transport_node::References;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Groups edge transport nodes behind one high-availability profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeClusterSpec {
    pub display_name: String,
    /// Display name of the edge high-availability cluster profile.
    pub ha_profile: String,
    /// Display names of the member transport nodes, in member order.
    pub members: Vec<String>,
    #[serde(default)]
    pub desired_state: DesiredState,
}

impl EdgeClusterSpec {
    pub fn absent(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            desired_state: DesiredState::Absent,
            ..Default::default()
        }
    }

    pub fn referenced_names(&self) -> Vec<(ObjectKind, String)> {
        let mut names = vec![(ObjectKind::ClusterProfile, self.ha_profile.clone())];
        for member in &self.members {
            let entry = (ObjectKind::TransportNode, member.clone());
            if !names.contains(&entry) {
                names.push(entry);
            }
        }
        names
    }

    /// Request body for `POST`/`PUT /api/v1/edge-clusters`.
    pub fn to_body(&self, refs: &References) -> Result<Value, ApiError> {
        let profile_id = refs.id(ObjectKind::ClusterProfile, &self.ha_profile)?;
        let mut members = Vec::with_capacity(self.members.len());
        for member in &self.members {
            let node_id = refs.id(ObjectKind::TransportNode, member)?;
            members.push(json!({ "transport_node_id": node_id }));
        }

        Ok(json!({
            "display_name": self.display_name,
            "cluster_profile_bindings": [
                { "resource_type": "EdgeHighAvailabilityProfile", "profile_id": profile_id }
            ],
            "members": members,
        }))
    }
}
