//! Compute manager registration requests.

use super::object::DesiredState;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;

/// Kind of external virtualization manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OriginType {
    #[default]
    #[serde(rename = "vCenter")]
    VCenter,
}

impl OriginType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OriginType::VCenter => "vCenter",
        }
    }
}

impl FromStr for OriginType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vcenter" => Ok(OriginType::VCenter),
            other => Err(format!("unknown origin type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialType {
    #[default]
    UsernamePasswordLoginCredential,
}

impl CredentialType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialType::UsernamePasswordLoginCredential => "UsernamePasswordLoginCredential",
        }
    }
}

impl FromStr for CredentialType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "UsernamePasswordLoginCredential" => Ok(CredentialType::UsernamePasswordLoginCredential),
            other => Err(format!("unknown credential type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub credential_type: CredentialType,
    pub username: String,
    pub password: String,
    /// SHA-256 thumbprint of the manager's certificate, when pinned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbprint: Option<String>,
}

/// A vCenter-like system to register with the NSX Manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeManagerSpec {
    pub display_name: String,
    /// Management IP or FQDN of the compute manager.
    pub server: String,
    pub origin_type: OriginType,
    pub credential: Credential,
    pub set_as_oidc_provider: bool,
    #[serde(default)]
    pub desired_state: DesiredState,
}

impl ComputeManagerSpec {
    pub fn absent(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            desired_state: DesiredState::Absent,
            ..Default::default()
        }
    }

    /// Request body for `POST`/`PUT /api/v1/fabric/compute-managers`.
    pub fn to_body(&self) -> Value {
        let mut credential = json!({
            "credential_type": self.credential.credential_type.as_str(),
            "username": self.credential.username,
            "password": self.credential.password,
        });
        if let Some(thumbprint) = &self.credential.thumbprint {
            credential["thumbprint"] = Value::from(thumbprint.as_str());
        }

        json!({
            "display_name": self.display_name,
            "server": self.server,
            "origin_type": self.origin_type.as_str(),
            "credential": credential,
            "set_as_oidc_provider": self.set_as_oidc_provider,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ComputeManagerSpec {
        ComputeManagerSpec {
            display_name: "vcenter-01".into(),
            server: "vcenter.mylab.net".into(),
            origin_type: OriginType::VCenter,
            credential: Credential {
                credential_type: CredentialType::UsernamePasswordLoginCredential,
                username: "administrator@vsphere.local".into(),
                password: "secret".into(),
                thumbprint: None,
            },
            set_as_oidc_provider: true,
            desired_state: DesiredState::Present,
        }
    }

    #[test]
    fn test_body_matches_manager_api_shape() {
        let body = spec().to_body();
        assert_eq!(body["display_name"], "vcenter-01");
        assert_eq!(body["origin_type"], "vCenter");
        assert_eq!(
            body["credential"]["credential_type"],
            "UsernamePasswordLoginCredential"
        );
        assert_eq!(body["set_as_oidc_provider"], true);
        assert!(body["credential"].get("thumbprint").is_none());
    }

    #[test]
    fn test_thumbprint_is_sent_when_pinned() {
        let mut spec = spec();
        spec.credential.thumbprint = Some("AB:CD".into());
        assert_eq!(spec.to_body()["credential"]["thumbprint"], "AB:CD");
    }

    #[test]
    fn test_origin_type_parse_is_case_insensitive() {
        assert_eq!("VCENTER".parse::<OriginType>(), Ok(OriginType::VCenter));
        assert!("hyperv".parse::<OriginType>().is_err());
    }
}
