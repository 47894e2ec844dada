//! # NSX
//!
//! Domain model shared by the installer crates.
//!
//! ## Modules
//! - `model`: Typed requests (license, compute managers, fabric objects, transport
//!   nodes, edge clusters), connection settings and run results.
//! - `error`: Configuration, API and network error taxonomy.
//! - `traits`: The `NsxApi` seam implemented by the HTTP client and the in-memory fake.

pub mod error;
pub mod model;
pub mod traits;

pub use error::{ApiError, ConfigError, NetworkError};
pub use model::compute_manager::{ComputeManagerSpec, Credential, CredentialType, OriginType};
pub use model::config::{LicenseSpec, ResolvedConfig};
pub use model::connection::{NsxConnection, RetryPolicy};
pub use model::edge_cluster::EdgeClusterSpec;
pub use model::fabric::{
    AllocationRange, IpPoolSpec, IpPoolSubnet, TeamingPolicy, TransportType, TransportZoneSpec,
    UplinkProfileSpec,
};
pub use model::object::{DesiredState, ObjectId, ObjectKind};
pub use model::run_result::{ItemState, Operation, RunReport, RunResult};
pub use model::transport_node::{
    DeploymentType, FormFactor, HostSwitch, HostSwitchMode, HostSwitchSpec, HostSwitchType,
    NodeDeploymentInfo, NodeUserSettings, Pnic, PortSubnet, References, TransportNodeSpec,
    VmDeploymentConfig,
};
pub use traits::nsx_api::NsxApi;
