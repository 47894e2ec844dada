#![allow(dead_code)]

use nsx::{
    AllocationRange, ComputeManagerSpec, Credential, CredentialType, DeploymentType, DesiredState,
    EdgeClusterSpec, FormFactor, HostSwitch, HostSwitchMode, HostSwitchSpec, HostSwitchType,
    IpPoolSpec, IpPoolSubnet, LicenseSpec, NodeDeploymentInfo, NodeUserSettings, NsxConnection,
    ObjectKind, OriginType, Pnic, PortSubnet, ResolvedConfig, RetryPolicy, TeamingPolicy,
    TransportNodeSpec, TransportType, TransportZoneSpec, UplinkProfileSpec, VmDeploymentConfig,
};
use nsx_core::client::mock::InMemoryNsx;

pub const UPLINK_PROFILE: &str = "nsx-edge-single-nic-uplink-profile";
pub const IP_POOL: &str = "Edge-TEP-IP-Pool";
pub const TRANSPORT_ZONE: &str = "Overlay-TZ";
pub const HA_PROFILE: &str = "nsx-default-edge-high-availability-profile";

pub fn compute_manager(name: &str) -> ComputeManagerSpec {
    ComputeManagerSpec {
        display_name: name.to_string(),
        server: format!("{}.mylab.net", name),
        origin_type: OriginType::VCenter,
        credential: Credential {
            credential_type: CredentialType::UsernamePasswordLoginCredential,
            username: "administrator@vsphere.local".into(),
            password: "myPassword1!".into(),
            thumbprint: None,
        },
        set_as_oidc_provider: true,
        desired_state: DesiredState::Present,
    }
}

pub fn transport_node(name: &str, compute_manager: &str) -> TransportNodeSpec {
    TransportNodeSpec {
        display_name: name.to_string(),
        host_switch_spec: HostSwitchSpec {
            host_switches: vec![HostSwitch {
                host_switch_name: "nvds1".into(),
                host_switch_type: HostSwitchType::Nvds,
                host_switch_mode: HostSwitchMode::Standard,
                uplink_profile: UPLINK_PROFILE.into(),
                pnics: Pnic::for_uplinks(2),
                ip_pool: IP_POOL.into(),
                transport_zones: vec![TRANSPORT_ZONE.into()],
            }],
        },
        node_deployment_info: NodeDeploymentInfo {
            deployment_type: DeploymentType::VirtualMachine,
            form_factor: FormFactor::Large,
            vm_deployment_config: VmDeploymentConfig {
                compute_manager: compute_manager.to_string(),
                compute_id: "domain-c7".into(),
                storage_id: "datastore-11".into(),
                management_network_id: "network-13".into(),
                data_network_ids: vec!["dvportgroup-21".into()],
                hostname: format!("{}.mylab.net", name),
                management_port_subnets: vec![PortSubnet {
                    ip_addresses: vec!["192.168.1.50".into()],
                    prefix_length: 24,
                }],
                default_gateway_addresses: vec!["192.168.1.1".into()],
                enable_ssh: true,
                allow_ssh_root_login: true,
            },
            node_user_settings: NodeUserSettings {
                cli_username: "admin".into(),
                cli_password: "myPassword1!myPassword1!".into(),
                root_password: "myPassword1!myPassword1!".into(),
                audit_username: "audit".into(),
                audit_password: "myPassword1!myPassword1!".into(),
            },
        },
        desired_state: DesiredState::Present,
    }
}

pub fn resolved(compute_managers: &[&str], edges: &[&str]) -> ResolvedConfig {
    let first = compute_managers.first().copied().unwrap_or("vcenter-01");
    ResolvedConfig {
        connection: NsxConnection {
            mgmt_ip: "192.168.1.10".into(),
            username: "admin".into(),
            password: "secret".into(),
            validate_certs: false,
            request_timeout_secs: 5,
            retry: RetryPolicy::new(2, 1, 2),
        },
        license: LicenseSpec {
            license_key: "AAAAA-BBBBB-CCCCC-DDDDD-EEEEE".into(),
            accept_eula: true,
        },
        compute_managers: compute_managers.iter().map(|n| compute_manager(n)).collect(),
        transport_zones: Vec::new(),
        ip_pools: Vec::new(),
        uplink_profiles: Vec::new(),
        transport_nodes: edges.iter().map(|n| transport_node(n, first)).collect(),
        edge_clusters: Vec::new(),
    }
}

/// Adds the fabric the edges reference, plus one cluster over `members`.
pub fn with_fabric(mut config: ResolvedConfig, members: &[&str]) -> ResolvedConfig {
    config.transport_zones = vec![TransportZoneSpec {
        display_name: TRANSPORT_ZONE.into(),
        transport_type: TransportType::Overlay,
        host_switch_name: Some("nvds1".into()),
        desired_state: DesiredState::Present,
    }];
    config.ip_pools = vec![IpPoolSpec {
        display_name: IP_POOL.into(),
        subnets: vec![IpPoolSubnet {
            allocation_ranges: vec![AllocationRange {
                start: "172.16.227.20".into(),
                end: "172.16.227.29".into(),
            }],
            gateway_ip: "172.16.227.1".into(),
            cidr: "172.16.227.0/27".into(),
        }],
        desired_state: DesiredState::Present,
    }];
    config.uplink_profiles = vec![UplinkProfileSpec {
        display_name: UPLINK_PROFILE.into(),
        mtu: 1600,
        transport_vlan: 0,
        teaming_policy: TeamingPolicy::FailoverOrder,
        active_uplinks: vec!["uplink-1".into(), "uplink-2".into()],
        standby_uplinks: Vec::new(),
        desired_state: DesiredState::Present,
    }];
    config.edge_clusters = vec![EdgeClusterSpec {
        display_name: "Edge-Cluster".into(),
        ha_profile: HA_PROFILE.into(),
        members: members.iter().map(|m| m.to_string()).collect(),
        desired_state: DesiredState::Present,
    }];
    config
}

/// A manager holding only what ships with it.
pub fn fresh_manager() -> InMemoryNsx {
    let nsx = InMemoryNsx::new();
    nsx.seed_named(ObjectKind::ClusterProfile, HA_PROFILE);
    nsx
}

/// A manager that already holds the objects edges depend on.
pub fn prepared_manager() -> InMemoryNsx {
    let nsx = fresh_manager();
    nsx.seed_named(ObjectKind::HostSwitchProfile, UPLINK_PROFILE);
    nsx.seed_named(ObjectKind::IpPool, IP_POOL);
    nsx.seed_named(ObjectKind::TransportZone, TRANSPORT_ZONE);
    nsx
}
