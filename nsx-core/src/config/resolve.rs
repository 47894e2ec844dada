//! Turns the merged [`RawConfig`] into a validated [`ResolvedConfig`].

use super::raw::{
    RawComputeManager, RawConfig, RawEdgeCluster, RawIpPool, RawNsxManager, RawTransportNode,
    RawTransportZone, RawUplinkProfile,
};
use nsx::{
    AllocationRange, ComputeManagerSpec, ConfigError, Credential, CredentialType, DeploymentType,
    DesiredState, EdgeClusterSpec, FormFactor, HostSwitch, HostSwitchMode, HostSwitchSpec,
    HostSwitchType, IpPoolSpec, IpPoolSubnet, LicenseSpec, NodeDeploymentInfo, NodeUserSettings,
    NsxConnection, ObjectKind, OriginType, Pnic, PortSubnet, ResolvedConfig, RetryPolicy,
    TeamingPolicy, TransportNodeSpec, TransportType, TransportZoneSpec, UplinkProfileSpec,
    VmDeploymentConfig,
};
use std::collections::HashSet;
use std::net::IpAddr;
use std::str::FromStr;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_UPLINKS: u8 = 2;
const MTU_RANGE: (u32, u32) = (1280, 9000);
const MAX_VLAN: u16 = 4094;

/// Resolves and validates every section of the merged configuration.
pub fn resolve(raw: RawConfig) -> Result<ResolvedConfig, ConfigError> {
    let (connection, license) = resolve_manager(&raw.nsx_manager)?;

    let compute_managers = raw
        .compute_managers
        .iter()
        .enumerate()
        .map(|(index, item)| resolve_compute_manager(&raw, index, item))
        .collect::<Result<Vec<_>, _>>()?;
    ensure_unique(
        ObjectKind::ComputeManager,
        compute_managers.iter().map(|cm| cm.display_name.as_str()),
    )?;

    let transport_zones = raw
        .transport_zones
        .iter()
        .enumerate()
        .map(|(index, item)| resolve_transport_zone(&raw, index, item))
        .collect::<Result<Vec<_>, _>>()?;
    ensure_unique(
        ObjectKind::TransportZone,
        transport_zones.iter().map(|tz| tz.display_name.as_str()),
    )?;

    let ip_pools = raw
        .ip_pools
        .iter()
        .enumerate()
        .map(|(index, item)| resolve_ip_pool(index, item))
        .collect::<Result<Vec<_>, _>>()?;
    ensure_unique(
        ObjectKind::IpPool,
        ip_pools.iter().map(|pool| pool.display_name.as_str()),
    )?;

    let uplink_profiles = raw
        .uplink_profiles
        .iter()
        .enumerate()
        .map(|(index, item)| resolve_uplink_profile(&raw, index, item))
        .collect::<Result<Vec<_>, _>>()?;
    ensure_unique(
        ObjectKind::HostSwitchProfile,
        uplink_profiles.iter().map(|p| p.display_name.as_str()),
    )?;

    let mut transport_nodes = Vec::with_capacity(raw.edge_transport_nodes.len());
    for (index, item) in raw.edge_transport_nodes.iter().enumerate() {
        transport_nodes.push(resolve_transport_node(
            &raw,
            &compute_managers,
            index,
            item,
        )?);
    }
    ensure_unique(
        ObjectKind::TransportNode,
        transport_nodes.iter().map(|tn| tn.display_name.as_str()),
    )?;

    let edge_clusters = raw
        .edge_clusters
        .iter()
        .enumerate()
        .map(|(index, item)| resolve_edge_cluster(&raw, &transport_nodes, index, item))
        .collect::<Result<Vec<_>, _>>()?;
    ensure_unique(
        ObjectKind::EdgeCluster,
        edge_clusters.iter().map(|c| c.display_name.as_str()),
    )?;

    Ok(ResolvedConfig {
        connection,
        license,
        compute_managers,
        transport_zones,
        ip_pools,
        uplink_profiles,
        transport_nodes,
        edge_clusters,
    })
}

fn resolve_manager(raw: &RawNsxManager) -> Result<(NsxConnection, LicenseSpec), ConfigError> {
    let defaults = RetryPolicy::default();
    let retry = RetryPolicy::new(
        optional_number(&raw.max_attempts, "nsx_manager.max_attempts")?
            .unwrap_or(defaults.max_attempts),
        optional_number(&raw.initial_backoff_ms, "nsx_manager.initial_backoff_ms")?
            .unwrap_or(defaults.initial_backoff_ms),
        optional_number(&raw.max_backoff_ms, "nsx_manager.max_backoff_ms")?
            .unwrap_or(defaults.max_backoff_ms),
    );
    if retry.max_attempts == 0 {
        return Err(ConfigError::invalid(
            "nsx_manager.max_attempts",
            "must be at least 1",
        ));
    }

    let request_timeout_secs =
        optional_number(&raw.request_timeout_secs, "nsx_manager.request_timeout_secs")?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    if request_timeout_secs == 0 {
        return Err(ConfigError::invalid(
            "nsx_manager.request_timeout_secs",
            "must be at least 1",
        ));
    }

    let connection = NsxConnection {
        mgmt_ip: required(&raw.mgmt_ip, "nsx_manager.mgmt_ip")?,
        username: required(&raw.username, "nsx_manager.username")?,
        password: required(&raw.password, "nsx_manager.password")?,
        validate_certs: optional_bool(&raw.validate_certs, "nsx_manager.validate_certs")?
            .unwrap_or(true),
        request_timeout_secs,
        retry,
    };

    let license = LicenseSpec {
        license_key: required(&raw.license_key, "nsx_manager.license_key")?,
        accept_eula: optional_bool(&raw.accept_eula, "nsx_manager.accept_eula")?.unwrap_or(true),
    };

    Ok((connection, license))
}

fn resolve_compute_manager(
    raw: &RawConfig,
    index: usize,
    item: &RawComputeManager,
) -> Result<ComputeManagerSpec, ConfigError> {
    let defaults = &raw.compute_manager_defaults;
    let path = |field: &str| format!("compute_managers[{}].{}", index, field);

    let display_name = match present(&item.display_name) {
        Some(name) => name,
        None => generated_name(
            &defaults.display_name,
            "compute_manager_defaults.display_name",
            index,
        )?,
    };
    if desired_state(&item.desired_state, &path("desired_state"))? == DesiredState::Absent {
        return Ok(ComputeManagerSpec::absent(display_name));
    }

    let origin_type = parse_or_default::<OriginType>(
        first_present(&item.origin_type, &defaults.origin_type),
        &path("origin_type"),
    )?;
    let credential_type = parse_or_default::<CredentialType>(
        first_present(&item.credential_type, &defaults.credential_type),
        &path("credential_type"),
    )?;
    let set_as_oidc_provider = optional_bool(
        &first_present(&item.set_as_oidc_provider, &defaults.set_as_oidc_provider),
        &path("set_as_oidc_provider"),
    )?
    .unwrap_or(false);

    Ok(ComputeManagerSpec {
        display_name,
        server: required(&item.server, &path("server"))?,
        origin_type,
        credential: Credential {
            credential_type,
            username: required(&item.username, &path("username"))?,
            password: required(&item.password, &path("password"))?,
            thumbprint: present(&item.thumbprint),
        },
        set_as_oidc_provider,
        desired_state: DesiredState::Present,
    })
}

fn resolve_transport_node(
    raw: &RawConfig,
    compute_managers: &[ComputeManagerSpec],
    index: usize,
    item: &RawTransportNode,
) -> Result<TransportNodeSpec, ConfigError> {
    let defaults = &raw.transport_node_defaults;
    let path = |field: &str| format!("edge_transport_nodes[{}].{}", index, field);

    let display_name = match present(&item.display_name) {
        Some(name) => name,
        None => generated_name(
            &defaults.display_name,
            "transport_node_defaults.display_name",
            index,
        )?,
    };
    if desired_state(&item.desired_state, &path("desired_state"))? == DesiredState::Absent {
        return Ok(TransportNodeSpec::absent(display_name));
    }

    let compute_manager = match first_present(&item.compute_manager, &defaults.compute_manager) {
        Some(name) => name,
        None => compute_managers
            .iter()
            .find(|cm| cm.desired_state == DesiredState::Present)
            .map(|cm| cm.display_name.clone())
            .ok_or_else(|| ConfigError::MissingField(path("compute_manager")))?,
    };

    let uplinks: u8 = required_number(
        &first_present(&item.number_of_uplinks, &defaults.number_of_uplinks),
        &path("number_of_uplinks"),
    )?;
    if uplinks == 0 || uplinks > MAX_UPLINKS {
        return Err(ConfigError::invalid(
            path("number_of_uplinks"),
            format!("must be between 1 and {}, got {}", MAX_UPLINKS, uplinks),
        ));
    }

    let transport_zones = non_empty_list(
        first_list(&item.transport_zones, &defaults.transport_zones),
        &path("transport_zones"),
    )?;

    let host_switch = HostSwitch {
        host_switch_name: required(
            &first_present(&item.host_switch_name, &defaults.host_switch_name),
            &path("host_switch_name"),
        )?,
        host_switch_type: HostSwitchType::Nvds,
        host_switch_mode: HostSwitchMode::Standard,
        uplink_profile: required(
            &first_present(&item.uplink_profile, &defaults.uplink_profile),
            &path("uplink_profile"),
        )?,
        pnics: Pnic::for_uplinks(uplinks),
        ip_pool: required(
            &first_present(&item.ip_pool, &defaults.ip_pool),
            &path("ip_pool"),
        )?,
        transport_zones,
    };

    let prefix_length: u8 = required_number(&item.mgmt_prefix_length, &path("mgmt_prefix_length"))?;
    if prefix_length == 0 || prefix_length > 32 {
        return Err(ConfigError::invalid(
            path("mgmt_prefix_length"),
            format!("must be between 1 and 32, got {}", prefix_length),
        ));
    }

    let hostname = required(&item.hostname, &path("hostname"))?;
    let system_password = required(&item.system_password, &path("system_password"))?;
    let enable_ssh = optional_bool(
        &first_present(&item.enable_ssh, &defaults.enable_ssh),
        &path("enable_ssh"),
    )?
    .unwrap_or(true);
    let allow_ssh_root_login = optional_bool(
        &first_present(&item.allow_ssh_root_login, &defaults.allow_ssh_root_login),
        &path("allow_ssh_root_login"),
    )?
    .unwrap_or(true);

    let vm_deployment_config = VmDeploymentConfig {
        compute_manager,
        compute_id: required(&item.compute_id, &path("compute_id"))?,
        storage_id: required(&item.storage_id, &path("storage_id"))?,
        management_network_id: required(
            &item.management_network_id,
            &path("management_network_id"),
        )?,
        data_network_ids: non_empty_list(item.data_network_ids.as_ref(), &path("data_network_ids"))?,
        hostname,
        management_port_subnets: vec![PortSubnet {
            ip_addresses: vec![required(&item.mgmt_ip, &path("mgmt_ip"))?],
            prefix_length,
        }],
        default_gateway_addresses: vec![required(&item.default_gateway, &path("default_gateway"))?],
        enable_ssh,
        allow_ssh_root_login,
    };

    let node_user_settings = NodeUserSettings {
        cli_username: first_present(&item.cli_username, &defaults.cli_username)
            .unwrap_or_else(|| "admin".to_string()),
        cli_password: system_password.clone(),
        root_password: system_password.clone(),
        audit_username: first_present(&item.audit_username, &defaults.audit_username)
            .unwrap_or_else(|| "audit".to_string()),
        audit_password: system_password,
    };

    Ok(TransportNodeSpec {
        display_name,
        host_switch_spec: HostSwitchSpec {
            host_switches: vec![host_switch],
        },
        node_deployment_info: NodeDeploymentInfo {
            deployment_type: DeploymentType::VirtualMachine,
            form_factor: parse_or_default::<FormFactor>(
                first_present(&item.form_factor, &defaults.form_factor),
                &path("form_factor"),
            )?,
            vm_deployment_config,
            node_user_settings,
        },
        desired_state: DesiredState::Present,
    })
}

fn resolve_transport_zone(
    raw: &RawConfig,
    index: usize,
    item: &RawTransportZone,
) -> Result<TransportZoneSpec, ConfigError> {
    let path = |field: &str| format!("transport_zones[{}].{}", index, field);
    let display_name = required(&item.display_name, &path("display_name"))?;
    if desired_state(&item.desired_state, &path("desired_state"))? == DesiredState::Absent {
        return Ok(TransportZoneSpec::absent(display_name));
    }

    Ok(TransportZoneSpec {
        display_name,
        transport_type: parse_or_default::<TransportType>(
            present(&item.transport_type),
            &path("transport_type"),
        )?,
        host_switch_name: first_present(
            &item.host_switch_name,
            &raw.transport_node_defaults.host_switch_name,
        ),
        desired_state: DesiredState::Present,
    })
}

fn resolve_ip_pool(index: usize, item: &RawIpPool) -> Result<IpPoolSpec, ConfigError> {
    let path = |field: &str| format!("ip_pools[{}].{}", index, field);
    let display_name = required(&item.display_name, &path("display_name"))?;
    if desired_state(&item.desired_state, &path("desired_state"))? == DesiredState::Absent {
        return Ok(IpPoolSpec::absent(display_name));
    }

    let start = required_ip(&item.start, &path("start"))?;
    let end = required_ip(&item.end, &path("end"))?;
    let gateway = required_ip(&item.gateway, &path("gateway"))?;
    let cidr = required(&item.cidr, &path("cidr"))?;
    let network = parse_cidr(&cidr, &path("cidr"))?;

    if start.is_ipv4() != end.is_ipv4() || start > end {
        return Err(ConfigError::invalid(
            path("end"),
            format!("range {} - {} is empty", start, end),
        ));
    }
    for (field, address) in [("start", start), ("end", end), ("gateway", gateway)] {
        if !network.contains(address) {
            return Err(ConfigError::invalid(
                path(field),
                format!("{} is outside {}", address, cidr),
            ));
        }
    }

    Ok(IpPoolSpec {
        display_name,
        subnets: vec![IpPoolSubnet {
            allocation_ranges: vec![AllocationRange {
                start: start.to_string(),
                end: end.to_string(),
            }],
            gateway_ip: gateway.to_string(),
            cidr,
        }],
        desired_state: DesiredState::Present,
    })
}

fn resolve_uplink_profile(
    raw: &RawConfig,
    index: usize,
    item: &RawUplinkProfile,
) -> Result<UplinkProfileSpec, ConfigError> {
    let defaults = &raw.uplink_profile_defaults;
    let path = |field: &str| format!("uplink_profiles[{}].{}", index, field);
    let display_name = required(&item.display_name, &path("display_name"))?;
    if desired_state(&item.desired_state, &path("desired_state"))? == DesiredState::Absent {
        return Ok(UplinkProfileSpec::absent(display_name));
    }

    let mtu: u32 = required_number(&first_present(&item.mtu, &defaults.mtu), &path("mtu"))?;
    if mtu < MTU_RANGE.0 || mtu > MTU_RANGE.1 {
        return Err(ConfigError::invalid(
            path("mtu"),
            format!("must be between {} and {}, got {}", MTU_RANGE.0, MTU_RANGE.1, mtu),
        ));
    }
    let transport_vlan: u16 = optional_number(
        &first_present(&item.transport_vlan, &defaults.transport_vlan),
        &path("transport_vlan"),
    )?
    .unwrap_or(0);
    if transport_vlan > MAX_VLAN {
        return Err(ConfigError::invalid(
            path("transport_vlan"),
            format!("must be between 0 and {}, got {}", MAX_VLAN, transport_vlan),
        ));
    }

    let active_uplinks = non_empty_list(
        first_list(&item.active_uplinks, &defaults.active_uplinks),
        &path("active_uplinks"),
    )?;
    let standby_uplinks: Vec<String> = first_list(&item.standby_uplinks, &defaults.standby_uplinks)
        .map(|list| trimmed(list))
        .unwrap_or_default();
    if let Some(both) = standby_uplinks.iter().find(|u| active_uplinks.contains(u)) {
        return Err(ConfigError::invalid(
            path("standby_uplinks"),
            format!("'{}' is also an active uplink", both),
        ));
    }

    Ok(UplinkProfileSpec {
        display_name,
        mtu,
        transport_vlan,
        teaming_policy: parse_or_default::<TeamingPolicy>(
            first_present(&item.teaming_policy, &defaults.teaming_policy),
            &path("teaming_policy"),
        )?,
        active_uplinks,
        standby_uplinks,
        desired_state: DesiredState::Present,
    })
}

fn resolve_edge_cluster(
    raw: &RawConfig,
    transport_nodes: &[TransportNodeSpec],
    index: usize,
    item: &RawEdgeCluster,
) -> Result<EdgeClusterSpec, ConfigError> {
    let path = |field: &str| format!("edge_clusters[{}].{}", index, field);
    let display_name = required(&item.display_name, &path("display_name"))?;
    if desired_state(&item.desired_state, &path("desired_state"))? == DesiredState::Absent {
        return Ok(EdgeClusterSpec::absent(display_name));
    }

    let ha_profile = required(
        &first_present(&item.ha_profile, &raw.edge_cluster_defaults.ha_profile),
        &path("ha_profile"),
    )?;

    let listed = item.members.as_deref().map(trimmed).unwrap_or_default();
    let mut members: Vec<String> = Vec::with_capacity(listed.len());
    if listed.is_empty() {
        members.extend(
            transport_nodes
                .iter()
                .filter(|tn| tn.desired_state == DesiredState::Present)
                .map(|tn| tn.display_name.clone()),
        );
    } else {
        for member in listed {
            let removed = transport_nodes
                .iter()
                .any(|tn| tn.display_name == member && tn.desired_state == DesiredState::Absent);
            if removed {
                return Err(ConfigError::invalid(
                    path("members"),
                    format!("edge '{}' is marked absent", member),
                ));
            }
            if !members.contains(&member) {
                members.push(member);
            }
        }
    }
    if members.is_empty() {
        return Err(ConfigError::MissingField(path("members")));
    }

    Ok(EdgeClusterSpec {
        display_name,
        ha_profile,
        members,
        desired_state: DesiredState::Present,
    })
}

// --- Helpers ---

/// A value is present when set and not blank.
fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn first_present(item: &Option<String>, default: &Option<String>) -> Option<String> {
    present(item).or_else(|| present(default))
}

fn required(value: &Option<String>, field: &str) -> Result<String, ConfigError> {
    present(value).ok_or_else(|| ConfigError::MissingField(field.to_string()))
}

fn trimmed(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// The item's list unless it has no usable entry, then the default's.
fn first_list<'a>(
    item: &'a Option<Vec<String>>,
    default: &'a Option<Vec<String>>,
) -> Option<&'a Vec<String>> {
    let usable = |list: &&Vec<String>| list.iter().any(|v| !v.trim().is_empty());
    item.as_ref()
        .filter(usable)
        .or_else(|| default.as_ref().filter(usable))
}

fn non_empty_list(value: Option<&Vec<String>>, field: &str) -> Result<Vec<String>, ConfigError> {
    let list: Vec<String> = value.map(|items| trimmed(items)).unwrap_or_default();
    if list.is_empty() {
        Err(ConfigError::MissingField(field.to_string()))
    } else {
        Ok(list)
    }
}

fn optional_number<T: FromStr>(value: &Option<String>, field: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match present(value) {
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::invalid(field, format!("'{}' is not a number: {}", v, e))),
        None => Ok(None),
    }
}

fn required_number<T: FromStr>(value: &Option<String>, field: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    optional_number(value, field)?.ok_or_else(|| ConfigError::MissingField(field.to_string()))
}

fn required_ip(value: &Option<String>, field: &str) -> Result<IpAddr, ConfigError> {
    let text = required(value, field)?;
    text.parse::<IpAddr>()
        .map_err(|_| ConfigError::invalid(field, format!("'{}' is not an IP address", text)))
}

/// An `address/prefix` network.
struct Network {
    address: IpAddr,
    prefix: u8,
}

impl Network {
    fn contains(&self, ip: IpAddr) -> bool {
        match (self.address, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = u32::MAX.checked_shl(32 - u32::from(self.prefix)).unwrap_or(0);
                u32::from(net) & mask == u32::from(ip) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = u128::MAX.checked_shl(128 - u32::from(self.prefix)).unwrap_or(0);
                u128::from(net) & mask == u128::from(ip) & mask
            }
            _ => false,
        }
    }
}

fn parse_cidr(text: &str, field: &str) -> Result<Network, ConfigError> {
    let invalid = || ConfigError::invalid(field, format!("'{}' is not an address/prefix network", text));
    let (address, prefix) = text.split_once('/').ok_or_else(invalid)?;
    let address: IpAddr = address.trim().parse().map_err(|_| invalid())?;
    let prefix: u8 = prefix.trim().parse().map_err(|_| invalid())?;
    let max = if address.is_ipv4() { 32 } else { 128 };
    if prefix > max {
        return Err(invalid());
    }
    Ok(Network { address, prefix })
}

fn optional_bool(value: &Option<String>, field: &str) -> Result<Option<bool>, ConfigError> {
    match present(value) {
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "on" | "1" => Ok(Some(true)),
            "false" | "no" | "n" | "off" | "0" => Ok(Some(false)),
            _ => Err(ConfigError::invalid(
                field,
                format!("'{}' is not a boolean", v),
            )),
        },
        None => Ok(None),
    }
}

fn parse_or_default<T>(value: Option<String>, field: &str) -> Result<T, ConfigError>
where
    T: FromStr<Err = String> + Default,
{
    match value {
        Some(v) => v.parse::<T>().map_err(|reason| ConfigError::invalid(field, reason)),
        None => Ok(T::default()),
    }
}

fn desired_state(value: &Option<String>, field: &str) -> Result<DesiredState, ConfigError> {
    match present(value).map(|v| v.to_ascii_lowercase()) {
        None => Ok(DesiredState::Present),
        Some(v) if v == "present" => Ok(DesiredState::Present),
        Some(v) if v == "absent" => Ok(DesiredState::Absent),
        Some(v) => Err(ConfigError::invalid(
            field,
            format!("'{}' must be 'present' or 'absent'", v),
        )),
    }
}

/// `"{prefix}-{NN}"` with a 1-based, zero-padded position.
fn generated_name(prefix: &Option<String>, field: &str, index: usize) -> Result<String, ConfigError> {
    let prefix = required(prefix, field)?;
    Ok(format!("{}-{:02}", prefix, index + 1))
}

fn ensure_unique<'a>(
    kind: ObjectKind,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigError::DuplicateDisplayName {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}
