//! Generators for the defaults and user configuration files.
//!
//! Both files are TOML. Every key is preceded by a comment describing it and, for
//! user values, an example, so the files can be filled in by hand.

use log::{debug, info};
use nsx::ConfigError;
use std::fs;
use std::path::Path;

const RULE: &str =
    "#-------------------------------------------------------------------------------";

/// A literal written on the right-hand side of a key.
enum Literal<'a> {
    Str(&'a str),
    Bool(bool),
    Int(i64),
    List(&'a [&'a str]),
}

impl Literal<'_> {
    fn render(&self) -> String {
        match self {
            Literal::Str(s) => quote(s),
            Literal::Bool(b) => b.to_string(),
            Literal::Int(i) => i.to_string(),
            Literal::List(items) => {
                let items: Vec<String> = items.iter().map(|s| quote(s)).collect();
                format!("[{}]", items.join(", "))
            }
        }
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

#[derive(Default)]
struct TemplateWriter {
    out: String,
}

impl TemplateWriter {
    fn comment(&mut self, text: &str) -> &mut Self {
        self.out.push_str(&format!("\n# {}\n", text));
        self
    }

    fn header(&mut self, text: &str) -> &mut Self {
        self.out
            .push_str(&format!("\n{}\n# {}\n{}\n", RULE, text, RULE));
        self
    }

    fn table(&mut self, name: &str) -> &mut Self {
        self.out.push_str(&format!("[{}]\n", name));
        self
    }

    fn array_table(&mut self, name: &str) -> &mut Self {
        self.out.push_str(&format!("[[{}]]\n", name));
        self
    }

    fn entry(&mut self, key: &str, value: Literal<'_>, comment: &str) -> &mut Self {
        self.out.push_str(&format!("# {}\n", comment));
        self.out
            .push_str(&format!("{} = {}\n", key, value.render()));
        self
    }

    fn example(&mut self, key: &str, value: Literal<'_>, comment: &str, example: &str) -> &mut Self {
        self.out.push_str(&format!("# {}\n# Example: {}\n", comment, example));
        self.out
            .push_str(&format!("{} = {}\n", key, value.render()));
        self
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Text of the factory defaults file.
pub fn defaults_template() -> String {
    let mut w = TemplateWriter::default();
    w.comment("Defaults. Regenerate with `nsx-installer reset-defaults`.");

    w.header("NSX Manager connection")
        .table("nsx_manager")
        .entry("username", Literal::Str("admin"), "NSX Username")
        .entry("validate_certs", Literal::Bool(false), "Accept self-signed certs")
        .entry("accept_eula", Literal::Bool(true), "Accept the NSX end-user license agreement")
        .entry("request_timeout_secs", Literal::Int(30), "Timeout of every API request, in seconds")
        .entry("max_attempts", Literal::Int(5), "Attempts per API request on transient failures")
        .entry("initial_backoff_ms", Literal::Int(500), "Delay before the first retry, in milliseconds. Doubles on each retry")
        .entry("max_backoff_ms", Literal::Int(8000), "Upper bound of the retry delay, in milliseconds");

    w.header("Compute managers")
        .table("compute_manager_defaults")
        .entry("display_name", Literal::Str("vcenter"), "Display Name prefix on NSX Manager for registered vCenter Servers")
        .entry("origin_type", Literal::Str("vCenter"), "Compute manager type")
        .entry("credential_type", Literal::Str("UsernamePasswordLoginCredential"), "Credential type used to log into the compute manager")
        .entry("set_as_oidc_provider", Literal::Bool(true), "Register the compute manager as an OIDC provider");

    w.header("Edge transport nodes")
        .table("transport_node_defaults")
        .entry("display_name", Literal::Str("edge"), "Display Name prefix of Edge nodes on NSX Manager")
        .entry("host_switch_name", Literal::Str("nvds1"), "Host Switch Name on the Edges")
        .entry("uplink_profile", Literal::Str("nsx-edge-single-nic-uplink-profile"), "Uplink Host Switch Profile used by the Edges")
        .entry("ip_pool", Literal::Str("Edge-TEP-IP-Pool"), "IP Pool used by Edge Transport Nodes")
        .entry("transport_zones", Literal::List(&["Overlay-TZ"]), "Transport Zones the Edge host switch joins")
        .entry("number_of_uplinks", Literal::Int(2), "Number of Uplinks on the Edge Node. Max: 2")
        .entry("form_factor", Literal::Str("LARGE"), "VM form factor for Edge Node deployments. Other choices are SMALL, MEDIUM and XLARGE")
        .entry("cli_username", Literal::Str("admin"), "Edge CLI user name")
        .entry("audit_username", Literal::Str("audit"), "Edge audit user name")
        .entry("enable_ssh", Literal::Bool(true), "Enable SSH on the Edges")
        .entry("allow_ssh_root_login", Literal::Bool(true), "Allow root SSH logins on the Edges");

    w.header("Transport zones. A [[transport_zones]] list in the user file replaces this one");
    for (name, kind) in [("Overlay-TZ", "OVERLAY"), ("VLAN-TZ", "VLAN")] {
        w.array_table("transport_zones")
            .entry("display_name", Literal::Str(name), "Transport Zone name")
            .entry("transport_type", Literal::Str(kind), "Traffic type: OVERLAY or VLAN");
    }

    w.header("Uplink profiles")
        .table("uplink_profile_defaults")
        .entry("mtu", Literal::Int(1600), "MTU of the uplinks. Between 1280 and 9000")
        .entry("transport_vlan", Literal::Int(0), "VLAN tagging TEP traffic. 0 leaves it untagged")
        .entry("teaming_policy", Literal::Str("FAILOVER_ORDER"), "Teaming policy: FAILOVER_ORDER, LOADBALANCE_SRCID or LOADBALANCE_SRC_MAC")
        .entry("active_uplinks", Literal::List(&["uplink-1", "uplink-2"]), "Active uplink names, in order")
        .entry("standby_uplinks", Literal::List(&[]), "Standby uplink names");

    w.header("Edge clusters")
        .table("edge_cluster_defaults")
        .entry("ha_profile", Literal::Str("nsx-default-edge-high-availability-profile"), "Edge high-availability cluster profile bound to new Edge clusters");

    w.finish()
}

fn edge_block(w: &mut TemplateWriter, number: u8) {
    w.header(&format!("Edge {} deployment details", number))
        .array_table("edge_transport_nodes")
        .example("compute_id", Literal::Str(""), "vSphere cluster (managed object id) where the Edge will be deployed", "domain-c7")
        .example("storage_id", Literal::Str(""), "vSphere datastore (managed object id) where the Edge will be deployed", "datastore-11")
        .example("management_network_id", Literal::Str(""), "Port Group backing the Edge management interface (managed object id)", "network-13")
        .example("data_network_ids", Literal::List(&[]), "Port Groups backing the Edge data interfaces (managed object ids)", "[\"dvportgroup-21\"]")
        .example("hostname", Literal::Str(""), "FQDN of the Edge", &format!("edge{}.mylab.net", number))
        .example("mgmt_ip", Literal::Str(""), "Management IP Address of the Edge", &format!("192.168.1.5{}", number))
        .example("mgmt_prefix_length", Literal::Str(""), "Network prefix on the Management Network", "24")
        .example("default_gateway", Literal::Str(""), "Default Gateway of the Edge Management Network", "192.168.1.1")
        .example("system_password", Literal::Str(""), "Edge CLI, root and audit passwords. The same password is configured for all 3", "myPassword1!myPassword1!");
}

/// Text of an empty user configuration file.
pub fn config_template() -> String {
    let mut w = TemplateWriter::default();
    w.comment("User Configuration. Regenerate with `nsx-installer reset-config`.");

    w.header("NSX Manager")
        .table("nsx_manager")
        .example("mgmt_ip", Literal::Str(""), "Management IP or FQDN of the NSX Manager", "192.168.1.10")
        .example("password", Literal::Str(""), "Password of the admin account", "myPassword1!myPassword1!")
        .example("license_key", Literal::Str(""), "NSX License Key", "XXXX-YYYY-ZZZZ-1111-2222-3333-4444");

    w.header("vCenter to be registered as Compute Manager")
        .array_table("compute_managers")
        .example("server", Literal::Str(""), "FQDN or IP of the vCenter Server to be registered with NSX Manager", "vcenter.mylab.net")
        .example("username", Literal::Str(""), "vCenter username for authentication", "administrator@vsphere.local")
        .example("password", Literal::Str(""), "vCenter password for authentication", "myPassword1!");

    w.header("TEP IP pool handing out Edge tunnel endpoint addresses")
        .array_table("ip_pools")
        .entry("display_name", Literal::Str("Edge-TEP-IP-Pool"), "IP Pool name. Must match transport_node_defaults.ip_pool")
        .example("start", Literal::Str(""), "First address of the pool", "172.16.227.20")
        .example("end", Literal::Str(""), "Last address of the pool", "172.16.227.29")
        .example("gateway", Literal::Str(""), "Gateway of the TEP network", "172.16.227.1")
        .example("cidr", Literal::Str(""), "TEP network in CIDR notation", "172.16.227.0/27");

    edge_block(&mut w, 1);
    edge_block(&mut w, 2);

    w.header("Edge cluster grouping the Edges above")
        .array_table("edge_clusters")
        .entry("display_name", Literal::Str("Edge-Cluster"), "Edge Cluster name")
        .example("members", Literal::List(&[]), "Display names of the member Edges. Empty means every Edge not marked absent", "[\"edge-01\", \"edge-02\"]");

    w.finish()
}

fn write_template(path: &Path, content: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Overwrites `path` with the factory defaults.
pub fn reset_defaults(path: &Path) -> Result<(), ConfigError> {
    debug!("Resetting defaults at {}", path.display());
    write_template(path, &defaults_template())?;
    info!("reset_defaults: wrote {}", path.display());
    Ok(())
}

/// Overwrites `path` with an empty user configuration.
pub fn reset_config(path: &Path) -> Result<(), ConfigError> {
    debug!("Resetting user config at {}", path.display());
    write_template(path, &config_template())?;
    info!("reset_config: wrote {}", path.display());
    Ok(())
}
