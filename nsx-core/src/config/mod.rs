//! Layered configuration loading.
//!
//! Two TOML files are stacked with the `config` crate: the defaults file first, the
//! user file on top. Tables merge key by key, so any key set in the user file
//! overrides the same key from the defaults while keys only present in the defaults
//! survive untouched. The merged tree is then validated into a [`ResolvedConfig`].

pub mod raw;
pub mod resolve;
pub mod templates;

use config::{Config, File, FileFormat};
use log::{debug, info};
use nsx::{ConfigError, ResolvedConfig};
use raw::RawConfig;
use std::path::Path;

pub use resolve::resolve;
pub use templates::{reset_config, reset_defaults};

/// Loads, merges and validates the defaults and user configuration files.
///
/// # Arguments
///
/// * `defaults_path` - File holding the factory defaults.
/// * `user_path` - File holding the operator's values. Wins on conflicts.
///
/// # Returns
///
/// * `Ok(ResolvedConfig)` when every required key is present and valid.
/// * `Err(ConfigError)` otherwise. No network call is made either way.
pub fn load(defaults_path: &Path, user_path: &Path) -> Result<ResolvedConfig, ConfigError> {
    let raw = load_raw(defaults_path, user_path)?;
    let resolved = resolve(raw)?;
    info!(
        "Configuration resolved: {} transport zone(s), {} IP pool(s), {} uplink profile(s), \
         {} compute manager(s), {} transport node(s), {} edge cluster(s)",
        resolved.transport_zones.len(),
        resolved.ip_pools.len(),
        resolved.uplink_profiles.len(),
        resolved.compute_managers.len(),
        resolved.transport_nodes.len(),
        resolved.edge_clusters.len()
    );
    Ok(resolved)
}

/// Merges both files without validating them.
pub fn load_raw(defaults_path: &Path, user_path: &Path) -> Result<RawConfig, ConfigError> {
    for path in [defaults_path, user_path] {
        if !path.is_file() {
            return Err(ConfigError::Load(format!(
                "{} does not exist",
                path.display()
            )));
        }
    }

    debug!(
        "Merging {} (defaults) with {} (user)",
        defaults_path.display(),
        user_path.display()
    );

    let merged = Config::builder()
        .add_source(File::from(defaults_path).format(FileFormat::Toml))
        .add_source(File::from(user_path).format(FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    merged
        .try_deserialize::<RawConfig>()
        .map_err(|e| ConfigError::Load(e.to_string()))
}

/// Pretty JSON rendering of a resolved configuration.
pub fn render(config: &ResolvedConfig) -> Result<String, ConfigError> {
    Ok(serde_json::to_string_pretty(config)?)
}

/// Writes the rendered configuration to `path`.
pub fn write_rendered(config: &ResolvedConfig, path: &Path) -> Result<(), ConfigError> {
    let json = render(config)?;
    std::fs::write(path, json).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Resolved configuration written to {}", path.display());
    Ok(())
}
