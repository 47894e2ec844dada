use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "nsx-config.toml";
pub const DEFAULT_DEFAULTS_FILE: &str = "nsx-defaults.toml";

/// Installs and configures an NSX-T Manager from two TOML files.
#[derive(Parser, Debug)]
#[command(name = "nsx-installer")]
#[command(about = "NSX-T Manager installer", long_about = None)]
pub struct Cli {
    /// File receiving the detailed log. Appended to, never truncated.
    #[arg(long, global = true, default_value = nsx_core::logging::DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Applies the license, fabric objects, compute managers, edge transport nodes
    /// and edge clusters.
    Run {
        /// User configuration file.
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Defaults file.
        #[arg(short, long, default_value = DEFAULT_DEFAULTS_FILE)]
        defaults: PathBuf,
    },
    /// Prints (or writes) the merged configuration as JSON without contacting the manager.
    Render {
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        #[arg(short, long, default_value = DEFAULT_DEFAULTS_FILE)]
        defaults: PathBuf,

        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Overwrites the defaults file with the factory values.
    ResetDefaults {
        #[arg(short, long, default_value = DEFAULT_DEFAULTS_FILE)]
        path: PathBuf,
    },
    /// Overwrites the user configuration file with an empty template.
    ResetConfig {
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,
    },
}
