//! # NSX Core
//!
//! Installer engine for an NSX-T Manager.
//!
//! ## Modules
//! - `config`: Layered TOML loading, validation, rendering and the file templates.
//! - `client`: `reqwest` implementation of `NsxApi` with retries and TLS handling.
//! - `reconcile`: Idempotent ensure present/absent keyed by display name.
//! - `orchestrator`: Runs every item in dependency order, deletes first.
//! - `logging`: Appending log file set up through `env_logger`.

pub mod client;
pub mod config;
pub mod logging;
pub mod orchestrator;
pub mod reconcile;

pub use client::NsxClient;
pub use orchestrator::Orchestrator;
