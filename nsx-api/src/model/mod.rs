pub mod compute_manager;
pub mod config;
pub mod connection;
pub mod edge_cluster;
pub mod fabric;
pub mod object;
pub mod run_result;
pub mod transport_node;
