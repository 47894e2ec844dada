pub mod nsx_api;
