pub mod config_routes;
pub mod monitor_routes;
pub mod target_routes;
