//! CLI command implementations

mod batch;
mod config;
mod targets;

pub use batch::{get_command, put_command, run_command};
pub use config::{config_init, config_path, config_show};
pub use targets::{resolve_endpoints, TargetArgs};
