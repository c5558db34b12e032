//! Application wiring and lifecycle management.

mod init;
mod state;

pub use init::{run_gateway, serve};
pub use state::GatewayState;
