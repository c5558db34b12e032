//! One-shot CLI commands besides `start`.

mod auth;
mod health;

pub use auth::run_auth;
pub use health::{health_url, run_health};
