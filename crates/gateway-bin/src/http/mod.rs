//! HTTP surface: one fallback handler that classifies and routes every request.

mod dispatch;
mod error;
pub mod health;
mod ingestion;
mod proxy;
mod status;

pub use dispatch::{classify, strip_api_prefix, Route};
pub use error::GatewayError;

use crate::app::GatewayState;
use axum::Router;

pub fn router(state: GatewayState) -> Router {
    Router::new()
        .fallback(dispatch::dispatch)
        .with_state(state)
}
