//! # Runner Client
//!
//! Outbound HTTP towards the remote task runner. Every request carries the
//! gateway's identity headers; proxied requests keep the caller's method,
//! path, query and body.

mod client;
mod error;
mod headers;

pub use client::RunnerClient;
pub use error::{RunnerClientError, RunnerClientResult};
pub use headers::{apply_identity, outbound_request_headers, strip_hop_by_hop};
