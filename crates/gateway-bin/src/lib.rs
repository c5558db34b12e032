//! Parity gateway: a local HTTP listener in front of a remote task runner.
//!
//! JSON `POST`s become tasks (acknowledged with 202, images shipped in the
//! background); everything else is proxied to the runner with the
//! operator's identity headers attached.

pub mod app;
pub mod commands;
pub mod http;
pub mod pipeline;
