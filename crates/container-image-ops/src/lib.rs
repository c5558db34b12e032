//! # Container Image Ops
//!
//! Docker CLI orchestration for the gateway's upload pipeline: check that an
//! image exists locally, pull it when it does not, and `docker save` it into
//! an [`ImagePackage`] whose temporary directory is removed on every path.

mod command_runner;
mod error;
mod operations;
mod package;

pub use command_runner::{CommandRunOutput, DockerCommandRunner};
pub use error::ContainerImageOpsError;
pub use operations::{validate_image_reference, EnsureOutcome, ImagePackager};
pub use package::{archive_file_name, ImagePackage};
