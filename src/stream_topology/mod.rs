//! Stream topology compilation
//!
//! ## Responsibilities
//! - Model the relay configuration document (paths, listeners, users)
//! - Compile camera and layout state into that document deterministically
//! - Build the ffmpeg pipelines referenced by publisher paths
//! - Define the sink seam through which a compiled topology is applied
//!
//! The compiler never talks to the relay process itself. The registry
//! compiles after every mutation and hands the result to a [`TopologySink`],
//! which in production is the relay supervisor.

mod compiler;
mod ffmpeg;
mod types;

pub use compiler::compile;
pub use ffmpeg::{grid_fusion_command, transcode_command};
pub use types::{RelayPath, RelayPermission, RelayTopology, RelayUser};

use async_trait::async_trait;

use crate::error::Result;

/// Consumer of freshly compiled topologies.
///
/// Implementations own the side effects of making a topology live, such as
/// writing the relay configuration file and restarting the relay process.
#[async_trait]
pub trait TopologySink: Send + Sync {
    async fn apply(&self, topology: RelayTopology) -> Result<()>;
}
