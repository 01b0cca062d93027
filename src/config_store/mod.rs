//! ConfigStore - Persisted Configuration
//!
//! ## Responsibilities
//!
//! - SSoT for cameras, global settings and grid-fusion layouts
//! - Atomic replace-on-write persistence (temp file + fsync + rename)
//!
//! Mutation goes through the camera registry, which holds the single
//! mutex protecting the in-memory document and the file.

mod repository;
mod types;

pub use repository::ConfigRepository;
pub use types::{
    Camera, CameraStatus, ConfigDocument, GridFusion, GridFusionLayout, IpMode, LayoutPlacement,
    Settings, StreamVariant, DEFAULT_RTSP_PORT, INTERNAL_RELAY_USER, ONVIF_PORT_BASE,
};
