//! CameraRegistry - Camera Model & Lifecycle
//!
//! ## Responsibilities
//!
//! - Authoritative in-memory + persisted camera set
//! - Id, ONVIF-port and path-name allocation
//! - Start/stop lifecycle: virtual NIC provisioning and protocol emulator
//!   supervision per camera
//! - Durable configuration write + full topology recompilation after every
//!   mutation

mod ident;
mod service;
mod types;

pub use ident::{derive_path_name, generate_mac};
pub use service::CameraRegistry;
pub use types::{NewCameraRequest, SettingsUpdate, UpdateCameraRequest};
