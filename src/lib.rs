//! Virtucam
//!
//! Presents a pool of virtual ONVIF network video devices from a single
//! host. Each configured camera gets its own ONVIF control endpoint,
//! WS-Discovery presence, relay stream paths and optionally its own
//! virtual network interface, so recorders and VMS software see a fleet
//! of independent devices.
//!
//! ## Architecture
//!
//! 1. ConfigStore - persisted cameras, settings and layouts
//! 2. CameraRegistry - lifecycle manager, single source of truth
//! 3. Onvif - WS-Discovery responder and SOAP control plane per camera
//! 4. StreamTopology - deterministic relay configuration compiler
//! 5. Relay - media server process supervision
//! 6. Netif - per-camera macvlan interfaces and address acquisition

pub mod camera_registry;
pub mod config_store;
pub mod error;
pub mod netif;
pub mod onvif;
pub mod relay;
pub mod state;
pub mod stream_topology;

pub use error::{Error, Result};
pub use state::{AppConfig, AppState};
