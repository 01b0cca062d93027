//! ONVIF Protocol Emulator
//!
//! ## Responsibilities
//!
//! - WS-Discovery responder: answers multicast probes with unicast matches
//! - Control endpoint: hand-built SOAP responses for the device and media
//!   channels on the camera's unique port
//! - Two authentication schemes (Basic, UsernameToken presence)
//!
//! One emulator instance is bound to one running camera. Both the
//! discovery responder and the control endpoint exit cooperatively when
//! the camera's stop signal fires.

pub mod auth;
mod device_service;
pub mod discovery;
mod media_service;
pub mod server;
pub mod types;
pub mod xml;

use crate::config_store::{Camera, Settings};

/// Immutable per-camera snapshot shared by the discovery responder and the
/// control endpoint. Taken at camera start; updates restart the camera, so
/// the snapshot never goes stale while in use.
#[derive(Debug, Clone)]
pub struct EmulatorContext {
    pub camera: Camera,
    pub settings: Settings,
}

impl EmulatorContext {
    pub fn new(camera: Camera, settings: Settings) -> Self {
        Self { camera, settings }
    }

    /// Address the camera is reachable on: the acquired virtual-NIC
    /// address when present, otherwise the host's configured server IP.
    pub fn endpoint_ip(&self) -> String {
        match self.camera.assigned_ip {
            Some(ip) => ip.to_string(),
            None => self.settings.server_ip.clone(),
        }
    }

    /// Root URL advertised in discovery XAddrs; `/` aliases the device
    /// service so recorders can use either form
    pub fn discovery_url(&self) -> String {
        format!("http://{}:{}/", self.endpoint_ip(), self.camera.onvif_port)
    }

    /// Device-service XAddr advertised in capabilities and services
    pub fn device_service_url(&self) -> String {
        format!(
            "http://{}:{}/onvif/device_service",
            self.endpoint_ip(),
            self.camera.onvif_port
        )
    }

    pub fn media_service_url(&self) -> String {
        format!(
            "http://{}:{}/onvif/media_service",
            self.endpoint_ip(),
            self.camera.onvif_port
        )
    }

    /// Externally visible RTSP URI of a stream variant on the relay
    pub fn stream_uri(&self, sub: bool) -> String {
        format!(
            "rtsp://{}:{}/{}",
            self.settings.server_ip,
            self.settings.rtsp_port,
            self.camera.relay_path(sub)
        )
    }

    /// WS-Discovery scope list, including the device-type scope derived
    /// from the camera name
    pub fn scopes(&self) -> String {
        format!(
            "onvif://www.onvif.org/type/video_encoder onvif://www.onvif.org/Profile/Streaming onvif://www.onvif.org/hardware/virtucam onvif://www.onvif.org/name/{}",
            urlencoding::encode(&self.camera.name)
        )
    }
}
