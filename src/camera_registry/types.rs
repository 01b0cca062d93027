//! CameraRegistry Type Definitions

use crate::config_store::{IpMode, StreamVariant};
use serde::{Deserialize, Serialize};

/// Camera creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCameraRequest {
    pub name: String,
    pub host: String,
    #[serde(default = "default_rtsp_source_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub path_main: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_sub: Option<String>,

    /// Explicit ONVIF control port; auto-assigned from the base when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onvif_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onvif_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onvif_password: Option<String>,

    /// Explicit MAC; a locally-administered one is generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<StreamVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<StreamVariant>,

    #[serde(default)]
    pub virtual_interface: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_interface: Option<String>,
    #[serde(default)]
    pub ip_mode: IpMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_mask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_gateway: Option<String>,

    #[serde(default)]
    pub autostart: bool,
}

fn default_rtsp_source_port() -> u16 {
    554
}

/// Camera update request (partial). The derived path name is never updated:
/// it stays stable for the camera's lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCameraRequest {
    pub name: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub path_main: Option<String>,
    pub path_sub: Option<String>,
    pub onvif_port: Option<u16>,
    pub onvif_username: Option<String>,
    pub onvif_password: Option<String>,
    pub mac: Option<String>,
    pub main: Option<StreamVariant>,
    pub sub: Option<StreamVariant>,
    pub virtual_interface: Option<bool>,
    pub parent_interface: Option<String>,
    pub ip_mode: Option<IpMode>,
    pub static_ip: Option<String>,
    pub static_mask: Option<String>,
    pub static_gateway: Option<String>,
    pub autostart: Option<bool>,
}

/// Global settings update request (partial)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub server_ip: Option<String>,
    pub rtsp_port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub auth_enabled: Option<bool>,
}
