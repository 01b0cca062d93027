//! RelayTopology Type Definitions
//!
//! The compiled, ephemeral artifact consumed by the external relay
//! process. Serialized as the relay's declarative YAML configuration.
//! Paths live in a `BTreeMap` so identical inputs always serialize to
//! byte-identical output.

use serde::Serialize;
use std::collections::BTreeMap;

/// One relay stream path: either a direct proxy of the upstream source or
/// a publisher path fed by a generated transcoder pipeline
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RelayPath {
    /// Upstream URL for proxy paths; omitted on publisher paths, which
    /// are fed by their own transcoder pipeline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Forced to `tcp` on proxy paths for multi-viewer stability
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtsp_transport: Option<String>,
    /// Disabled on proxy paths so the relay holds the upstream open
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_on_demand: Option<bool>,
    /// Generated transcoder command line feeding a publisher path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_on_init: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_on_init_restart: Option<bool>,
}

/// One action grant; an absent path means every path
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RelayPermission {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl RelayPermission {
    pub fn any_path(action: &str) -> Self {
        Self {
            action: action.to_string(),
            path: None,
        }
    }
}

/// One credential pair in the relay's access-control table
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RelayUser {
    pub user: String,
    pub pass: String,
    pub permissions: Vec<RelayPermission>,
}

/// The full compiled relay configuration
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RelayTopology {
    pub rtsp_address: String,
    pub rtp_address: String,
    pub rtcp_address: String,
    pub hls_address: String,
    pub webrtc_address: String,
    /// Access-control table; absent means all paths are open
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_internal_users: Option<Vec<RelayUser>>,
    pub paths: BTreeMap<String, RelayPath>,
}

impl RelayTopology {
    /// Serialize to the relay's YAML configuration format
    pub fn to_yaml(&self) -> crate::error::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
