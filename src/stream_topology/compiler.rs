//! Relay configuration compiler
//!
//! Turns the full camera and layout state into one deterministic relay
//! document. Compilation is pure: the same inputs always produce the
//! same YAML, so every registry mutation can regenerate the whole
//! topology instead of patching it incrementally.

use std::collections::BTreeMap;

use crate::config_store::{
    Camera, CameraStatus, GridFusionLayout, Settings, INTERNAL_RELAY_USER,
};

use super::ffmpeg;
use super::types::{RelayPath, RelayPermission, RelayTopology, RelayUser};

/// Compile the complete relay topology from current state.
///
/// Only running cameras contribute paths. Each camera yields one path per
/// stream variant: a direct proxy when the variant is untouched, or a
/// publisher path driven by a re-encode pipeline when transcoding is on.
/// Enabled layouts with at least one running source yield a composite path.
pub fn compile(
    cameras: &[Camera],
    layouts: &[GridFusionLayout],
    settings: &Settings,
) -> RelayTopology {
    let mut paths: BTreeMap<String, RelayPath> = BTreeMap::new();

    for camera in cameras.iter().filter(|c| c.status == CameraStatus::Running) {
        insert_variant(&mut paths, camera, false, settings);
        insert_variant(&mut paths, camera, true, settings);
    }

    for layout in layouts.iter().filter(|l| l.enabled) {
        if let Some(cmd) = ffmpeg::grid_fusion_command(layout, cameras, settings) {
            paths.insert(
                layout.id.clone(),
                RelayPath {
                    source: None,
                    rtsp_transport: None,
                    source_on_demand: None,
                    run_on_init: Some(cmd),
                    run_on_init_restart: Some(true),
                },
            );
        }
    }

    RelayTopology {
        rtsp_address: format!(":{}", settings.rtsp_port),
        rtp_address: ":8000".to_string(),
        rtcp_address: ":8001".to_string(),
        hls_address: ":8888".to_string(),
        webrtc_address: ":8889".to_string(),
        auth_internal_users: access_control(settings),
        paths,
    }
}

fn insert_variant(
    paths: &mut BTreeMap<String, RelayPath>,
    camera: &Camera,
    sub: bool,
    settings: &Settings,
) {
    let variant = if sub { &camera.sub } else { &camera.main };
    let path = if variant.transcode {
        RelayPath {
            source: None,
            rtsp_transport: None,
            source_on_demand: None,
            run_on_init: Some(ffmpeg::transcode_command(camera, sub, settings)),
            run_on_init_restart: Some(true),
        }
    } else {
        RelayPath {
            source: Some(camera.source_url(sub)),
            rtsp_transport: Some("tcp".to_string()),
            source_on_demand: Some(false),
            run_on_init: None,
            run_on_init_restart: None,
        }
    };
    paths.insert(camera.relay_path(sub), path);
}

/// Relay-side credential list.
///
/// When global authentication is on, the internal system user may publish
/// and administer any path while the external viewer account is read-only.
/// With authentication off the relay runs open and no user list is emitted.
fn access_control(settings: &Settings) -> Option<Vec<RelayUser>> {
    let (user, pass) = settings.external_credentials()?;
    Some(vec![
        RelayUser {
            user: INTERNAL_RELAY_USER.to_string(),
            pass: settings.internal_password.clone(),
            permissions: vec![
                RelayPermission::any_path("publish"),
                RelayPermission::any_path("read"),
                RelayPermission::any_path("admin"),
            ],
        },
        RelayUser {
            user: user.to_string(),
            pass: pass.to_string(),
            permissions: vec![RelayPermission::any_path("read")],
        },
    ])
}
