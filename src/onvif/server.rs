//! Per-camera control endpoint
//!
//! A small axum router bound to the camera's unique port, serving the
//! device channel and both media-channel variants. GET returns a minimal
//! service descriptor; POST dispatches by body content. The server shuts
//! down gracefully when the camera's stop signal fires.

use super::types::{DeviceMethod, MediaMethod};
use super::{auth, device_service, media_service, EmulatorContext};
use crate::config_store::{Camera, Settings};
use crate::error::Result;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Spawn the control endpoint for a running camera.
///
/// The listener is bound before the task is spawned, so an occupied port
/// surfaces as an error to the caller instead of a dead endpoint.
pub async fn spawn(
    camera: Camera,
    settings: Settings,
    stop_rx: watch::Receiver<bool>,
) -> Result<JoinHandle<()>> {
    let bind_ip: IpAddr = match camera.assigned_ip {
        Some(ip) => IpAddr::V4(ip),
        None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
    };
    let addr = SocketAddr::new(bind_ip, camera.onvif_port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let ctx = Arc::new(EmulatorContext::new(camera, settings));
    let app = Router::new()
        .route("/", get(descriptor).post(device_channel))
        .route("/onvif/device_service", get(descriptor).post(device_channel))
        .route("/onvif/media_service", get(descriptor).post(media_channel_open))
        .route(
            "/onvif/media_service2",
            get(descriptor).post(media_channel_authenticated),
        )
        .with_state(ctx.clone());

    tracing::info!(
        camera_id = ctx.camera.id,
        addr = %addr,
        "Control endpoint listening"
    );

    Ok(tokio::spawn(async move {
        let camera_id = ctx.camera.id;
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_stop(stop_rx))
            .await
        {
            tracing::error!(camera_id, error = %e, "Control endpoint failed");
        }
        tracing::info!(camera_id, "Control endpoint stopped");
    }))
}

async fn wait_for_stop(mut stop_rx: watch::Receiver<bool>) {
    while !*stop_rx.borrow() {
        if stop_rx.changed().await.is_err() {
            return;
        }
    }
}

fn xml_response(body: String) -> Response {
    (
        [(header::CONTENT_TYPE, "application/soap+xml; charset=utf-8")],
        body,
    )
        .into_response()
}

/// Minimal service descriptor for GET probes
async fn descriptor(State(ctx): State<Arc<EmulatorContext>>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml; charset=utf-8")],
        format!(
            "<Device name=\"{}\" xaddr=\"{}\"/>",
            super::xml::xml_escape(&ctx.camera.name),
            ctx.device_service_url()
        ),
    )
        .into_response()
}

/// Device channel: no authentication, every recorder probes it freely
async fn device_channel(State(ctx): State<Arc<EmulatorContext>>, body: String) -> Response {
    let method = DeviceMethod::classify(&body);
    tracing::debug!(camera_id = ctx.camera.id, ?method, "Device request");
    xml_response(device_service::respond(&ctx, method))
}

/// Media channel, unauthenticated variant: tolerant of any credentials,
/// used by many recorders' auto-discovery probes
async fn media_channel_open(State(ctx): State<Arc<EmulatorContext>>, body: String) -> Response {
    let method = MediaMethod::classify(&body);
    tracing::debug!(camera_id = ctx.camera.id, ?method, "Media request (open)");
    xml_response(media_service::respond(&ctx, method, &body))
}

/// Media channel, authenticated variant
async fn media_channel_authenticated(
    State(ctx): State<Arc<EmulatorContext>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if !auth::is_authorized(&headers, &body, &ctx.camera) {
        tracing::debug!(camera_id = ctx.camera.id, "Media request rejected, challenging");
        return auth::challenge();
    }
    let method = MediaMethod::classify(&body);
    tracing::debug!(camera_id = ctx.camera.id, ?method, "Media request (authenticated)");
    xml_response(media_service::respond(&ctx, method, &body))
}
