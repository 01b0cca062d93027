//! WS-Discovery responder
//!
//! Joins the well-known discovery multicast group and answers every
//! inbound probe with a unicast ProbeMatches naming this camera's device
//! service. The receive uses a bounded timeout so the camera's stop flag
//! is polled rather than blocked on forever.

use super::xml::{extract_xml_value, xml_escape};
use super::EmulatorContext;
use crate::config_store::{Camera, Settings};
use crate::error::Result;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// WS-Discovery multicast group
pub const DISCOVERY_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);
/// WS-Discovery port
pub const DISCOVERY_PORT: u16 = 3702;

/// Poll interval for the stop flag while waiting for probes
const RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// Spawn the discovery responder for a running camera
pub fn spawn(
    camera: Camera,
    settings: Settings,
    stop_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let camera_id = camera.id;
        let ctx = EmulatorContext::new(camera, settings);
        if let Err(e) = responder_loop(ctx, stop_rx).await {
            tracing::error!(camera_id, error = %e, "Discovery responder failed");
        }
    })
}

async fn responder_loop(ctx: EmulatorContext, stop_rx: watch::Receiver<bool>) -> Result<()> {
    let socket = bind_discovery_socket()?;
    tracing::info!(
        camera_id = ctx.camera.id,
        group = %DISCOVERY_GROUP,
        "Discovery responder listening"
    );

    let mut buf = vec![0u8; 8192];
    loop {
        if *stop_rx.borrow() {
            break;
        }
        match tokio::time::timeout(RECV_TIMEOUT, socket.recv_from(&mut buf)).await {
            Ok(Ok((len, src))) => {
                let payload = String::from_utf8_lossy(&buf[..len]);
                if let Some(relates_to) = parse_probe(&payload) {
                    let reply = build_probe_match(&ctx, &relates_to);
                    if let Err(e) = socket.send_to(reply.as_bytes(), src).await {
                        tracing::warn!(
                            camera_id = ctx.camera.id,
                            peer = %src,
                            error = %e,
                            "Failed to send probe match"
                        );
                    } else {
                        tracing::debug!(
                            camera_id = ctx.camera.id,
                            peer = %src,
                            relates_to = %relates_to,
                            "Probe answered"
                        );
                    }
                }
                // Unmatched multicast traffic is ignored
            }
            Ok(Err(e)) => {
                tracing::warn!(camera_id = ctx.camera.id, error = %e, "Discovery receive error");
            }
            // Timeout: loop around and re-check the stop flag
            Err(_) => {}
        }
    }

    tracing::info!(camera_id = ctx.camera.id, "Discovery responder stopped");
    Ok(())
}

/// Bind 0.0.0.0:3702 with address reuse (every running camera shares the
/// port) and join the discovery group.
fn bind_discovery_socket() -> Result<UdpSocket> {
    use socket2::{Domain, Protocol, Socket, Type};

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nonblocking(true)?;
    let addr: SocketAddr = (Ipv4Addr::UNSPECIFIED, DISCOVERY_PORT).into();
    socket.bind(&addr.into())?;

    let std_socket: std::net::UdpSocket = socket.into();
    let socket = UdpSocket::from_std(std_socket)?;
    socket.join_multicast_v4(DISCOVERY_GROUP, Ipv4Addr::UNSPECIFIED)?;
    Ok(socket)
}

/// Recognize a WS-Discovery probe and pull out its correlation id.
/// Returns `None` for anything else (matches, resolves, unrelated chatter).
pub fn parse_probe(payload: &str) -> Option<String> {
    if !payload.contains("Probe") || payload.contains("ProbeMatch") {
        return None;
    }
    extract_xml_value(payload, "MessageID")
}

/// Build the ProbeMatches envelope, echoing the probe's correlation id in
/// RelatesTo and advertising this camera's device-service XAddr.
pub fn build_probe_match(ctx: &EmulatorContext, relates_to: &str) -> String {
    let message_id = format!("urn:uuid:{}", uuid::Uuid::new_v4());
    let endpoint_uuid = format!("urn:uuid:{}", device_uuid(&ctx.camera));
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:a="http://schemas.xmlsoap.org/ws/2004/08/addressing" xmlns:d="http://schemas.xmlsoap.org/ws/2005/04/discovery" xmlns:dn="http://www.onvif.org/ver10/network/wsdl">
  <s:Header>
    <a:MessageID>{message_id}</a:MessageID>
    <a:RelatesTo>{relates_to}</a:RelatesTo>
    <a:To>http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous</a:To>
    <a:Action>http://schemas.xmlsoap.org/ws/2005/04/discovery/ProbeMatches</a:Action>
  </s:Header>
  <s:Body>
    <d:ProbeMatches>
      <d:ProbeMatch>
        <a:EndpointReference><a:Address>{endpoint_uuid}</a:Address></a:EndpointReference>
        <d:Types>dn:NetworkVideoTransmitter</d:Types>
        <d:Scopes>{scopes}</d:Scopes>
        <d:XAddrs>{xaddrs}</d:XAddrs>
        <d:MetadataVersion>1</d:MetadataVersion>
      </d:ProbeMatch>
    </d:ProbeMatches>
  </s:Body>
</s:Envelope>"#,
        message_id = message_id,
        relates_to = xml_escape(relates_to),
        endpoint_uuid = endpoint_uuid,
        scopes = ctx.scopes(),
        xaddrs = ctx.discovery_url(),
    )
}

/// Stable per-device endpoint id derived from the MAC, so recorders see
/// the same endpoint across restarts
fn device_uuid(camera: &Camera) -> String {
    let serial = camera.serial_number().to_lowercase();
    let serial = format!("{:0>12}", serial);
    format!("2419d68a-2dd2-21b2-a205-{}", &serial[..12])
}
