//! Virtual network interface management
//!
//! ## Responsibilities
//! - Create one macvlan interface per camera on a configured parent NIC
//! - Acquire an address for it via DHCP or static assignment
//! - Keep the host routing table untouched by virtual interfaces
//! - Tear interfaces down on camera stop and clean up stale ones at boot
//!
//! Everything here shells out to `ip` and the DHCP clients, so on
//! non-Linux hosts the manager degrades to a no-op and cameras bind to
//! the wildcard address instead.

mod dhcp;

use std::net::Ipv4Addr;
use std::path::Path;

use tokio::process::Command;

use crate::config_store::IpMode;
use crate::error::{Error, Result};

/// Naming prefix for all interfaces owned by this process
const VIF_PREFIX: &str = "vcam";

/// Manager for per-camera macvlan interfaces
pub struct VirtualInterfaceManager;

impl VirtualInterfaceManager {
    pub fn new() -> Self {
        VirtualInterfaceManager
    }

    /// Deterministic interface name for a camera id
    pub fn interface_name(camera_id: u32) -> String {
        format!("{}{}", VIF_PREFIX, camera_id)
    }

    /// Create a macvlan interface on `parent` with the given name and MAC.
    ///
    /// A leftover interface with the same name is removed first, so the
    /// call is safe to repeat after a crash. The parent is switched to
    /// promiscuous mode because bridge-mode macvlan children do not
    /// receive frames for their own MACs otherwise.
    pub async fn create_virtual_interface(
        &self,
        parent: &str,
        name: &str,
        mac: &str,
    ) -> Result<()> {
        if !cfg!(target_os = "linux") {
            tracing::debug!(interface = %name, "Virtual interfaces unsupported on this platform");
            return Ok(());
        }

        if !Path::new("/sys/class/net").join(parent).exists() {
            return Err(Error::ParentInterfaceNotFound {
                parent: parent.to_string(),
                available: list_host_interfaces().await,
            });
        }

        if Path::new("/sys/class/net").join(name).exists() {
            tracing::warn!(interface = %name, "Removing stale virtual interface");
            let _ = run_ip(&["link", "del", name]).await;
        }

        run_ip(&["link", "set", parent, "promisc", "on"]).await?;
        run_ip(&[
            "link", "add", "link", parent, "name", name, "address", mac, "type", "macvlan",
            "mode", "bridge",
        ])
        .await?;
        run_ip(&["link", "set", name, "up"]).await?;

        // The host answers ARP for all local addresses by default, which
        // makes every virtual camera resolve to the parent's MAC.
        write_sysctl(name, "arp_ignore", "1").await;
        write_sysctl(name, "arp_announce", "2").await;

        tracing::info!(interface = %name, parent = %parent, mac = %mac, "Virtual interface created");
        Ok(())
    }

    /// Obtain an IPv4 address for the interface.
    ///
    /// Address acquisition is best effort: on failure the camera falls
    /// back to the wildcard bind, so this returns `Option` rather than
    /// an error. The host's default route stays authoritative, any
    /// default route a DHCP client leaked onto the interface is removed.
    pub async fn acquire_address(
        &self,
        name: &str,
        mode: IpMode,
        static_ip: Option<&str>,
        static_mask: Option<&str>,
        static_gateway: Option<&str>,
    ) -> Option<Ipv4Addr> {
        if !cfg!(target_os = "linux") {
            return None;
        }

        match mode {
            IpMode::Static => {
                let ip: Ipv4Addr = match static_ip?.parse() {
                    Ok(ip) => ip,
                    Err(_) => {
                        tracing::warn!(interface = %name, "Invalid static address configured");
                        return None;
                    }
                };
                let prefix = static_mask.and_then(mask_to_prefix).unwrap_or(24);
                let cidr = format!("{}/{}", ip, prefix);
                if let Err(e) = run_ip(&["addr", "add", &cidr, "dev", name]).await {
                    tracing::warn!(interface = %name, error = %e, "Static address assignment failed");
                    return None;
                }
                // The gateway is recorded for the operator but never
                // installed, the parent interface keeps the only default
                // route on the host.
                if let Some(gw) = static_gateway {
                    tracing::debug!(interface = %name, gateway = %gw, "Gateway noted, not installed");
                }
                Some(ip)
            }
            IpMode::Dhcp => {
                if !dhcp::run_client_chain(name).await {
                    tracing::warn!(interface = %name, "All DHCP clients failed");
                }
                remove_default_route(name).await;
                let assigned = current_address(name).await;
                match assigned {
                    Some(ip) => {
                        tracing::info!(interface = %name, address = %ip, "Address acquired")
                    }
                    None => tracing::warn!(interface = %name, "No address on interface"),
                }
                assigned
            }
        }
    }

    /// Delete the interface. Tolerates it being already gone.
    pub async fn release_interface(&self, name: &str) {
        if !cfg!(target_os = "linux") {
            return;
        }
        match run_ip(&["link", "del", name]).await {
            Ok(()) => tracing::info!(interface = %name, "Virtual interface removed"),
            Err(e) => tracing::debug!(interface = %name, error = %e, "Interface removal skipped"),
        }
    }

    /// Remove interfaces left behind by a previous unclean shutdown
    pub async fn cleanup_stale_interfaces(&self) {
        if !cfg!(target_os = "linux") {
            return;
        }
        for iface in list_host_interfaces().await {
            if iface.starts_with(VIF_PREFIX) {
                tracing::warn!(interface = %iface, "Cleaning up stale virtual interface");
                let _ = run_ip(&["link", "del", &iface]).await;
            }
        }
    }
}

impl Default for VirtualInterfaceManager {
    fn default() -> Self {
        Self::new()
    }
}

// ========================================
// Helpers
// ========================================

async fn run_ip(args: &[&str]) -> Result<()> {
    let output = Command::new("ip").args(args).output().await?;
    if output.status.success() {
        Ok(())
    } else {
        Err(Error::Internal(format!(
            "ip {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

async fn write_sysctl(interface: &str, key: &str, value: &str) {
    let path = format!("/proc/sys/net/ipv4/conf/{}/{}", interface, key);
    if let Err(e) = tokio::fs::write(&path, value).await {
        tracing::warn!(interface = %interface, sysctl = %key, error = %e, "Sysctl not applied");
    }
}

async fn list_host_interfaces() -> Vec<String> {
    let mut names = Vec::new();
    if let Ok(mut dir) = tokio::fs::read_dir("/sys/class/net").await {
        while let Ok(Some(entry)) = dir.next_entry().await {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    names
}

async fn remove_default_route(interface: &str) {
    let _ = run_ip(&["route", "del", "default", "dev", interface]).await;
}

async fn current_address(interface: &str) -> Option<Ipv4Addr> {
    let output = Command::new("ip")
        .args(["-4", "-o", "addr", "show", "dev", interface])
        .output()
        .await
        .ok()?;
    parse_address_listing(&String::from_utf8_lossy(&output.stdout))
}

/// Extract the first IPv4 address from `ip -4 -o addr show` output
fn parse_address_listing(output: &str) -> Option<Ipv4Addr> {
    for line in output.lines() {
        let mut tokens = line.split_whitespace();
        while let Some(token) = tokens.next() {
            if token == "inet" {
                let cidr = tokens.next()?;
                let addr = cidr.split('/').next()?;
                if let Ok(ip) = addr.parse() {
                    return Some(ip);
                }
            }
        }
    }
    None
}

/// Convert a dotted-quad netmask to a prefix length
fn mask_to_prefix(mask: &str) -> Option<u8> {
    let mask: Ipv4Addr = mask.parse().ok()?;
    let bits = u32::from(mask);
    // Valid masks are a run of ones followed by zeros
    let prefix = bits.count_ones() as u8;
    let expected = if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - prefix)
    };
    if bits == expected {
        Some(prefix)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_names_carry_the_camera_id() {
        assert_eq!(VirtualInterfaceManager::interface_name(7), "vcam7");
        assert_eq!(VirtualInterfaceManager::interface_name(120), "vcam120");
    }

    #[test]
    fn parses_the_first_inet_entry() {
        let out = "5: vcam3    inet 192.168.1.71/24 brd 192.168.1.255 scope global dynamic vcam3\\       valid_lft 85917sec preferred_lft 85917sec\n";
        assert_eq!(
            parse_address_listing(out),
            Some(Ipv4Addr::new(192, 168, 1, 71))
        );
    }

    #[test]
    fn empty_listing_yields_no_address() {
        assert_eq!(parse_address_listing(""), None);
        assert_eq!(parse_address_listing("3: vcam1 <BROADCAST>\n"), None);
    }

    #[test]
    fn contiguous_masks_convert_to_prefix_lengths() {
        assert_eq!(mask_to_prefix("255.255.255.0"), Some(24));
        assert_eq!(mask_to_prefix("255.255.0.0"), Some(16));
        assert_eq!(mask_to_prefix("255.255.255.252"), Some(30));
    }

    #[test]
    fn broken_masks_are_rejected() {
        assert_eq!(mask_to_prefix("255.0.255.0"), None);
        assert_eq!(mask_to_prefix("garbage"), None);
    }
}
