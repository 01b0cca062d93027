//! DHCP client strategies for virtual interfaces
//!
//! Three clients are tried in order of how little they disturb host
//! routing. Every client run is bounded by a hard timeout so a dead
//! DHCP server can never wedge camera startup.

use std::time::Duration;

use tokio::process::Command;

/// Upper bound on a single client invocation, including its own retries
const CLIENT_TIMEOUT: Duration = Duration::from_secs(20);

/// One DHCP client with the flags that keep it from touching host routing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DhcpStrategy {
    /// busybox udhcpc, lease restricted to address and subnet options
    Udhcpc,
    /// dhcpcd in one-shot mode with gateway installation disabled
    Dhcpcd,
    /// ISC dhclient as the last resort, default route removed afterwards
    Dhclient,
}

/// Preference order, least invasive first
pub(super) const STRATEGIES: [DhcpStrategy; 3] = [
    DhcpStrategy::Udhcpc,
    DhcpStrategy::Dhcpcd,
    DhcpStrategy::Dhclient,
];

impl DhcpStrategy {
    pub(super) fn command(&self, interface: &str) -> (&'static str, Vec<String>) {
        match self {
            DhcpStrategy::Udhcpc => (
                "udhcpc",
                vec![
                    "-i".into(),
                    interface.into(),
                    "-q".into(),
                    "-n".into(),
                    "-t".into(),
                    "4".into(),
                    "-T".into(),
                    "3".into(),
                    "-O".into(),
                    "subnet".into(),
                ],
            ),
            DhcpStrategy::Dhcpcd => (
                "dhcpcd",
                vec![
                    "-1".into(),
                    "--nogateway".into(),
                    "--noipv6".into(),
                    "-t".into(),
                    "10".into(),
                    interface.into(),
                ],
            ),
            DhcpStrategy::Dhclient => (
                "dhclient",
                vec!["-1".into(), interface.into()],
            ),
        }
    }

    pub(super) fn name(&self) -> &'static str {
        match self {
            DhcpStrategy::Udhcpc => "udhcpc",
            DhcpStrategy::Dhcpcd => "dhcpcd",
            DhcpStrategy::Dhclient => "dhclient",
        }
    }
}

/// Run the strategy chain until one client exits successfully.
///
/// A missing client binary is treated the same as a failed lease and the
/// chain moves on. Returns whether any client reported success; the caller
/// still verifies an address actually landed on the interface.
pub(super) async fn run_client_chain(interface: &str) -> bool {
    let commands: Vec<(String, Vec<String>, &'static str)> = STRATEGIES
        .iter()
        .map(|s| {
            let (program, args) = s.command(interface);
            (program.to_string(), args, s.name())
        })
        .collect();
    run_chain(interface, &commands, CLIENT_TIMEOUT).await
}

async fn run_chain(
    interface: &str,
    commands: &[(String, Vec<String>, &'static str)],
    timeout: Duration,
) -> bool {
    for (program, args, name) in commands {
        tracing::debug!(interface = %interface, client = name, "Trying DHCP client");
        let child = Command::new(program).args(args).kill_on_drop(true).output();
        match tokio::time::timeout(timeout, child).await {
            Ok(Ok(output)) if output.status.success() => {
                tracing::info!(interface = %interface, client = name, "DHCP lease obtained");
                return true;
            }
            Ok(Ok(output)) => {
                tracing::debug!(
                    interface = %interface,
                    client = name,
                    status = %output.status,
                    "DHCP client failed, trying next"
                );
            }
            Ok(Err(e)) => {
                tracing::debug!(
                    interface = %interface,
                    client = name,
                    error = %e,
                    "DHCP client not runnable, trying next"
                );
            }
            Err(_) => {
                tracing::warn!(
                    interface = %interface,
                    client = name,
                    "DHCP client timed out, trying next"
                );
            }
        }
    }
    false
}
