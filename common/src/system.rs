//! OS side effects that sit outside the ARP engine.

#[cfg(target_os = "linux")]
const IP_FORWARD_PATH: &str = "/proc/sys/net/ipv4/ip_forward";

/// Turns on IPv4 forwarding so redirected traffic still reaches its
/// destination. The setting does not survive a reboot.
#[cfg(target_os = "linux")]
pub fn enable_ip_forwarding() -> anyhow::Result<()> {
    use anyhow::Context;

    let current = std::fs::read_to_string(IP_FORWARD_PATH)
        .with_context(|| format!("reading {IP_FORWARD_PATH}"))?;
    if current.trim() == "1" {
        tracing::debug!("IPv4 forwarding already enabled");
        return Ok(());
    }

    std::fs::write(IP_FORWARD_PATH, "1").with_context(|| format!("writing {IP_FORWARD_PATH}"))?;
    tracing::info!("IPv4 forwarding enabled");
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn enable_ip_forwarding() -> anyhow::Result<()> {
    anyhow::bail!("enabling IP forwarding is only supported on Linux");
}
