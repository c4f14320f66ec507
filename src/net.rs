//! LAN address discovery for the operator banner.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};

use crate::config::{FALLBACK_HOST, ROUTE_LOOKUP_ADDR};

/// Best-effort address other devices on the LAN can use to reach this host.
///
/// Falls back to `"localhost"` when there is no outbound route. Display only;
/// the listener always binds the configured address.
pub fn local_ip() -> String {
    host_for_route(ROUTE_LOOKUP_ADDR)
}

fn host_for_route(target: &str) -> String {
    target
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .and_then(discover_local_ip)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| FALLBACK_HOST.to_string())
}

/// Ask the OS which local address it would use to reach `target`.
///
/// Connecting a UDP socket only selects a route; nothing is sent.
pub fn discover_local_ip(target: SocketAddr) -> Option<IpAddr> {
    let bind_addr = if target.is_ipv4() {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
    } else {
        SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
    };

    let socket = match UdpSocket::bind(bind_addr) {
        Ok(socket) => socket,
        Err(e) => {
            tracing::debug!(error = %e, "Could not bind route lookup socket");
            return None;
        }
    };

    if let Err(e) = socket.connect(target) {
        tracing::debug!(error = %e, addr = %target, "No route for LAN address discovery");
        return None;
    }

    let ip = socket.local_addr().ok()?.ip();
    if ip.is_unspecified() {
        None
    } else {
        Some(ip)
    }
}
