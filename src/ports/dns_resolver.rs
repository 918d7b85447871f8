use std::{io, net::Ipv4Addr};

use async_trait::async_trait;

/// DnsResolver defines the port for looking up the IPv4 addresses behind a
/// host name. Only used for diagnostics; proxied calls resolve on connect.
#[async_trait]
pub trait DnsResolver: Send + Sync + 'static {
    /// Resolve `host` to its IPv4 addresses (may contain duplicates).
    async fn lookup_ipv4(&self, host: &str) -> io::Result<Vec<Ipv4Addr>>;
}
