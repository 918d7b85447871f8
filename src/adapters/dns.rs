use std::{io, net::Ipv4Addr};

use async_trait::async_trait;

use crate::ports::dns_resolver::DnsResolver;

/// Resolver using the host's system DNS via `tokio::net::lookup_host`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDnsResolver;

impl SystemDnsResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DnsResolver for SystemDnsResolver {
    async fn lookup_ipv4(&self, host: &str) -> io::Result<Vec<Ipv4Addr>> {
        // Port is required by lookup_host but irrelevant to the answer
        let addrs = tokio::net::lookup_host((host, 0)).await?;
        Ok(addrs
            .filter_map(|addr| match addr.ip() {
                std::net::IpAddr::V4(v4) => Some(v4),
                std::net::IpAddr::V6(_) => None,
            })
            .collect())
    }
}
