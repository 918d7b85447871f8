//! Diagnostic DNS resolution.
//!
//! Addresses shown on the dashboard are informational only. Any failure
//! collapses into [`AddressSet::Unavailable`] so that a broken resolver never
//! takes the dashboard down; proxied calls resolve names on their own when
//! they connect.
use std::{collections::BTreeSet, fmt, net::Ipv4Addr, sync::Arc, time::Duration};

use serde::{Serialize, Serializer};

use crate::ports::dns_resolver::DnsResolver;

/// Outcome of a diagnostic lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressSet {
    /// Distinct IPv4 addresses, sorted
    Resolved(BTreeSet<Ipv4Addr>),
    /// Name absent, empty, unresolvable or without IPv4 records
    Unavailable,
}

impl AddressSet {
    pub fn is_available(&self) -> bool {
        matches!(self, AddressSet::Resolved(_))
    }
}

impl fmt::Display for AddressSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressSet::Resolved(addrs) => {
                let joined = addrs
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{joined}")
            }
            AddressSet::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Serialised as a list of addresses or the string `"unavailable"`.
impl Serialize for AddressSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AddressSet::Resolved(addrs) => serializer.collect_seq(addrs),
            AddressSet::Unavailable => serializer.serialize_str("unavailable"),
        }
    }
}

/// Upper bound for one diagnostic lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Stateless diagnostic resolver over a [`DnsResolver`] port.
#[derive(Clone)]
pub struct DnsLookup {
    resolver: Arc<dyn DnsResolver>,
    lookup_timeout: Duration,
}

impl DnsLookup {
    pub fn new(resolver: Arc<dyn DnsResolver>) -> Self {
        Self {
            resolver,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, lookup_timeout: Duration) -> Self {
        self.lookup_timeout = lookup_timeout;
        self
    }

    /// Resolve `dns_name` for display. Never fails.
    pub async fn resolve(&self, dns_name: Option<&str>) -> AddressSet {
        let Some(name) = dns_name.map(str::trim).filter(|n| !n.is_empty()) else {
            return AddressSet::Unavailable;
        };

        let lookup = tokio::time::timeout(self.lookup_timeout, self.resolver.lookup_ipv4(name));
        match lookup.await {
            Err(_) => {
                tracing::debug!(dns_name = %name, "Diagnostic DNS lookup timed out");
                AddressSet::Unavailable
            }
            Ok(Ok(addrs)) if !addrs.is_empty() => {
                AddressSet::Resolved(addrs.into_iter().collect())
            }
            Ok(Ok(_)) => {
                tracing::debug!(dns_name = %name, "No IPv4 records");
                AddressSet::Unavailable
            }
            Ok(Err(e)) => {
                tracing::debug!(dns_name = %name, error = %e, "Diagnostic DNS lookup failed");
                AddressSet::Unavailable
            }
        }
    }
}
