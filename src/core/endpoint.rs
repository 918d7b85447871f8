//! Front-end tier selection and outbound target construction.
//!
//! Tiers are consulted in a fixed order on every request:
//!
//! 1. Application load balancer: one hostname, path-based routing per service
//! 2. VPC endpoint (PrivateLink): one hostname, per-service listener ports
//! 3. Network load balancer: each record's own `nlbDnsName` and listener port
//!
//! A tier whose key is missing, empty or unreadable is simply absent. All port
//! and path rules per tier live in [`ResolvedTarget::for_service`].
use std::{fmt, sync::Arc};

use serde::Serialize;

use crate::{
    config::models::FrontEndKeys,
    core::{
        error::GatewayResult,
        service_registry::{ServiceRecord, ServiceRegistry},
    },
    ports::config_store::ConfigStore,
};

/// The tier chosen to carry traffic for one resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tier", content = "dnsName", rename_all = "snake_case")]
pub enum FrontEndChoice {
    ApplicationLoadBalancer(String),
    VpcEndpoint(String),
    /// Fall back to the per-service NLB declared in each record
    NetworkLoadBalancer,
}

impl FrontEndChoice {
    /// Apply the priority chain to already-read tier addresses.
    pub fn from_tiers(alb_dns: Option<String>, vpc_endpoint_dns: Option<String>) -> Self {
        match (alb_dns, vpc_endpoint_dns) {
            (Some(dns), _) => FrontEndChoice::ApplicationLoadBalancer(dns),
            (None, Some(dns)) => FrontEndChoice::VpcEndpoint(dns),
            (None, None) => FrontEndChoice::NetworkLoadBalancer,
        }
    }

    pub fn tier_name(&self) -> &'static str {
        match self {
            FrontEndChoice::ApplicationLoadBalancer(_) => "application_load_balancer",
            FrontEndChoice::VpcEndpoint(_) => "vpc_endpoint",
            FrontEndChoice::NetworkLoadBalancer => "network_load_balancer",
        }
    }
}

impl fmt::Display for FrontEndChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrontEndChoice::ApplicationLoadBalancer(dns) | FrontEndChoice::VpcEndpoint(dns) => {
                write!(f, "{} ({dns})", self.tier_name())
            }
            FrontEndChoice::NetworkLoadBalancer => write!(f, "{}", self.tier_name()),
        }
    }
}

/// Reads tier addresses from the parameter store and applies the priority chain.
pub struct EndpointResolver {
    store: Arc<dyn ConfigStore>,
    keys: FrontEndKeys,
}

impl EndpointResolver {
    pub fn new(store: Arc<dyn ConfigStore>, keys: FrontEndKeys) -> Self {
        Self { store, keys }
    }

    pub fn keys(&self) -> &FrontEndKeys {
        &self.keys
    }

    /// Read a tier's DNS name. Missing, blank or unreadable keys are `None`.
    pub async fn tier_dns(&self, key: &str) -> Option<String> {
        match self.store.get_parameter(key).await {
            Ok(Some(parameter)) => {
                let value = parameter.value.trim();
                (!value.is_empty()).then(|| value.to_string())
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key = %key, "Front-end lookup failed, treating tier as absent: {}", e);
                None
            }
        }
    }

    pub async fn alb_dns(&self) -> Option<String> {
        self.tier_dns(&self.keys.alb_dns_key).await
    }

    pub async fn vpc_endpoint_dns(&self) -> Option<String> {
        self.tier_dns(&self.keys.vpc_endpoint_dns_key).await
    }

    pub async fn shared_nlb_dns(&self) -> Option<String> {
        self.tier_dns(&self.keys.nlb_dns_key).await
    }

    /// First present tier wins. Exactly one variant is always returned.
    pub async fn resolve_front_end(&self) -> FrontEndChoice {
        let choice = match self.alb_dns().await {
            Some(dns) => FrontEndChoice::ApplicationLoadBalancer(dns),
            None => FrontEndChoice::from_tiers(None, self.vpc_endpoint_dns().await),
        };

        tracing::debug!(front_end = %choice, "Resolved front-end tier");
        choice
    }
}

/// Base URL for one proxied request; the request path is appended to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    base_url: String,
}

impl ResolvedTarget {
    /// Port/path mapping per tier:
    ///
    /// | tier | host | port | path prefix |
    /// |------|------|------|-------------|
    /// | ALB  | ALB DNS | listener default | `/{alb_path_prefix}` |
    /// | VPC endpoint | endpoint DNS | `listenerPort` | none |
    /// | NLB  | record `nlbDnsName` | `listenerPort` | none |
    ///
    /// `targetPort` is the container port behind the listener and is never
    /// addressed directly.
    ///
    /// The ALB prefix comes from the record's `pathRule` when it has one, so
    /// it can differ from `serviceName`; only records without a rule fall
    /// back to `/{serviceName}`.
    pub fn for_service(choice: &FrontEndChoice, record: &ServiceRecord) -> Self {
        let base_url = match choice {
            FrontEndChoice::ApplicationLoadBalancer(dns) => {
                format!("http://{dns}/{}", record.alb_path_prefix())
            }
            FrontEndChoice::VpcEndpoint(dns) => {
                format!("http://{dns}:{}", record.listener_port)
            }
            FrontEndChoice::NetworkLoadBalancer => {
                format!("http://{}:{}", record.nlb_dns_name, record.listener_port)
            }
        };
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join `path` (with or without leading slash) and an optional raw query.
    pub fn url_for(&self, path: &str, query: Option<&str>) -> String {
        let mut url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

impl fmt::Display for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url)
    }
}

/// Service lookup followed by tier resolution; shared by the proxy router and
/// the docs aggregator so both address a service identically.
pub struct TargetLocator {
    registry: Arc<ServiceRegistry>,
    endpoints: Arc<EndpointResolver>,
}

impl TargetLocator {
    pub fn new(registry: Arc<ServiceRegistry>, endpoints: Arc<EndpointResolver>) -> Self {
        Self {
            registry,
            endpoints,
        }
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    pub fn endpoints(&self) -> &Arc<EndpointResolver> {
        &self.endpoints
    }

    /// Find `service_name` in a fresh listing, then pick the front-end tier.
    pub async fn locate(
        &self,
        service_name: &str,
    ) -> GatewayResult<(ServiceRecord, FrontEndChoice, ResolvedTarget)> {
        let record = self.registry.find_service(service_name).await?;
        let choice = self.endpoints.resolve_front_end().await;
        let target = ResolvedTarget::for_service(&choice, &record);
        Ok((record, choice, target))
    }
}
