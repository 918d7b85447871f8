//! Data behind the gateway's landing page.
//!
//! Everything here is diagnostic. Only the service listing can fail the
//! overview; DNS and on-prem lookups degrade to sentinels.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinSet;

use crate::{
    config::models::OnPremEndpoint,
    core::{
        dns::{AddressSet, DnsLookup},
        endpoint::{EndpointResolver, FrontEndChoice},
        error::GatewayResult,
        service_registry::{ServiceRecord, ServiceRegistry},
    },
};

/// Shown for on-prem endpoints whose key is missing, blank or unreadable.
pub const NOT_CONFIGURED: &str = "Not configured";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub generated_at: DateTime<Utc>,
    pub active_front_end: FrontEndChoice,
    pub front_ends: Vec<FrontEndTier>,
    pub services: Vec<ServiceSummary>,
    pub onprem: Vec<OnPremStatus>,
    pub connection: ConnectionHints,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontEndTier {
    pub tier: &'static str,
    pub key: String,
    pub dns_name: Option<String>,
    pub addresses: AddressSet,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    #[serde(flatten)]
    pub record: ServiceRecord,
    pub nlb_addresses: AddressSet,
    pub docs_url: String,
    pub redoc_url: String,
    pub openapi_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OnPremStatus {
    pub name: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionHints {
    pub api_pattern: String,
    pub example: String,
}

pub struct Dashboard {
    registry: Arc<ServiceRegistry>,
    endpoints: Arc<EndpointResolver>,
    dns: DnsLookup,
    onprem: Vec<OnPremEndpoint>,
}

impl Dashboard {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        endpoints: Arc<EndpointResolver>,
        dns: DnsLookup,
        onprem: Vec<OnPremEndpoint>,
    ) -> Self {
        Self {
            registry,
            endpoints,
            dns,
            onprem,
        }
    }

    pub async fn overview(&self) -> GatewayResult<DashboardOverview> {
        let records = self.registry.list_services().await?;
        let addresses = self.resolve_nlb_addresses(&records).await;

        let mut services = Vec::with_capacity(records.len());
        for (record, nlb_addresses) in records.into_iter().zip(addresses) {
            services.push(ServiceSummary {
                docs_url: format!("/docs/{}", record.name),
                redoc_url: format!("/redoc/{}", record.name),
                openapi_url: format!("/openapi/{}.json", record.name),
                nlb_addresses,
                record,
            });
        }

        let keys = self.endpoints.keys();
        let alb = self.endpoints.alb_dns().await;
        let vpc = self.endpoints.vpc_endpoint_dns().await;
        let nlb = self.endpoints.shared_nlb_dns().await;

        let front_ends = vec![
            self.tier("application_load_balancer", &keys.alb_dns_key, alb.clone())
                .await,
            self.tier("vpc_endpoint", &keys.vpc_endpoint_dns_key, vpc.clone())
                .await,
            self.tier("network_load_balancer", &keys.nlb_dns_key, nlb).await,
        ];
        let active_front_end = FrontEndChoice::from_tiers(alb, vpc);

        let mut onprem = Vec::with_capacity(self.onprem.len());
        for endpoint in &self.onprem {
            onprem.push(OnPremStatus {
                name: endpoint.name.clone(),
                endpoint: self.onprem_endpoint(&endpoint.key).await,
            });
        }

        let example_service = services
            .first()
            .map_or("gets3data-service", |s| s.record.name.as_str());
        let connection = ConnectionHints {
            api_pattern: "/api/{service}/{path}".to_string(),
            example: format!("/api/{example_service}/health"),
        };

        Ok(DashboardOverview {
            generated_at: Utc::now(),
            active_front_end,
            front_ends,
            services,
            onprem,
            connection,
        })
    }

    /// Per-service lookups run concurrently, each bounded by the lookup timeout.
    async fn resolve_nlb_addresses(&self, records: &[ServiceRecord]) -> Vec<AddressSet> {
        let mut lookups = JoinSet::new();
        for (index, record) in records.iter().enumerate() {
            let dns = self.dns.clone();
            let dns_name = record.nlb_dns_name.clone();
            lookups.spawn(async move { (index, dns.resolve(Some(&dns_name)).await) });
        }

        let mut addresses = vec![AddressSet::Unavailable; records.len()];
        while let Some(joined) = lookups.join_next().await {
            match joined {
                Ok((index, resolved)) => addresses[index] = resolved,
                Err(e) => tracing::warn!("Diagnostic DNS lookup task failed: {}", e),
            }
        }
        addresses
    }

    async fn tier(&self, tier: &'static str, key: &str, dns_name: Option<String>) -> FrontEndTier {
        let addresses = self.dns.resolve(dns_name.as_deref()).await;
        FrontEndTier {
            tier,
            key: key.to_string(),
            dns_name,
            addresses,
        }
    }

    async fn onprem_endpoint(&self, key: &str) -> String {
        match self.registry.store().get_parameter(key).await {
            Ok(Some(parameter)) if !parameter.value.trim().is_empty() => {
                parameter.value.trim().to_string()
            }
            Ok(_) => NOT_CONFIGURED.to_string(),
            Err(e) => {
                tracing::debug!(key = %key, "On-prem endpoint lookup failed: {}", e);
                NOT_CONFIGURED.to_string()
            }
        }
    }
}
