//! Service registry backed by the parameter store.
//!
//! Every listing walks all pages below the services path and parses each
//! parameter into a [`ServiceRecord`]. Nothing is cached between calls, so a
//! deployment that rewrites a record is visible to the very next request.
use std::{collections::HashSet, sync::Arc};

use serde::{Deserialize, Deserializer, Serialize, de};
use thiserror::Error;

use crate::{
    core::error::{GatewayError, GatewayResult},
    ports::config_store::{ConfigStore, Parameter},
};

/// A registered backend service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    #[serde(rename = "serviceName")]
    pub name: String,
    pub nlb_dns_name: String,
    #[serde(deserialize_with = "port_from_number_or_string")]
    pub listener_port: u16,
    #[serde(deserialize_with = "port_from_number_or_string")]
    pub target_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_rule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<String>,
}

impl ServiceRecord {
    /// Path segment the application load balancer routes on for this service.
    ///
    /// `pathRule` values look like `/orders/*`; the wildcard and slashes are
    /// stripped. Records without a rule are routed on their name.
    pub fn alb_path_prefix(&self) -> &str {
        self.path_rule
            .as_deref()
            .map(|rule| rule.trim_end_matches('*').trim_matches('/'))
            .filter(|prefix| !prefix.is_empty())
            .unwrap_or(&self.name)
    }
}

/// Ports are written by infrastructure tooling as numbers or numeric strings.
fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPort {
        Number(u64),
        Text(String),
    }

    match RawPort::deserialize(deserializer)? {
        RawPort::Number(n) => u16::try_from(n).map_err(|_| de::Error::custom("port out of range")),
        RawPort::Text(s) => s
            .trim()
            .parse::<u16>()
            .map_err(|e| de::Error::custom(format!("invalid port '{s}': {e}"))),
    }
}

/// Why a single parameter could not become a [`ServiceRecord`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RecordError {
    #[error("Malformed record in {name}: {reason}")]
    Malformed { name: String, reason: String },
}

/// Parse one parameter value into a record.
pub fn parse_record(parameter: &Parameter) -> Result<ServiceRecord, RecordError> {
    let record: ServiceRecord =
        serde_json::from_str(&parameter.value).map_err(|e| RecordError::Malformed {
            name: parameter.name.clone(),
            reason: e.to_string(),
        })?;

    if record.name.trim().is_empty() {
        return Err(RecordError::Malformed {
            name: parameter.name.clone(),
            reason: "empty serviceName".to_string(),
        });
    }

    Ok(record)
}

/// Read-only view over the service records held in the parameter store.
pub struct ServiceRegistry {
    store: Arc<dyn ConfigStore>,
    services_path: String,
}

impl ServiceRegistry {
    pub fn new(store: Arc<dyn ConfigStore>, services_path: impl Into<String>) -> Self {
        Self {
            store,
            services_path: services_path.into(),
        }
    }

    /// The underlying store, shared with the endpoint resolver and dashboard.
    pub fn store(&self) -> &Arc<dyn ConfigStore> {
        &self.store
    }

    /// List every registered service, following continuation tokens until the
    /// store reports no further pages.
    ///
    /// Malformed entries are logged and skipped; only a store failure fails the
    /// whole listing.
    pub async fn list_services(&self) -> GatewayResult<Vec<ServiceRecord>> {
        let mut records = Vec::new();
        let mut next_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        let mut pages = 0usize;

        loop {
            let page = self
                .store
                .get_parameters_by_path(&self.services_path, next_token.as_deref())
                .await
                .map_err(|e| GatewayError::ConfigUnavailable(e.to_string()))?;
            pages += 1;

            for parameter in &page.parameters {
                match parse_record(parameter) {
                    Ok(record) => records.push(record),
                    Err(e) => tracing::warn!(parameter = %parameter.name, "Skipping service entry: {}", e),
                }
            }

            match page.next_token {
                Some(token) if !token.is_empty() => {
                    if !seen_tokens.insert(token.clone()) {
                        // A store cycling through tokens would loop forever
                        return Err(GatewayError::ConfigUnavailable(format!(
                            "store repeated continuation token '{token}'"
                        )));
                    }
                    next_token = Some(token);
                }
                _ => break,
            }
        }

        tracing::debug!(
            services = records.len(),
            pages,
            path = %self.services_path,
            "Listed registered services"
        );
        Ok(records)
    }

    /// Exact, case-sensitive lookup against a fresh listing.
    pub async fn find_service(&self, name: &str) -> GatewayResult<ServiceRecord> {
        self.list_services()
            .await?
            .into_iter()
            .find(|record| record.name == name)
            .ok_or_else(|| GatewayError::ServiceNotFound(name.to_string()))
    }
}
