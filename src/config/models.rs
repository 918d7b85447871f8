//! Configuration data structures for svcgate.
//!
//! These types map directly to TOML (also JSON / YAML) configuration files. They are
//! serde‑friendly and include defaults so that a minimal config only has to name the
//! parameter store.
use serde::{Deserialize, Serialize};

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_services_path() -> String {
    "/services".to_string()
}

fn default_store_timeout_secs() -> u64 {
    5
}

fn default_file_page_size() -> usize {
    10
}

/// Top-level gateway configuration.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Where service registrations and front-end addresses are read from
    pub store: StoreConfig,
    /// Namespace prefix under which service records live
    #[serde(default = "default_services_path")]
    pub services_path: String,
    #[serde(default)]
    pub front_ends: FrontEndKeys,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub docs: DocsConfig,
    #[serde(default = "default_onprem_endpoints")]
    pub onprem: Vec<OnPremEndpoint>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    /// Create a configuration with defaults for everything but the store.
    pub fn new(store: StoreConfig) -> Self {
        Self {
            listen_addr: default_listen_addr(),
            store,
            services_path: default_services_path(),
            front_ends: FrontEndKeys::default(),
            proxy: ProxyConfig::default(),
            docs: DocsConfig::default(),
            onprem: default_onprem_endpoints(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Parameter store backends (tagged enum).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum StoreConfig {
    /// Remote store reachable over HTTP
    Http {
        url: String,
        #[serde(default = "default_store_timeout_secs")]
        timeout_secs: u64,
        /// Page size hint sent as `max_results`; the store default applies when unset
        #[serde(default)]
        page_size: Option<u32>,
    },
    /// Local JSON parameter file, re-read on every call
    File {
        path: String,
        #[serde(default = "default_file_page_size")]
        page_size: usize,
    },
}

/// Well-known keys holding the DNS names of each front-end tier.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct FrontEndKeys {
    pub alb_dns_key: String,
    pub vpc_endpoint_dns_key: String,
    /// Shared NLB name; shown on the dashboard only, routing uses each record's own NLB
    pub nlb_dns_key: String,
}

impl Default for FrontEndKeys {
    fn default() -> Self {
        Self {
            alb_dns_key: "/linked/infra/alb/dns".to_string(),
            vpc_endpoint_dns_key: "/linked/infra/privatelink/endpoint".to_string(),
            nlb_dns_key: "/linked/infra/nlb/dns".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Bound on waiting for a backend's response head
    pub timeout_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DocsConfig {
    /// Bound on fetching a backend's OpenAPI document
    pub timeout_secs: u64,
    /// Base URL serving `swagger-ui-dist` assets
    pub swagger_ui_cdn: String,
    /// URL of the ReDoc standalone bundle
    pub redoc_cdn: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            swagger_ui_cdn: "https://cdn.jsdelivr.net/npm/swagger-ui-dist@5".to_string(),
            redoc_cdn: "https://cdn.jsdelivr.net/npm/redoc@2/bundles/redoc.standalone.js"
                .to_string(),
        }
    }
}

/// An on-premises endpoint listed on the dashboard for diagnostics.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OnPremEndpoint {
    /// Display label, e.g. "GitLab API"
    pub name: String,
    /// Parameter key holding the endpoint address
    pub key: String,
}

fn default_onprem_endpoints() -> Vec<OnPremEndpoint> {
    vec![
        OnPremEndpoint {
            name: "GitLab API".to_string(),
            key: "/onprem/as4-gitlab/endpoint".to_string(),
        },
        OnPremEndpoint {
            name: "License Server".to_string(),
            key: "/onprem/silver-license/endpoint".to_string(),
        },
    ]
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `svcgate=debug,tower_http=info`
    pub level: String,
    /// Emit JSON lines instead of pretty console output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let json = r#"{ "store": { "type": "file", "path": "params.json" } }"#;
        let config: GatewayConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.services_path, "/services");
        assert_eq!(config.proxy.timeout_secs, 30);
        assert_eq!(config.docs.timeout_secs, 10);
        assert_eq!(config.onprem.len(), 2);
        assert_eq!(
            config.store,
            StoreConfig::File {
                path: "params.json".to_string(),
                page_size: 10
            }
        );
    }

    #[test]
    fn test_http_store_config() {
        let json = r#"{ "type": "http", "url": "http://store:9000" }"#;
        let store: StoreConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            store,
            StoreConfig::Http {
                url: "http://store:9000".to_string(),
                timeout_secs: 5,
                page_size: None
            }
        );
    }
}
