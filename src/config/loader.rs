use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::GatewayConfig;

/// Prefix for environment overrides, e.g. `SVCGATE__PROXY__TIMEOUT_SECS=5`
pub const ENV_PREFIX: &str = "SVCGATE";

/// Load configuration from a file using the config crate
/// Supports multiple formats: YAML, JSON, TOML, etc.
pub async fn load_config(config_path: &str) -> Result<GatewayConfig> {
    load_config_sync(config_path)
}

/// Load configuration synchronously
pub fn load_config_sync(config_path: &str) -> Result<GatewayConfig> {
    let config_path = Path::new(config_path);

    // Determine file format based on extension
    let format = match config_path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        Some("toml") => FileFormat::Toml,
        Some("ini") => FileFormat::Ini,
        _ => FileFormat::Yaml, // Default to YAML
    };

    let settings = Config::builder()
        .add_source(File::new(
            config_path
                .to_str()
                .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", config_path.display()))?,
            format,
        ))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("Failed to build config from {}", config_path.display()))?;

    let gateway_config: GatewayConfig = settings.try_deserialize().with_context(|| {
        format!(
            "Failed to deserialize config from {}",
            config_path.display()
        )
    })?;

    Ok(gateway_config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::config::models::StoreConfig;

    #[tokio::test]
    async fn test_load_toml_config() {
        let toml_content = r#"
listen_addr = "127.0.0.1:3000"
services_path = "/services"

[store]
type = "http"
url = "http://parameter-store:9000"
timeout_secs = 3

[front_ends]
alb_dns_key = "/isolated/infra/alb/dns"

[proxy]
timeout_secs = 15
"#;

        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:3000");
        assert_eq!(config.proxy.timeout_secs, 15);
        assert_eq!(config.front_ends.alb_dns_key, "/isolated/infra/alb/dns");
        assert_eq!(
            config.front_ends.vpc_endpoint_dns_key,
            "/linked/infra/privatelink/endpoint"
        );
        assert!(matches!(
            config.store,
            StoreConfig::Http { timeout_secs: 3, .. }
        ));
    }

    #[tokio::test]
    async fn test_load_yaml_config() {
        let yaml_content = r#"
listen_addr: "127.0.0.1:3000"
store:
  type: "file"
  path: "/etc/svcgate/parameters.json"
  page_size: 2
onprem:
  - name: "Artifact Cache"
    key: "/onprem/artifact-cache/endpoint"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(
            config.store,
            StoreConfig::File {
                path: "/etc/svcgate/parameters.json".to_string(),
                page_size: 2
            }
        );
        assert_eq!(config.onprem.len(), 1);
        assert_eq!(config.onprem[0].name, "Artifact Cache");
    }

    #[tokio::test]
    async fn test_load_config_missing_store_fails() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(temp_file, r#"{{ "listen_addr": "127.0.0.1:3000" }}"#).unwrap();

        let result = load_config(temp_file.path().to_str().unwrap()).await;
        assert!(result.is_err());
    }
}
