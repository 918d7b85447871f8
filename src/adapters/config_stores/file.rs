use std::{collections::BTreeMap, path::PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use super::memory::page_parameters;
use crate::ports::config_store::{
    ConfigStore, ConfigStoreError, ConfigStoreResult, Parameter, ParameterPage,
};

#[derive(Debug, Deserialize)]
struct ParameterFile {
    #[serde(default)]
    parameters: BTreeMap<String, serde_json::Value>,
}

/// Parameter store backed by a local JSON file:
///
/// ```json
/// { "parameters": {
///     "/services/orders/config": { "serviceName": "orders", "nlbDnsName": "nlb", "listenerPort": 8080, "targetPort": 80 },
///     "/linked/infra/alb/dns": "alb.internal"
/// } }
/// ```
///
/// The file is read on every call so edits take effect without a restart.
/// Object values are handed out as their JSON text, strings verbatim.
pub struct FileParameterStore {
    path: PathBuf,
    page_size: usize,
}

impl FileParameterStore {
    pub fn new(path: impl Into<PathBuf>, page_size: usize) -> Self {
        Self {
            path: path.into(),
            page_size,
        }
    }

    async fn read_parameters(&self) -> ConfigStoreResult<Vec<Parameter>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ConfigStoreError::Unreachable(format!("{}: {e}", self.path.display()))
        })?;
        let file: ParameterFile = serde_json::from_str(&raw).map_err(|e| {
            ConfigStoreError::InvalidResponse(format!("{}: {e}", self.path.display()))
        })?;

        Ok(file
            .parameters
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                Parameter { name, value }
            })
            .collect())
    }
}

#[async_trait]
impl ConfigStore for FileParameterStore {
    async fn get_parameters_by_path(
        &self,
        path: &str,
        next_token: Option<&str>,
    ) -> ConfigStoreResult<ParameterPage> {
        page_parameters(self.read_parameters().await?, path, next_token, self.page_size)
    }

    async fn get_parameter(&self, name: &str) -> ConfigStoreResult<Option<Parameter>> {
        Ok(self
            .read_parameters()
            .await?
            .into_iter()
            .find(|p| p.name == name))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    const PARAMETERS: &str = r#"{
  "parameters": {
    "/services/orders/config": {"serviceName": "orders", "nlbDnsName": "nlb.example", "listenerPort": 8080, "targetPort": 80},
    "/services/billing/config": "{\"serviceName\":\"billing\",\"nlbDnsName\":\"nlb.example\",\"listenerPort\":8081,\"targetPort\":80}",
    "/linked/infra/privatelink/endpoint": "vpce-123.example"
  }
}"#;

    #[tokio::test]
    async fn test_file_store_lists_and_gets() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(file, "{}", PARAMETERS).unwrap();

        let store = FileParameterStore::new(file.path(), 1);
        let first = store.get_parameters_by_path("/services", None).await.unwrap();
        assert_eq!(first.parameters.len(), 1);
        // BTreeMap order: billing sorts before orders
        assert_eq!(first.parameters[0].name, "/services/billing/config");
        assert!(first.parameters[0].value.contains("\"billing\""));

        let second = store
            .get_parameters_by_path("/services", first.next_token.as_deref())
            .await
            .unwrap();
        assert!(second.parameters[0].value.contains("\"orders\""));
        assert!(second.next_token.is_none());

        let vpce = store
            .get_parameter("/linked/infra/privatelink/endpoint")
            .await
            .unwrap();
        assert_eq!(vpce.unwrap().value, "vpce-123.example");
    }

    #[tokio::test]
    async fn test_missing_file_is_unreachable() {
        let store = FileParameterStore::new("/nonexistent/svcgate/parameters.json", 10);
        let result = store.get_parameters_by_path("/services", None).await;
        assert!(matches!(result, Err(ConfigStoreError::Unreachable(_))));
    }

    #[tokio::test]
    async fn test_invalid_file_is_invalid_response() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(file, "not json").unwrap();

        let store = FileParameterStore::new(file.path(), 10);
        let result = store.get_parameter("/services/orders/config").await;
        assert!(matches!(result, Err(ConfigStoreError::InvalidResponse(_))));
    }
}
