use std::{collections::BTreeMap, sync::RwLock};

use async_trait::async_trait;

use crate::ports::config_store::{
    ConfigStore, ConfigStoreError, ConfigStoreResult, Parameter, ParameterPage,
};

/// Slice the parameters below `path` into one page.
///
/// The continuation token is the decimal offset of the next entry. Entries
/// must already be in the store's natural (sorted) order.
pub(crate) fn page_parameters(
    entries: impl IntoIterator<Item = Parameter>,
    path: &str,
    next_token: Option<&str>,
    page_size: usize,
) -> ConfigStoreResult<ParameterPage> {
    let prefix = format!("{}/", path.trim_end_matches('/'));
    let matching: Vec<Parameter> = entries
        .into_iter()
        .filter(|p| p.name.starts_with(&prefix))
        .collect();

    let offset = match next_token {
        Some(token) => token
            .parse::<usize>()
            .ok()
            .filter(|offset| *offset <= matching.len())
            .ok_or_else(|| ConfigStoreError::InvalidToken(token.to_string()))?,
        None => 0,
    };

    let page_size = page_size.max(1);
    let end = (offset + page_size).min(matching.len());
    let next_token = (end < matching.len()).then(|| end.to_string());

    Ok(ParameterPage {
        parameters: matching[offset..end].to_vec(),
        next_token,
    })
}

/// In-process parameter store.
///
/// Used for embedding and tests; values can be changed while the gateway is
/// running and are visible on the next read.
pub struct MemoryParameterStore {
    parameters: RwLock<BTreeMap<String, String>>,
    page_size: usize,
}

impl MemoryParameterStore {
    pub fn new() -> Self {
        Self::with_page_size(10)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            parameters: RwLock::new(BTreeMap::new()),
            page_size,
        }
    }

    /// Insert or overwrite a parameter.
    pub fn put(&self, name: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut parameters) = self.parameters.write() {
            parameters.insert(name.into(), value.into());
        }
    }

    /// Remove a parameter, returning its previous value.
    pub fn delete(&self, name: &str) -> Option<String> {
        self.parameters
            .write()
            .ok()
            .and_then(|mut parameters| parameters.remove(name))
    }

    fn snapshot(&self) -> ConfigStoreResult<Vec<Parameter>> {
        let parameters = self
            .parameters
            .read()
            .map_err(|_| ConfigStoreError::Unreachable("parameter map lock poisoned".to_string()))?;
        Ok(parameters
            .iter()
            .map(|(name, value)| Parameter {
                name: name.clone(),
                value: value.clone(),
            })
            .collect())
    }
}

impl Default for MemoryParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for MemoryParameterStore {
    async fn get_parameters_by_path(
        &self,
        path: &str,
        next_token: Option<&str>,
    ) -> ConfigStoreResult<ParameterPage> {
        page_parameters(self.snapshot()?, path, next_token, self.page_size)
    }

    async fn get_parameter(&self, name: &str) -> ConfigStoreResult<Option<Parameter>> {
        let parameters = self
            .parameters
            .read()
            .map_err(|_| ConfigStoreError::Unreachable("parameter map lock poisoned".to_string()))?;
        Ok(parameters.get(name).map(|value| Parameter {
            name: name.to_string(),
            value: value.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_paging_walks_all_entries() {
        let store = MemoryParameterStore::with_page_size(2);
        for i in 0..5 {
            store.put(format!("/services/s{i}/config"), format!("v{i}"));
        }
        store.put("/servicesX/other", "ignored");

        let first = store.get_parameters_by_path("/services", None).await.unwrap();
        assert_eq!(first.parameters.len(), 2);
        assert_eq!(first.next_token.as_deref(), Some("2"));

        let second = store
            .get_parameters_by_path("/services/", Some("2"))
            .await
            .unwrap();
        assert_eq!(second.parameters.len(), 2);

        let last = store
            .get_parameters_by_path("/services", second.next_token.as_deref())
            .await
            .unwrap();
        assert_eq!(last.parameters.len(), 1);
        assert!(last.next_token.is_none());
    }

    #[tokio::test]
    async fn test_bad_token_is_rejected() {
        let store = MemoryParameterStore::new();
        store.put("/services/a/config", "{}");

        let result = store.get_parameters_by_path("/services", Some("abc")).await;
        assert!(matches!(result, Err(ConfigStoreError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_get_parameter_and_delete() {
        let store = MemoryParameterStore::new();
        store.put("/linked/infra/alb/dns", "alb.example");

        let found = store.get_parameter("/linked/infra/alb/dns").await.unwrap();
        assert_eq!(found.unwrap().value, "alb.example");

        assert_eq!(
            store.delete("/linked/infra/alb/dns").as_deref(),
            Some("alb.example")
        );
        assert!(store.get_parameter("/linked/infra/alb/dns").await.unwrap().is_none());
    }
}
