use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::ports::config_store::{
    ConfigStore, ConfigStoreError, ConfigStoreResult, Parameter, ParameterPage,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetParameterResponse {
    parameter: Parameter,
}

/// Parameter store reached over HTTP.
///
/// * `GET {base}/parameters?path=..&recursive=true[&next_token=..][&max_results=..]`
///   answers with a [`ParameterPage`] in PascalCase JSON.
/// * `GET {base}/parameter?name=..` answers with `{"Parameter": {...}}`, or 404
///   when the key does not exist.
pub struct HttpParameterStore {
    base_url: String,
    client: Client,
    page_size: Option<u32>,
}

impl HttpParameterStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration, page_size: Option<u32>) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            page_size,
        }
    }

    fn transport_error(e: reqwest::Error) -> ConfigStoreError {
        if e.is_decode() {
            ConfigStoreError::InvalidResponse(e.to_string())
        } else {
            ConfigStoreError::Unreachable(e.to_string())
        }
    }
}

#[async_trait]
impl ConfigStore for HttpParameterStore {
    async fn get_parameters_by_path(
        &self,
        path: &str,
        next_token: Option<&str>,
    ) -> ConfigStoreResult<ParameterPage> {
        let mut query: Vec<(&str, String)> = vec![
            ("path", path.to_string()),
            ("recursive", "true".to_string()),
        ];
        if let Some(token) = next_token {
            query.push(("next_token", token.to_string()));
        }
        if let Some(max_results) = self.page_size {
            query.push(("max_results", max_results.to_string()));
        }

        let resp = self
            .client
            .get(format!("{}/parameters", self.base_url))
            .query(&query)
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !resp.status().is_success() {
            return Err(ConfigStoreError::Unreachable(format!(
                "listing {path} returned {}",
                resp.status()
            )));
        }

        resp.json::<ParameterPage>()
            .await
            .map_err(|e| ConfigStoreError::InvalidResponse(e.to_string()))
    }

    async fn get_parameter(&self, name: &str) -> ConfigStoreResult<Option<Parameter>> {
        let resp = self
            .client
            .get(format!("{}/parameter", self.base_url))
            .query(&[("name", name)])
            .send()
            .await
            .map_err(Self::transport_error)?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => resp
                .json::<GetParameterResponse>()
                .await
                .map(|body| Some(body.parameter))
                .map_err(|e| ConfigStoreError::InvalidResponse(e.to_string())),
            status => Err(ConfigStoreError::Unreachable(format!(
                "reading {name} returned {status}"
            ))),
        }
    }
}
