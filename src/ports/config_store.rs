use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration store operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigStoreError {
    /// The store could not be reached (connect failure, timeout, I/O error)
    #[error("Configuration store unreachable: {0}")]
    Unreachable(String),

    /// The store answered but the payload could not be understood
    #[error("Invalid configuration store response: {0}")]
    InvalidResponse(String),

    /// A continuation token the store did not issue
    #[error("Invalid continuation token: {0}")]
    InvalidToken(String),
}

/// Result type alias for configuration store operations
pub type ConfigStoreResult<T> = Result<T, ConfigStoreError>;

/// A single key/value entry held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

/// One page of a path listing. `next_token` is `None` on the last page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterPage {
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// ConfigStore defines the port (interface) for the hierarchical key/value
/// store holding service registrations and front-end addresses.
///
/// Implementations must not cache: every call reflects the store's current
/// state.
#[async_trait]
pub trait ConfigStore: Send + Sync + 'static {
    /// List every parameter below `path` (recursively), one page at a time.
    ///
    /// # Arguments
    /// * `path` - The namespace prefix, e.g. `/services`
    /// * `next_token` - Continuation token returned by the previous page
    async fn get_parameters_by_path(
        &self,
        path: &str,
        next_token: Option<&str>,
    ) -> ConfigStoreResult<ParameterPage>;

    /// Fetch a single parameter by its full name. A missing key is `Ok(None)`.
    async fn get_parameter(&self, name: &str) -> ConfigStoreResult<Option<Parameter>>;
}
