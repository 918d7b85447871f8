#![allow(clippy::collapsible_if)]

use std::net::SocketAddr;

use eyre::Result;

use crate::config::models::{DocsConfig, FrontEndKeys, GatewayConfig, StoreConfig};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Gateway configuration validator
pub struct GatewayConfigValidator;

impl GatewayConfigValidator {
    /// Validate the entire gateway configuration
    pub fn validate(config: &GatewayConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        if let Err(mut store_errors) = Self::validate_store(&config.store) {
            errors.append(&mut store_errors);
        }

        if let Err(e) = Self::validate_key_path(&config.services_path, "services_path") {
            errors.push(e);
        }

        if let Err(mut key_errors) = Self::validate_front_end_keys(&config.front_ends) {
            errors.append(&mut key_errors);
        }

        if config.proxy.timeout_secs == 0 {
            errors.push(ValidationError::InvalidField {
                field: "proxy.timeout_secs".to_string(),
                message: "Proxy timeout must be greater than 0".to_string(),
            });
        }

        if let Err(mut docs_errors) = Self::validate_docs(&config.docs) {
            errors.append(&mut docs_errors);
        }

        for (i, endpoint) in config.onprem.iter().enumerate() {
            if endpoint.name.trim().is_empty() {
                errors.push(ValidationError::MissingField {
                    field: format!("onprem[{i}].name"),
                });
            }
            if let Err(e) = Self::validate_key_path(&endpoint.key, &format!("onprem[{i}].key")) {
                errors.push(e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:3000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }

    fn validate_store(store: &StoreConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        match store {
            StoreConfig::Http {
                url,
                timeout_secs,
                page_size,
            } => {
                if let Err(e) = Self::validate_url(url, "store.url") {
                    errors.push(e);
                }
                if *timeout_secs == 0 {
                    errors.push(ValidationError::InvalidField {
                        field: "store.timeout_secs".to_string(),
                        message: "Store timeout must be greater than 0".to_string(),
                    });
                }
                if *page_size == Some(0) {
                    errors.push(ValidationError::InvalidField {
                        field: "store.page_size".to_string(),
                        message: "Page size must be greater than 0".to_string(),
                    });
                }
            }
            StoreConfig::File { path, page_size } => {
                if path.trim().is_empty() {
                    errors.push(ValidationError::MissingField {
                        field: "store.path".to_string(),
                    });
                }
                if *page_size == 0 {
                    errors.push(ValidationError::InvalidField {
                        field: "store.page_size".to_string(),
                        message: "Page size must be greater than 0".to_string(),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_front_end_keys(keys: &FrontEndKeys) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = [
            (&keys.alb_dns_key, "front_ends.alb_dns_key"),
            (&keys.vpc_endpoint_dns_key, "front_ends.vpc_endpoint_dns_key"),
            (&keys.nlb_dns_key, "front_ends.nlb_dns_key"),
        ]
        .into_iter()
        .filter_map(|(key, field)| Self::validate_key_path(key, field).err())
        .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_docs(docs: &DocsConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if docs.timeout_secs == 0 {
            errors.push(ValidationError::InvalidField {
                field: "docs.timeout_secs".to_string(),
                message: "Docs timeout must be greater than 0".to_string(),
            });
        }
        if let Err(e) = Self::validate_url(&docs.swagger_ui_cdn, "docs.swagger_ui_cdn") {
            errors.push(e);
        }
        if let Err(e) = Self::validate_url(&docs.redoc_cdn, "docs.redoc_cdn") {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Parameter keys are absolute hierarchical paths
    fn validate_key_path(key: &str, field: &str) -> ValidationResult<()> {
        if !key.starts_with('/') {
            return Err(ValidationError::InvalidField {
                field: field.to_string(),
                message: format!("Parameter keys must start with '/', got '{key}'"),
            });
        }
        if key.contains("//") {
            return Err(ValidationError::InvalidField {
                field: field.to_string(),
                message: format!("Parameter keys must not contain empty segments: '{key}'"),
            });
        }
        Ok(())
    }

    /// Validate URL format
    fn validate_url(url_str: &str, context: &str) -> ValidationResult<()> {
        match url::Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(ValidationError::InvalidField {
                        field: context.to_string(),
                        message: format!(
                            "URL scheme must be 'http' or 'https', got '{}'",
                            url.scheme()
                        ),
                    });
                }

                if url.host().is_none() {
                    return Err(ValidationError::InvalidField {
                        field: context.to_string(),
                        message: "URL must have a valid host".to_string(),
                    });
                }

                Ok(())
            }
            Err(e) => Err(ValidationError::InvalidField {
                field: context.to_string(),
                message: format!("Invalid URL format: {e}"),
            }),
        }
    }

    /// Format multiple validation errors into a single message
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        if errors.is_empty() {
            return "No errors".to_string();
        }

        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} validation errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}
