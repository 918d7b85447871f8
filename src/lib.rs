//! svcgate - a dynamic reverse-proxy gateway for registered backend services.
//!
//! Backends register themselves by writing a record to a hierarchical
//! parameter store. svcgate reads the registry on every request, picks the
//! preferred network front-end (application load balancer, then VPC endpoint,
//! then each service's own network load balancer) and forwards
//! `/api/{service}/{path}` there, relaying the backend's response unchanged.
//! It also aggregates each service's OpenAPI document behind Swagger UI and
//! ReDoc pages and serves a diagnostic dashboard.
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use svcgate::{
//!     HttpClientAdapter, HttpHandler,
//!     adapters::{FileParameterStore, SystemDnsResolver},
//!     config::load_config,
//! };
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let config = load_config("config.toml").await?;
//! let handler = HttpHandler::from_config(
//!     &config,
//!     Arc::new(FileParameterStore::new("parameters.json", 10)),
//!     Arc::new(HttpClientAdapter::new()?),
//!     Arc::new(SystemDnsResolver::new()),
//! );
//! let app = Arc::new(handler).into_router();
//! let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
//! axum::serve(listener, app).await?;
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits for the parameter store, DNS and the
//! outbound HTTP client) from **adapters** (their implementations plus the
//! axum front door) while keeping routing decisions inside `core`. Nothing is
//! cached between requests: a re-registered service or a newly provisioned
//! load balancer takes effect on the next call.
//!
//! # Error Handling
//! Request-path failures are [`core::GatewayError`] values mapped to 404, 502,
//! 503 or 504 JSON responses. Startup code returns `eyre::Result<T>` with
//! context attached.
pub mod config;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;

// Re-export the specific types needed by the binary crate
pub use crate::{
    adapters::{HttpClientAdapter, HttpHandler},
    core::{GatewayError, ProxyRouter},
    ports::{config_store::ConfigStore, http_client::HttpClient},
    utils::GracefulShutdown,
};
