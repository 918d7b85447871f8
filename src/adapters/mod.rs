pub mod config_stores;
pub mod dns;
pub mod http_client;
pub mod http_handler;
pub mod middleware;
pub mod timeout_body;

/// Re-export commonly used types from adapters
pub use config_stores::{FileParameterStore, HttpParameterStore, MemoryParameterStore};
pub use dns::SystemDnsResolver;
pub use http_client::HttpClientAdapter;
pub use http_handler::HttpHandler;
pub use middleware::*;
