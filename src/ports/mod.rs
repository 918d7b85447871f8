pub mod config_store;
pub mod dns_resolver;
pub mod http_client;
