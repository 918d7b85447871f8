//! Shared harness: real backends and a real gateway on ephemeral ports.
#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use svcgate::{
    adapters::{HttpClientAdapter, HttpHandler, MemoryParameterStore, SystemDnsResolver},
    config::{GatewayConfig, StoreConfig},
    ports::config_store::ConfigStore,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

pub async fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A raw backend that sends a head promising 100 bytes, 7 of them, then
/// holds every connection open without writing again.
pub async fn spawn_stalling_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = listener.accept().await.unwrap();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial")
                    .await;
                tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            });
        }
    });
    addr
}

/// A port nothing is listening on.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

pub fn record(name: &str, nlb_dns: &str, listener_port: u16) -> String {
    serde_json::json!({
        "serviceName": name,
        "nlbDnsName": nlb_dns,
        "listenerPort": listener_port,
        "targetPort": 8000,
    })
    .to_string()
}

pub fn register(store: &MemoryParameterStore, name: &str, nlb_dns: &str, listener_port: u16) {
    store.put(
        format!("/services/{name}/config"),
        record(name, nlb_dns, listener_port),
    );
}

pub fn test_config(proxy_timeout_secs: u64) -> GatewayConfig {
    let mut config = GatewayConfig::new(StoreConfig::File {
        path: "unused.json".to_string(),
        page_size: 10,
    });
    config.proxy.timeout_secs = proxy_timeout_secs;
    config.docs.timeout_secs = proxy_timeout_secs;
    config
}

/// Start a gateway over `store` and return its base URL.
pub async fn start_gateway(store: Arc<dyn ConfigStore>, config: GatewayConfig) -> String {
    let handler = HttpHandler::from_config(
        &config,
        store,
        Arc::new(HttpClientAdapter::new().unwrap()),
        Arc::new(SystemDnsResolver::new()),
    );
    let addr = spawn(Arc::new(handler).into_router()).await;
    format!("http://{addr}")
}
