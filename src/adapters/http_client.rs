use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body as AxumBody;
use eyre::Result;
use hyper::{HeaderMap, Request, Response, Version, header, header::HeaderValue};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use rustls_native_certs::load_native_certs;
use tokio::time::timeout;
use tracing::Instrument;

use crate::{
    adapters::timeout_body::IdleTimeoutBody,
    ports::http_client::{HttpClient, HttpClientError, HttpClientResult},
    tracing_setup::create_backend_span,
};

/// Connection-scoped headers that must not travel past a single hop.
const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "upgrade",
];

/// HTTP client adapter using Hyper with Rustls (HTTP/1.1, plain or TLS).
///
/// Responsibilities:
/// * Rewrites `Host` to the resolved target's authority
/// * Strips hop-by-hop request headers, leaves everything else verbatim
/// * Bounds the wait for the response head with a timeout, then applies the
///   same timeout to every gap between body frames
/// * Converts between Hyper body and Axum body types
///
/// The underlying connection pool is the only long-lived shared resource and
/// is safe to use from concurrent requests without extra locking. There are
/// no retries: a failed attempt is reported as-is.
pub struct HttpClientAdapter {
    client: Client<HttpsConnector<HttpConnector>, AxumBody>,
}

impl HttpClientAdapter {
    /// Create a new HTTP client adapter.
    pub fn new() -> Result<Self> {
        // Install default crypto provider for rustls if not already set
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false); // Allow HTTPS URLs

        let mut root_cert_store = rustls::RootCertStore::empty();
        let native_certs = load_native_certs();

        if !native_certs.certs.is_empty() {
            for cert in native_certs.certs {
                if root_cert_store.add(cert).is_err() {
                    tracing::warn!("Failed to add native certificate to rustls RootCertStore");
                }
            }
            tracing::debug!("Loaded {} native root certificates.", root_cert_store.len());
        }

        if !native_certs.errors.is_empty() {
            tracing::warn!(
                "Some native certificates failed to load: {:?}",
                native_certs.errors
            );
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_cert_store)
            .with_no_client_auth();

        let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let client = Client::builder(TokioExecutor::new()).build::<_, AxumBody>(https_connector);

        tracing::info!("Created outbound HTTP client");
        Ok(Self { client })
    }

    /// Remove hop-by-hop headers, including any named by `Connection`.
    fn strip_hop_by_hop_headers(headers: &mut HeaderMap) {
        let named: Vec<String> = headers
            .get_all(header::CONNECTION)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(|name| name.trim().to_ascii_lowercase())
            .filter(|name| !name.is_empty())
            .collect();

        for name in HOP_BY_HOP_HEADERS
            .iter()
            .copied()
            .chain(named.iter().map(String::as_str))
        {
            headers.remove(name);
        }
    }
}

#[async_trait]
impl HttpClient for HttpClientAdapter {
    async fn send_request(
        &self,
        mut req: Request<AxumBody>,
        request_timeout: Duration,
    ) -> HttpClientResult<Response<AxumBody>> {
        let client = self.client.clone();

        let backend_identifier = format!(
            "{}://{}",
            req.uri().scheme_str().unwrap_or("http"),
            req.uri()
                .authority()
                .map_or_else(|| "unknown".to_string(), |a| a.to_string())
        );

        let span = create_backend_span(
            &backend_identifier,
            req.method().as_str(),
            req.uri().path(),
        );
        let started = std::time::Instant::now();

        Self::strip_hop_by_hop_headers(req.headers_mut());

        // Host follows the target, not the gateway the client called
        match req.uri().authority().map(|a| a.as_str().to_string()) {
            Some(authority) => {
                let host_header_val = HeaderValue::from_str(&authority).map_err(|e| {
                    HttpClientError::InvalidRequest(format!("invalid authority {authority}: {e}"))
                })?;
                req.headers_mut().insert(header::HOST, host_header_val);
            }
            None => {
                tracing::error!("Outgoing URI has no host: {}", req.uri());
                return Err(HttpClientError::InvalidRequest(
                    "Outgoing URI has no host".to_string(),
                ));
            }
        }

        let (mut parts, axum_body) = req.into_parts();
        parts.version = Version::HTTP_11;

        let method_for_error_log = parts.method.clone();
        let uri_for_error_log = parts.uri.clone();
        let outgoing_request = Request::from_parts(parts, axum_body);

        let result = async {
            tracing::info!("Sending request: {} {}", method_for_error_log, uri_for_error_log);
            tracing::debug!("Outgoing request headers: {:?}", outgoing_request.headers());
            timeout(request_timeout, client.request(outgoing_request)).await
        }
        .instrument(span.clone())
        .await;

        let _enter = span.enter();
        span.record("duration_ms", started.elapsed().as_millis() as u64);
        match result {
            Ok(Ok(response)) => {
                span.record("http.status_code", response.status().as_u16());

                let (mut parts, hyper_body) = response.into_parts();

                // Framing is re-done by the inbound server
                parts.headers.remove(header::TRANSFER_ENCODING);
                parts.headers.remove(header::CONNECTION);

                Ok(Response::from_parts(
                    parts,
                    AxumBody::new(IdleTimeoutBody::new(hyper_body, request_timeout)),
                ))
            }
            Ok(Err(e)) => {
                span.record("http.status_code", 599u16);
                tracing::error!(
                    "Error making request to backend {} ({} {}): {}",
                    backend_identifier,
                    method_for_error_log,
                    uri_for_error_log,
                    e
                );

                Err(HttpClientError::ConnectionError(format!(
                    "Request to {method_for_error_log} {uri_for_error_log} failed: {e}"
                )))
            }
            Err(_) => {
                span.record("http.status_code", 599u16);
                tracing::error!(
                    "Request to backend {} ({} {}) timed out after {:?}",
                    backend_identifier,
                    method_for_error_log,
                    uri_for_error_log,
                    request_timeout
                );
                Err(HttpClientError::Timeout(request_timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::HeaderMap as AxumHeaders, routing::get};
    use http_body_util::BodyExt;
    use tokio::net::TcpListener;

    use super::*;

    async fn spawn_backend(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_http_client_creation() {
        let client = HttpClientAdapter::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_strip_hop_by_hop_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("close, x-trace-hop"));
        headers.insert("x-trace-hop", HeaderValue::from_static("1"));
        headers.insert(header::TE, HeaderValue::from_static("trailers"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));

        HttpClientAdapter::strip_hop_by_hop_headers(&mut headers);

        assert!(!headers.contains_key(header::CONNECTION));
        assert!(!headers.contains_key("x-trace-hop"));
        assert!(!headers.contains_key(header::TE));
        assert!(headers.contains_key(header::AUTHORIZATION));
    }

    #[tokio::test]
    async fn test_send_request_sets_host_to_target() {
        let base = spawn_backend(Router::new().route(
            "/echo-host",
            get(|headers: AxumHeaders| async move {
                headers
                    .get(header::HOST)
                    .and_then(|h| h.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            }),
        ))
        .await;

        let client = HttpClientAdapter::new().unwrap();
        let req = Request::builder()
            .uri(format!("{base}/echo-host"))
            .header(header::HOST, "gateway.example")
            .body(AxumBody::empty())
            .unwrap();

        let resp = client
            .send_request(req, Duration::from_secs(5))
            .await
            .unwrap();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, base.trim_start_matches("http://").as_bytes());
    }

    #[tokio::test]
    async fn test_send_request_times_out() {
        let base = spawn_backend(Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        ))
        .await;

        let client = HttpClientAdapter::new().unwrap();
        let req = Request::builder()
            .uri(format!("{base}/slow"))
            .body(AxumBody::empty())
            .unwrap();

        let started = std::time::Instant::now();
        let result = client.send_request(req, Duration::from_millis(200)).await;
        assert!(matches!(result, Err(HttpClientError::Timeout(_))));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_stalled_body_is_cut_off() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Sends the head and part of the body, then goes silent
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let client = HttpClientAdapter::new().unwrap();
        let req = Request::builder()
            .uri(format!("http://{addr}/stall"))
            .body(AxumBody::empty())
            .unwrap();

        let started = std::time::Instant::now();
        let resp = client
            .send_request(req, Duration::from_millis(300))
            .await
            .unwrap();
        assert_eq!(resp.status(), hyper::StatusCode::OK);

        let body = resp.into_body().collect().await;
        assert!(body.is_err());
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_send_request_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpClientAdapter::new().unwrap();
        let req = Request::builder()
            .uri(format!("http://{addr}/"))
            .body(AxumBody::empty())
            .unwrap();

        let result = client.send_request(req, Duration::from_secs(2)).await;
        assert!(matches!(result, Err(HttpClientError::ConnectionError(_))));
    }
}
