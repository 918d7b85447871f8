//! Per-service API documentation.
//!
//! The OpenAPI document is fetched live from the service's current front-end
//! on every call. Docs pages are static HTML shells that load the document
//! back through this gateway at `/openapi/{service}.json`.
use std::{sync::Arc, time::Duration};

use axum::body::Body as AxumBody;
use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::{Method, Request, StatusCode, Uri, header};

use crate::{
    config::models::DocsConfig,
    core::{
        endpoint::TargetLocator,
        error::{GatewayError, GatewayResult},
        router::backend_unreachable,
    },
    ports::http_client::{HttpClient, HttpClientError},
};

/// Which documentation UI to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocsFlavor {
    Swagger,
    Redoc,
}

/// Backend answer for `openapi.json`, relayed with its original status.
#[derive(Debug, Clone)]
pub struct OpenApiDocument {
    pub status: StatusCode,
    pub body: Bytes,
}

pub struct DocAggregator {
    locator: Arc<TargetLocator>,
    http_client: Arc<dyn HttpClient>,
    config: DocsConfig,
}

impl DocAggregator {
    pub fn new(
        locator: Arc<TargetLocator>,
        http_client: Arc<dyn HttpClient>,
        config: DocsConfig,
    ) -> Self {
        Self {
            locator,
            http_client,
            config,
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    /// GET `openapi.json` from the service, buffering the body. The whole
    /// exchange, body included, is bounded by the docs timeout.
    pub async fn fetch_openapi_document(&self, service_name: &str) -> GatewayResult<OpenApiDocument> {
        let (_, choice, target) = self.locator.locate(service_name).await?;
        let url = target.url_for("openapi.json", None);
        tracing::info!(
            service = %service_name,
            front_end = choice.tier_name(),
            target = %url,
            "Fetching OpenAPI document"
        );

        let uri: Uri = url.parse().map_err(|e| GatewayError::BackendUnreachable {
            url: url.clone(),
            reason: format!("invalid target URL: {e}"),
            timed_out: false,
        })?;

        let mut request = Request::new(AxumBody::empty());
        *request.method_mut() = Method::GET;
        *request.uri_mut() = uri;
        request.headers_mut().insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let timeout = self.timeout();
        let exchange = async {
            let response = self.http_client.send_request(request, timeout).await?;
            let status = response.status();
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| HttpClientError::ConnectionError(format!("reading body: {e}")))?
                .to_bytes();
            Ok::<_, HttpClientError>(OpenApiDocument { status, body })
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(Ok(document)) => Ok(document),
            Ok(Err(e)) => Err(backend_unreachable(url, e)),
            Err(_) => Err(backend_unreachable(url, HttpClientError::Timeout(timeout))),
        }
    }

    /// Render the docs page for a registered service. Only the registry is
    /// consulted; the page itself pulls the document when a browser loads it.
    pub async fn render_docs_view(
        &self,
        service_name: &str,
        flavor: DocsFlavor,
    ) -> GatewayResult<String> {
        let record = self.locator.registry().find_service(service_name).await?;
        let spec_url = format!("/openapi/{}.json", record.name);

        Ok(match flavor {
            DocsFlavor::Swagger => swagger_page(&record.name, &spec_url, &self.config.swagger_ui_cdn),
            DocsFlavor::Redoc => redoc_page(&record.name, &spec_url, &self.config.redoc_cdn),
        })
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// A JS string literal that is also safe inside a `<script>` element.
fn js_string(input: &str) -> String {
    serde_json::Value::from(input)
        .to_string()
        .replace("</", "<\\/")
}

fn swagger_page(service: &str, spec_url: &str, cdn: &str) -> String {
    let title = escape_html(&format!("{service} API Docs"));
    let cdn = escape_html(cdn.trim_end_matches('/'));
    let spec_url = js_string(spec_url);
    format!(
        r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" href="{cdn}/swagger-ui.css">
</head>
<body>
<div id="swagger-ui"></div>
<script src="{cdn}/swagger-ui-bundle.js"></script>
<script>
window.ui = SwaggerUIBundle({{
  url: {spec_url},
  dom_id: "#swagger-ui",
  deepLinking: true,
  presets: [SwaggerUIBundle.presets.apis, SwaggerUIBundle.SwaggerUIStandalonePreset],
  layout: "BaseLayout"
}});
</script>
</body>
</html>
"##
    )
}

fn redoc_page(service: &str, spec_url: &str, script: &str) -> String {
    let title = escape_html(&format!("{service} API Docs"));
    let spec_url = escape_html(spec_url);
    let script = escape_html(script);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<meta name="viewport" content="width=device-width, initial-scale=1">
<style>body {{ margin: 0; padding: 0; }}</style>
</head>
<body>
<redoc spec-url="{spec_url}"></redoc>
<script src="{script}"></script>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use hyper::Response;

    use super::*;
    use crate::{
        adapters::config_stores::MemoryParameterStore,
        config::models::FrontEndKeys,
        core::{endpoint::EndpointResolver, service_registry::ServiceRegistry},
        ports::http_client::HttpClientResult,
    };

    struct CannedClient {
        status: StatusCode,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HttpClient for CannedClient {
        async fn send_request(
            &self,
            req: Request<AxumBody>,
            _timeout: Duration,
        ) -> HttpClientResult<Response<AxumBody>> {
            self.calls.lock().unwrap().push(req.uri().to_string());
            Ok(Response::builder()
                .status(self.status)
                .body(AxumBody::from(r#"{"openapi":"3.1.0"}"#))
                .unwrap())
        }
    }

    /// Never answers; exercises the aggregator's own deadline.
    struct StalledClient;

    #[async_trait]
    impl HttpClient for StalledClient {
        async fn send_request(
            &self,
            _req: Request<AxumBody>,
            _timeout: Duration,
        ) -> HttpClientResult<Response<AxumBody>> {
            std::future::pending().await
        }
    }

    fn aggregator(client: Arc<dyn HttpClient>, timeout_secs: u64) -> DocAggregator {
        let store = MemoryParameterStore::new();
        store.put(
            "/services/orders/config",
            r#"{"serviceName":"orders","nlbDnsName":"nlb.example","listenerPort":9000,"targetPort":80}"#,
        );
        let store = Arc::new(store);
        let registry = Arc::new(ServiceRegistry::new(store.clone(), "/services"));
        let endpoints = Arc::new(EndpointResolver::new(store, FrontEndKeys::default()));
        DocAggregator::new(
            Arc::new(TargetLocator::new(registry, endpoints)),
            client,
            DocsConfig {
                timeout_secs,
                ..DocsConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_fetch_relays_status_and_body() {
        let client = Arc::new(CannedClient {
            status: StatusCode::OK,
            calls: Mutex::new(Vec::new()),
        });
        let document = aggregator(client.clone(), 10)
            .fetch_openapi_document("orders")
            .await
            .unwrap();

        assert_eq!(document.status, StatusCode::OK);
        assert_eq!(document.body.as_ref(), br#"{"openapi":"3.1.0"}"#);
        assert_eq!(
            client.calls.lock().unwrap().as_slice(),
            ["http://nlb.example:9000/openapi.json"]
        );
    }

    #[tokio::test]
    async fn test_fetch_keeps_backend_error_status() {
        let client = Arc::new(CannedClient {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            calls: Mutex::new(Vec::new()),
        });
        let document = aggregator(client, 10)
            .fetch_openapi_document("orders")
            .await
            .unwrap();
        assert_eq!(document.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_fetch_unknown_service() {
        let client = Arc::new(CannedClient {
            status: StatusCode::OK,
            calls: Mutex::new(Vec::new()),
        });
        let result = aggregator(client.clone(), 10)
            .fetch_openapi_document("missing")
            .await;
        assert!(matches!(result, Err(GatewayError::ServiceNotFound(_))));
        assert!(client.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_is_bounded_by_docs_timeout() {
        let started = std::time::Instant::now();
        let result = aggregator(Arc::new(StalledClient), 1)
            .fetch_openapi_document("orders")
            .await;
        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(matches!(
            result,
            Err(GatewayError::BackendUnreachable { timed_out: true, .. })
        ));
    }

    #[tokio::test]
    async fn test_render_views_point_at_gateway_document() {
        let client = Arc::new(CannedClient {
            status: StatusCode::OK,
            calls: Mutex::new(Vec::new()),
        });
        let aggregator = aggregator(client.clone(), 10);

        let swagger = aggregator
            .render_docs_view("orders", DocsFlavor::Swagger)
            .await
            .unwrap();
        assert!(swagger.contains(r#"url: "/openapi/orders.json""#));
        assert!(swagger.contains("<title>orders API Docs</title>"));
        assert!(swagger.contains("swagger-ui-bundle.js"));
        assert!(swagger.contains(r##"dom_id: "#swagger-ui""##));
        assert!(swagger.trim_end().ends_with("</html>"));

        let redoc = aggregator
            .render_docs_view("orders", DocsFlavor::Redoc)
            .await
            .unwrap();
        assert!(redoc.contains(r#"<redoc spec-url="/openapi/orders.json">"#));

        // Rendering never calls the backend
        assert!(client.calls.lock().unwrap().is_empty());

        let missing = aggregator.render_docs_view("nope", DocsFlavor::Redoc).await;
        assert!(matches!(missing, Err(GatewayError::ServiceNotFound(_))));
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#x27;");
        assert_eq!(js_string("</script>"), r#""<\/script>""#);
    }
}
