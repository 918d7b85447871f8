use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    body::Body as AxumBody,
    extract::{Path, Request, State},
    http::{StatusCode, header},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{any, get},
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    adapters::middleware::{request_id_middleware, request_timing_middleware},
    config::models::GatewayConfig,
    core::{
        Dashboard, DocAggregator, DocsFlavor, EndpointResolver, GatewayError, ProxyRequest,
        ProxyRouter, ServiceRegistry, TargetLocator, dns::DnsLookup,
    },
    ports::{config_store::ConfigStore, dns_resolver::DnsResolver, http_client::HttpClient},
};

/// HTTP front door of the gateway: proxy, docs, dashboard and liveness.
pub struct HttpHandler {
    router: ProxyRouter,
    docs: DocAggregator,
    dashboard: Dashboard,
}

impl HttpHandler {
    pub fn new(router: ProxyRouter, docs: DocAggregator, dashboard: Dashboard) -> Self {
        Self {
            router,
            docs,
            dashboard,
        }
    }

    /// Wire the core services from configuration and the three outbound ports.
    pub fn from_config(
        config: &GatewayConfig,
        store: Arc<dyn ConfigStore>,
        http_client: Arc<dyn HttpClient>,
        dns_resolver: Arc<dyn DnsResolver>,
    ) -> Self {
        let registry = Arc::new(ServiceRegistry::new(
            store.clone(),
            config.services_path.clone(),
        ));
        let endpoints = Arc::new(EndpointResolver::new(store, config.front_ends.clone()));
        let locator = Arc::new(TargetLocator::new(registry.clone(), endpoints.clone()));

        let router = ProxyRouter::new(
            locator.clone(),
            http_client.clone(),
            Duration::from_secs(config.proxy.timeout_secs),
        );
        let docs = DocAggregator::new(locator, http_client, config.docs.clone());
        let dashboard = Dashboard::new(
            registry,
            endpoints,
            DnsLookup::new(dns_resolver),
            config.onprem.clone(),
        );

        Self::new(router, docs, dashboard)
    }

    /// Build the axum router. Every request is looked up afresh; the handler
    /// holds no per-request state.
    pub fn into_router(self: Arc<Self>) -> Router {
        Router::new()
            .route("/", get(dashboard))
            .route("/health", get(health))
            .route("/api/{service}", any(proxy))
            .route("/api/{service}/", any(proxy))
            .route("/api/{service}/{*path}", any(proxy))
            .route("/openapi/{file}", get(openapi_by_file))
            .route("/{service}/openapi.json", get(openapi_by_service))
            .route("/docs/{service}", get(swagger_docs))
            .route("/{service}/docs", get(swagger_docs))
            .route("/redoc/{service}", get(redoc_docs))
            .route("/{service}/redoc", get(redoc_docs))
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(request_timing_middleware))
            .layer(middleware::from_fn(request_id_middleware))
            .with_state(self)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            GatewayError::ServiceNotFound(service) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "service not found", "service": service }),
            ),
            GatewayError::ConfigUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "configuration store unavailable" }),
            ),
            GatewayError::BackendUnreachable {
                url,
                timed_out: true,
                ..
            } => (
                StatusCode::GATEWAY_TIMEOUT,
                json!({ "error": "backend timed out", "target": url }),
            ),
            GatewayError::BackendUnreachable { url, .. } => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "backend unreachable", "target": url }),
            ),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        } else {
            tracing::info!(status = status.as_u16(), "{}", self);
        }

        (status, Json(body)).into_response()
    }
}

/// Split `/api/{service}/{rest}` keeping `rest` exactly as received.
fn split_api_path(path: &str) -> Option<(&str, &str)> {
    let remainder = path.strip_prefix("/api/")?;
    let (service, rest) = remainder.split_once('/').unwrap_or((remainder, ""));
    (!service.is_empty()).then_some((service, rest))
}

async fn proxy(
    State(handler): State<Arc<HttpHandler>>,
    req: Request,
) -> Result<Response, GatewayError> {
    let (parts, body) = req.into_parts();
    let (service_name, path) = split_api_path(parts.uri.path())
        .map(|(s, p)| (s.to_string(), p.to_string()))
        .ok_or_else(|| GatewayError::ServiceNotFound(String::new()))?;

    handler
        .router
        .route(ProxyRequest {
            service_name,
            path,
            method: parts.method,
            headers: parts.headers,
            query: parts.uri.query().map(str::to_string),
            body,
        })
        .await
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn dashboard(State(handler): State<Arc<HttpHandler>>) -> Result<Response, GatewayError> {
    let overview = handler.dashboard.overview().await?;
    Ok(Json(overview).into_response())
}

async fn openapi_by_file(
    State(handler): State<Arc<HttpHandler>>,
    Path(file): Path<String>,
) -> Result<Response, GatewayError> {
    let service = file
        .strip_suffix(".json")
        .ok_or_else(|| GatewayError::ServiceNotFound(file.clone()))?;
    openapi(&handler, service).await
}

async fn openapi_by_service(
    State(handler): State<Arc<HttpHandler>>,
    Path(service): Path<String>,
) -> Result<Response, GatewayError> {
    openapi(&handler, &service).await
}

async fn openapi(handler: &HttpHandler, service: &str) -> Result<Response, GatewayError> {
    let document = handler.docs.fetch_openapi_document(service).await?;
    Ok((
        document.status,
        [(header::CONTENT_TYPE, "application/json")],
        AxumBody::from(document.body),
    )
        .into_response())
}

async fn swagger_docs(
    State(handler): State<Arc<HttpHandler>>,
    Path(service): Path<String>,
) -> Result<Html<String>, GatewayError> {
    handler
        .docs
        .render_docs_view(&service, DocsFlavor::Swagger)
        .await
        .map(Html)
}

async fn redoc_docs(
    State(handler): State<Arc<HttpHandler>>,
    Path(service): Path<String>,
) -> Result<Html<String>, GatewayError> {
    handler
        .docs
        .render_docs_view(&service, DocsFlavor::Redoc)
        .await
        .map(Html)
}
