//! Request forwarding.
//!
//! [`ProxyRouter::route`] looks a service up, picks the front-end tier, builds
//! the outbound request from the inbound one and hands back the backend's
//! response untouched. One attempt per request; failures surface as
//! [`GatewayError`] for the HTTP boundary to render.
use std::{sync::Arc, time::Duration};

use axum::body::Body as AxumBody;
use hyper::{HeaderMap, Method, Request, Response, Uri};

use crate::{
    core::{
        endpoint::TargetLocator,
        error::{GatewayError, GatewayResult},
    },
    ports::http_client::{HttpClient, HttpClientError},
};

/// An inbound call addressed to `/api/{service_name}/{path}`.
#[derive(Debug)]
pub struct ProxyRequest {
    pub service_name: String,
    /// Remainder after the service segment, still percent-encoded
    pub path: String,
    pub method: Method,
    pub headers: HeaderMap,
    /// Raw query string without the leading `?`
    pub query: Option<String>,
    pub body: AxumBody,
}

pub struct ProxyRouter {
    locator: Arc<TargetLocator>,
    http_client: Arc<dyn HttpClient>,
    timeout: Duration,
}

impl ProxyRouter {
    pub fn new(
        locator: Arc<TargetLocator>,
        http_client: Arc<dyn HttpClient>,
        timeout: Duration,
    ) -> Self {
        Self {
            locator,
            http_client,
            timeout,
        }
    }

    /// Forward `request` to the service's current front-end and relay the
    /// response (status, headers, streaming body) as received.
    pub async fn route(&self, request: ProxyRequest) -> GatewayResult<Response<AxumBody>> {
        let ProxyRequest {
            service_name,
            path,
            method,
            headers,
            query,
            body,
        } = request;

        let (_, choice, target) = self.locator.locate(&service_name).await?;
        let url = target.url_for(&path, query.as_deref());

        tracing::info!(
            service = %service_name,
            front_end = choice.tier_name(),
            target = %url,
            "Proxying {} request",
            method
        );

        let uri: Uri = url.parse().map_err(|e| GatewayError::BackendUnreachable {
            url: url.clone(),
            reason: format!("invalid target URL: {e}"),
            timed_out: false,
        })?;

        let mut outbound = Request::new(body);
        *outbound.method_mut() = method;
        *outbound.uri_mut() = uri;
        *outbound.headers_mut() = headers;

        self.http_client
            .send_request(outbound, self.timeout)
            .await
            .map_err(|e| backend_unreachable(url, e))
    }
}

pub(crate) fn backend_unreachable(url: String, error: HttpClientError) -> GatewayError {
    GatewayError::BackendUnreachable {
        url,
        timed_out: error.is_timeout(),
        reason: error.to_string(),
    }
}
