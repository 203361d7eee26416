use axum::body::Body;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header;
use http::HeaderMap;
use http::HeaderName;
use http::HeaderValue;
use http::Method;
use http::Uri;

use crate::config::ProxyConfig;
use crate::proxy::errors::ProxyError;
use crate::proxy::models::ProxyAdmission;

/// Connection-scoped headers that never cross a proxy hop.
const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// A request ready to be sent to a backend.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub forwards_body: bool,
}

/// Shared client for forwarding requests to backends.
///
/// Cloning is cheap and every clone shares one connection pool.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    scheme: String,
    identity_header: HeaderName,
}

impl UpstreamClient {
    /// Build the pooled client from proxy settings.
    ///
    /// Redirects are handed back to the caller instead of being followed.
    ///
    /// # Errors
    /// * `Internal` - Identity header name is invalid or the client cannot be built
    pub fn new(config: &ProxyConfig) -> Result<Self, ProxyError> {
        let identity_header = HeaderName::from_bytes(config.identity_header.as_bytes())
            .map_err(|e| ProxyError::Internal(format!("Invalid identity header name: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .pool_idle_timeout(config.pool_idle_timeout())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ProxyError::Internal(format!("Failed to build upstream client: {}", e)))?;

        Ok(Self {
            client,
            scheme: config.scheme.clone(),
            identity_header,
        })
    }

    pub fn prepare(
        &self,
        admission: &ProxyAdmission,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
    ) -> Result<UpstreamRequest, ProxyError> {
        build_upstream_request(
            &self.scheme,
            &self.identity_header,
            admission,
            method,
            uri,
            headers,
        )
    }

    /// Send a prepared request, returning once the response headers arrive.
    ///
    /// The inbound body is streamed through only when the request carries one.
    pub async fn forward(
        &self,
        request: UpstreamRequest,
        body: Body,
    ) -> Result<reqwest::Response, ProxyError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);

        if request.forwards_body {
            builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        builder
            .send()
            .await
            .map_err(|e| ProxyError::UpstreamFailed(format!("{} ({})", e, request.url)))
    }
}

/// Methods forwarded without inbound headers or body.
fn is_bodiless(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::DELETE | Method::TRACE
    )
}

/// Translate an admitted inbound request into its upstream form.
///
/// Target is `scheme://host:port` plus the original path and query. The
/// identity header always carries the base64 encoded JSON of the scoped
/// identity, replacing anything the caller sent under that name.
///
/// # Errors
/// * `InvalidRequest` - Identity cannot be serialized into a header value
pub fn build_upstream_request(
    scheme: &str,
    identity_header: &HeaderName,
    admission: &ProxyAdmission,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
) -> Result<UpstreamRequest, ProxyError> {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let url = format!(
        "{}://{}:{}{}",
        scheme, admission.endpoint.host, admission.endpoint.port, path_and_query
    );

    let forwards_body = !is_bodiless(method);

    let mut forwarded = HeaderMap::new();
    if forwards_body {
        for (name, value) in headers {
            if name == header::HOST
                || name == header::AUTHORIZATION
                || name == identity_header
                || name.as_str() == "keep-alive"
                || HOP_BY_HOP.contains(name)
            {
                continue;
            }
            forwarded.append(name.clone(), value.clone());
        }
    }

    let identity = serde_json::to_vec(&admission.identity)
        .map_err(|e| ProxyError::InvalidRequest(format!("Identity not serializable: {}", e)))?;
    let identity = HeaderValue::from_str(&STANDARD.encode(identity))
        .map_err(|e| ProxyError::InvalidRequest(format!("Invalid identity header: {}", e)))?;
    forwarded.insert(identity_header.clone(), identity);

    Ok(UpstreamRequest {
        method: method.clone(),
        url,
        headers: forwarded,
        forwards_body,
    })
}
