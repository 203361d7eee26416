use axum::body::Body;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::response::Response;
use futures::TryStreamExt;

use super::ApiError;
use crate::inbound::http::router::AppState;

/// Forward any request not served by the API to the backend named in the
/// service selection header.
///
/// The response status and headers are passed through as received and the
/// body is streamed chunk by chunk. Dropping this future drops the upstream
/// request with it.
pub async fn proxy(State(state): State<AppState>, request: Request) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();

    let service_name = parts
        .headers
        .get(&state.service_header)
        .and_then(|value| value.to_str().ok());
    let authorization = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let admission = state.gateway.admit(service_name, authorization).await?;

    let upstream_request =
        state
            .upstream
            .prepare(&admission, &parts.method, &parts.uri, &parts.headers)?;

    tracing::debug!(
        service = %admission.endpoint.name,
        identity_id = admission.identity.id,
        method = %upstream_request.method,
        url = %upstream_request.url,
        "Forwarding request"
    );

    let upstream_response = state.upstream.forward(upstream_request, body).await?;

    Ok(stream_response(upstream_response))
}

fn stream_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    headers.remove(header::TRANSFER_ENCODING);

    let body = Body::from_stream(
        upstream
            .bytes_stream()
            .inspect_err(|e| tracing::warn!(error = %e, "Upstream body stream failed")),
    );

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
