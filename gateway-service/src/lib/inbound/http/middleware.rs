use std::sync::Arc;

use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use super::handlers::ApiError;
use crate::authorization::models::Authorization;
use crate::authorization::ports::AuthorizerPort;
use crate::identity::models::Identity;

/// Verified caller, stored in request extensions by [`require_permission`].
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity(pub Identity);

/// Middleware state: the authorizer and the permission a route demands.
#[derive(Clone)]
pub struct PermissionGuard {
    authorizer: Arc<dyn AuthorizerPort>,
    permission: Option<&'static str>,
}

impl PermissionGuard {
    pub fn new(authorizer: Arc<dyn AuthorizerPort>, permission: Option<&'static str>) -> Self {
        Self {
            authorizer,
            permission,
        }
    }
}

/// Middleware that authorizes the bearer credential against this deployment's
/// grant and the route's permission.
///
/// Rejections carry no reason; the authorizer logs it.
pub async fn require_permission(
    State(guard): State<PermissionGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    match guard
        .authorizer
        .authorize(authorization.as_deref(), guard.permission)
        .await
    {
        Authorization::Authorized(identity) => {
            req.extensions_mut().insert(AuthenticatedIdentity(identity));
            Ok(next.run(req).await)
        }
        Authorization::Forbidden(identity) => {
            tracing::info!(
                identity_id = identity.id,
                permission = guard.permission.unwrap_or("<service access>"),
                uri = %req.uri(),
                "Request forbidden"
            );
            Err(ApiError::Forbidden("Forbidden".to_string()))
        }
        Authorization::Unauthenticated => {
            Err(ApiError::Unauthorized("Unauthenticated".to_string()))
        }
        Authorization::SystemError => Err(ApiError::InternalServerError(
            "Authorization failed".to_string(),
        )),
    }
}
