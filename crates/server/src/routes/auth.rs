use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use configs::AuthConfig;
use serde::{Deserialize, Serialize};
use service::product::{ProductRepository, ProductService};
use tracing::{debug, error, warn};

use crate::errors::JsonApiError;

pub const INTERNAL_API_KEY_HEADER: &str = "X-Internal-Api-Key";

/// Shared state handed to every handler and middleware.
#[derive(Clone)]
pub struct ServerState {
    pub products: Arc<ProductService<dyn ProductRepository>>,
    pub auth: AuthConfig,
    pub http: reqwest::Client,
}

impl ServerState {
    pub fn new(repo: Arc<dyn ProductRepository>, auth: AuthConfig) -> Self {
        Self {
            products: Arc::new(ProductService::new(repo)),
            auth,
            http: reqwest::Client::new(),
        }
    }
}

/// Caller confirmed by the auth service, available to handlers as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: String,
}

#[derive(Serialize)]
struct IntrospectRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct IntrospectResponse {
    is_valid: bool,
    #[serde(default)]
    user_id: String,
}

fn bearer_token(req: &Request) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Guard for mutating routes: `Authorization: Bearer <token>` checked against
/// the external auth service.
///
/// Missing or malformed header answers 401, an unreachable service or an
/// undecodable reply 500, a rejected token 401.
pub async fn require_bearer_token_state(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let path = req.uri().path().to_owned();
    // owned so no borrow of the request is held across the await below
    let Some(token) = bearer_token(&req).map(str::to_owned) else {
        warn!(path = %path, "missing or malformed Authorization header (expect Bearer)");
        return Err(JsonApiError::unauthorized("Missing or malformed token"));
    };

    let res = state
        .http
        .post(&state.auth.service_url)
        .header(INTERNAL_API_KEY_HEADER, &state.auth.internal_api_key)
        .json(&IntrospectRequest { token: &token })
        .send()
        .await
        .map_err(|e| {
            error!(path = %path, err = %e, "auth service unreachable");
            JsonApiError::internal("AUTH_SERVICE_UNAVAILABLE")
        })?;

    if res.status() != reqwest::StatusCode::OK {
        warn!(path = %path, status = res.status().as_u16(), "token rejected by auth service");
        return Err(JsonApiError::unauthorized("Invalid token"));
    }

    let reply: IntrospectResponse = res.json().await.map_err(|e| {
        error!(path = %path, err = %e, "undecodable auth service reply");
        JsonApiError::internal("AUTH_SERVICE_UNAVAILABLE")
    })?;
    if !reply.is_valid {
        warn!(path = %path, "token rejected by auth service");
        return Err(JsonApiError::unauthorized("Invalid token"));
    }

    debug!(path = %path, user_id = %reply.user_id, "caller authenticated");
    req.extensions_mut().insert(CallerIdentity { user_id: reply.user_id });
    Ok(next.run(req).await)
}

/// Guard for service-to-service routes: `X-Internal-Api-Key` must equal the
/// configured shared secret. An unset secret rejects everything.
pub async fn require_internal_api_key(
    State(state): State<ServerState>,
    req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let provided = req
        .headers()
        .get(INTERNAL_API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let expected = state.auth.internal_api_key.as_str();

    if provided.is_empty() || expected.is_empty() || provided != expected {
        warn!(path = %req.uri().path(), "internal api key rejected");
        return Err(JsonApiError::forbidden());
    }
    Ok(next.run(req).await)
}
