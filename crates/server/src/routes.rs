use std::{any::Any, time::Duration};

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, Level};
use utoipa::OpenApi;

use common::types::Health;

use crate::{errors::JsonApiError, openapi::ApiDoc};

pub mod auth;
pub mod products;

use auth::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Product routes. Reads are public, writes sit behind the bearer gate and
/// stock reduction behind the shared secret.
fn product_routes(state: &ServerState) -> Router<ServerState> {
    let bearer = middleware::from_fn_with_state(state.clone(), auth::require_bearer_token_state);
    let internal = middleware::from_fn_with_state(state.clone(), auth::require_internal_api_key);

    Router::new()
        .route("/list", get(products::list))
        .route("/create", post(products::create).route_layer(bearer.clone()))
        .route("/reduce-stock/:id", put(products::reduce_stock).route_layer(internal))
        .route(
            "/:id",
            get(products::get_by_id)
                .merge(put(products::update).delete(products::delete).route_layer(bearer)),
        )
}

/// Build the full application router with CORS, request tracing and a
/// per-request timeout.
pub fn build_router(state: ServerState, cors: CorsLayer, request_timeout: Duration) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json));

    let app = public
        .merge(product_routes(&state))
        .with_state(state);
    with_middleware(app, cors, request_timeout)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    error!(panic = %message, "handler panicked");
    JsonApiError::internal("INTERNAL_SERVER_ERROR").into_response()
}

// TimeoutLayer answers with an empty 408; handlers never produce that status.
async fn timeout_envelope(res: Response) -> Response {
    if res.status() == StatusCode::REQUEST_TIMEOUT {
        return JsonApiError::timeout().into_response();
    }
    res
}

fn with_middleware(app: Router, cors: CorsLayer, request_timeout: Duration) -> Router {
    app
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::map_response(timeout_envelope))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 5xx and timeouts
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
