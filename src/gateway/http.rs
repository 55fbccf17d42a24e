use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::Instrument as _;

use super::{ACCESS_KEY_HEADER, BuiltinModelGateway, ValidationResult};
use crate::error::GatewayError;

pub const DEFAULT_MOUNT_PREFIX: &str = "/api/v1/builtin-models";
const REQUEST_ID_HEADER: &str = "x-request-id";

static REQUEST_ID_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Clone)]
pub struct GatewayHttpState {
    gateway: Arc<BuiltinModelGateway>,
}

impl GatewayHttpState {
    pub fn new(gateway: BuiltinModelGateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }

    pub fn gateway(&self) -> &BuiltinModelGateway {
        &self.gateway
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
    code: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn router(state: GatewayHttpState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/config", get(handle_config))
        .route("/models", get(handle_models))
        .route("/validate", post(handle_validate))
        .with_state(state)
}

/// Mounts [`router`] under `prefix`, e.g. `/api/v1/builtin-models`.
pub fn mounted_router(prefix: &str, state: GatewayHttpState) -> Router {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return router(state);
    }
    if prefix.starts_with('/') {
        Router::new().nest(prefix, router(state))
    } else {
        Router::new().nest(&format!("/{prefix}"), router(state))
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn handle_config(State(state): State<GatewayHttpState>, headers: HeaderMap) -> Response {
    let request_id = extract_request_id(&headers);
    let gateway = state.gateway();
    let result = gateway
        .verify(extract_access_key(&headers).as_deref())
        .map(|authorized| gateway.get_config(authorized))
        .map_err(GatewayError::from);
    respond(&request_id, "config", result)
}

async fn handle_models(State(state): State<GatewayHttpState>, headers: HeaderMap) -> Response {
    let request_id = extract_request_id(&headers);
    let gateway = state.gateway();
    let result = match gateway.verify(extract_access_key(&headers).as_deref()) {
        Ok(authorized) => {
            let span = tracing::info_span!(
                "builtin_models.list",
                request_id = %request_id,
                base_url = %gateway.config().base_url
            );
            gateway.list_models(authorized).instrument(span).await
        }
        Err(err) => Err(err.into()),
    };
    if let Ok(catalog) = &result {
        tracing::info!(
            request_id = %request_id,
            models = catalog.models.len(),
            "served builtin model list"
        );
    }
    respond(&request_id, "models", result)
}

async fn handle_validate(State(state): State<GatewayHttpState>, headers: HeaderMap) -> Response {
    let request_id = extract_request_id(&headers);
    let result: ValidationResult = state
        .gateway()
        .validate(extract_access_key(&headers).as_deref());
    if !result.valid {
        tracing::info!(
            request_id = %request_id,
            reason = %result.message,
            "access key validation failed"
        );
    }
    with_request_id(Json(result).into_response(), &request_id)
}

fn respond<T: Serialize>(
    request_id: &str,
    route: &'static str,
    result: Result<T, GatewayError>,
) -> Response {
    let response = match result {
        Ok(body) => Json(body).into_response(),
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                tracing::error!(
                    request_id = %request_id,
                    route,
                    status = status.as_u16(),
                    error = %err,
                    "builtin model request failed"
                );
            } else {
                tracing::warn!(
                    request_id = %request_id,
                    route,
                    status = status.as_u16(),
                    error = %err,
                    "builtin model request rejected"
                );
            }
            map_gateway_error(err).into_response()
        }
    };
    with_request_id(response, request_id)
}

fn map_gateway_error(err: GatewayError) -> (StatusCode, Json<ErrorResponse>) {
    (
        err.status_code(),
        Json(ErrorResponse {
            detail: err.to_string(),
            code: err.code(),
        }),
    )
}

/// Raw header value, untrimmed; non-UTF-8 bytes are kept lossily so they
/// fail the membership check rather than reading as absent.
fn extract_access_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ACCESS_KEY_HEADER)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}

fn extract_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(generate_request_id)
}

fn generate_request_id() -> String {
    let seq = REQUEST_ID_SEQ.fetch_add(1, Ordering::Relaxed);
    let ts_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis())
        .unwrap_or(0);
    format!("bmg-{ts_ms}-{seq}")
}

fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
