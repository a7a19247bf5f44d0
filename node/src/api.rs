//! # REST API
//!
//! The axum router exposing identifier creation and resolution over HTTP.
//! All handlers share [`AppState`] through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                     | Description                          |
//! |--------|--------------------------|--------------------------------------|
//! | GET    | `/health`                | Liveness probe                       |
//! | POST   | `/createUserDID`         | Create a user DID `{alias}`          |
//! | POST   | `/createDataDID`         | Create a data DID                    |
//! | POST   | `/resolveDID`            | Resolve a DID `{did}`                |
//! | GET    | `/1.0/identifiers/:did`  | Raw resolution result                |
//!
//! The POST endpoints answer with `{status, message, data: {didDocument}}`
//! on success and `{status: "error", message}` otherwise.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use valyu_did::identity::{CreateOptions, DidDocument, DidError, DidVariant, ResolutionErrorKind};
use valyu_did::manager::DidManager;

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub version: String,
    pub manager: Arc<DidManager>,
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the axum [`Router`] with all routes, CORS, and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/createUserDID", post(create_user_did_handler))
        .route("/createDataDID", post(create_data_did_handler))
        .route("/resolveDID", post(resolve_did_handler))
        .route("/1.0/identifiers/:did", get(identifiers_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Envelope for the POST endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<DocumentPayload>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPayload {
    pub did_document: DidDocument,
}

fn success(message: &str, document: DidDocument) -> Response {
    let body = ApiResponse {
        status: "success".to_string(),
        message: message.to_string(),
        data: Some(DocumentPayload {
            did_document: document,
        }),
    };
    (StatusCode::OK, Json(body)).into_response()
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ApiResponse {
        status: "error".to_string(),
        message: message.into(),
        data: None,
    };
    (status, Json(body)).into_response()
}

fn did_error_status(err: &DidError) -> StatusCode {
    match err {
        DidError::InvalidOptions(_) => StatusCode::BAD_REQUEST,
        DidError::DuplicateDid(_) | DidError::DuplicateAlias(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// A non-empty string field from a JSON body.
fn string_field<'a>(body: &'a Value, name: &str) -> Option<&'a str> {
    body.get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Present and non-empty. Numbers count, so `chainId: 1` is accepted.
fn field_present(body: &Value, name: &str) -> bool {
    match body.get(name) {
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(_)) => true,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: liveness probe.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "version": state.version,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

async fn create(state: &AppState, alias: &str, options: CreateOptions, kind: DidVariant) -> Response {
    let timer = state.metrics.creation_latency_seconds.start_timer();
    let result = state
        .manager
        .create_and_resolve(Some(alias), options, None)
        .await;
    timer.observe_duration();

    match result {
        Ok(document) => {
            state
                .metrics
                .dids_created_total
                .with_label_values(&[kind.as_str()])
                .inc();
            success("DID successfully created.", document)
        }
        Err(e) => {
            tracing::warn!(alias, %kind, error = %e, "identifier creation failed");
            error_response(did_error_status(&e), e.to_string())
        }
    }
}

/// `POST /createUserDID`: body `{alias}`.
async fn create_user_did_handler(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Response {
    let Some(Json(body)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "Request body is missing.");
    };
    let Some(alias) = string_field(&body, "alias") else {
        return error_response(StatusCode::BAD_REQUEST, "Please provide an alias for the user.");
    };

    create(&state, alias, CreateOptions::User, DidVariant::User).await
}

/// `POST /createDataDID`: body `{alias, dataTokenAddress, chainId, accessEndpoint}`.
async fn create_data_did_handler(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Response {
    let Some(Json(body)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "Request body is missing.");
    };
    let Some(alias) = string_field(&body, "alias") else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid request body provided");
    };
    if !["dataTokenAddress", "chainId", "accessEndpoint"]
        .iter()
        .all(|field| field_present(&body, field))
    {
        return error_response(StatusCode::BAD_REQUEST, "Invalid request body provided");
    }

    let options = match CreateOptions::from_value(&body) {
        Ok(options) => options,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };
    create(&state, alias, options, DidVariant::Data).await
}

/// `POST /resolveDID`: body `{did}`.
///
/// An unresolvable DID gets an error envelope with a status taken from the
/// resolution error code, never a success envelope with a null document.
async fn resolve_did_handler(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Response {
    let Some(Json(body)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "Request body is missing.");
    };
    let Some(did) = string_field(&body, "did") else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid request body provided");
    };

    state.metrics.resolutions_total.inc();
    let result = state.manager.resolve_did(did).await;
    match result.did_document {
        Some(document) => success("DID successfully resolved.", document),
        None => {
            state.metrics.resolution_failures_total.inc();
            let code = result
                .did_resolution_metadata
                .error
                .unwrap_or(ResolutionErrorKind::NotFound);
            error_response(
                resolution_status(code),
                format!("DID could not be resolved: {}", error_code(code)),
            )
        }
    }
}

/// `GET /1.0/identifiers/:did`: the resolution result as-is.
async fn identifiers_handler(State(state): State<AppState>, Path(did): Path<String>) -> Response {
    state.metrics.resolutions_total.inc();
    let result = state.manager.resolve_did(&did).await;
    let status = match result.error() {
        None => StatusCode::OK,
        Some(code) => {
            state.metrics.resolution_failures_total.inc();
            resolution_status(code)
        }
    };
    (status, Json(result)).into_response()
}

fn resolution_status(code: ResolutionErrorKind) -> StatusCode {
    match code {
        ResolutionErrorKind::NotFound => StatusCode::NOT_FOUND,
        ResolutionErrorKind::InvalidDid | ResolutionErrorKind::UnknownDidType => {
            StatusCode::BAD_REQUEST
        }
        ResolutionErrorKind::UnsupportedDidMethod => StatusCode::NOT_IMPLEMENTED,
    }
}

fn error_code(code: ResolutionErrorKind) -> String {
    serde_json::to_value(code)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
