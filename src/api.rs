// Vendor REST API (axum)
//
// Thin adapter over VendorStore: parse, call the store, map NotFound to 404.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, Request, State,
    },
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span};

use crate::config::DbType;
use crate::entities::{Field, NewVendor, Vendor, VendorFilter, VendorId, VendorPatch};
use crate::error::StoreError;
use crate::store::VendorStore;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VendorStore>,
    pub db_type: DbType,
}

impl AppState {
    pub fn new(store: Arc<dyn VendorStore>, db_type: DbType) -> Self {
        AppState { store, db_type }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Body(#[from] JsonRejection),

    #[error(transparent)]
    Path(#[from] PathRejection),

    #[error(transparent)]
    Query(#[from] QueryRejection),
}

/// Body of every non-vendor response
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    fn new(message: impl Into<String>) -> Self {
        Message {
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Store(StoreError::NotFound(_)) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Store(err) => {
                error!(error = %err, "vendor store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            ApiError::Body(rejection) => (rejection.status(), rejection.body_text()),
            ApiError::Path(rejection) => (rejection.status(), rejection.body_text()),
            ApiError::Query(rejection) => (rejection.status(), rejection.body_text()),
        };

        (status, Json(Message::new(message))).into_response()
    }
}

// ============================================================================
// Request bodies
// ============================================================================

/// PATCH body; keys left out of the JSON are left untouched
#[derive(Debug, Default, Deserialize)]
pub struct VendorUpdateRequest {
    #[serde(default)]
    pub name: Field<Option<String>>,
    #[serde(default)]
    pub comment: Field<Option<String>>,
}

impl TryFrom<VendorUpdateRequest> for VendorPatch {
    type Error = ApiError;

    fn try_from(request: VendorUpdateRequest) -> Result<Self, Self::Error> {
        let name = match request.name {
            Field::Unchanged => Field::Unchanged,
            Field::Set(Some(name)) => Field::Set(name),
            Field::Set(None) => return Err(ApiError::Validation("Name cannot be unset.".into())),
        };

        Ok(VendorPatch {
            name,
            comment: request.comment,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub db_type: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/v1/health
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// GET /api/v1/info
async fn get_info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        version: crate::VERSION.to_string(),
        db_type: state.db_type.as_str().to_string(),
    })
}

/// GET /api/v1/vendor?name=X
async fn find_vendors(
    State(state): State<AppState>,
    query: Result<Query<VendorFilter>, QueryRejection>,
) -> Result<Json<Vec<Vendor>>, ApiError> {
    let Query(filter) = query?;
    Ok(Json(state.store.list(&filter)?))
}

/// POST /api/v1/vendor
async fn add_vendor(
    State(state): State<AppState>,
    payload: Result<Json<NewVendor>, JsonRejection>,
) -> Result<Json<Vendor>, ApiError> {
    let Json(new) = payload?;
    let vendor = state.store.create(new)?;

    info!(vendor_id = %vendor.id, "added vendor");
    Ok(Json(vendor))
}

/// GET /api/v1/vendor/:id
async fn get_vendor(
    State(state): State<AppState>,
    id: Result<Path<VendorId>, PathRejection>,
) -> Result<Json<Vendor>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.store.get(id)?))
}

/// PATCH /api/v1/vendor/:id
async fn update_vendor(
    State(state): State<AppState>,
    id: Result<Path<VendorId>, PathRejection>,
    payload: Result<Json<VendorUpdateRequest>, JsonRejection>,
) -> Result<Json<Vendor>, ApiError> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let patch = VendorPatch::try_from(request)?;

    let vendor = state.store.update(id, patch)?;
    info!(vendor_id = %id, "updated vendor");
    Ok(Json(vendor))
}

/// DELETE /api/v1/vendor/:id
async fn delete_vendor(
    State(state): State<AppState>,
    id: Result<Path<VendorId>, PathRejection>,
) -> Result<Json<Message>, ApiError> {
    let Path(id) = id?;
    state.store.delete(id)?;

    info!(vendor_id = %id, "deleted vendor");
    Ok(Json(Message::new("Success!")))
}

// ============================================================================
// Middleware
// ============================================================================

/// Reuse the caller's x-request-id or mint one, and echo it on the response
async fn request_id(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let value = HeaderValue::from_str(&id).ok();
    if let Some(value) = &value {
        request
            .headers_mut()
            .insert(REQUEST_ID_HEADER, value.clone());
    }

    let mut response = next.run(request).await;
    if let Some(value) = value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Permissive when no origins are configured
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/info", get(get_info))
        .route("/vendor", get(find_vendors).post(add_vendor))
        .route(
            "/vendor/:id",
            get(get_vendor).patch(update_vendor).delete(delete_vendor),
        )
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            let request_id = request
                .headers()
                .get(&REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        }))
        .layer(middleware::from_fn(request_id))
}
