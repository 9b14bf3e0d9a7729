use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub mod config;
pub mod fetch;
pub mod optimize;
pub mod pipeline;
pub mod upload;
pub mod validate;

use crate::config::IngestConfig;
use crate::pipeline::{IngestRequest, Ingestor};

/// Closed error taxonomy for the ingestion pipeline. Every stage-local
/// failure is one of these; nothing propagates unclassified to callers.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("{0}")]
    InvalidUrl(String),
    #[error("{0}")]
    HostUnreachable(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    AccessDenied(String),
    #[error("{0}")]
    Timeout(String),
    #[error("Failed to fetch image: {0}")]
    Fetch(String),
    #[error("{0}")]
    UnsupportedFormat(String),
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Image too large: maximum dimensions are {max}x{max} pixels.")]
    ImageTooLarge { width: u32, height: u32, max: u32 },
    #[error("Optimization error: {0}")]
    Optimize(String),
    #[error("Upload error: {0}")]
    Upload(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;

impl IngestError {
    /// Caller-facing category code, mirrored into the HTTP status.
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::Unauthenticated(_) => "unauthenticated",
            IngestError::PermissionDenied(_) => "permission-denied",
            IngestError::InvalidUrl(_)
            | IngestError::HostUnreachable(_)
            | IngestError::NotFound(_)
            | IngestError::AccessDenied(_)
            | IngestError::Fetch(_)
            | IngestError::UnsupportedFormat(_)
            | IngestError::InvalidImage(_)
            | IngestError::ImageTooLarge { .. } => "invalid-argument",
            IngestError::Timeout(_) => "deadline-exceeded",
            IngestError::Optimize(_) | IngestError::Upload(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code() {
            "unauthenticated" => StatusCode::UNAUTHORIZED,
            "permission-denied" => StatusCode::FORBIDDEN,
            "invalid-argument" => StatusCode::BAD_REQUEST,
            "deadline-exceeded" => StatusCode::REQUEST_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.code(),
            "message": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

/// Caller role resolved from a profile lookup keyed by the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Customer,
}

/// Seam for the authentication collaborator. The pipeline itself never
/// looks at credentials; handlers check this gate before invoking it.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    async fn role_for(&self, bearer_token: &str) -> Option<Role>;
}

/// Static token-list provider used by the standalone server and tests.
pub struct StaticTokenAuth {
    admin_tokens: Vec<String>,
}

impl StaticTokenAuth {
    pub fn new(admin_tokens: Vec<String>) -> Self {
        Self { admin_tokens }
    }
}

#[async_trait::async_trait]
impl AuthProvider for StaticTokenAuth {
    async fn role_for(&self, bearer_token: &str) -> Option<Role> {
        if bearer_token.is_empty() {
            return None;
        }
        if self.admin_tokens.iter().any(|t| t == bearer_token) {
            Some(Role::Admin)
        } else {
            Some(Role::Customer)
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub ingestor: Ingestor,
    pub auth: Arc<dyn AuthProvider>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestBody {
    pub image_url: String,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub is_main_image: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub success: bool,
    pub cloudinary_url: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteBody {
    pub urls: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResponse {
    pub deleted_count: usize,
    pub failures: Vec<String>,
}

/// Extracts the bearer token and resolves it to a role; both ingest and
/// bulk-delete require the admin role. A precondition gate, not a
/// pipeline stage.
async fn require_admin(auth: &dyn AuthProvider, headers: &HeaderMap) -> Result<()> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("")
        .trim();

    let role = auth.role_for(token).await.ok_or_else(|| {
        IngestError::Unauthenticated("You must be signed in to perform this action.".into())
    })?;

    if role != Role::Admin {
        return Err(IngestError::PermissionDenied(
            "Admin role required for image management.".into(),
        ));
    }
    Ok(())
}

async fn ingest_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<IngestBody>,
) -> Result<Json<IngestResponse>> {
    require_admin(state.auth.as_ref(), &headers).await?;

    let url = state
        .ingestor
        .ingest(IngestRequest {
            source_url: body.image_url,
            entity_id: body.product_id,
            is_primary: body.is_main_image,
        })
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, code = e.code(), "Ingestion failed");
            e
        })?;

    Ok(Json(IngestResponse {
        success: true,
        cloudinary_url: url,
    }))
}

/// Bulk best-effort deletion: only URLs on the image-host domain are
/// attempted, each independently; individual failures never fail the
/// overall call.
async fn bulk_delete_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<BulkDeleteBody>,
) -> Result<Json<BulkDeleteResponse>> {
    require_admin(state.auth.as_ref(), &headers).await?;

    let host = state.ingestor.host();
    let mut deleted_count = 0;
    let mut failures = Vec::new();

    for url in &body.urls {
        if !host.owns_url(url) {
            tracing::debug!(url = %url, "Skipping non-host URL");
            continue;
        }
        if host.delete_by_url(url).await {
            deleted_count += 1;
        } else {
            failures.push(format!("Failed to delete {}", url));
        }
    }

    Ok(Json(BulkDeleteResponse {
        deleted_count,
        failures,
    }))
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "imageingest"
    }))
}

/// Builds the application router with the static token auth provider
/// derived from the config.
pub fn router(config: IngestConfig) -> Result<Router> {
    let auth = Arc::new(StaticTokenAuth::new(config.admin_tokens.clone()));
    router_with(config, auth)
}

/// Builds the router with an injected auth provider (for embedding and
/// tests that stub the authentication collaborator).
pub fn router_with(config: IngestConfig, auth: Arc<dyn AuthProvider>) -> Result<Router> {
    let ingestor = Ingestor::new(Arc::new(config))?;
    let state = AppState { ingestor, auth };

    Ok(Router::new()
        .route("/health", get(health_handler))
        .route("/ingest", post(ingest_handler))
        .route("/images/delete", post(bulk_delete_handler))
        .with_state(state))
}
