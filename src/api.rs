//! REST API for the portfolio Q&A gateway
//!
//! `GET /` liveness banner, `GET /health` configuration presence,
//! `POST /ask` question answering.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::config::ConfiguredStores;
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::models::{QuestionAnswer, VisualizationKind};

/// =============================
/// Request / Response Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// A missing field is treated like a blank question
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct VisualizationData {
    #[serde(rename = "type")]
    pub kind: VisualizationKind,
    pub query: String,
    pub query_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub processing_time: String,
    pub visualization_data: Option<VisualizationData>,
}

impl From<QuestionAnswer> for AskResponse {
    fn from(exchange: QuestionAnswer) -> Self {
        let processing_time = exchange.processing_time();
        let query_type = exchange
            .domain
            .map(|d| d.store_tag().to_string())
            .unwrap_or_default();

        let visualization_data = exchange.visualization.map(|kind| VisualizationData {
            kind,
            query: exchange.question.clone(),
            query_type,
        });

        Self {
            answer: exchange.answer,
            processing_time,
            visualization_data,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

/// Maps gateway failures onto HTTP statuses
pub struct ApiError(GatewayError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            GatewayError::InvalidQuestion => (StatusCode::BAD_REQUEST, self.0.to_string()),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal server error: {}", other),
            ),
        };
        (status, Json(ErrorDetail { detail })).into_response()
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub gateway: Arc<Gateway>,
    pub configured: ConfiguredStores,
}

/// =============================
/// Handlers
/// =============================

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Portfolio Q&A Gateway API",
        "status": "running"
    }))
}

async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "openai_configured": state.configured.openai,
        "mongodb_configured": state.configured.mongodb,
        "mysql_configured": state.configured.mysql,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn ask(
    State(state): State<ApiState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    info!("Received question: {}", req.question);

    match state.gateway.ask(&req.question).await {
        Ok(exchange) => Ok(Json(exchange.into())),
        Err(e) => {
            if !matches!(e, GatewayError::InvalidQuestion) {
                error!(error = %e, "Unexpected error answering question");
            }
            Err(ApiError(e))
        }
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(gateway: Arc<Gateway>, configured: ConfiguredStores) -> Router {
    let state = ApiState { gateway, configured };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ask", post(ask))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    gateway: Arc<Gateway>,
    configured: ConfiguredStores,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(gateway, configured);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
