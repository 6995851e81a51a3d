use std::path::Path;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::analyze::{Analyzer, Outcome};
use crate::auth;
use crate::config::DemoLogin;
use crate::model::{AnalysisResponse, AnalysisStatus, LoginRequest, LoginResponse, Query};

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub demo_login: Option<Arc<DemoLogin>>,
}

impl AppState {
    pub fn new(analyzer: Analyzer, demo_login: Option<DemoLogin>) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            demo_login: demo_login.map(Arc::new),
        }
    }
}

pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .route("/login", post(login))
        .route_service("/login.html", ServeFile::new(static_dir.join("login.html")))
        .route_service("/app.html", ServeFile::new(static_dir.join("app.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn home() -> Json<Value> {
    Json(json!({ "message": "Law Line API is Running!" }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "categories": state.analyzer.knowledge().len(),
    }))
}

async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<Query>, JsonRejection>,
) -> (StatusCode, Json<AnalysisResponse>) {
    let Json(query) = match payload {
        Ok(q) => q,
        Err(rejection) => {
            warn!(error = %rejection, "rejected analyze request");
            return (
                StatusCode::BAD_REQUEST,
                Json(AnalysisResponse::error(format!(
                    "Invalid request: {}",
                    rejection.body_text()
                ))),
            );
        }
    };

    let outcome = state.analyzer.analyze(&query).await;
    let status = match outcome {
        Outcome::Failed => StatusCode::BAD_GATEWAY,
        _ => StatusCode::OK,
    };
    (status, Json(outcome.into_response()))
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> (StatusCode, Json<LoginResponse>) {
    let Json(req) = match payload {
        Ok(r) => r,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(LoginResponse {
                    status: AnalysisStatus::Error,
                    token: None,
                    message: Some(format!("Invalid request: {}", rejection.body_text())),
                }),
            );
        }
    };

    match auth::check_login(state.demo_login.as_deref(), &req.username, &req.password) {
        Some(token) => {
            info!(username = %req.username, "demo login accepted");
            (
                StatusCode::OK,
                Json(LoginResponse {
                    status: AnalysisStatus::Success,
                    token: Some(token),
                    message: None,
                }),
            )
        }
        None => {
            info!(username = %req.username, "demo login refused");
            (
                StatusCode::UNAUTHORIZED,
                Json(LoginResponse {
                    status: AnalysisStatus::Error,
                    token: None,
                    message: Some("Invalid credentials".to_string()),
                }),
            )
        }
    }
}
