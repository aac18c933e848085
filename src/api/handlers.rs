//! HTTP request handlers

use super::assets::{get_index_html, serve_static};
use super::sse::sse_stream;
use super::types::{
    CalculateResponse, CreateSessionResponse, ErrorResponse, HealthResponse, InputRequest,
    QueuedResponse, SessionViewResponse, SuccessResponse,
};
use super::AppState;
use crate::arith::{self, ArithError, Operator};
use crate::runtime::SessionError;
use crate::state_machine::Event;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{Map, Value};

/// Fields a calculation request must carry, in validation order
const REQUIRED_FIELDS: [&str; 3] = ["num1", "operator", "num2"];

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Root serves the calculator page
        .route("/", get(serve_page))
        // Static assets
        .route("/assets/*path", get(serve_static))
        // Arithmetic endpoint
        .route("/api/calculate", post(calculate))
        .route("/api/health", get(health_check))
        // Calculator sessions
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/input", post(send_input))
        .route("/api/sessions/:id/stream", get(stream_session))
        .route("/api/sessions/:id/close", post(close_session))
        .fallback(not_found)
        .with_state(state)
}

async fn serve_page() -> impl IntoResponse {
    match get_index_html() {
        Some(content) => Html(content).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - UI not found</h1>".to_string()),
        )
            .into_response(),
    }
}

// ============================================================
// Arithmetic Endpoint
// ============================================================

async fn calculate(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CalculateResponse>, AppError> {
    let result = evaluate_request(payload);
    if let Err(error) = &result {
        tracing::warn!(error = %error.message(), "Calculation rejected");
    }
    result.map(Json)
}

fn evaluate_request(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<CalculateResponse, AppError> {
    let fields = match payload {
        Ok(Json(Value::Object(fields))) if !fields.is_empty() => fields,
        _ => return Err(AppError::bad_request("no_data", "No data provided")),
    };

    for field in REQUIRED_FIELDS {
        if !fields.contains_key(field) {
            return Err(AppError::bad_request(
                "missing_field",
                format!("Missing required field: {field}"),
            ));
        }
    }

    let lhs = operand(&fields, "num1")?;
    let rhs = operand(&fields, "num2")?;
    let operator = match &fields["operator"] {
        Value::String(symbol) => Operator::parse(symbol)?,
        other => return Err(ArithError::InvalidOperator(other.to_string()).into()),
    };

    let result = arith::calculate(lhs, operator, rhs)?;
    tracing::info!(%lhs, operator = %operator, %rhs, %result, "Calculation");

    CalculateResponse::from_value(result)
        .ok_or_else(|| AppError::Internal("Result could not be encoded".to_string()))
}

/// Numbers may arrive as JSON numbers or numeric strings
fn operand(fields: &Map<String, Value>, name: &str) -> Result<f64, ArithError> {
    match &fields[name] {
        Value::Number(n) => n.as_f64().ok_or(ArithError::InvalidNumber),
        Value::String(s) => arith::parse_operand(s),
        _ => Err(ArithError::InvalidNumber),
    }
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "Calculator API is running",
    })
}

async fn not_found() -> AppError {
    AppError::NotFound("Endpoint not found".to_string())
}

// ============================================================
// Calculator Sessions
// ============================================================

async fn create_session(State(state): State<AppState>) -> Json<CreateSessionResponse> {
    let (session_id, view) = state.sessions.create().await;
    Json(CreateSessionResponse { session_id, view })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionViewResponse>, AppError> {
    let view = state.sessions.snapshot(&id).await?;
    Ok(Json(SessionViewResponse { view }))
}

async fn send_input(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<InputRequest>, JsonRejection>,
) -> Result<Json<QueuedResponse>, AppError> {
    let Json(req) =
        payload.map_err(|rejection| AppError::bad_request("invalid_request", rejection.body_text()))?;
    let event = Event::from_key(&req.key)
        .ok_or_else(|| AppError::bad_request("invalid_key", format!("Unknown key: {}", req.key)))?;
    state.sessions.send_event(&id, event).await?;
    Ok(Json(QueuedResponse { queued: true }))
}

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (view, broadcast_rx) = state.sessions.subscribe(&id).await?;
    Ok(sse_stream(view, broadcast_rx))
}

async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.sessions.close(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest { code: &'static str, message: String },
    NotFound(String),
    Internal(String),
}

impl AppError {
    fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        AppError::BadRequest {
            code,
            message: message.into(),
        }
    }

    fn message(&self) -> &str {
        match self {
            AppError::BadRequest { message, .. } => message,
            AppError::NotFound(msg) | AppError::Internal(msg) => msg,
        }
    }
}

impl From<ArithError> for AppError {
    fn from(e: ArithError) -> Self {
        AppError::bad_request(e.code(), e.to_string())
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::NotFound(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new(code, message))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::new("not_found", msg)),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("internal", msg),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
