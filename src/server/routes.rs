use crate::core::{Pipeline, ProcessRequest, ProcessedArtifacts};
use crate::server::state::AppState;
use crate::utils::error::AppError;
use crate::utils::validation::Validate;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

pub fn build_router<P: Pipeline + 'static>(state: AppState<P>) -> Router {
    Router::new()
        .route("/process-audio", post(process_audio::<P>))
        .route("/health", get(health_check::<P>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `POST /process-audio`: download, analyze, adjust, transcribe, upload.
async fn process_audio<P: Pipeline + 'static>(
    State(state): State<AppState<P>>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<ProcessedArtifacts>, ApiError> {
    request.validate()?;

    let _permit = state
        .jobs
        .acquire()
        .await
        .map_err(|_| AppError::ProcessingError {
            message: "job queue closed".to_string(),
        })?;

    let result = state.engine.run(&request).await?;
    Ok(Json(result))
}

async fn health_check<P: Pipeline + 'static>(
    State(state): State<AppState<P>>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}

/// HTTP mapping for pipeline failures: source download problems are the
/// caller's 400, request-shape problems are 422, the rest is a 500.
pub struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::DownloadError { .. } | AppError::TooLargeError { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::ValidationError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(
                "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
                self.0,
                self.0.category(),
                self.0.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", self.0.recovery_suggestion());
        } else {
            tracing::warn!("Request rejected with {}: {}", status, self.0);
        }

        let body = Json(serde_json::json!({
            "error": self.0.user_friendly_message(),
        }));
        (status, body).into_response()
    }
}
