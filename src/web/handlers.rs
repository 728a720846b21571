use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};

use super::{ApiFailure, ApiResponse, AppState};
use crate::models::CheckResult;
use crate::scheduler::JobInfo;

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "vhs-termin-watcher"
    }))
}

/// Manual check. Ignores the schedule window and never notifies.
pub async fn check_appointments(State(state): State<AppState>) -> (StatusCode, Json<CheckResult>) {
    tracing::info!("VHS Monitor HTTP trigger function processed a request");

    let result = state.monitor.check_now().await;
    let status = if result.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, Json(result))
}

pub async fn get_job_info(State(state): State<AppState>) -> Json<ApiResponse<JobInfo>> {
    let job = state.scheduler.lock().await.handle();
    Json(ApiResponse::success(job.get_job_info().await))
}

pub async fn pause_job(State(state): State<AppState>) -> Json<ApiResponse<JobInfo>> {
    let job = state.scheduler.lock().await.handle();
    job.pause_job().await;
    Json(ApiResponse::success(job.get_job_info().await))
}

pub async fn resume_job(State(state): State<AppState>) -> Json<ApiResponse<JobInfo>> {
    let job = state.scheduler.lock().await.handle();
    job.resume_job().await;
    Json(ApiResponse::success(job.get_job_info().await))
}

/// Immediate check through the scheduler, refused while another check is
/// running. The scheduler lock is released before the check starts.
pub async fn run_job_now(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CheckResult>>, ApiFailure> {
    let job = state.scheduler.lock().await.handle();

    match job.run_job_now().await {
        Ok(result) => Ok(Json(ApiResponse::success(result))),
        Err(crate::AppError::Validation(message)) => Err(ApiFailure::conflict(message)),
        Err(e) => {
            tracing::error!("Failed to run check: {}", e);
            Err(ApiFailure::internal("Failed to run check"))
        }
    }
}
