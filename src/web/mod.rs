use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::AppConfig;
use crate::monitor::AppointmentMonitor;
use crate::scheduler::MonitorScheduler;

pub mod handlers;
pub mod responses;

pub use handlers::{check_appointments, get_job_info, health_check, pause_job, resume_job, run_job_now};
pub use responses::*;

#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<AppointmentMonitor>,
    pub scheduler: Arc<tokio::sync::Mutex<MonitorScheduler>>,
    pub config: AppConfig,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new().layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            ),
        )
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/vhs-monitor", get(check_appointments).post(check_appointments))
        .route("/scheduler/job", get(get_job_info))
        .route("/scheduler/job/pause", post(pause_job))
        .route("/scheduler/job/resume", post(resume_job))
        .route("/scheduler/job/run", post(run_job_now))
}

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server starting on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
