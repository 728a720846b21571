use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use tower::ServiceExt;
use vhs_termin_watcher::web::create_router;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

async fn send(app: axum::Router, method: Method, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_manual_endpoint_reports_availability() -> anyhow::Result<()> {
    let page = start_page_server(AVAILABLE_PAGE).await;
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&webhook)
        .await;
    let app = create_router(create_test_app_state(get_test_config(&page, Some(&webhook))).await?);

    let (status, json) = send(app, Method::POST, "/api/vhs-monitor").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["appointments_available"], true);
    assert_eq!(json["status"], "success");
    assert_eq!(json["candidate_sections"], 2);
    assert!(json.get("notification_sent").is_none());
    Ok(())
}

#[tokio::test]
async fn test_manual_endpoint_reports_fetch_failure() -> anyhow::Result<()> {
    let page = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&page)
        .await;
    let app = create_router(create_test_app_state(get_test_config(&page, None)).await?);

    let (status, json) = send(app, Method::GET, "/api/vhs-monitor").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["status"], "error");
    assert_eq!(json["appointments_available"], false);
    assert!(json["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_job_endpoint_reflects_manual_runs() -> anyhow::Result<()> {
    let page = start_page_server(BOOKED_PAGE).await;
    let state = create_test_app_state(get_test_config(&page, None)).await?;
    let app = create_router(state);

    let (status, json) = send(app.clone(), Method::POST, "/api/scheduler/job/run").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["appointments_available"], false);

    // Manual runs bypass the scheduled statistics.
    let (_, json) = send(app, Method::GET, "/api/scheduler/job").await;
    assert_eq!(json["data"]["run_count"], 0);
    assert_eq!(json["data"]["status"], "active");
    Ok(())
}

#[tokio::test]
async fn test_health_endpoint() -> anyhow::Result<()> {
    let page = start_page_server(BOOKED_PAGE).await;
    let app = create_router(create_test_app_state(get_test_config(&page, None)).await?);

    let (status, json) = send(app, Method::GET, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["service"], "vhs-termin-watcher");
    Ok(())
}
