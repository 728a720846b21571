use std::sync::Arc;
use vhs_termin_watcher::{AppointmentMonitor, CheckStatus, MonitorScheduler, TickOutcome};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

async fn webhook_server(status: u16, expected_calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .and(body_partial_json(serde_json::json!({
            "appointments_available": true,
            "status": "success"
        })))
        .respond_with(ResponseTemplate::new(status))
        .expect(expected_calls)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_scheduled_run_notifies_webhook() -> anyhow::Result<()> {
    let page = start_page_server(AVAILABLE_PAGE).await;
    let webhook = webhook_server(202, 1).await;
    let monitor = AppointmentMonitor::from_config(&get_test_config(&page, Some(&webhook)))?;

    let outcome = monitor.run_scheduled(open_time()).await;

    let TickOutcome::Checked(result) = outcome else {
        panic!("expected a check inside the window");
    };
    assert!(result.appointments_available);
    assert_eq!(result.notification_sent, Some(true));
    // Berlin local time, CET or CEST
    assert!([3600, 7200].contains(&result.timestamp.offset().local_minus_utc()));
    Ok(())
}

#[tokio::test]
async fn test_booked_page_sends_nothing() -> anyhow::Result<()> {
    let page = start_page_server(BOOKED_PAGE).await;
    let webhook = webhook_server(202, 0).await;
    let monitor = AppointmentMonitor::from_config(&get_test_config(&page, Some(&webhook)))?;

    let TickOutcome::Checked(result) = monitor.run_scheduled(open_time()).await else {
        panic!("expected a check inside the window");
    };
    assert!(!result.appointments_available);
    assert_eq!(result.status, CheckStatus::Success);
    assert!(result.notification_sent.is_none());
    Ok(())
}

#[tokio::test]
async fn test_outside_window_does_not_fetch() -> anyhow::Result<()> {
    let page = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(AVAILABLE_PAGE))
        .expect(0)
        .mount(&page)
        .await;
    let webhook = webhook_server(202, 0).await;
    let monitor = AppointmentMonitor::from_config(&get_test_config(&page, Some(&webhook)))?;

    let outcome = monitor.run_scheduled(closed_time()).await;

    assert!(matches!(outcome, TickOutcome::OutsideWindow));
    Ok(())
}

#[tokio::test]
async fn test_webhook_failure_is_recorded() -> anyhow::Result<()> {
    let page = start_page_server(AVAILABLE_PAGE).await;
    let webhook = webhook_server(500, 1).await;
    let monitor = AppointmentMonitor::from_config(&get_test_config(&page, Some(&webhook)))?;

    let TickOutcome::Checked(result) = monitor.run_scheduled(open_time()).await else {
        panic!("expected a check inside the window");
    };
    assert!(result.appointments_available);
    assert_eq!(result.notification_sent, Some(false));
    Ok(())
}

#[tokio::test]
async fn test_missing_webhook_url_skips_notification() -> anyhow::Result<()> {
    let page = start_page_server(AVAILABLE_PAGE).await;
    let monitor = AppointmentMonitor::from_config(&get_test_config(&page, None))?;

    let TickOutcome::Checked(result) = monitor.run_scheduled(open_time()).await else {
        panic!("expected a check inside the window");
    };
    assert!(result.appointments_available);
    assert_eq!(result.notification_sent, Some(false));
    Ok(())
}

#[tokio::test]
async fn test_page_server_error_becomes_error_result() -> anyhow::Result<()> {
    let page = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&page)
        .await;
    let webhook = webhook_server(202, 0).await;
    let monitor = AppointmentMonitor::from_config(&get_test_config(&page, Some(&webhook)))?;

    let result = monitor.check_now().await;

    assert_eq!(result.status, CheckStatus::Error);
    assert!(!result.appointments_available);
    assert!(result.error.unwrap().contains("503"));
    Ok(())
}

#[tokio::test]
async fn test_manual_check_never_notifies() -> anyhow::Result<()> {
    let page = start_page_server(AVAILABLE_PAGE).await;
    let webhook = webhook_server(202, 0).await;
    let monitor = AppointmentMonitor::from_config(&get_test_config(&page, Some(&webhook)))?;

    let result = monitor.check_now().await;

    assert!(result.appointments_available);
    assert!(result.notification_sent.is_none());
    Ok(())
}

#[tokio::test]
async fn test_scheduler_tick_tracks_statistics() -> anyhow::Result<()> {
    let page = start_page_server(AVAILABLE_PAGE).await;
    let webhook = webhook_server(200, 1).await;
    let config = get_test_config(&page, Some(&webhook));
    let monitor = Arc::new(AppointmentMonitor::from_config(&config)?);
    let scheduler = MonitorScheduler::new(monitor, &config.schedule.cron).await?;

    scheduler.tick(closed_time()).await;
    scheduler.tick(open_time()).await;

    let job = scheduler.get_job_info().await;
    assert_eq!(job.run_count, 2);
    assert_eq!(job.skipped_count, 1);
    assert_eq!(job.success_count, 1);
    assert_eq!(job.notifications_sent, 1);
    Ok(())
}
