// Shared fixtures for the integration tests. The VHS page and the webhook
// are both served by wiremock.

pub mod monitor_tests;
pub mod web_tests;

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use vhs_termin_watcher::{
    AppConfig, AppointmentMonitor, MonitorScheduler,
    web::AppState,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PAGE_PATH: &str = "/einbuergerungstest";
pub const HOOK_PATH: &str = "/workflows/notify";

/// Course listing with one bookable date (cart icon inside the row).
pub const AVAILABLE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="de">
<head><title>Einbürgerungstest | vhs Darmstadt</title></head>
<body>
  <nav><a href="/warenkorb" class="nav-link">Warenkorb</a></nav>
  <main>
    <h1>Einbürgerungstest</h1>
    <table class="course-list">
      <tr>
        <td>Termin Anmeldung</td>
        <td>Mo, 16.06.2025, 09:00 Uhr</td>
        <td><a href="/kurs/25-1234" title="In den Warenkorb"><i class="fa fa-shopping-cart"></i></a></td>
      </tr>
      <tr>
        <td>Termin Anmeldung</td>
        <td>Di, 17.06.2025, 09:00 Uhr</td>
        <td><span class="status">ausgebucht</span></td>
      </tr>
    </table>
  </main>
</body>
</html>"#;

/// Same listing with every date fully booked; the only cart is in the header.
pub const BOOKED_PAGE: &str = r#"<!DOCTYPE html>
<html lang="de">
<head><title>Einbürgerungstest | vhs Darmstadt</title></head>
<body>
  <header><i class="fa fa-shopping-cart"></i> Warenkorb (0)</header>
  <main>
    <div class="teaser">Anmeldung zum
      Einbürgerungstest: alle Termine sind derzeit ausgebucht.</div>
    <table class="course-list">
      <tr><td>Termin Anmeldung</td><td>Mo, 16.06.2025</td><td>ausgebucht</td></tr>
    </table>
  </main>
</body>
</html>"#;

/// Monday 10:00 in Berlin (summer time).
pub fn open_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap()
}

/// Wednesday 10:00 in Berlin.
pub fn closed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 4, 8, 0, 0).unwrap()
}

pub async fn start_page_server(body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PAGE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;
    server
}

/// Test configuration pointing at the mock servers.
pub fn get_test_config(page: &MockServer, webhook: Option<&MockServer>) -> AppConfig {
    let mut config = AppConfig::default();
    config.target.url = format!("{}{}", page.uri(), PAGE_PATH);
    config.target.request_timeout = 5;
    config.target.user_agent = "VhsTerminWatcher-Test/1.0".to_string();
    config.notifications.webhook.url = webhook.map(|server| format!("{}{}", server.uri(), HOOK_PATH));
    config.notifications.webhook.timeout = 5;
    config
}

pub async fn create_test_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let monitor = Arc::new(AppointmentMonitor::from_config(&config)?);
    let scheduler = MonitorScheduler::new(Arc::clone(&monitor), &config.schedule.cron).await?;

    Ok(AppState {
        monitor,
        scheduler: Arc::new(tokio::sync::Mutex::new(scheduler)),
        config,
    })
}
