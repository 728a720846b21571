use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use vhs_termin_watcher::{
    AppConfig, AppointmentMonitor, AvailabilityDetector, CheckResult, MonitorScheduler,
    web::{self, AppState},
};

#[derive(Parser)]
#[command(name = "vhs-termin-watcher", version, about = "Watches the VHS Darmstadt page for open citizenship test appointments")]
struct Cli {
    /// Configuration file, layered over the built-in defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check the page once and print the result
    Check,
    /// Run the scheduled monitor and the HTTP endpoints until Ctrl-C
    Serve,
    /// Run the detector on a saved HTML file
    Detect { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let directive = if cli.verbose {
        "vhs_termin_watcher=debug"
    } else {
        "vhs_termin_watcher=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?))
        .init();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::from_env(),
    }
    .context("Failed to load configuration")?;

    match cli.command {
        Command::Check => check(&config).await,
        Command::Serve => serve(config).await,
        Command::Detect { file } => detect(&config, &file),
    }
}

async fn check(config: &AppConfig) -> Result<()> {
    let monitor = AppointmentMonitor::from_config(config)?;
    let result = monitor.check_now().await;

    print_summary(&result);
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.is_success() {
        anyhow::bail!("check failed");
    }
    Ok(())
}

fn print_summary(result: &CheckResult) {
    match (&result.error, result.appointments_available) {
        (Some(error), _) => println!("Check failed: {}", error),
        (None, true) => println!(
            "Appointments available ({} candidate sections, {} markers)",
            result.candidate_sections, result.markers
        ),
        (None, false) => println!(
            "No appointments available ({} candidate sections)",
            result.candidate_sections
        ),
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    info!("Starting VHS termin watcher...");

    let monitor = Arc::new(AppointmentMonitor::from_config(&config)?);
    let mut scheduler = MonitorScheduler::new(Arc::clone(&monitor), &config.schedule.cron).await?;
    scheduler.start().await?;

    let scheduler = Arc::new(tokio::sync::Mutex::new(scheduler));
    let state = AppState {
        monitor,
        scheduler: Arc::clone(&scheduler),
        config,
    };

    web::serve(state).await?;

    info!("Shutting down...");
    scheduler.lock().await.shutdown().await?;
    Ok(())
}

fn detect(config: &AppConfig, file: &Path) -> Result<()> {
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let verdict = AvailabilityDetector::from_config(&config.detector).detect(&html);

    println!(
        "available: {}\ncandidate sections: {}\nmarkers: {}\nmarker kind: {:?}",
        verdict.available, verdict.candidate_sections, verdict.markers, verdict.marker_kind
    );
    Ok(())
}
