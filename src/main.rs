//! OrgHub attendance backend
//!
//! Main application entry point

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::{error, info, warn};

use OrgHub::{
    config::Settings,
    database::{connection::{create_pool, run_migrations, DatabaseConfig}, DatabaseService},
    services::ServiceFactory,
    utils::{clock::SystemClock, logging},
};

const USAGE: &str = "usage: OrgHub [serve | migrate | health | stats | summary <session_id> | refresh-qr <session_id>]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    settings.validate()?;

    // Initialize logging; the guard flushes the file writer on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("serve");

    info!("Starting {}...", OrgHub::info());

    // Initialize database connection
    info!("Connecting to database...");
    let db_pool = create_pool(&DatabaseConfig::from(&settings.database)).await?;

    if settings.database.run_migrations || command == "migrate" {
        run_migrations(&db_pool).await?;
    }
    if command == "migrate" {
        return Ok(());
    }

    let database_service = DatabaseService::new(db_pool);

    info!("Initializing services...");
    let services = ServiceFactory::new(settings.clone(), database_service, Arc::new(SystemClock))?;

    match command {
        "serve" => serve(services).await,
        "health" => {
            let status = services.health_check().await;
            if !status.is_healthy() {
                for issue in status.get_issues() {
                    error!(issue = %issue, "Health check issue");
                }
                bail!("unhealthy: {}", status.get_issues().join(", "));
            }
            println!("ok");
            Ok(())
        }
        "stats" => {
            let stats = services.database().get_system_stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        "summary" => {
            let session_id = session_id_arg(&args)?;
            let summary = services.attendance_service.session_summary(session_id).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        "refresh-qr" => {
            let session_id = session_id_arg(&args)?;
            let session = services.session_service.refresh_qr_token(session_id).await?;
            println!("{}", session.qr_token_code.unwrap_or_default());
            Ok(())
        }
        other => bail!("unknown command `{}`\n{}", other, USAGE),
    }
}

/// Keep the pool and services alive until interrupted
async fn serve(services: ServiceFactory) -> anyhow::Result<()> {
    let status = services.health_check().await;
    if !status.is_healthy() {
        warn!(issues = ?status.get_issues(), "Starting with unhealthy services");
    }

    info!("OrgHub attendance core is ready");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    services.database().pool().close().await;
    info!("OrgHub has been shut down.");
    Ok(())
}

fn session_id_arg(args: &[String]) -> anyhow::Result<i64> {
    let raw = args.get(1).with_context(|| USAGE.to_string())?;
    raw.parse::<i64>()
        .with_context(|| format!("invalid session id `{}`", raw))
}
