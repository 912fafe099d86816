//! Rollcall Server — application entry point.

use std::env;

use rollcall_db::repository::{SurrealAttendanceRepository, SurrealSessionRepository};
use rollcall_db::{DbConfig, DbManager};
use rollcall_service::config::ServiceConfig;
use rollcall_service::lifecycle::SessionService;
use rollcall_service::redemption::RedemptionEngine;
use rollcall_service::report::ReportService;
use tracing_subscriber::EnvFilter;

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("rollcall_db=info".parse().unwrap())
                .add_directive("rollcall_service=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting Rollcall server...");

    let db_config = DbConfig {
        url: env_or("ROLLCALL_DB_URL", "127.0.0.1:8000"),
        namespace: env_or("ROLLCALL_DB_NS", "rollcall"),
        database: env_or("ROLLCALL_DB_NAME", "main"),
        username: env_or("ROLLCALL_DB_USER", "root"),
        password: env_or("ROLLCALL_DB_PASS", "root"),
    };

    let manager = match DbManager::connect(&db_config).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!("Failed to connect to SurrealDB: {e}");
            return;
        }
    };

    if let Err(e) = rollcall_db::run_migrations(manager.client()).await {
        tracing::error!("Migration failed: {e}");
        return;
    }

    let service_config = ServiceConfig {
        session_ttl_secs: env_or("ROLLCALL_SESSION_TTL_SECS", "60")
            .parse()
            .unwrap_or(60),
        origin_check_enabled: env_or("ROLLCALL_ORIGIN_CHECK", "true") != "false",
    };

    let db = manager.client().clone();
    let _sessions = SessionService::new(
        SurrealSessionRepository::new(db.clone()),
        SurrealAttendanceRepository::new(db.clone()),
        service_config.clone(),
    );
    let _redemption = RedemptionEngine::new(
        SurrealSessionRepository::new(db.clone()),
        SurrealAttendanceRepository::new(db.clone()),
        service_config,
    );
    let _reports = ReportService::new(SurrealAttendanceRepository::new(db));

    tracing::info!("Rollcall services ready.");

    // TODO: Mount the HTTP transport (session, redemption, and report
    // routes) on the services above.

    tracing::info!("Rollcall server stopped.");
}
