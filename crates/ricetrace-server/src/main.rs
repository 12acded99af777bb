//! RiceTrace Server — application entry point.
//!
//! Bootstraps the registry: structured logging, database connection,
//! migrations, service construction. Exposing the service over a
//! transport is left to the deployment; this binary keeps the registry
//! alive until interrupted.

use ricetrace_core::models::Identity;
use ricetrace_db::{DbConfig, DbManager, SurrealBatchStore, SurrealRoleStore};
use ricetrace_registry::{RegistryConfig, RegistryService};
use tracing_subscriber::EnvFilter;

/// Read configuration from the environment, falling back to defaults
/// suitable for local development.
fn db_config_from_env() -> DbConfig {
    let defaults = DbConfig::default();
    DbConfig {
        url: std::env::var("RICETRACE_DB_URL").unwrap_or(defaults.url),
        namespace: std::env::var("RICETRACE_DB_NS").unwrap_or(defaults.namespace),
        database: std::env::var("RICETRACE_DB_NAME").unwrap_or(defaults.database),
        username: std::env::var("RICETRACE_DB_USER").unwrap_or(defaults.username),
        password: std::env::var("RICETRACE_DB_PASS").unwrap_or(defaults.password),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("ricetrace=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting RiceTrace registry server...");

    let administrator = match std::env::var("RICETRACE_ADMIN") {
        Ok(value) if !value.is_empty() => Identity::new(value),
        _ => {
            tracing::error!("RICETRACE_ADMIN must be set to the administrator identity");
            std::process::exit(1);
        }
    };

    let db_config = db_config_from_env();
    let manager = match DbManager::connect(&db_config).await {
        Ok(manager) => manager,
        Err(err) => {
            tracing::error!(error = %err, "failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(err) = ricetrace_db::run_migrations(manager.client()).await {
        tracing::error!(error = %err, "failed to run migrations");
        std::process::exit(1);
    }

    let db = manager.client().clone();
    let _service = RegistryService::new(
        RegistryConfig::new(administrator),
        SurrealBatchStore::new(db.clone()),
        SurrealRoleStore::new(db),
    );

    tracing::info!("Registry ready; press ctrl-c to stop");

    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }

    tracing::info!("RiceTrace registry server stopped.");
}
