//! Connection handling for the registry's SurrealDB backend.
//!
//! Two ways in: [`DbManager::connect`] reaches a running server over
//! WebSocket (the deployment path), [`DbManager::embedded`] boots a
//! fresh in-memory instance with the schema already applied (the test
//! path; every suite in this workspace runs on it).

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::schema::run_migrations;

/// Connection settings for a remote SurrealDB server.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket endpoint, host and port only (e.g. `127.0.0.1:8000`).
    pub url: String,
    /// Namespace the registry lives in.
    pub namespace: String,
    /// Database name within the namespace.
    pub database: String,
    /// Root username.
    pub username: String,
    /// Root password.
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "ricetrace".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

/// Owns a SurrealDB handle for the registry stores.
///
/// Generic over the engine so the same stores run against a remote
/// server in production and the embedded engine in tests.
#[derive(Clone)]
pub struct DbManager<C: surrealdb::Connection> {
    db: Surreal<C>,
}

impl DbManager<Client> {
    /// Open a WebSocket connection to a running SurrealDB server,
    /// authenticate as root, and select the configured namespace and
    /// database. Migrations are not applied here; the caller decides
    /// when ([`run_migrations`]).
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            endpoint = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "opening SurrealDB connection"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;

        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!("registry database reachable");

        Ok(Self { db })
    }
}

impl DbManager<Db> {
    /// Boot an embedded in-memory instance and apply the registry
    /// schema. State lives only as long as the handle; each call yields
    /// an isolated registry.
    pub async fn embedded() -> Result<Self, DbError> {
        let db = Surreal::new::<Mem>(()).await?;
        db.use_ns("ricetrace").use_db("main").await?;
        run_migrations(&db).await?;
        Ok(Self { db })
    }
}

impl<C: surrealdb::Connection> DbManager<C> {
    /// Access the underlying SurrealDB handle.
    pub fn client(&self) -> &Surreal<C> {
        &self.db
    }
}
