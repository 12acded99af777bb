//! SurrealDB implementation of [`RoleStore`].
//!
//! Role tables use the identity itself as the record id, so membership
//! probes are single-record lookups and grant/revoke are naturally
//! idempotent (`UPSERT`/`DELETE`). The pending queue keeps FIFO order
//! through a monotonic `position` allocated from the shared counter
//! table.

use ricetrace_core::error::{RegistryError, RegistryResult};
use ricetrace_core::models::Identity;
use ricetrace_core::repository::RoleStore;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;
use crate::repository::CounterRow;

#[derive(Debug, SurrealValue)]
struct MemberRow {
    identity: String,
}

#[derive(Debug, SurrealValue)]
struct PendingRow {
    identity: String,
    #[allow(dead_code)]
    position: i64,
}

/// SurrealDB implementation of the role store.
#[derive(Clone)]
pub struct SurrealRoleStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn member_exists(
        &self,
        table: &'static str,
        identity: &Identity,
    ) -> RegistryResult<bool> {
        let query = format!("SELECT * FROM type::record('{table}', $identity)");
        let mut result = self
            .db
            .query(&query)
            .bind(("identity", identity.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }

    async fn grant(&self, table: &'static str, identity: &Identity) -> RegistryResult<()> {
        let query = format!("UPSERT type::record('{table}', $identity) SET identity = $identity");
        let result = self
            .db
            .query(&query)
            .bind(("identity", identity.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;
        Ok(())
    }

    async fn revoke(&self, table: &'static str, identity: &Identity) -> RegistryResult<()> {
        let query = format!("DELETE type::record('{table}', $identity)");
        let result = self
            .db
            .query(&query)
            .bind(("identity", identity.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Allocate the next FIFO position for the pending queue.
    async fn next_position(&self) -> RegistryResult<i64> {
        let mut result = self
            .db
            .query("UPSERT type::record('counter', 'pending') SET value += 1")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CounterRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::Corrupt("pending counter returned no record".into()))?;
        Ok(row.value)
    }
}

impl<C: Connection> RoleStore for SurrealRoleStore<C> {
    async fn is_farmer(&self, identity: &Identity) -> RegistryResult<bool> {
        self.member_exists("farmer", identity).await
    }

    async fn is_miller(&self, identity: &Identity) -> RegistryResult<bool> {
        self.member_exists("miller", identity).await
    }

    async fn is_pending(&self, identity: &Identity) -> RegistryResult<bool> {
        self.member_exists("pending_request", identity).await
    }

    async fn approve_farmer(&self, identity: &Identity) -> RegistryResult<()> {
        // Dequeue any pending request first so the "pending and approved
        // at once" state is never observable.
        let result = self
            .db
            .query("DELETE type::record('pending_request', $identity)")
            .query("UPSERT type::record('farmer', $identity) SET identity = $identity")
            .bind(("identity", identity.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;
        Ok(())
    }

    async fn revoke_farmer(&self, identity: &Identity) -> RegistryResult<()> {
        self.revoke("farmer", identity).await
    }

    async fn approve_miller(&self, identity: &Identity) -> RegistryResult<()> {
        self.grant("miller", identity).await
    }

    async fn revoke_miller(&self, identity: &Identity) -> RegistryResult<()> {
        self.revoke("miller", identity).await
    }

    async fn request_farmer_role(&self, identity: &Identity) -> RegistryResult<()> {
        if self.is_farmer(identity).await? {
            return Err(RegistryError::AlreadyApproved {
                identity: identity.clone(),
            });
        }
        if self.is_pending(identity).await? {
            return Err(RegistryError::RequestAlreadyPending {
                identity: identity.clone(),
            });
        }

        let position = self.next_position().await?;

        let result = self
            .db
            .query(
                "CREATE type::record('pending_request', $identity) SET \
                 identity = $identity, position = $position",
            )
            .bind(("identity", identity.as_str().to_string()))
            .bind(("position", position))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;
        Ok(())
    }

    async fn reject_farmer_request(&self, identity: &Identity) -> RegistryResult<()> {
        let mut result = self
            .db
            .query("DELETE type::record('pending_request', $identity) RETURN BEFORE")
            .bind(("identity", identity.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PendingRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(RegistryError::RequestNotFound {
                identity: identity.clone(),
            });
        }
        Ok(())
    }

    async fn list_pending_requests(&self) -> RegistryResult<Vec<Identity>> {
        let mut result = self
            .db
            .query("SELECT * FROM pending_request ORDER BY position ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PendingRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(|r| Identity::new(r.identity)).collect())
    }

    async fn list_farmers(&self) -> RegistryResult<Vec<Identity>> {
        let mut result = self
            .db
            .query("SELECT * FROM farmer ORDER BY identity ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(|r| Identity::new(r.identity)).collect())
    }
}
