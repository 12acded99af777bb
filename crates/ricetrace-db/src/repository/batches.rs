//! SurrealDB implementation of [`BatchStore`].
//!
//! Batch records are addressed by their sequential id. Every lifecycle
//! transition is a single guarded `UPDATE ... WHERE state = ...`
//! statement, so the guard check and the field mutation are atomic: of
//! two racing transitions on the same batch, the loser matches zero rows
//! and surfaces `InvalidTransition`.

use chrono::{DateTime, Utc};
use ricetrace_core::error::{RegistryError, RegistryResult};
use ricetrace_core::models::{Batch, BatchId, BatchState, Identity};
use ricetrace_core::repository::BatchStore;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;
use crate::repository::CounterRow;

#[derive(Debug, SurrealValue)]
struct BatchRow {
    batch_id: i64,
    variety: String,
    origin: String,
    is_organic: bool,
    farmer: String,
    miller: Option<String>,
    harvest_date: DateTime<Utc>,
    milling_date: Option<DateTime<Utc>>,
    image_ref: String,
    state: String,
}

impl BatchRow {
    fn try_into_batch(self) -> Result<Batch, DbError> {
        let id = u64::try_from(self.batch_id)
            .map_err(|_| DbError::Corrupt(format!("negative batch id: {}", self.batch_id)))?;
        Ok(Batch {
            id,
            variety: self.variety,
            origin: self.origin,
            is_organic: self.is_organic,
            farmer: Identity::new(self.farmer),
            miller: self.miller.map(Identity::new),
            harvest_date: self.harvest_date,
            milling_date: self.milling_date,
            image_ref: self.image_ref,
            state: parse_state(&self.state)?,
        })
    }
}

fn parse_state(s: &str) -> Result<BatchState, DbError> {
    match s {
        "Harvested" => Ok(BatchState::Harvested),
        "Processed" => Ok(BatchState::Processed),
        "Sold" => Ok(BatchState::Sold),
        "Deleted" => Ok(BatchState::Deleted),
        other => Err(DbError::Corrupt(format!("unknown batch state: {other}"))),
    }
}

fn state_to_string(s: BatchState) -> &'static str {
    match s {
        BatchState::Harvested => "Harvested",
        BatchState::Processed => "Processed",
        BatchState::Sold => "Sold",
        BatchState::Deleted => "Deleted",
    }
}

/// SurrealDB implementation of the batch store.
#[derive(Clone)]
pub struct SurrealBatchStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBatchStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Decode the outcome of a guarded transition.
    ///
    /// An empty result means the guard matched nothing: either the batch
    /// does not exist or its state disqualifies the transition. A
    /// follow-up read distinguishes the two.
    async fn resolve_transition(
        &self,
        id: BatchId,
        rows: Vec<BatchRow>,
        to: BatchState,
    ) -> RegistryResult<Batch> {
        match rows.into_iter().next() {
            Some(row) => Ok(row.try_into_batch()?),
            None => match self.get(id).await? {
                Some(batch) => Err(RegistryError::InvalidTransition {
                    id,
                    from: batch.state,
                    to,
                }),
                None => Err(RegistryError::NotFound { id }),
            },
        }
    }
}

impl<C: Connection> BatchStore for SurrealBatchStore<C> {
    async fn next_id(&self) -> RegistryResult<BatchId> {
        let mut result = self
            .db
            .query("UPSERT type::record('counter', 'batch') SET value += 1")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CounterRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::Corrupt("batch counter returned no record".into()))?;

        u64::try_from(row.value)
            .map_err(|_| DbError::Corrupt(format!("negative batch counter: {}", row.value)).into())
    }

    async fn insert(&self, batch: Batch) -> RegistryResult<Batch> {
        // Defensive: unreachable as long as ids come from `next_id`.
        if self.get(batch.id).await?.is_some() {
            return Err(RegistryError::DuplicateId { id: batch.id });
        }

        let id = batch.id;
        let result = self
            .db
            .query(
                "CREATE type::record('batch', $id) SET \
                 batch_id = $batch_id, \
                 variety = $variety, origin = $origin, \
                 is_organic = $is_organic, \
                 farmer = $farmer, miller = $miller, \
                 harvest_date = $harvest_date, \
                 milling_date = $milling_date, \
                 image_ref = $image_ref, state = $state",
            )
            .bind(("id", id.to_string()))
            .bind(("batch_id", batch.id as i64))
            .bind(("variety", batch.variety))
            .bind(("origin", batch.origin))
            .bind(("is_organic", batch.is_organic))
            .bind(("farmer", batch.farmer.into_string()))
            .bind(("miller", batch.miller.map(Identity::into_string)))
            .bind(("harvest_date", batch.harvest_date))
            .bind(("milling_date", batch.milling_date))
            .bind(("image_ref", batch.image_ref))
            .bind(("state", state_to_string(batch.state).to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<BatchRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::Corrupt(format!("insert of batch {id} returned no record")))?;

        Ok(row.try_into_batch()?)
    }

    async fn get(&self, id: BatchId) -> RegistryResult<Option<Batch>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('batch', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BatchRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_batch()?)),
            None => Ok(None),
        }
    }

    async fn mark_processed(
        &self,
        id: BatchId,
        miller: &Identity,
        image_ref: &str,
        milling_date: DateTime<Utc>,
    ) -> RegistryResult<Batch> {
        let result = self
            .db
            .query(
                "UPDATE type::record('batch', $id) SET \
                 miller = $miller, milling_date = $milling_date, \
                 image_ref = $image_ref, state = 'Processed' \
                 WHERE state = 'Harvested'",
            )
            .bind(("id", id.to_string()))
            .bind(("miller", miller.as_str().to_string()))
            .bind(("milling_date", milling_date))
            .bind(("image_ref", image_ref.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<BatchRow> = result.take(0).map_err(DbError::from)?;
        self.resolve_transition(id, rows, BatchState::Processed).await
    }

    async fn mark_sold(&self, id: BatchId) -> RegistryResult<Batch> {
        let result = self
            .db
            .query(
                "UPDATE type::record('batch', $id) SET state = 'Sold' \
                 WHERE state = 'Processed'",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<BatchRow> = result.take(0).map_err(DbError::from)?;
        self.resolve_transition(id, rows, BatchState::Sold).await
    }

    async fn mark_deleted(&self, id: BatchId) -> RegistryResult<Batch> {
        let result = self
            .db
            .query(
                "UPDATE type::record('batch', $id) SET state = 'Deleted' \
                 WHERE state != 'Deleted'",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<BatchRow> = result.take(0).map_err(DbError::from)?;
        self.resolve_transition(id, rows, BatchState::Deleted).await
    }

    async fn count(&self) -> RegistryResult<u64> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('counter', 'batch')")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CounterRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(u64::try_from(row.value).map_err(|_| {
                DbError::Corrupt(format!("negative batch counter: {}", row.value))
            })?),
            // Counter record appears on first allocation.
            None => Ok(0),
        }
    }

    async fn list_all(&self) -> RegistryResult<Vec<Batch>> {
        let mut result = self
            .db
            .query("SELECT * FROM batch ORDER BY batch_id ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BatchRow> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|r| r.try_into_batch().map_err(RegistryError::from))
            .collect()
    }
}
