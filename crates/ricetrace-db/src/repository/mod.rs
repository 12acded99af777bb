//! SurrealDB store implementations.

use surrealdb_types::SurrealValue;

mod batches;
mod roles;

pub use batches::SurrealBatchStore;
pub use roles::SurrealRoleStore;

/// Row shape of the shared `counter` table (one record per counter
/// name; batch ids and pending-queue positions both draw from it).
#[derive(Debug, SurrealValue)]
pub(crate) struct CounterRow {
    pub(crate) value: i64,
}
