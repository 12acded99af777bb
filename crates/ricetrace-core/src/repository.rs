//! Store trait definitions for data access abstraction.
//!
//! All store operations are async. Authorization is deliberately absent
//! here: the stores record membership and batch state, the registry
//! service enforces who may call what (separation of policy from
//! storage).

use chrono::{DateTime, Utc};

use crate::error::RegistryResult;
use crate::models::{Batch, BatchId, Identity};

/// Source of truth for "who may act as what".
pub trait RoleStore: Send + Sync {
    fn is_farmer(&self, identity: &Identity) -> impl Future<Output = RegistryResult<bool>> + Send;

    fn is_miller(&self, identity: &Identity) -> impl Future<Output = RegistryResult<bool>> + Send;

    /// Whether `identity` currently sits in the pending farmer queue.
    fn is_pending(&self, identity: &Identity) -> impl Future<Output = RegistryResult<bool>> + Send;

    /// Idempotent add to the farmer set. Also removes `identity` from the
    /// pending queue if present; no error when it was never pending (the
    /// administrator may grant directly, without a prior request).
    fn approve_farmer(&self, identity: &Identity)
    -> impl Future<Output = RegistryResult<()>> + Send;

    /// Idempotent removal from the farmer set.
    fn revoke_farmer(&self, identity: &Identity) -> impl Future<Output = RegistryResult<()>> + Send;

    /// Idempotent add to the miller set.
    fn approve_miller(&self, identity: &Identity)
    -> impl Future<Output = RegistryResult<()>> + Send;

    /// Idempotent removal from the miller set.
    fn revoke_miller(&self, identity: &Identity) -> impl Future<Output = RegistryResult<()>> + Send;

    /// Appends `identity` to the pending farmer queue.
    ///
    /// Fails with `AlreadyApproved` if the identity is already a farmer
    /// and `RequestAlreadyPending` if it is already queued.
    fn request_farmer_role(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = RegistryResult<()>> + Send;

    /// Drops a pending request without approving it. Fails with
    /// `RequestNotFound` if the identity is not queued.
    fn reject_farmer_request(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = RegistryResult<()>> + Send;

    /// Pending queue snapshot, oldest request first.
    fn list_pending_requests(&self) -> impl Future<Output = RegistryResult<Vec<Identity>>> + Send;

    fn list_farmers(&self) -> impl Future<Output = RegistryResult<Vec<Identity>>> + Send;
}

/// Durable record of all batches ever created. Records are never
/// physically removed; retirement is a state transition.
pub trait BatchStore: Send + Sync {
    /// Returns the next unused sequential id and advances the counter.
    /// Atomic under concurrency; ids are never reused.
    fn next_id(&self) -> impl Future<Output = RegistryResult<BatchId>> + Send;

    /// Stores a new batch under its pre-assigned id. Fails with
    /// `DuplicateId` if the id is already present (defensive; unreachable
    /// under `next_id` discipline).
    fn insert(&self, batch: Batch) -> impl Future<Output = RegistryResult<Batch>> + Send;

    /// `None` for id `0` and any id never issued; absence is probeable,
    /// not an error.
    fn get(&self, id: BatchId) -> impl Future<Output = RegistryResult<Option<Batch>>> + Send;

    /// Harvested → Processed. The state guard and the field updates are
    /// applied in one atomic statement; a concurrent transition loses
    /// with `InvalidTransition`.
    fn mark_processed(
        &self,
        id: BatchId,
        miller: &Identity,
        image_ref: &str,
        milling_date: DateTime<Utc>,
    ) -> impl Future<Output = RegistryResult<Batch>> + Send;

    /// Processed → Sold, atomically guarded.
    fn mark_sold(&self, id: BatchId) -> impl Future<Output = RegistryResult<Batch>> + Send;

    /// Any non-deleted state → Deleted, atomically guarded. All other
    /// fields are retained for audit.
    fn mark_deleted(&self, id: BatchId) -> impl Future<Output = RegistryResult<Batch>> + Send;

    /// Number of batches ever created, retired ones included.
    fn count(&self) -> impl Future<Output = RegistryResult<u64>> + Send;

    /// All batches in ascending id order.
    fn list_all(&self) -> impl Future<Output = RegistryResult<Vec<Batch>>> + Send;
}
