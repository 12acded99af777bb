//! Registry service — role enforcement and lifecycle orchestration.
//!
//! Every mutation resolves the caller's role first, then applies the
//! transition through the stores, then publishes one notification.
//! Reads are public and go straight to the stores.

use chrono::Utc;
use ricetrace_core::RegistryEvent;
use ricetrace_core::error::{RegistryError, RegistryResult};
use ricetrace_core::models::{Batch, BatchId, BatchState, CreateBatch, Identity, Role};
use ricetrace_core::repository::{BatchStore, RoleStore};
use tokio::sync::{Mutex, broadcast};
use tracing::info;

use crate::config::RegistryConfig;
use crate::events::EventBus;

/// The registry service.
///
/// Holds no batch or role state of its own; everything lives in the
/// stores so any state is re-derivable by querying.
pub struct RegistryService<B: BatchStore, R: RoleStore> {
    administrator: Identity,
    batches: B,
    roles: R,
    events: EventBus,
    /// Serializes role-set mutations so concurrent updates to the
    /// pending queue are never lost. Batch transitions do not take this
    /// lock; they rely on the store's per-record guards.
    role_gate: Mutex<()>,
}

impl<B: BatchStore, R: RoleStore> RegistryService<B, R> {
    pub fn new(config: RegistryConfig, batches: B, roles: R) -> Self {
        Self {
            administrator: config.administrator,
            batches,
            roles,
            events: EventBus::new(config.event_capacity),
            role_gate: Mutex::new(()),
        }
    }

    /// Subscribe to change notifications. Best-effort; see [`EventBus`].
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    // -------------------------------------------------------------------
    // Queries (public, no role checks)
    // -------------------------------------------------------------------

    pub fn is_administrator(&self, identity: &Identity) -> bool {
        *identity == self.administrator
    }

    pub async fn is_farmer(&self, identity: &Identity) -> RegistryResult<bool> {
        self.roles.is_farmer(identity).await
    }

    pub async fn is_miller(&self, identity: &Identity) -> RegistryResult<bool> {
        self.roles.is_miller(identity).await
    }

    pub async fn is_pending(&self, identity: &Identity) -> RegistryResult<bool> {
        self.roles.is_pending(identity).await
    }

    /// `None` for id `0` and any id never issued, so callers can probe
    /// safely while polling.
    pub async fn get_batch(&self, id: BatchId) -> RegistryResult<Option<Batch>> {
        self.batches.get(id).await
    }

    /// Number of batches ever created, retired ones included.
    pub async fn count(&self) -> RegistryResult<u64> {
        self.batches.count().await
    }

    pub async fn list_batches(&self) -> RegistryResult<Vec<Batch>> {
        self.batches.list_all().await
    }

    pub async fn list_farmers(&self) -> RegistryResult<Vec<Identity>> {
        self.roles.list_farmers().await
    }

    /// Pending farmer requests, oldest first.
    pub async fn list_pending_requests(&self) -> RegistryResult<Vec<Identity>> {
        self.roles.list_pending_requests().await
    }

    // -------------------------------------------------------------------
    // Batch lifecycle commands
    // -------------------------------------------------------------------

    /// Create a new batch in `Harvested` state. Farmer-only.
    pub async fn create_batch(
        &self,
        caller: &Identity,
        input: CreateBatch,
    ) -> RegistryResult<Batch> {
        if !self.roles.is_farmer(caller).await? {
            return Err(RegistryError::NotAuthorized {
                identity: caller.clone(),
                required: "farmer",
            });
        }

        let id = self.batches.next_id().await?;
        let batch = Batch {
            id,
            variety: input.variety,
            origin: input.origin,
            is_organic: input.is_organic,
            farmer: caller.clone(),
            miller: None,
            harvest_date: Utc::now(),
            milling_date: None,
            image_ref: input.image_ref,
            state: BatchState::Harvested,
        };
        let batch = self.batches.insert(batch).await?;

        info!(id = batch.id, farmer = %caller, "batch created");
        self.events.publish(RegistryEvent::BatchCreated { id: batch.id });
        Ok(batch)
    }

    /// Advance a `Harvested` batch to `Processed`. Miller-only; the
    /// caller becomes the batch's assigned miller and the image
    /// reference is replaced with the processed product's.
    pub async fn process_batch(
        &self,
        caller: &Identity,
        id: BatchId,
        image_ref: &str,
    ) -> RegistryResult<Batch> {
        if !self.roles.is_miller(caller).await? {
            return Err(RegistryError::NotAuthorized {
                identity: caller.clone(),
                required: "miller",
            });
        }

        let batch = self
            .batches
            .mark_processed(id, caller, image_ref, Utc::now())
            .await?;

        info!(id, miller = %caller, "batch processed");
        self.events.publish(RegistryEvent::BatchStateChanged {
            id,
            from: BatchState::Harvested,
            to: BatchState::Processed,
        });
        Ok(batch)
    }

    /// Mark a `Processed` batch as `Sold`. Allowed for the administrator
    /// or the batch's assigned miller.
    pub async fn mark_sold(&self, caller: &Identity, id: BatchId) -> RegistryResult<Batch> {
        let batch = self
            .batches
            .get(id)
            .await?
            .ok_or(RegistryError::NotFound { id })?;

        // The assigned miller only exists once the batch is processed;
        // until then, non-administrators cannot be authorized.
        let authorized =
            self.is_administrator(caller) || batch.miller.as_ref() == Some(caller);
        if !authorized {
            return Err(RegistryError::NotAuthorized {
                identity: caller.clone(),
                required: "administrator or assigned miller",
            });
        }
        if !batch.state.can_transition_to(BatchState::Sold) {
            return Err(RegistryError::InvalidTransition {
                id,
                from: batch.state,
                to: BatchState::Sold,
            });
        }

        // The store re-checks the guard atomically; a concurrent
        // transition between the read above and here still loses cleanly.
        let batch = self.batches.mark_sold(id).await?;

        info!(id, caller = %caller, "batch sold");
        self.events.publish(RegistryEvent::BatchStateChanged {
            id,
            from: BatchState::Processed,
            to: BatchState::Sold,
        });
        Ok(batch)
    }

    /// Retire a batch from any non-deleted state. Allowed for the
    /// administrator or the batch's creating farmer. The record is
    /// retained for audit; only the state changes.
    pub async fn delete_batch(&self, caller: &Identity, id: BatchId) -> RegistryResult<Batch> {
        let batch = self
            .batches
            .get(id)
            .await?
            .ok_or(RegistryError::NotFound { id })?;

        let authorized = self.is_administrator(caller) || batch.farmer == *caller;
        if !authorized {
            return Err(RegistryError::NotAuthorized {
                identity: caller.clone(),
                required: "administrator or batch farmer",
            });
        }
        if !batch.state.can_transition_to(BatchState::Deleted) {
            return Err(RegistryError::InvalidTransition {
                id,
                from: batch.state,
                to: BatchState::Deleted,
            });
        }

        let from = batch.state;
        let batch = self.batches.mark_deleted(id).await?;

        info!(id, caller = %caller, "batch deleted");
        self.events.publish(RegistryEvent::BatchStateChanged {
            id,
            from,
            to: BatchState::Deleted,
        });
        Ok(batch)
    }

    // -------------------------------------------------------------------
    // Role commands
    // -------------------------------------------------------------------

    /// Self-service: queue the caller for farmer approval.
    pub async fn request_farmer_role(&self, caller: &Identity) -> RegistryResult<()> {
        let _guard = self.role_gate.lock().await;
        self.roles.request_farmer_role(caller).await?;

        info!(identity = %caller, "farmer role requested");
        Ok(())
    }

    /// Approve a pending farmer request. Administrator-only. Also valid
    /// when the target never requested (a direct grant).
    pub async fn approve_farmer_request(
        &self,
        caller: &Identity,
        target: &Identity,
    ) -> RegistryResult<()> {
        self.grant_farmer(caller, target).await
    }

    /// Drop a pending request without approving it. Administrator-only.
    pub async fn reject_farmer_request(
        &self,
        caller: &Identity,
        target: &Identity,
    ) -> RegistryResult<()> {
        self.require_administrator(caller)?;

        let _guard = self.role_gate.lock().await;
        self.roles.reject_farmer_request(target).await?;

        info!(identity = %target, "farmer request rejected");
        Ok(())
    }

    /// Grant the farmer role directly. Administrator-only.
    pub async fn add_farmer(&self, caller: &Identity, target: &Identity) -> RegistryResult<()> {
        self.grant_farmer(caller, target).await
    }

    /// Revoke the farmer role. Administrator-only, idempotent.
    pub async fn remove_farmer(&self, caller: &Identity, target: &Identity) -> RegistryResult<()> {
        self.require_administrator(caller)?;

        let _guard = self.role_gate.lock().await;
        self.roles.revoke_farmer(target).await?;

        info!(identity = %target, "farmer role revoked");
        self.events.publish(RegistryEvent::RoleChanged {
            identity: target.clone(),
            role: Role::Farmer,
            granted: false,
        });
        Ok(())
    }

    /// Grant the miller role. Administrator-only, idempotent.
    pub async fn add_miller(&self, caller: &Identity, target: &Identity) -> RegistryResult<()> {
        self.require_administrator(caller)?;

        let _guard = self.role_gate.lock().await;
        self.roles.approve_miller(target).await?;

        info!(identity = %target, "miller role granted");
        self.events.publish(RegistryEvent::RoleChanged {
            identity: target.clone(),
            role: Role::Miller,
            granted: true,
        });
        Ok(())
    }

    /// Revoke the miller role. Administrator-only, idempotent.
    pub async fn remove_miller(&self, caller: &Identity, target: &Identity) -> RegistryResult<()> {
        self.require_administrator(caller)?;

        let _guard = self.role_gate.lock().await;
        self.roles.revoke_miller(target).await?;

        info!(identity = %target, "miller role revoked");
        self.events.publish(RegistryEvent::RoleChanged {
            identity: target.clone(),
            role: Role::Miller,
            granted: false,
        });
        Ok(())
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    fn require_administrator(&self, caller: &Identity) -> RegistryResult<()> {
        if self.is_administrator(caller) {
            Ok(())
        } else {
            Err(RegistryError::NotAuthorized {
                identity: caller.clone(),
                required: "administrator",
            })
        }
    }

    async fn grant_farmer(&self, caller: &Identity, target: &Identity) -> RegistryResult<()> {
        self.require_administrator(caller)?;

        let _guard = self.role_gate.lock().await;
        self.roles.approve_farmer(target).await?;

        info!(identity = %target, "farmer role granted");
        self.events.publish(RegistryEvent::RoleChanged {
            identity: target.clone(),
            role: Role::Farmer,
            granted: true,
        });
        Ok(())
    }
}
