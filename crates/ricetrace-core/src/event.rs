//! Change notifications emitted by the registry.
//!
//! Delivery is best-effort: subscribers that miss an event reconcile by
//! re-querying, so every payload carries only enough to know what to
//! re-fetch.

use serde::{Deserialize, Serialize};

use crate::models::{BatchId, BatchState, Identity, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    BatchCreated {
        id: BatchId,
    },
    BatchStateChanged {
        id: BatchId,
        from: BatchState,
        to: BatchState,
    },
    RoleChanged {
        identity: Identity,
        role: Role,
        granted: bool,
    },
}
