//! Batch domain model and lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::identity::Identity;

/// Sequential batch identifier, assigned from 1. Id `0` is never issued;
/// lookups of unknown ids yield `None` rather than a sentinel record.
pub type BatchId = u64;

/// Lifecycle state of a batch.
///
/// The registry models a physical supply chain, so transitions are
/// one-way: rice cannot un-harvest or un-process. `Deleted` is reachable
/// from every other state (recall/correction) and is terminal; the record
/// itself is retained for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchState {
    Harvested,
    Processed,
    Sold,
    Deleted,
}

impl BatchState {
    /// Whether the lifecycle permits moving from `self` to `next`.
    pub fn can_transition_to(self, next: BatchState) -> bool {
        use BatchState::*;
        matches!(
            (self, next),
            (Harvested, Processed)
                | (Processed, Sold)
                | (Harvested, Deleted)
                | (Processed, Deleted)
                | (Sold, Deleted)
        )
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BatchState::Harvested => "Harvested",
            BatchState::Processed => "Processed",
            BatchState::Sold => "Sold",
            BatchState::Deleted => "Deleted",
        };
        f.write_str(s)
    }
}

/// One traceable unit of harvested rice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    /// Cultivar name, e.g. "ST25".
    pub variety: String,
    /// Growing region.
    pub origin: String,
    pub is_organic: bool,
    /// Identity of the creating farmer; immutable after creation.
    pub farmer: Identity,
    /// Set exactly once, when the batch is processed.
    pub miller: Option<Identity>,
    pub harvest_date: DateTime<Utc>,
    /// Set exactly once, alongside `miller`.
    pub milling_date: Option<DateTime<Utc>>,
    /// Opaque product image reference (URL or embedded content); the
    /// registry accepts it without validating the format.
    pub image_ref: String,
    pub state: BatchState,
}

/// Input for batch creation. Id, farmer, dates, and state are assigned
/// by the registry, not the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBatch {
    pub variety: String,
    pub origin: String,
    pub is_organic: bool,
    pub image_ref: String,
}

#[cfg(test)]
mod tests {
    use super::BatchState::*;

    #[test]
    fn forward_transitions_allowed() {
        assert!(Harvested.can_transition_to(Processed));
        assert!(Processed.can_transition_to(Sold));
    }

    #[test]
    fn backward_transitions_forbidden() {
        assert!(!Processed.can_transition_to(Harvested));
        assert!(!Sold.can_transition_to(Processed));
        assert!(!Sold.can_transition_to(Harvested));
    }

    #[test]
    fn deletion_reachable_from_every_live_state() {
        assert!(Harvested.can_transition_to(Deleted));
        assert!(Processed.can_transition_to(Deleted));
        assert!(Sold.can_transition_to(Deleted));
    }

    #[test]
    fn deleted_is_terminal() {
        assert!(!Deleted.can_transition_to(Harvested));
        assert!(!Deleted.can_transition_to(Processed));
        assert!(!Deleted.can_transition_to(Sold));
        assert!(!Deleted.can_transition_to(Deleted));
    }

    #[test]
    fn no_state_skipping() {
        assert!(!Harvested.can_transition_to(Sold));
    }
}
