//! Error types for the RiceTrace registry.

use thiserror::Error;

use crate::models::{BatchId, BatchState, Identity};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("caller {identity} lacks the required role: {required}")]
    NotAuthorized {
        identity: Identity,
        required: &'static str,
    },

    #[error("batch {id} does not exist")]
    NotFound { id: BatchId },

    #[error("batch {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: BatchId,
        from: BatchState,
        to: BatchState,
    },

    #[error("{identity} is already an approved farmer")]
    AlreadyApproved { identity: Identity },

    #[error("{identity} already has a pending farmer request")]
    RequestAlreadyPending { identity: Identity },

    #[error("{identity} has no pending farmer request")]
    RequestNotFound { identity: Identity },

    /// Defensive: unreachable as long as ids come from `next_id`.
    #[error("batch id {id} is already present")]
    DuplicateId { id: BatchId },

    #[error("storage error: {0}")]
    Storage(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
