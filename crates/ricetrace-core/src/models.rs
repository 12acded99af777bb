//! Domain models for the batch registry.
//!
//! These are the core types shared across all crates.

pub mod batch;
pub mod identity;
pub mod role;

pub use batch::{Batch, BatchId, BatchState, CreateBatch};
pub use identity::Identity;
pub use role::Role;
