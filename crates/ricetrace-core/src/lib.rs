//! RiceTrace Core — domain models, error types, events, and the store
//! traits shared by all registry crates.

pub mod error;
pub mod event;
pub mod models;
pub mod repository;

pub use error::{RegistryError, RegistryResult};
pub use event::RegistryEvent;
