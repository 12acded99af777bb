//! Registry configuration.

use ricetrace_core::models::Identity;

/// Configuration for the registry service.
///
/// The administrator identity is fixed here, at construction time; the
/// core offers no runtime reassignment (ownership transfer is out of
/// scope).
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// The single administrator identity.
    pub administrator: Identity,
    /// Buffered capacity of the notification channel. Slow subscribers
    /// past this lag are dropped and must reconcile by re-querying.
    pub event_capacity: usize,
}

impl RegistryConfig {
    pub fn new(administrator: Identity) -> Self {
        Self {
            administrator,
            event_capacity: 64,
        }
    }
}
