//! RiceTrace Registry — the service layer enforcing role checks and the
//! batch lifecycle state machine, and publishing change notifications.

pub mod config;
pub mod events;
pub mod service;

pub use config::RegistryConfig;
pub use events::EventBus;
pub use service::RegistryService;
