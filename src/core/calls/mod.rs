// Anonymous calls between two text channels.
// Registry = state, CallService = call/hangup/skip, RelayRouter = message forwarding.

pub mod call_service;
pub mod calls_models;
pub mod pairing_registry;
pub mod relay_router;

#[cfg(test)]
pub mod fake_platform;

pub use call_service::{CallError, CallPlatform, CallService, PlatformError};
pub use calls_models::*;
pub use pairing_registry::{PairingRegistry, RegistryError};
pub use relay_router::RelayRouter;
