//! `EngineRegistry`: durable, restart-surviving record of each engine's
//! last-known health, so `EngineManager::StartAll` can tell which engines
//! were running before a process restart.

pub mod error;
pub mod registry;

pub use error::{RegistryError, RegistryResult};
pub use registry::EngineRegistry;
