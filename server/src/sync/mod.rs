//! Sync between the local store and the remote directory.

mod orchestrator;
mod paginator;
mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use orchestrator::{SyncOrchestrator, SyncSettings};
