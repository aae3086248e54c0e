//! Request handlers for contacts and sync operations.

mod contacts;
mod sync;

pub use contacts::*;
pub use sync::*;
