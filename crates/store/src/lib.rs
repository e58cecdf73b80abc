//! Document store facade for the event log.
//!
//! The engine only needs three outcomes from a write: it landed, the key was
//! already taken, or something else went wrong. [`StoreError::DuplicateKey`]
//! is that middle outcome, reported structurally by every backend.

pub mod codec;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use codec::{decode, encode};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::{PgStore, PgStoreConfig};
pub use store::{collections, DocumentStore};
