//! Folio domain core.
//!
//! Holds the lock coordination rules, the document snapshot/diff engine, and
//! the storage traits both sit on. This crate has no internal dependencies so
//! the persistence layer, the HTTP layer, and tests all share one definition
//! of lock expiry and snapshot semantics.

pub mod clock;
pub mod diff;
pub mod document;
pub mod error;
pub mod lock_manager;
pub mod locking;
pub mod memory;
pub mod snapshot;
pub mod store;
pub mod types;
pub mod version_engine;
