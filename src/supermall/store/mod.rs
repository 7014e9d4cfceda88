//! # Storage Layer
//!
//! The store is split the same way at every level: *what* is stored is decided by
//! [`RecordStore`], *how* it is stored is decided by a [`StorageBackend`].
//!
//! ## Backends
//!
//! A backend is a flat key-value medium holding whole JSON documents:
//!
//! - [`fs_backend::FsBackend`]: production, one `<key>.json` file per key, atomic
//!   tmp-then-rename writes.
//! - [`mem_backend::MemBackend`]: testing, with optional byte quota and write-error
//!   simulation.
//!
//! ## Keys
//!
//! ```text
//! shops, products, offers, categories, users   JSON array of records, insertion order
//! demoDataSeeded_v1                            seed sentinel ("true")
//! appLogs                                      capped application log (see applog.rs)
//! ```
//!
//! ## Write Model
//!
//! Every mutation (create, update, delete) loads the full collection, changes it in
//! memory and writes the whole collection back. There are no partial or delta writes,
//! which is fine at the scale this store targets (hundreds to low thousands of records
//! per collection). A rejected write leaves the previously persisted collection intact.
//!
//! ## Not-Found Semantics
//!
//! | operation     | missing id                         |
//! |---------------|------------------------------------|
//! | `read`        | `Ok(None)`                         |
//! | `delete`      | `Ok(())`, idempotent               |
//! | `update`      | `Err(StoreError::NotFound)`        |
//!
//! Existing callers rely on this asymmetry; keep it.

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;
pub mod patch;
pub mod query;
pub mod record_store;
pub mod stats;

pub use backend::StorageBackend;
pub use patch::Patch;
pub use query::{Filter, Predicate};
pub use record_store::{RecordStore, SEED_SENTINEL_KEY};
pub use stats::StoreStats;
