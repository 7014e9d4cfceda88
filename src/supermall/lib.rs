//! # Supermall Architecture
//!
//! Supermall is the **record store behind a mall storefront**: shops, products, offers,
//! categories and users, kept as JSON collections in a key-value backend. The store
//! can fill itself with a large synthetic catalog the first time it is opened, so a
//! fresh install has something to browse.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs, args.rs, render.rs)                          │
//! │  - Parses arguments, formats output, sets up tracing        │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs) / Catalog helpers (catalog.rs)          │
//! │  - Collection-name driven facade, uniform Response shape    │
//! │  - Storefront filtering, sorting and name lookups           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Record Store (store/record_store.rs) + Seeder (seed.rs)    │
//! │  - Typed CRUD, queries, stats, one-time demo data           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/backend.rs)                           │
//! │  - StorageBackend trait: string values under string keys   │
//! │  - FsBackend (production), MemBackend (testing)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code takes Rust arguments and returns Rust types. It never
//! prints, never exits the process, and reports diagnostics only through `tracing`.
//! Installing a subscriber is the binary's job.
//!
//! ## Testing Strategy
//!
//! - **Store and seeder**: unit tests against [`store::mem_backend::MemBackend`], which
//!   can also simulate write failures and a storage quota
//! - **Filesystem backend**: integration tests in `tests/` against temp directories
//! - **CLI**: end-to-end tests running the binary with `SUPERMALL_HOME` pointed at a
//!   temp directory

pub mod api;
pub mod applog;
pub mod catalog;
pub mod config;
pub mod error;
pub mod model;
pub mod seed;
pub mod store;
