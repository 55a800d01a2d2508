//! m2p-reconcile
//!
//! Drift detection and re-synchronization of serial numbers between the MES
//! barcode registry and the PLUS inventory registry.
//!
//! Architectural decisions:
//! - Per production order: compare the upstream barcode set against the
//!   downstream imported set.
//! - Exact set equality means no drift: skip.
//! - Any received or shipped serial for the order freezes its imported set
//!   (movement lock): skip unconditionally.
//! - A repair is a full replace (delete-all + bulk insert) inside one write
//!   transaction, never a partial patch.
//! - A count mismatch between the two sides is a drift signal, not a skip.
//!
//! Database access goes through the [`UpstreamSource`] and
//! [`DownstreamStore`] traits so the engine runs unmodified against the
//! in-memory fakes in m2p-testkit.

mod config;
mod engine;
mod repo;
mod types;

pub use config::{local_now, SyncConfig};
pub use engine::SyncEngine;
pub use repo::{DownstreamStore, UpstreamSource};
pub use types::*;
