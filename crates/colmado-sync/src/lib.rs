//! # Colmado POS Sync
//!
//! Cross-view synchronization for the Colmado POS application.
//!
//! Several register windows can be open over the same catalog at once. This
//! crate keeps them loosely consistent: every state change is rebroadcast on
//! a process-wide bus, and each view folds foreign events into its own
//! [`CatalogCache`] under a last-writer-wins policy.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        colmado-sync                                     │
//! │                                                                         │
//! │   bus.rs      SyncBus / BusEndpoint — broadcast fan-out with            │
//! │               per-view origin ids and channel filtering                 │
//! │   event.rs    SyncEvent — channel + action + JSON payload               │
//! │   catalog.rs  CatalogCache — LWW product/stock view, dedup by id,       │
//! │               3s freshness highlights                                   │
//! │   error.rs    SyncError                                                 │
//! │                                                                         │
//! │  Guarantees are deliberately weak: no ordering, no exactly-once.        │
//! │  Consumers are idempotent and converge via absolute values.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod bus;
pub mod catalog;
pub mod error;
pub mod event;

pub use bus::{BusEndpoint, SyncBus, SyncHandler, DEFAULT_BUS_CAPACITY};
pub use catalog::{CatalogCache, FRESHNESS_TTL};
pub use error::{SyncError, SyncResult};
pub use event::{Action, Channel, SaleCreatedPayload, SoldItem, StockSetPayload, SyncEvent};
