//! # colmado-register: Register Session Layer for Colmado POS
//!
//! The stateful layer between a UI shell and the backend ledger: the active
//! cart, the sale commit pipeline, the print pipeline and the alert queue.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Colmado POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI Shell (out of scope)                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ colmado-register (THIS CRATE) ★                  │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌──────────────┐  │   │
//! │  │   │  session  │ │  commit   │ │   print   │ │    alerts    │  │   │
//! │  │   │  facade + │ │ validate→ │ │ dispatch, │ │ 5s TTL, non- │  │   │
//! │  │   │ cart owner│ │ submit→   │ │ warn-only │ │   blocking   │  │   │
//! │  │   │           │ │ complete  │ │ failures  │ │              │  │   │
//! │  │   └───────────┘ └───────────┘ └───────────┘ └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   services — async traits: CatalogService, SaleService,        │   │
//! │  │              PrintService (the backend/printer plug in here)   │   │
//! │  └──────────────┬──────────────────────────────┬───────────────────┘   │
//! │                 ▼                              ▼                       │
//! │           colmado-core                   colmado-sync                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! 1. **One commit at a time**: a second checkout while one is in flight is
//!    refused, never queued
//! 2. **Failure leaves the cart intact**: any failed commit returns the cart
//!    exactly as it was
//! 3. **Printing never fails a sale**: printer trouble is a warning alert
//! 4. **The backend owns sale identity**: success without a backend id is
//!    treated as failure

// =============================================================================
// Module Declarations
// =============================================================================

pub mod alerts;
pub mod commit;
pub mod config;
pub mod error;
pub mod print;
pub mod services;
pub mod session;
pub mod telemetry;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use alerts::{Alert, AlertQueue, AlertSeverity, DEFAULT_ALERT_TTL};
pub use commit::{CommitPhase, CommitRequest, SaleCommitCoordinator, SharedCart};
pub use config::RegisterConfig;
pub use error::{RegisterError, RegisterResult};
pub use print::PrintOrchestrator;
pub use services::{
    CatalogService, CreateSaleOutcome, PrintOutcome, PrintService, SaleService, ServiceError,
};
pub use session::RegisterSession;
pub use telemetry::init_tracing;
