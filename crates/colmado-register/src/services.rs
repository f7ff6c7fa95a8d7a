//! # Service Seams
//!
//! Async traits the external collaborators plug into: the catalog backend,
//! the sale ledger and the print service. The register never talks to a
//! database or a printer directly — tests plug stubs into these same seams.
//!
//! ## Trust Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Service Seams                                    │
//! │                                                                         │
//! │   colmado-register                      external world                  │
//! │   ────────────────                      ──────────────                  │
//! │                                                                         │
//! │   CatalogService  ◄── trait ──►  product/category/customer listings     │
//! │   SaleService     ◄── trait ──►  the ledger (single source of truth     │
//! │                                  for sale identity and stock)           │
//! │   PrintService    ◄── trait ──►  thermal printer + cash drawer          │
//! │                                                                         │
//! │   SaleService failures are Results; PrintService failures are           │
//! │   outcomes — a dead printer must never fail a committed sale.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use colmado_core::types::{Category, Customer, Product, Sale};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Service Error
// =============================================================================

/// Failure of an external service call.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service answered with an application-level rejection.
    #[error("{0}")]
    Backend(String),

    /// The call never got a proper answer (timeout, connection refused, ...).
    #[error("{0}")]
    Transport(String),
}

// =============================================================================
// Catalog Service
// =============================================================================

/// Read access to the backend catalog.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, ServiceError>;
    async fn list_categories(&self) -> Result<Vec<Category>, ServiceError>;
    async fn list_customers(&self) -> Result<Vec<Customer>, ServiceError>;
}

// =============================================================================
// Sale Service
// =============================================================================

/// Outcome of a `create_sale` call, as reported by the backend.
///
/// `success = false` carries the rejection in `error`; `updated_stock` (when
/// present) holds authoritative post-sale stock levels keyed by product id
/// and is preferred over local arithmetic when rebroadcasting stock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleOutcome {
    pub success: bool,
    /// Backend-assigned sale id. Required on success.
    pub id: Option<String>,
    /// Rejection reason, surfaced to the user verbatim.
    pub error: Option<String>,
    /// Non-fatal notes (e.g. "stock went negative"), surfaced as warnings.
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Authoritative stock levels after this sale, keyed by product id.
    #[serde(default)]
    pub updated_stock: Option<HashMap<String, i64>>,
}

/// The backend sale ledger.
#[async_trait]
pub trait SaleService: Send + Sync {
    /// Submits a sale. Called exactly once per commit attempt.
    async fn create_sale(&self, sale: &Sale) -> Result<CreateSaleOutcome, ServiceError>;

    /// Lists the most recent sales, newest first.
    async fn get_sales(&self, limit: u32) -> Result<Vec<Sale>, ServiceError>;

    /// Fetches one sale with its lines.
    async fn get_sale_details(&self, sale_id: &str) -> Result<Sale, ServiceError>;

    /// Cancels a completed sale.
    async fn cancel_sale(&self, sale_id: &str) -> Result<(), ServiceError>;
}

// =============================================================================
// Print Service
// =============================================================================

/// Result of a print/drawer operation.
///
/// Deliberately NOT a `Result`: printer failures are expected operational
/// noise, reported and retried manually, never propagated as errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl PrintOutcome {
    pub fn ok() -> Self {
        PrintOutcome {
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        PrintOutcome {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// The thermal printer and attached cash drawer.
#[async_trait]
pub trait PrintService: Send + Sync {
    async fn print_invoice(&self, sale: &Sale) -> PrintOutcome;
    async fn print_label(&self, product: &Product) -> PrintOutcome;
    async fn print_barcode(&self, text: &str) -> PrintOutcome;
    async fn print_qr(&self, text: &str) -> PrintOutcome;
    async fn test_printer(&self) -> PrintOutcome;
    async fn open_cash_drawer(&self) -> PrintOutcome;
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sale_outcome_tolerates_minimal_json() {
        // A backend that only reports success/id must still parse.
        let outcome: CreateSaleOutcome =
            serde_json::from_str(r#"{"success":true,"id":"sale-9"}"#).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.id.as_deref(), Some("sale-9"));
        assert!(outcome.warnings.is_empty());
        assert!(outcome.updated_stock.is_none());
    }

    #[test]
    fn test_create_sale_outcome_updated_stock() {
        let outcome: CreateSaleOutcome = serde_json::from_str(
            r#"{"success":true,"id":"sale-9","updatedStock":{"p1":4}}"#,
        )
        .unwrap();
        assert_eq!(outcome.updated_stock.unwrap().get("p1"), Some(&4));
    }
}
