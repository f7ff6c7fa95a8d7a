//! # Print Orchestrator
//!
//! Dispatches print jobs to the printer seam and decides what happens on
//! failure: nothing fatal, ever.
//!
//! ## Failure Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Print Failure Policy                              │
//! │                                                                         │
//! │   job ──► payload check ──► PrintService ──► success ──► (invoice only) │
//! │                │                   │                     open drawer    │
//! │                │ empty payload     │ printer error       if configured  │
//! │                ▼                   ▼                                    │
//! │          Warning alert,      Warning alert,                             │
//! │          job NOT dispatched  sale stays Completed                       │
//! │                                                                         │
//! │  A sale that printed nothing is still a sale. Retry is MANUAL: the      │
//! │  cashier re-triggers the job from the alert; nothing retries on its     │
//! │  own against a printer that may be mid-jam.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use colmado_core::types::{Product, Sale};
use tracing::{debug, warn};

use crate::alerts::AlertQueue;
use crate::services::PrintService;

// =============================================================================
// Orchestrator
// =============================================================================

/// Print pipeline for one register session.
pub struct PrintOrchestrator {
    printer: Arc<dyn PrintService>,
    alerts: AlertQueue,
    open_drawer_after_invoice: bool,
}

impl PrintOrchestrator {
    pub fn new(
        printer: Arc<dyn PrintService>,
        alerts: AlertQueue,
        open_drawer_after_invoice: bool,
    ) -> Self {
        PrintOrchestrator {
            printer,
            alerts,
            open_drawer_after_invoice,
        }
    }

    /// Prints the invoice for a completed sale.
    ///
    /// Returns whether the print succeeded. On success the cash drawer opens
    /// if configured; a failed print never opens the drawer and never touches
    /// the sale.
    pub async fn print_invoice(&self, sale: &Sale) -> bool {
        let sale_id = sale.id.as_deref().unwrap_or("-");
        debug!(sale_id, "Printing invoice");

        let outcome = self.printer.print_invoice(sale).await;
        if !outcome.success {
            self.report_failure("Invoice print failed", outcome.error);
            return false;
        }

        if self.open_drawer_after_invoice {
            let drawer = self.printer.open_cash_drawer().await;
            if !drawer.success {
                self.report_failure("Cash drawer did not open", drawer.error);
            }
        }
        true
    }

    /// Prints a shelf label for a product. An unnamed product is refused
    /// before dispatch.
    pub async fn print_label(&self, product: &Product) -> bool {
        if product.name.trim().is_empty() {
            self.alerts
                .warning("Nothing to print: product has no name");
            return false;
        }
        let outcome = self.printer.print_label(product).await;
        if !outcome.success {
            self.report_failure("Label print failed", outcome.error);
            return false;
        }
        true
    }

    /// Prints a barcode. An empty payload is refused before dispatch.
    pub async fn print_barcode(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            self.alerts.warning("Nothing to print: barcode text is empty");
            return false;
        }
        let outcome = self.printer.print_barcode(text).await;
        if !outcome.success {
            self.report_failure("Barcode print failed", outcome.error);
            return false;
        }
        true
    }

    /// Prints a QR code. An empty payload is refused before dispatch.
    pub async fn print_qr(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            self.alerts.warning("Nothing to print: QR text is empty");
            return false;
        }
        let outcome = self.printer.print_qr(text).await;
        if !outcome.success {
            self.report_failure("QR print failed", outcome.error);
            return false;
        }
        true
    }

    /// Runs the printer self-test page.
    pub async fn test_printer(&self) -> bool {
        let outcome = self.printer.test_printer().await;
        if !outcome.success {
            self.report_failure("Printer test failed", outcome.error);
            return false;
        }
        self.alerts.info("Printer test page sent");
        true
    }

    /// Opens the cash drawer on demand (no-sale open).
    pub async fn open_cash_drawer(&self) -> bool {
        let outcome = self.printer.open_cash_drawer().await;
        if !outcome.success {
            self.report_failure("Cash drawer did not open", outcome.error);
            return false;
        }
        true
    }

    fn report_failure(&self, what: &str, detail: Option<String>) {
        let message = match detail {
            Some(detail) => format!("{}: {}", what, detail),
            None => what.to_string(),
        };
        warn!(%message, "Print pipeline failure");
        self.alerts.warning(message);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
