//! # Sale Commit Coordinator
//!
//! Turns the active cart into an immutable sale owned by the backend ledger.
//!
//! ## Commit Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Commit Pipeline                              │
//! │                                                                         │
//! │   Draft ──► Validating ──► Submitting ──► Completed                     │
//! │                 │               │             │                         │
//! │                 │ local rule    │ rejected /  ├── clear cart            │
//! │                 │ fails         │ transport / ├── rebroadcast stock     │
//! │                 ▼               │ missing id  ├── announce sale         │
//! │               Failed ◄──────────┘             └── warnings → alerts     │
//! │                 │                                                       │
//! │                 └──► back to Draft: the cart is left EXACTLY as it      │
//! │                      was (same lines, quantities, discount, notes)      │
//! │                      so the cashier can retry or hand-edit              │
//! │                                                                         │
//! │  Contracts:                                                             │
//! │  • exactly ONE create_sale call per attempt, ONE attempt at a time      │
//! │  • the backend assigns the sale id; success without an id is failure    │
//! │  • backend rejection messages reach the cashier verbatim                │
//! │  • stock rebroadcast prefers the backend's authoritative figures,       │
//! │    falling back to max(0, cached − qty) when the backend sends none     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use colmado_core::cart::Cart;
use colmado_core::money::Money;
use colmado_core::types::{PaymentMethod, Sale, SaleStatus};
use colmado_core::validation::validate_for_commit;
use colmado_sync::{BusEndpoint, CatalogCache, SaleCreatedPayload, SoldItem, SyncEvent};
use tracing::{debug, info, warn};

use crate::alerts::AlertQueue;
use crate::error::{RegisterError, RegisterResult};
use crate::services::SaleService;

// =============================================================================
// Shared Cart
// =============================================================================

/// The session's cart behind a mutex. The coordinator holds the lock only
/// for snapshot/clear, never across an await point.
pub type SharedCart = Arc<Mutex<Cart>>;

pub(crate) fn lock_cart(cart: &SharedCart) -> MutexGuard<'_, Cart> {
    match cart.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// =============================================================================
// Commit Phase
// =============================================================================

/// Where a commit attempt currently is, for logging and the shell's
/// busy indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPhase {
    Draft,
    Validating,
    Submitting,
    Completed,
    Failed,
}

impl CommitPhase {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CommitPhase::Draft => "draft",
            CommitPhase::Validating => "validating",
            CommitPhase::Submitting => "submitting",
            CommitPhase::Completed => "completed",
            CommitPhase::Failed => "failed",
        }
    }
}

// =============================================================================
// Commit Request
// =============================================================================

/// Everything the cashier chose at tender time.
#[derive(Debug, Clone)]
pub struct CommitRequest {
    pub payment_method: PaymentMethod,
    /// Amount tendered. Only meaningful for Cash; ignored otherwise.
    pub amount_received: Money,
    pub customer_id: Option<String>,
}

// =============================================================================
// Coordinator
// =============================================================================

/// Drives the commit pipeline for one register session.
pub struct SaleCommitCoordinator {
    sales: Arc<dyn SaleService>,
    cache: CatalogCache,
    alerts: AlertQueue,
    endpoint: BusEndpoint,
    in_flight: Arc<AtomicBool>,
}

/// Resets the in-flight flag on every exit path.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SaleCommitCoordinator {
    pub fn new(
        sales: Arc<dyn SaleService>,
        cache: CatalogCache,
        alerts: AlertQueue,
        endpoint: BusEndpoint,
    ) -> Self {
        SaleCommitCoordinator {
            sales,
            cache,
            alerts,
            endpoint,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a commit attempt is currently running.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Commits the cart as a sale.
    ///
    /// On success the cart is cleared and the completed sale returned. On
    /// ANY failure the cart is left exactly as it was and the reason is
    /// pushed to the alert queue.
    pub async fn commit(&self, cart: &SharedCart, request: CommitRequest) -> RegisterResult<Sale> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Commit refused: another attempt is in flight");
            return Err(RegisterError::CommitInFlight);
        }
        let _guard = InFlightGuard(Arc::clone(&self.in_flight));

        debug!(phase = CommitPhase::Validating.as_str(), "Committing sale");
        let sale = {
            let cart = lock_cart(cart);
            validate_for_commit(&cart)?;
            build_sale(&cart, &request)
        };

        debug!(
            phase = CommitPhase::Submitting.as_str(),
            total_cents = sale.total_cents,
            lines = sale.lines.len(),
            "Submitting sale to backend"
        );
        let outcome = match self.sales.create_sale(&sale).await {
            Ok(outcome) => outcome,
            Err(err) => {
                let err: RegisterError = err.into();
                self.alerts.error(err.to_string());
                return Err(err);
            }
        };

        if !outcome.success {
            // The backend's reason reaches the cashier verbatim.
            let message = outcome
                .error
                .unwrap_or_else(|| "Sale rejected with no reason given".to_string());
            self.alerts.error(message.clone());
            return Err(RegisterError::Rejected(message));
        }

        let id = match outcome.id {
            Some(id) => id,
            None => {
                let err = RegisterError::MissingSaleId;
                self.alerts.error(err.to_string());
                return Err(err);
            }
        };

        let mut sale = sale;
        sale.id = Some(id.clone());
        sale.status = SaleStatus::Completed;

        // The sale is terminal from here on; only now does the cart reset.
        lock_cart(cart).clear();

        for warning in &outcome.warnings {
            self.alerts.warning(warning.clone());
        }

        self.propagate_stock(&sale, outcome.updated_stock.as_ref());
        self.announce_sale(&sale);

        info!(
            phase = CommitPhase::Completed.as_str(),
            sale_id = %id,
            total_cents = sale.total_cents,
            "Sale committed"
        );
        self.alerts.info(format!("Sale {} completed", id));

        Ok(sale)
    }

    /// Rebroadcasts post-sale stock for every sold line.
    fn propagate_stock(&self, sale: &Sale, authoritative: Option<&HashMap<String, i64>>) {
        for line in &sale.lines {
            let stock = authoritative
                .and_then(|stocks| stocks.get(&line.product_id).copied())
                .or_else(|| {
                    // Optimistic fallback against the cached level. The next
                    // authoritative event overwrites it (last writer wins).
                    self.cache
                        .stock_of(&line.product_id)
                        .map(|cached| (cached - line.quantity).max(0))
                });

            let stock = match stock {
                Some(stock) => stock,
                None => {
                    debug!(product_id = %line.product_id, "No stock figure to rebroadcast");
                    continue;
                }
            };

            let event = SyncEvent::stock_set(&line.product_id, stock, self.endpoint.origin_id());
            // Our own broadcasts are filtered out of our subscription, so
            // fold the figure into the local cache directly.
            self.cache.apply(&event);
            self.endpoint.send(event);
        }
    }

    /// Announces the completed sale to reporting views.
    fn announce_sale(&self, sale: &Sale) {
        let payload = SaleCreatedPayload {
            sale_id: sale.id.clone().unwrap_or_default(),
            items: sale
                .lines
                .iter()
                .map(|line| SoldItem {
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                })
                .collect(),
        };
        match SyncEvent::sale_created(&payload, self.endpoint.origin_id()) {
            Ok(event) => {
                self.endpoint.send(event);
            }
            Err(err) => warn!(?err, "Could not announce completed sale"),
        }
    }
}

/// Snapshots the cart into a pending sale.
fn build_sale(cart: &Cart, request: &CommitRequest) -> Sale {
    let totals = cart.totals();
    let tender = cart.tender(request.payment_method, request.amount_received);
    Sale {
        id: None,
        customer_id: request.customer_id.clone(),
        status: SaleStatus::Pending,
        subtotal_ex_tax_cents: totals.subtotal_ex_tax_cents,
        tax_cents: totals.tax_cents,
        discount_cents: totals.discount_cents,
        total_cents: totals.total_cents,
        payment_method: request.payment_method,
        amount_received_cents: tender.amount_received.cents(),
        change_cents: tender.change.cents(),
        lines: cart.sale_lines(),
        created_at: Utc::now(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
