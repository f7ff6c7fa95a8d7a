//! # Register Session
//!
//! The facade a UI shell talks to: one session per open register window.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Register Session                                 │
//! │                                                                         │
//! │   UI shell calls ──► RegisterSession                                    │
//! │                        ├── cart (EXCLUSIVELY owned, behind a mutex)     │
//! │                        ├── catalog cache (shared, sync-fed, stale-ok)   │
//! │                        ├── alert queue                                  │
//! │                        ├── commit coordinator                           │
//! │                        └── print orchestrator                           │
//! │                                                                         │
//! │   Cross-view sync feeds the CACHE, never the cart: another register     │
//! │   selling the last unit changes what this session sees as stock, not    │
//! │   what is already in its cart.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex};

use colmado_core::cart::{Cart, CartTotals, LineItem, QuantityOutcome, Tender};
use colmado_core::money::Money;
use colmado_core::types::{Category, Customer, PaymentMethod, Sale};
use colmado_sync::{BusEndpoint, CatalogCache, Channel, SyncBus};
use tracing::{debug, info};

use crate::alerts::AlertQueue;
use crate::commit::{lock_cart, CommitRequest, SaleCommitCoordinator, SharedCart};
use crate::config::RegisterConfig;
use crate::error::{RegisterError, RegisterResult};
use crate::print::PrintOrchestrator;
use crate::services::{CatalogService, PrintService, SaleService};

// =============================================================================
// Session
// =============================================================================

/// One register window's session state.
pub struct RegisterSession {
    cart: SharedCart,
    catalog: Arc<dyn CatalogService>,
    sales: Arc<dyn SaleService>,
    cache: CatalogCache,
    alerts: AlertQueue,
    coordinator: SaleCommitCoordinator,
    printer: PrintOrchestrator,
    endpoint: BusEndpoint,
}

impl RegisterSession {
    /// Wires a session onto the shared bus.
    ///
    /// The session's catalog cache starts listening for Products/Stock
    /// traffic from other views immediately.
    pub fn new(
        config: RegisterConfig,
        bus: &SyncBus,
        catalog: Arc<dyn CatalogService>,
        sales: Arc<dyn SaleService>,
        printer: Arc<dyn PrintService>,
    ) -> Self {
        let endpoint = bus.endpoint(config.origin_id.clone());
        let cache = CatalogCache::with_freshness_ttl(config.freshness_ttl);
        let alerts = AlertQueue::with_ttl(config.alert_ttl);

        endpoint.subscribe(
            &[Channel::Products, Channel::Stock],
            Arc::new(cache.clone()),
        );

        let coordinator = SaleCommitCoordinator::new(
            Arc::clone(&sales),
            cache.clone(),
            alerts.clone(),
            endpoint.clone(),
        );
        let printer = PrintOrchestrator::new(
            printer,
            alerts.clone(),
            config.open_drawer_after_invoice,
        );

        info!(origin = %endpoint.origin_id(), "Register session started");
        RegisterSession {
            cart: Arc::new(Mutex::new(Cart::new())),
            catalog,
            sales,
            cache,
            alerts,
            coordinator,
            printer,
            endpoint,
        }
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    /// Loads the product catalog into the cache. Returns the product count.
    pub async fn load_catalog(&self) -> RegisterResult<usize> {
        let products = self.catalog.list_products().await?;
        let count = products.len();
        self.cache.seed(products);
        debug!(count, "Catalog loaded");
        Ok(count)
    }

    pub async fn categories(&self) -> RegisterResult<Vec<Category>> {
        Ok(self.catalog.list_categories().await?)
    }

    pub async fn customers(&self) -> RegisterResult<Vec<Customer>> {
        Ok(self.catalog.list_customers().await?)
    }

    // -------------------------------------------------------------------------
    // Cart
    // -------------------------------------------------------------------------

    /// Runs a closure against the cart (read-only).
    pub fn with_cart<R>(&self, f: impl FnOnce(&Cart) -> R) -> R {
        f(&lock_cart(&self.cart))
    }

    /// Runs a closure against the cart (mutable).
    pub fn with_cart_mut<R>(&self, f: impl FnOnce(&mut Cart) -> R) -> R {
        f(&mut lock_cart(&self.cart))
    }

    /// Adds one unit of a product to the cart.
    ///
    /// The product must exist in the cache and be active. A zero cached
    /// stock warns but does not block: the figure may be stale, and the
    /// backend has the final word at commit time.
    pub fn add_to_cart(&self, product_id: &str) -> RegisterResult<CartTotals> {
        let product = self
            .cache
            .get(product_id)
            .ok_or_else(|| RegisterError::ProductNotFound(product_id.to_string()))?;

        if !product.is_active {
            return Err(RegisterError::ProductInactive(product.name));
        }

        if product.current_stock < 1 {
            self.alerts
                .warning(format!("{} may be out of stock", product.name));
        }

        self.with_cart_mut(|cart| cart.add(&product))?;
        Ok(self.totals())
    }

    /// Sets the quantity of a cart line, clamping to the last-known stock.
    pub fn set_line_quantity(&self, index: usize, quantity: i64) -> RegisterResult<CartTotals> {
        let outcome = self.with_cart_mut(|cart| {
            let known_stock = cart
                .items
                .get(index)
                .and_then(|item| self.cache.stock_of(&item.product_id));
            cart.set_quantity(index, quantity, known_stock)
        })?;

        if let QuantityOutcome::ClampedToStock { stock } = outcome {
            self.alerts
                .warning(format!("Quantity capped to available stock ({})", stock));
        }
        Ok(self.totals())
    }

    /// Removes a cart line. Out-of-range indices are a no-op.
    pub fn remove_line(&self, index: usize) -> Option<LineItem> {
        self.with_cart_mut(|cart| cart.remove(index))
    }

    /// Sets the whole-cart discount (clamped by the cart).
    pub fn set_discount(&self, discount: Money) -> CartTotals {
        self.with_cart_mut(|cart| cart.set_discount(discount));
        self.totals()
    }

    /// Attaches a receipt note to the cart.
    pub fn set_notes(&self, notes: Option<String>) {
        self.with_cart_mut(|cart| cart.notes = notes);
    }

    /// Empties the cart.
    pub fn clear_cart(&self) -> CartTotals {
        self.with_cart_mut(Cart::clear);
        self.totals()
    }

    /// Current cart totals.
    pub fn totals(&self) -> CartTotals {
        self.with_cart(Cart::totals)
    }

    /// Previews tendered amount and change without committing anything.
    pub fn preview_change(&self, method: PaymentMethod, amount_received: Money) -> Tender {
        self.with_cart(|cart| cart.tender(method, amount_received))
    }

    // -------------------------------------------------------------------------
    // Checkout
    // -------------------------------------------------------------------------

    /// Commits the cart as a sale and prints the invoice.
    ///
    /// The method string comes straight from the shell and is parsed
    /// strictly: an unknown method fails BEFORE anything reaches the
    /// backend. Printing is best-effort — a committed sale is returned
    /// even when the printer is down.
    pub async fn checkout(
        &self,
        method: &str,
        amount_received: Money,
        customer_id: Option<String>,
    ) -> RegisterResult<Sale> {
        let payment_method = PaymentMethod::parse(method)?;
        let request = CommitRequest {
            payment_method,
            amount_received,
            customer_id,
        };

        let sale = self.coordinator.commit(&self.cart, request).await?;
        self.printer.print_invoice(&sale).await;
        Ok(sale)
    }

    // -------------------------------------------------------------------------
    // Sales History
    // -------------------------------------------------------------------------

    pub async fn recent_sales(&self, limit: u32) -> RegisterResult<Vec<Sale>> {
        Ok(self.sales.get_sales(limit).await?)
    }

    pub async fn sale_details(&self, sale_id: &str) -> RegisterResult<Sale> {
        Ok(self.sales.get_sale_details(sale_id).await?)
    }

    pub async fn cancel_sale(&self, sale_id: &str) -> RegisterResult<()> {
        self.sales.cancel_sale(sale_id).await?;
        self.alerts.info(format!("Sale {} cancelled", sale_id));
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn alerts(&self) -> &AlertQueue {
        &self.alerts
    }

    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    /// For manual re-prints, labels, barcodes and drawer opens.
    pub fn printer(&self) -> &PrintOrchestrator {
        &self.printer
    }

    pub fn origin_id(&self) -> &str {
        self.endpoint.origin_id()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use colmado_core::types::Product;
    use colmado_sync::SyncEvent;

    use crate::alerts::AlertSeverity;
    use crate::services::{CreateSaleOutcome, PrintOutcome, ServiceError};

    fn product(id: &str, price_cents: i64, tax_bps: u32, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            category_id: None,
            price_cents,
            tax_rate_bps: tax_bps,
            current_stock: stock,
            is_active: true,
            updated_at: Utc::now(),
        }
    }

    struct StubCatalog {
        products: Vec<Product>,
    }

    #[async_trait]
    impl CatalogService for StubCatalog {
        async fn list_products(&self) -> Result<Vec<Product>, ServiceError> {
            Ok(self.products.clone())
        }

        async fn list_categories(&self) -> Result<Vec<Category>, ServiceError> {
            Ok(Vec::new())
        }

        async fn list_customers(&self) -> Result<Vec<Customer>, ServiceError> {
            Ok(Vec::new())
        }
    }

    struct StubSales {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SaleService for StubSales {
        async fn create_sale(&self, _sale: &Sale) -> Result<CreateSaleOutcome, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CreateSaleOutcome {
                success: true,
                id: Some("sale-1".to_string()),
                ..Default::default()
            })
        }

        async fn get_sales(&self, _limit: u32) -> Result<Vec<Sale>, ServiceError> {
            Ok(Vec::new())
        }

        async fn get_sale_details(&self, _sale_id: &str) -> Result<Sale, ServiceError> {
            Err(ServiceError::Backend("not found".to_string()))
        }

        async fn cancel_sale(&self, _sale_id: &str) -> Result<(), ServiceError> {
            Ok(())
        }
    }

    struct StubPrinter {
        fail: AtomicBool,
        invoices: AtomicUsize,
    }

    #[async_trait]
    impl PrintService for StubPrinter {
        async fn print_invoice(&self, _sale: &Sale) -> PrintOutcome {
            self.invoices.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                PrintOutcome::failed("out of paper")
            } else {
                PrintOutcome::ok()
            }
        }

        async fn print_label(&self, _product: &Product) -> PrintOutcome {
            PrintOutcome::ok()
        }

        async fn print_barcode(&self, _text: &str) -> PrintOutcome {
            PrintOutcome::ok()
        }

        async fn print_qr(&self, _text: &str) -> PrintOutcome {
            PrintOutcome::ok()
        }

        async fn test_printer(&self) -> PrintOutcome {
            PrintOutcome::ok()
        }

        async fn open_cash_drawer(&self) -> PrintOutcome {
            PrintOutcome::ok()
        }
    }

    struct Fixture {
        session: RegisterSession,
        sales: Arc<StubSales>,
        printer: Arc<StubPrinter>,
        bus: SyncBus,
    }

    async fn fixture(products: Vec<Product>) -> Fixture {
        let bus = SyncBus::new();
        let sales = Arc::new(StubSales {
            calls: AtomicUsize::new(0),
        });
        let printer = Arc::new(StubPrinter {
            fail: AtomicBool::new(false),
            invoices: AtomicUsize::new(0),
        });
        let session = RegisterSession::new(
            RegisterConfig::default(),
            &bus,
            Arc::new(StubCatalog { products }),
            sales.clone(),
            printer.clone(),
        );
        session.load_catalog().await.unwrap();
        Fixture {
            session,
            sales,
            printer,
            bus,
        }
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_rejected() {
        let fx = fixture(vec![]).await;
        let result = fx.session.add_to_cart("ghost");
        assert!(matches!(result, Err(RegisterError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_add_inactive_product_is_rejected() {
        let mut inactive = product("p1", 1000, 0, 5);
        inactive.is_active = false;
        let fx = fixture(vec![inactive]).await;

        let result = fx.session.add_to_cart("p1");
        assert!(matches!(result, Err(RegisterError::ProductInactive(_))));
        assert!(fx.session.with_cart(Cart::is_empty));
    }

    #[tokio::test]
    async fn test_add_with_zero_cached_stock_warns_but_adds() {
        let fx = fixture(vec![product("p1", 1000, 0, 0)]).await;

        let totals = fx.session.add_to_cart("p1").unwrap();
        assert_eq!(totals.line_count, 1);

        let alerts = fx.session.alerts().snapshot();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);
    }

    #[tokio::test]
    async fn test_quantity_clamp_surfaces_warning() {
        let fx = fixture(vec![product("p1", 1000, 0, 3)]).await;
        fx.session.add_to_cart("p1").unwrap();

        let totals = fx.session.set_line_quantity(0, 10).unwrap();
        assert_eq!(totals.total_quantity, 3);

        let alerts = fx.session.alerts().snapshot();
        assert!(alerts
            .iter()
            .any(|a| a.message.contains("capped to available stock (3)")));
    }

    #[tokio::test]
    async fn test_checkout_happy_path() {
        let fx = fixture(vec![product("p1", 11800, 1800, 10)]).await;
        fx.session.add_to_cart("p1").unwrap();
        fx.session.add_to_cart("p1").unwrap();

        let sale = fx
            .session
            .checkout("efectivo", Money::from_cents(30000), None)
            .await
            .unwrap();

        assert_eq!(sale.id.as_deref(), Some("sale-1"));
        assert_eq!(sale.total_cents, 23600);
        assert_eq!(sale.change_cents, 6400);
        assert!(fx.session.with_cart(Cart::is_empty));
        assert_eq!(fx.printer.invoices.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_checkout_rejects_unknown_payment_method() {
        let fx = fixture(vec![product("p1", 1000, 0, 10)]).await;
        fx.session.add_to_cart("p1").unwrap();

        let result = fx
            .session
            .checkout("bitcoin", Money::from_cents(1000), None)
            .await;

        assert!(matches!(result, Err(RegisterError::Validation(_))));
        assert_eq!(fx.sales.calls.load(Ordering::SeqCst), 0);
        assert!(!fx.session.with_cart(Cart::is_empty));
    }

    #[tokio::test]
    async fn test_checkout_survives_dead_printer() {
        let fx = fixture(vec![product("p1", 1000, 0, 10)]).await;
        fx.printer.fail.store(true, Ordering::SeqCst);
        fx.session.add_to_cart("p1").unwrap();

        let sale = fx
            .session
            .checkout("cash", Money::from_cents(1000), None)
            .await
            .unwrap();

        // The sale is committed; the print failure is only a warning.
        assert_eq!(sale.id.as_deref(), Some("sale-1"));
        assert!(fx
            .session
            .alerts()
            .snapshot()
            .iter()
            .any(|a| a.severity == AlertSeverity::Warning));
    }

    #[tokio::test]
    async fn test_foreign_stock_event_updates_cache_not_cart() {
        let fx = fixture(vec![product("p1", 1000, 0, 10)]).await;
        fx.session.add_to_cart("p1").unwrap();
        fx.session.set_line_quantity(0, 4).unwrap();
        settle().await;

        // Another register sells most of the stock.
        let other = fx.bus.endpoint("register-b");
        other.send(SyncEvent::stock_set("p1", 1, "register-b"));
        settle().await;

        assert_eq!(fx.session.cache().stock_of("p1"), Some(1));
        // What is already in the cart is untouched.
        assert_eq!(fx.session.totals().total_quantity, 4);
    }
}
