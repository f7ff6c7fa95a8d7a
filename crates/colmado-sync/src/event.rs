//! # Sync Events
//!
//! Message types rebroadcast between open views.
//!
//! ## Event Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Event Flow                                  │
//! │                                                                         │
//! │  Register A                         Register B                          │
//! │  ──────────                         ──────────                          │
//! │  commit sale                                                            │
//! │       │                                                                 │
//! │       ├──► Stock/StockSet { productId, stock } ──► catalog cache        │
//! │       │                                            (LWW overwrite)      │
//! │       └──► Sales/SaleCreated { saleId, items } ──► reporting views      │
//! │                                                                         │
//! │  create product                                                         │
//! │       └──► Products/Created { product } ─────────► insert IF ABSENT     │
//! │                                                    (dedup by id)        │
//! │                                                                         │
//! │  Events are NOT globally sequenced: consumers must be idempotent to    │
//! │  replays and tolerate arbitrary interleaving.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use colmado_core::types::Product;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Channel and Action
// =============================================================================

/// Logical channel an event is published on. Consumers filter by channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Products,
    Stock,
    Sales,
    Customers,
}

impl Channel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Channel::Products => "products",
            Channel::Stock => "stock",
            Channel::Sales => "sales",
            Channel::Customers => "customers",
        }
    }
}

/// What happened on the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Created,
    Updated,
    Deleted,
    /// Absolute stock value for a product (not a delta).
    StockSet,
    SaleCreated,
}

impl Action {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Action::Created => "created",
            Action::Updated => "updated",
            Action::Deleted => "deleted",
            Action::StockSet => "stock_set",
            Action::SaleCreated => "sale_created",
        }
    }
}

// =============================================================================
// Sync Event
// =============================================================================

/// A broadcast message informing other open views of a state change.
///
/// Ownerless and transient: no consumer may assume ordering or uniqueness.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEvent {
    /// Logical channel for consumer filtering.
    pub channel: Channel,

    /// What happened.
    pub action: Action,

    /// Event payload as JSON (shape depends on channel/action).
    pub payload: Value,

    /// Identifier of the view that produced the event.
    pub origin_id: String,

    /// When the event was produced.
    pub timestamp: DateTime<Utc>,
}

impl SyncEvent {
    /// Creates an event stamped with origin and current time.
    pub fn new(channel: Channel, action: Action, payload: Value, origin_id: &str) -> Self {
        SyncEvent {
            channel,
            action,
            payload,
            origin_id: origin_id.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Deserializes the payload into a typed shape.
    pub fn payload_as<T: serde::de::DeserializeOwned>(&self) -> SyncResult<T> {
        serde_json::from_value(self.payload.clone()).map_err(SyncError::from)
    }
}

// =============================================================================
// Typed Payloads
// =============================================================================

/// Payload for `Stock/StockSet`: an absolute stock level for one product.
///
/// Absolute values (not deltas) are what makes last-writer-wins safe: a
/// replayed or reordered event converges to whichever write applied last.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSetPayload {
    pub product_id: String,
    pub stock: i64,
}

/// One sold line inside a `Sales/SaleCreated` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoldItem {
    pub product_id: String,
    pub quantity: i64,
}

/// Payload for `Sales/SaleCreated`: product ids and quantities for consumers
/// such as reporting views.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleCreatedPayload {
    pub sale_id: String,
    pub items: Vec<SoldItem>,
}

// =============================================================================
// Helper Constructors
// =============================================================================

impl SyncEvent {
    /// Creates a `Products/Created` event.
    pub fn product_created(product: &Product, origin_id: &str) -> SyncResult<Self> {
        Ok(SyncEvent::new(
            Channel::Products,
            Action::Created,
            serde_json::to_value(product)?,
            origin_id,
        ))
    }

    /// Creates a `Products/Updated` event.
    pub fn product_updated(product: &Product, origin_id: &str) -> SyncResult<Self> {
        Ok(SyncEvent::new(
            Channel::Products,
            Action::Updated,
            serde_json::to_value(product)?,
            origin_id,
        ))
    }

    /// Creates a `Stock/StockSet` event with an absolute stock value.
    pub fn stock_set(product_id: &str, stock: i64, origin_id: &str) -> Self {
        SyncEvent::new(
            Channel::Stock,
            Action::StockSet,
            serde_json::json!({ "productId": product_id, "stock": stock }),
            origin_id,
        )
    }

    /// Creates a `Sales/SaleCreated` event.
    pub fn sale_created(payload: &SaleCreatedPayload, origin_id: &str) -> SyncResult<Self> {
        Ok(SyncEvent::new(
            Channel::Sales,
            Action::SaleCreated,
            serde_json::to_value(payload)?,
            origin_id,
        ))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
