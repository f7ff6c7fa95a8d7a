//! # SyncBus
//!
//! Process-wide publish/subscribe channel shared by every open view.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SyncBus Fan-Out                                 │
//! │                                                                         │
//! │            ┌──────────────────────────────────────┐                     │
//! │            │        tokio broadcast channel       │                     │
//! │            └──────┬───────────┬───────────┬───────┘                     │
//! │                   │           │           │                             │
//! │                   ▼           ▼           ▼                             │
//! │            ┌──────────┐ ┌──────────┐ ┌──────────┐                       │
//! │            │Register A│ │Register B│ │Reporting │    Each endpoint      │
//! │            │ endpoint │ │ endpoint │ │ endpoint │    has its own        │
//! │            └──────────┘ └──────────┘ └──────────┘    origin id          │
//! │                                                                         │
//! │  Contracts:                                                             │
//! │  • broadcast() is fire-and-forget — no receiver, no error              │
//! │  • handlers are invoked once per received event and MUST be            │
//! │    idempotent to replays (dedup by entity existence, not event id)     │
//! │  • delivery is async and unordered relative to local mutations;        │
//! │    conflict policy is last-writer-wins                                 │
//! │  • a lagged receiver skips missed events and keeps going               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::event::{Action, Channel, SyncEvent};

// =============================================================================
// Constants
// =============================================================================

/// Default broadcast channel capacity.
pub const DEFAULT_BUS_CAPACITY: usize = 256;

// =============================================================================
// Handler Trait
// =============================================================================

/// A subscriber's event handler.
///
/// Invoked once per distinct received event. Implementations must be
/// idempotent: duplicate delivery of the same logical event (e.g. a replayed
/// "product created") must not double-insert state.
pub trait SyncHandler: Send + Sync {
    fn handle(&self, event: &SyncEvent);
}

// =============================================================================
// SyncBus
// =============================================================================

/// The shared bus. Cheap to clone; all clones fan out to the same channel.
#[derive(Clone)]
pub struct SyncBus {
    tx: broadcast::Sender<SyncEvent>,
}

impl SyncBus {
    /// Creates a bus with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }

    /// Creates a bus with an explicit capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        SyncBus { tx }
    }

    /// Creates a view-scoped endpoint with its own origin id.
    pub fn endpoint(&self, origin_id: impl Into<String>) -> BusEndpoint {
        BusEndpoint {
            origin_id: origin_id.into(),
            tx: self.tx.clone(),
        }
    }

    /// Raw receiver, mainly for tests and ad-hoc consumers.
    pub fn raw_receiver(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }
}

impl Default for SyncBus {
    fn default() -> Self {
        SyncBus::new()
    }
}

// =============================================================================
// BusEndpoint
// =============================================================================

/// One view's handle on the bus.
///
/// Broadcasts stamp this endpoint's origin id; subscriptions skip events the
/// endpoint itself produced unless asked otherwise.
#[derive(Clone)]
pub struct BusEndpoint {
    origin_id: String,
    tx: broadcast::Sender<SyncEvent>,
}

impl BusEndpoint {
    /// This endpoint's origin id.
    pub fn origin_id(&self) -> &str {
        &self.origin_id
    }

    /// Broadcasts an event. Fire-and-forget: an empty bus is not an error.
    ///
    /// Returns the number of receivers the event was delivered to, for
    /// observability only — callers must not branch on it.
    pub fn broadcast(&self, channel: Channel, action: Action, payload: Value) -> usize {
        self.send(SyncEvent::new(channel, action, payload, &self.origin_id))
    }

    /// Broadcasts a pre-built event, restamping its origin.
    pub fn send(&self, mut event: SyncEvent) -> usize {
        event.origin_id = self.origin_id.clone();
        debug!(
            channel = event.channel.as_str(),
            action = event.action.as_str(),
            origin = %self.origin_id,
            "Broadcasting sync event"
        );
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribes a handler to the given channels, skipping this endpoint's
    /// own events.
    pub fn subscribe(&self, channels: &[Channel], handler: Arc<dyn SyncHandler>) -> JoinHandle<()> {
        self.subscribe_with(channels, handler, false)
    }

    /// Subscribes a handler, optionally receiving this endpoint's own events.
    pub fn subscribe_with(
        &self,
        channels: &[Channel],
        handler: Arc<dyn SyncHandler>,
        deliver_own: bool,
    ) -> JoinHandle<()> {
        let channels: Vec<Channel> = channels.to_vec();
        let origin_id = self.origin_id.clone();
        let mut rx = self.tx.subscribe();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if !channels.contains(&event.channel) {
                            continue;
                        }
                        if !deliver_own && event.origin_id == origin_id {
                            continue;
                        }
                        handler.handle(&event);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Missed events are tolerable: consumers converge via
                        // last-writer-wins on the next event.
                        warn!(origin = %origin_id, skipped, "Sync subscriber lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every event it sees.
    struct Recorder {
        seen: Mutex<Vec<SyncEvent>>,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Recorder {
                seen: Mutex::new(Vec::new()),
            })
        }

        fn count(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl SyncHandler for Recorder {
        fn handle(&self, event: &SyncEvent) {
            self.seen.lock().unwrap().push(event.clone());
        }
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_delivered_to_other_views_not_sender() {
        let bus = SyncBus::new();
        let a = bus.endpoint("register-a");
        let b = bus.endpoint("register-b");

        let heard_by_a = Recorder::new();
        let heard_by_b = Recorder::new();
        a.subscribe(&[Channel::Stock], heard_by_a.clone() as Arc<dyn SyncHandler>);
        b.subscribe(&[Channel::Stock], heard_by_b.clone() as Arc<dyn SyncHandler>);
        settle().await;

        a.broadcast(
            Channel::Stock,
            Action::StockSet,
            serde_json::json!({ "productId": "p1", "stock": 4 }),
        );
        settle().await;

        assert_eq!(heard_by_b.count(), 1, "other view must receive the event");
        assert_eq!(heard_by_a.count(), 0, "sender's own view is skipped");
    }

    #[tokio::test]
    async fn test_channel_filtering() {
        let bus = SyncBus::new();
        let a = bus.endpoint("register-a");
        let b = bus.endpoint("register-b");

        let heard = Recorder::new();
        b.subscribe(&[Channel::Products], heard.clone() as Arc<dyn SyncHandler>);
        settle().await;

        a.broadcast(Channel::Stock, Action::StockSet, serde_json::json!({}));
        a.broadcast(Channel::Products, Action::Created, serde_json::json!({}));
        settle().await;

        let seen = heard.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].channel, Channel::Products);
    }

    #[tokio::test]
    async fn test_deliver_own_opt_in() {
        let bus = SyncBus::new();
        let a = bus.endpoint("register-a");

        let heard = Recorder::new();
        a.subscribe_with(&[Channel::Sales], heard.clone() as Arc<dyn SyncHandler>, true);
        settle().await;

        a.broadcast(Channel::Sales, Action::SaleCreated, serde_json::json!({}));
        settle().await;

        assert_eq!(heard.count(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_without_receivers_is_fire_and_forget() {
        let bus = SyncBus::new();
        let a = bus.endpoint("register-a");
        // No subscribers at all: must not error or panic.
        let delivered = a.broadcast(Channel::Stock, Action::StockSet, serde_json::json!({}));
        assert_eq!(delivered, 0);
    }
}
