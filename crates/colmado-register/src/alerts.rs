//! # Alert Queue
//!
//! Transient, non-blocking notifications for the register shell.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Alert Lifecycle                                  │
//! │                                                                         │
//! │   push(severity, msg) ──► visible in snapshot() ──┬──► TTL timer fires  │
//! │                                                   │    (5s default)     │
//! │                                                   └──► user dismisses   │
//! │                                                              │          │
//! │                                                              ▼          │
//! │                                                    removed (idempotent: │
//! │                                                    timer firing after a │
//! │                                                    manual dismiss is a  │
//! │                                                    no-op)               │
//! │                                                                         │
//! │   Alerts NEVER block: a Warning about a failed print or a clamped       │
//! │   quantity informs the cashier while the sale keeps moving.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

// =============================================================================
// Constants
// =============================================================================

/// Default time an alert stays visible before auto-dismissal.
pub const DEFAULT_ALERT_TTL: Duration = Duration::from_secs(5);

// =============================================================================
// Alert
// =============================================================================

/// How loud the alert is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    /// Informational ("sale #42 completed").
    Info,
    /// Something degraded but the sale proceeded (failed print, clamped qty).
    Warning,
    /// An operation failed outright (rejected commit).
    Error,
}

/// A single transient notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    pub severity: AlertSeverity,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Alert Queue
// =============================================================================

/// FIFO queue of live alerts. Cheap to clone; all clones share the queue.
#[derive(Clone)]
pub struct AlertQueue {
    inner: Arc<Mutex<Vec<Alert>>>,
    ttl: Duration,
}

impl AlertQueue {
    /// Creates a queue with the default TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_ALERT_TTL)
    }

    /// Creates a queue with an explicit TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        AlertQueue {
            inner: Arc::new(Mutex::new(Vec::new())),
            ttl,
        }
    }

    /// Pushes an alert and schedules its auto-dismissal.
    ///
    /// The TTL timer needs a tokio runtime. Called outside one, the alert
    /// is still queued and can be dismissed manually; it just never expires
    /// on its own.
    pub fn push(&self, severity: AlertSeverity, message: impl Into<String>) -> Uuid {
        let alert = Alert {
            id: Uuid::new_v4(),
            severity,
            message: message.into(),
            created_at: Utc::now(),
        };
        let id = alert.id;
        debug!(alert_id = %id, ?severity, message = %alert.message, "Alert pushed");
        self.lock().push(alert);

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let queue = self.clone();
            let ttl = self.ttl;
            handle.spawn(async move {
                tokio::time::sleep(ttl).await;
                queue.dismiss(id);
            });
        }

        id
    }

    pub fn info(&self, message: impl Into<String>) -> Uuid {
        self.push(AlertSeverity::Info, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> Uuid {
        self.push(AlertSeverity::Warning, message)
    }

    pub fn error(&self, message: impl Into<String>) -> Uuid {
        self.push(AlertSeverity::Error, message)
    }

    /// Removes an alert. Idempotent: dismissing an already-gone alert (the
    /// TTL timer racing a manual dismiss) is a no-op.
    pub fn dismiss(&self, id: Uuid) {
        self.lock().retain(|a| a.id != id);
    }

    /// Current live alerts, oldest first.
    pub fn snapshot(&self) -> Vec<Alert> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Alert>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for AlertQueue {
    fn default() -> Self {
        AlertQueue::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
