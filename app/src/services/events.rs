// app/src/services/events.rs

//! Application-wide event bus.
//!
//! Cross-component signals (opening the auth flow, a payment settling, a
//! session expiring) go through one explicit broadcast channel with a
//! defined publish/subscribe contract instead of ambient listeners.

use crate::models::PaymentStatus;
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
  /// Some surface asked for the auth flow to open.
  AuthRequested,
  /// The reconciler settled a pack order.
  PaymentSettled {
    pack_order_id: Uuid,
    campaign_id: Uuid,
    status: PaymentStatus,
  },
  /// A session went idle past the configured limit.
  SessionExpired { user_id: Uuid },
}

#[derive(Debug, Clone)]
pub struct EventBus {
  tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
  pub fn new(capacity: usize) -> Self {
    let (tx, _rx) = broadcast::channel(capacity);
    Self { tx }
  }

  /// Publishes an event. Lagging or absent subscribers are not an error.
  pub fn publish(&self, event: AppEvent) {
    let receivers = self.tx.receiver_count();
    if self.tx.send(event.clone()).is_err() {
      tracing::debug!(?event, "Event published with no active subscribers.");
    } else {
      tracing::debug!(?event, receivers, "Event published.");
    }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
    self.tx.subscribe()
  }
}

impl Default for EventBus {
  fn default() -> Self {
    Self::new(64)
  }
}
