// app/src/services/session_watch.rs

//! Session inactivity watchdog.
//!
//! A cancellable scheduled task per signed-in session: every recorded
//! activity resets the idle timer; if the timer runs out, a
//! `SessionExpired` event is published on the bus. Independent of the
//! wizard/reconciler core.

use crate::services::events::{AppEvent, EventBus};
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

enum WatchSignal {
  Activity,
  Cancel,
}

/// Handle to a running inactivity watchdog. Dropping the handle cancels it.
pub struct SessionWatch {
  tx: mpsc::UnboundedSender<WatchSignal>,
}

impl SessionWatch {
  /// Spawns the watchdog for a session.
  pub fn spawn(user_id: Uuid, idle: Duration, bus: EventBus) -> Self {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
      loop {
        match tokio::time::timeout(idle, rx.recv()).await {
          Ok(Some(WatchSignal::Activity)) => continue,
          Ok(Some(WatchSignal::Cancel)) | Ok(None) => {
            tracing::debug!(%user_id, "Session watchdog cancelled.");
            return;
          }
          Err(_elapsed) => {
            tracing::info!(%user_id, "Session idle limit reached; signalling expiry.");
            bus.publish(AppEvent::SessionExpired { user_id });
            return;
          }
        }
      }
    });
    Self { tx }
  }

  /// Records user activity, resetting the idle timer.
  pub fn touch(&self) {
    let _ = self.tx.send(WatchSignal::Activity);
  }

  /// Cancels the watchdog (normal sign-out).
  pub fn cancel(&self) {
    let _ = self.tx.send(WatchSignal::Cancel);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::sync::broadcast::error::TryRecvError;

  #[tokio::test(start_paused = true)]
  async fn fires_expiry_after_idle_period() {
    let bus = EventBus::new(8);
    let mut rx = bus.subscribe();
    let user_id = Uuid::new_v4();
    let _watch = SessionWatch::spawn(user_id, Duration::from_secs(30), bus.clone());

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(rx.recv().await.unwrap(), AppEvent::SessionExpired { user_id });
  }

  #[tokio::test(start_paused = true)]
  async fn activity_resets_the_timer() {
    let bus = EventBus::new(8);
    let mut rx = bus.subscribe();
    let watch = SessionWatch::spawn(Uuid::new_v4(), Duration::from_secs(30), bus.clone());

    tokio::time::sleep(Duration::from_secs(20)).await;
    watch.touch();
    tokio::time::sleep(Duration::from_secs(20)).await;
    // 40s of wall time but never 30s idle: no expiry yet.
    assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(rx.recv().await.is_ok());
  }

  #[tokio::test(start_paused = true)]
  async fn cancel_prevents_expiry() {
    let bus = EventBus::new(8);
    let mut rx = bus.subscribe();
    let watch = SessionWatch::spawn(Uuid::new_v4(), Duration::from_secs(30), bus.clone());

    watch.cancel();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
  }
}
