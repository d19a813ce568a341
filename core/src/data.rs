// src/data.rs

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Shared, lock-wrapped context data for a flow run.
///
/// Cloning is cheap (`Arc` clone); all clones refer to the same underlying
/// data. Lock guards obtained from this struct are blocking and MUST NOT be
/// held across `.await` suspension points.
#[derive(Debug)]
pub struct FlowData<T: Send + Sync + 'static>(Arc<RwLock<T>>);

impl<T: Send + Sync + 'static> FlowData<T> {
  pub fn new(data: T) -> Self {
    FlowData(Arc::new(RwLock::new(data)))
  }

  /// Acquires a read lock. The returned guard MUST be dropped before any
  /// `.await` point.
  pub fn read(&self) -> RwLockReadGuard<'_, T> {
    self.0.read()
  }

  /// Acquires a write lock. The returned guard MUST be dropped before any
  /// `.await` point.
  pub fn write(&self) -> RwLockWriteGuard<'_, T> {
    self.0.write()
  }
}

impl<T: Send + Sync + 'static> Clone for FlowData<T> {
  fn clone(&self) -> Self {
    FlowData(Arc::clone(&self.0))
  }
}

impl<T: Send + Sync + 'static + Default> Default for FlowData<T> {
  fn default() -> Self {
    Self::new(Default::default())
  }
}
