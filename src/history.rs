use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::Capture;

/// Fixed-capacity FIFO of the most recent captures.
///
/// Every append runs its evict-then-push under one lock, so the length never
/// exceeds `capacity` even with several producers.
pub struct HistoryBuffer {
  capacity: usize,
  entries: Mutex<VecDeque<Arc<Capture>>>,
}

impl HistoryBuffer {
  /// `capacity` is clamped to at least one entry.
  pub fn new(capacity: usize) -> Self {
    let capacity = capacity.max(1);
    Self {
      capacity,
      entries: Mutex::new(VecDeque::with_capacity(capacity)),
    }
  }

  pub fn append(&self, capture: Arc<Capture>) {
    let mut entries = self.lock();
    while entries.len() >= self.capacity {
      entries.pop_front();
    }
    entries.push_back(capture);
  }

  pub fn latest(&self) -> Option<Arc<Capture>> {
    self.lock().back().cloned()
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool {
    self.lock().is_empty()
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Oldest first.
  #[cfg(test)]
  pub fn snapshot(&self) -> Vec<Arc<Capture>> {
    self.lock().iter().cloned().collect()
  }

  fn lock(&self) -> MutexGuard<'_, VecDeque<Arc<Capture>>> {
    // a panic mid-append cannot leave the deque over capacity
    self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}
