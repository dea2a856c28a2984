//! Bounded Sliding-Window History Buffers
//!
//! ## Overview
//!
//! Each stream (EMG, IMU orientation, IMU acceleration) keeps a bounded
//! window of its most recent samples so late-joining consumers and
//! interactive tooling can look back a few seconds without the buffer ever
//! growing with session length.
//!
//! ## Design Rationale
//!
//! The retention policy is "newest first, evict oldest": a push inserts at
//! the logical front and, once the configured maximum is exceeded, exactly
//! one entry falls off the tail. Backing the window with a `VecDeque` makes
//! both ends O(1); an insert-at-front `Vec` would shift every element on
//! every sample, which at IMU rates is real money.
//!
//! Capacity is a runtime value (default [`DEFAULT_MAX`]) rather than a
//! const generic because the window size comes from the command line, and
//! each buffer owns its own bound. The EMG and IMU windows are
//! independent of each other.
//!
//! ## Sharing
//!
//! The pipeline is single-threaded and dispatch is non-reentrant, so a
//! history handler and an external reader can share one buffer through
//! [`SharedHistory`] (`Rc<RefCell<..>>`) without locks: all mutation
//! happens inside the one dispatch call stack.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Default window size per stream.
pub const DEFAULT_MAX: usize = 100;

/// Shared handle to a history buffer.
///
/// Cloning the handle shares the underlying buffer; see the module docs
/// for why this needs no lock.
pub type SharedHistory<T> = Rc<RefCell<HistoryBuffer<T>>>;

/// Bounded window over the most recent samples of one stream, newest first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer<T> {
    entries: VecDeque<T>,
    max: usize,
}

impl<T: Clone> HistoryBuffer<T> {
    /// Create an empty buffer retaining at most `max` samples.
    ///
    /// `max == 0` is legal and keeps the buffer permanently empty;
    /// `max == 1` always holds exactly the most recent sample.
    pub fn new(max: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max),
            max,
        }
    }

    /// Create a shared handle to a new buffer.
    pub fn shared(max: usize) -> SharedHistory<T> {
        Rc::new(RefCell::new(Self::new(max)))
    }

    /// Insert `sample` as the newest entry, evicting the oldest if the
    /// window would exceed its maximum. Never fails, never reorders.
    pub fn push(&mut self, sample: T) {
        self.entries.push_front(sample);
        if self.entries.len() > self.max {
            self.entries.pop_back();
        }
    }

    /// Ordered copy of the current contents, newest first.
    ///
    /// Idempotent between pushes: two snapshots with no intervening push
    /// are equal.
    pub fn snapshot(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }

    /// Most recent sample, if any.
    pub fn latest(&self) -> Option<&T> {
        self.entries.front()
    }

    /// Iterate newest to oldest without copying.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// Number of retained samples.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been retained.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the window is at its maximum.
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.max
    }

    /// The configured maximum window size.
    pub fn max_len(&self) -> usize {
        self.max
    }
}
