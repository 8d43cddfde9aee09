// SPDX-License-Identifier: MPL-2.0
//! Bounded history of recent probabilities.
//!
//! A ring buffer that evicts the oldest value once full. Only successful
//! inference results are appended; the history exists solely to compute a
//! moving average and is never persisted.

use std::collections::VecDeque;

/// Number of recent probabilities kept for smoothing.
pub const HISTORY_CAPACITY: usize = 5;

/// Fixed-capacity FIFO of recent probabilities, oldest first.
///
/// # Example
///
/// ```
/// use ad_lens::domain::detection::ProbabilityHistory;
///
/// let mut history = ProbabilityHistory::new();
/// for p in [0.1, 0.2, 0.3, 0.4, 0.5, 0.6] {
///     history.push(p);
/// }
///
/// let values: Vec<_> = history.iter().collect();
/// assert_eq!(values, vec![0.2, 0.3, 0.4, 0.5, 0.6]);
/// ```
#[derive(Debug, Clone)]
pub struct ProbabilityHistory {
    data: VecDeque<f64>,
    capacity: usize,
}

impl Default for ProbabilityHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbabilityHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Creates a history with a custom capacity (at least 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a value, evicting the oldest if at capacity.
    pub fn push(&mut self, probability: f64) {
        if self.data.len() >= self.capacity {
            self.data.pop_front();
        }
        self.data.push_back(probability);
    }

    /// Values in arrival order (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied()
    }

    /// Arithmetic mean of the stored values, `None` when empty.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        if self.data.is_empty() {
            return None;
        }
        Some(self.data.iter().sum::<f64>() / self.data.len() as f64)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}
