//! Temporal stabilization of per-frame gesture labels.
//!
//! Keeps a bounded FIFO of the most recent labels and confirms the
//! current label only when it holds a majority of the window.

use std::collections::VecDeque;
use tracing::trace;

use super::classifier::Gesture;

/// Default number of ticks in the history window.
pub const DEFAULT_HISTORY_SIZE: usize = 5;

/// Default count of matching labels required to confirm.
pub const DEFAULT_MAJORITY_THRESHOLD: usize = 4;

/// Majority-vote filter over recent gesture labels.
#[derive(Debug, Clone)]
pub struct Stabilizer {
    history: VecDeque<Gesture>,
    capacity: usize,
    threshold: usize,
}

impl Default for Stabilizer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE, DEFAULT_MAJORITY_THRESHOLD)
    }
}

impl Stabilizer {
    /// `capacity` and `threshold` are validated by the config layer;
    /// a zero capacity is bumped to one.
    pub fn new(capacity: usize, threshold: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity + 1),
            capacity,
            threshold,
        }
    }

    /// Record this tick's label and return it if it is confirmed.
    ///
    /// Level-triggered: a held gesture is confirmed on every tick it keeps
    /// its majority.
    pub fn observe(&mut self, gesture: Gesture) -> Option<Gesture> {
        self.history.push_back(gesture);
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }

        let count = self.count(gesture);
        trace!(gesture = gesture.as_str(), count, "stabilizer window");
        if count >= self.threshold {
            Some(gesture)
        } else {
            None
        }
    }

    /// Occurrences of `gesture` in the current window.
    pub fn count(&self, gesture: Gesture) -> usize {
        self.history.iter().filter(|g| **g == gesture).count()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Labels oldest first.
    pub fn history(&self) -> impl Iterator<Item = Gesture> + '_ {
        self.history.iter().copied()
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Generate s-expression of the window, oldest first.
    pub fn history_sexp(&self) -> String {
        let labels: Vec<&str> = self.history.iter().map(|g| g.as_str()).collect();
        format!("({})", labels.join(" "))
    }
}
