//! Shuffle queue for the random-order play modes
//!
//! The queue is a permutation of an inclusive track range, built once per
//! folder selection with a Fisher-Yates shuffle. Stepping past either end
//! wraps around without reshuffling.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{PlaybackError, Result};

/// Precomputed random track order with a cursor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShuffleQueue {
    order: Vec<u8>,
    cursor: usize,
}

impl ShuffleQueue {
    /// Shuffle `first..=last` uniformly and point at the first entry
    pub fn build<R: Rng + ?Sized>(first: u8, last: u8, rng: &mut R) -> Self {
        let mut order: Vec<u8> = (first..=last).collect();
        order.shuffle(rng);
        Self { order, cursor: 0 }
    }

    /// Use a fixed order, which must be a permutation of `first..=last`
    pub fn from_order(order: Vec<u8>, first: u8, last: u8) -> Result<Self> {
        let queue = Self { order, cursor: 0 };
        if !queue.is_permutation_of(first, last) {
            return Err(PlaybackError::InvalidQueue(format!(
                "{:?} is not a permutation of {}..={}",
                queue.order, first, last
            )));
        }
        Ok(queue)
    }

    /// Track at the cursor
    pub fn current(&self) -> Option<u8> {
        self.order.get(self.cursor).copied()
    }

    /// 1-based position of the cursor (0 when empty)
    pub fn position(&self) -> usize {
        if self.order.is_empty() {
            0
        } else {
            self.cursor + 1
        }
    }

    /// Step forward, wrapping to the start
    pub fn advance(&mut self) -> Option<u8> {
        if self.order.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + 1) % self.order.len();
        self.current()
    }

    /// Step back, wrapping to the end
    pub fn retreat(&mut self) -> Option<u8> {
        if self.order.is_empty() {
            return None;
        }
        self.cursor = self.cursor.checked_sub(1).unwrap_or(self.order.len() - 1);
        self.current()
    }

    pub fn order(&self) -> &[u8] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether the queue holds every track of `first..=last` exactly once
    pub fn is_permutation_of(&self, first: u8, last: u8) -> bool {
        if first > last {
            return self.order.is_empty();
        }
        let mut sorted = self.order.clone();
        sorted.sort_unstable();
        sorted.into_iter().eq(first..=last)
    }
}
