// Rolling hashrate history shared by all rigs.
// One FIFO buffer of (rig_index, hashrate) samples; capacity = samples_per_rig * rig_count.
// Eviction is global, not per rig: the oldest sample goes first whichever rig it belongs to.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySample {
    pub rig_index: usize,
    pub hashrate_khs: f64,
}

pub struct HistoryStore {
    samples: Mutex<VecDeque<HistorySample>>,
    capacity: usize,
}

impl HistoryStore {
    pub fn new(samples_per_rig: usize, rig_count: usize) -> Self {
        let capacity = samples_per_rig.saturating_mul(rig_count).max(1);
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    // A panic while holding the lock can't leave the deque half-updated, so a
    // poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, VecDeque<HistorySample>> {
        self.samples.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one sample, evicting the oldest once the buffer is full.
    pub fn record(&self, rig_index: usize, hashrate_khs: f64) {
        let mut samples = self.lock();
        while samples.len() >= self.capacity {
            samples.pop_front();
        }
        samples.push_back(HistorySample {
            rig_index,
            hashrate_khs,
        });
    }

    /// Mean of the retained samples for `rig_index`, or 0 if there are none.
    pub fn average_for(&self, rig_index: usize) -> f64 {
        let samples = self.lock();
        let (sum, count) = samples
            .iter()
            .filter(|s| s.rig_index == rig_index)
            .fold((0.0, 0usize), |(sum, n), s| (sum + s.hashrate_khs, n + 1));
        if count == 0 { 0.0 } else { sum / count as f64 }
    }

    /// Retained hashrates for one rig, oldest first.
    pub fn samples_for(&self, rig_index: usize) -> Vec<f64> {
        self.lock()
            .iter()
            .filter(|s| s.rig_index == rig_index)
            .map(|s| s.hashrate_khs)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
