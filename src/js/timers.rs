// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Timer queue for setTimeout/setInterval management
//!
//! Timers run on a virtual clock. The host never sleeps: once the script
//! and its promise jobs are quiet, the earliest pending timer is popped and
//! the clock jumps to its deadline. Callbacks themselves live on the JS side,
//! keyed by the id handed out here.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// Intervals shorter than this are clamped so the clock always advances
const MIN_INTERVAL_MS: u64 = 1;

/// Timer entry in the queue
#[derive(Debug, Clone)]
pub struct TimerEntry {
    /// Unique timer ID
    pub id: u32,
    /// Virtual time at which the timer fires
    pub fire_at: u64,
    /// Repeat period for intervals
    pub interval_ms: Option<u64>,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.fire_at == other.fire_at
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap; equal deadlines fire in scheduling order
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Timer queue for managing setTimeout/setInterval
#[derive(Debug)]
pub struct TimerQueue {
    /// Pending timers (min-heap by fire_at)
    timers: BinaryHeap<TimerEntry>,
    /// Cancelled timer IDs
    cancelled: HashSet<u32>,
    /// Next timer ID
    next_id: u32,
    /// Current virtual time in milliseconds
    now_ms: u64,
    /// Timers fired so far
    fired: usize,
    /// Maximum timers to prevent runaway intervals
    max_fires: usize,
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerQueue {
    /// Create a new timer queue
    pub fn new() -> Self {
        Self::with_max_fires(10_000)
    }

    /// Create with a custom cap on total timer firings
    pub fn with_max_fires(max_fires: usize) -> Self {
        Self {
            timers: BinaryHeap::new(),
            cancelled: HashSet::new(),
            next_id: 1,
            now_ms: 0,
            fired: 0,
            max_fires,
        }
    }

    /// Schedule a setTimeout
    pub fn set_timeout(&mut self, delay_ms: u64) -> u32 {
        self.schedule(delay_ms, None)
    }

    /// Schedule a setInterval
    pub fn set_interval(&mut self, interval_ms: u64) -> u32 {
        let interval_ms = interval_ms.max(MIN_INTERVAL_MS);
        self.schedule(interval_ms, Some(interval_ms))
    }

    fn schedule(&mut self, delay_ms: u64, interval_ms: Option<u64>) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.timers.push(TimerEntry {
            id,
            fire_at: self.now_ms.saturating_add(delay_ms),
            interval_ms,
        });
        id
    }

    /// Cancel a timer (setTimeout or setInterval)
    pub fn clear_timer(&mut self, id: u32) {
        if self.timers.iter().any(|t| t.id == id) {
            self.cancelled.insert(id);
        }
    }

    /// Pop the next timer to fire and advance the clock to it
    ///
    /// Intervals are re-armed before returning. Returns `None` when nothing
    /// is pending or the firing cap has been reached.
    pub fn pop_next(&mut self) -> Option<u32> {
        if self.fired >= self.max_fires {
            return None;
        }
        while let Some(entry) = self.timers.pop() {
            if self.cancelled.remove(&entry.id) {
                continue;
            }
            self.now_ms = self.now_ms.max(entry.fire_at);
            if let Some(interval) = entry.interval_ms {
                self.timers.push(TimerEntry {
                    id: entry.id,
                    fire_at: self.now_ms.saturating_add(interval),
                    interval_ms: Some(interval),
                });
            }
            self.fired += 1;
            return Some(entry.id);
        }
        None
    }

    /// Check if there are pending timers
    pub fn has_pending(&self) -> bool {
        self.pending_count() > 0
    }

    /// Get number of pending timers
    pub fn pending_count(&self) -> usize {
        self.timers
            .iter()
            .filter(|t| !self.cancelled.contains(&t.id))
            .count()
    }

    /// Current virtual time in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Number of timers fired so far
    pub fn fired(&self) -> usize {
        self.fired
    }

    /// Whether the firing cap stopped the queue
    pub fn exhausted(&self) -> bool {
        self.fired >= self.max_fires
    }
}
