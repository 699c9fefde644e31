//! Per-channel delay queues.
//!
//! A `DelayQueue` is the only timing primitive in the simulator. Every
//! channel that crosses a clock boundary stores `(ready_cycle, item)` pairs
//! and hands an item out only once the simulated clock has reached its
//! ready cycle. `BusyUnit` layers the request/complete discipline of a
//! fixed-latency device on top of two such queues.

use std::collections::VecDeque;

use crate::common::Cycle;

/// Ordered sequence of `(ready_cycle, item)` entries.
///
/// Items leave in insertion order. The two enqueue policies only differ
/// in how the ready cycle of a new item is derived.
#[derive(Debug, Clone)]
pub struct DelayQueue<T> {
    entries: VecDeque<(Cycle, T)>,
    next_available: Cycle,
}

impl<T> Default for DelayQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DelayQueue<T> {
    /// Creates an empty queue whose throughput cursor starts at cycle 0.
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            next_available: 0,
        }
    }

    /// Enqueues with the chained policy.
    ///
    /// The ready cycle is `current + delay` when the queue is empty and
    /// `tail + delay` otherwise, so back-to-back items are spaced by exactly
    /// `delay` regardless of when they were submitted.
    ///
    /// # Arguments
    ///
    /// * `current` - Cycle the item is submitted at.
    /// * `delay` - Inter-item latency in cycles.
    /// * `item` - Payload to enqueue.
    pub fn push(&mut self, current: Cycle, delay: Cycle, item: T) {
        let ready = match self.entries.back() {
            Some((tail, _)) => tail + delay,
            None => current + delay,
        };
        self.entries.push_back((ready, item));
    }

    /// Enqueues with the throughput-limited policy.
    ///
    /// On an empty queue the item issues at `max(current, next_available)`
    /// and the cursor advances by `delay`; on a non-empty queue the item
    /// chains off the tail. This bounds the steady-state issue rate to one
    /// item per `delay` cycles under bursty submission.
    ///
    /// # Arguments
    ///
    /// * `current` - Cycle the item is submitted at.
    /// * `delay` - Minimum spacing between issued items.
    /// * `item` - Payload to enqueue.
    pub fn push_out(&mut self, current: Cycle, delay: Cycle, item: T) {
        let ready = match self.entries.back() {
            Some((tail, _)) => tail + delay,
            None if self.next_available <= current => {
                self.next_available = current + delay;
                current
            }
            None => {
                let ready = self.next_available;
                self.next_available += delay;
                ready
            }
        };
        self.entries.push_back((ready, item));
    }

    /// Removes and returns the head if its ready cycle is `<= cycle`.
    pub fn pop(&mut self, cycle: Cycle) -> Option<T> {
        match self.entries.front() {
            Some((ready, _)) if *ready <= cycle => self.entries.pop_front().map(|(_, item)| item),
            _ => None,
        }
    }

    /// Ready cycle of the head entry, if any.
    pub fn head_ready(&self) -> Option<Cycle> {
        self.entries.front().map(|(ready, _)| *ready)
    }

    /// Ready cycle of the tail entry, if any.
    pub fn tail_ready(&self) -> Option<Cycle> {
        self.entries.back().map(|(ready, _)| *ready)
    }

    /// Current position of the throughput cursor used by `push_out`.
    pub fn next_available(&self) -> Cycle {
        self.next_available
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Request buffer plus in-flight completion for a fixed-latency unit.
///
/// While busy, no new request is taken from the inbound queue, so exactly
/// one completion is outstanding at a time. A request started in cycle `c`
/// completes in cycle `c + latency - 1`; with a latency of one it completes
/// in the same cycle it was started.
#[derive(Debug, Clone)]
pub struct BusyUnit<T> {
    requests: DelayQueue<T>,
    in_flight: DelayQueue<T>,
    latency: Cycle,
    busy: bool,
}

impl<T> BusyUnit<T> {
    /// Creates an idle unit with the given processing latency (at least 1).
    pub fn new(latency: Cycle) -> Self {
        Self {
            requests: DelayQueue::new(),
            in_flight: DelayQueue::new(),
            latency: latency.max(1),
            busy: false,
        }
    }

    /// Buffers an inbound request delivered during `cycle`.
    ///
    /// The request becomes visible on the next clock cycle.
    pub fn enqueue(&mut self, cycle: Cycle, request: T) {
        self.requests.push(cycle + 1, 0, request);
    }

    /// Takes the next ready request if the unit is idle.
    pub fn poll(&mut self, cycle: Cycle) -> Option<T> {
        if self.busy {
            return None;
        }
        self.requests.pop(cycle)
    }

    /// Marks the unit busy and schedules `work` to complete after the latency.
    pub fn start(&mut self, cycle: Cycle, work: T) {
        self.busy = true;
        self.in_flight.push(cycle, self.latency - 1, work);
    }

    /// Returns the in-flight work once it is due and clears the busy flag.
    pub fn complete(&mut self, cycle: Cycle) -> Option<T> {
        let done = self.in_flight.pop(cycle)?;
        self.busy = false;
        Some(done)
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// True when nothing is queued or in flight.
    pub fn is_idle(&self) -> bool {
        !self.busy && self.requests.is_empty() && self.in_flight.is_empty()
    }

    pub fn latency(&self) -> Cycle {
        self.latency
    }
}
