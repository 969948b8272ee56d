use super::FrontierEntry;
use crate::crawler::LimitRule;
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Lifecycle of a domain-glob group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupStatus {
    /// Nothing queued and nothing in flight
    Idle,

    /// Work is queued or in flight and another dispatch is allowed
    Dispatching,

    /// In-flight count has reached the group's parallelism
    Saturated,
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Dispatching => "dispatching",
            Self::Saturated => "saturated",
        };
        write!(f, "{}", s)
    }
}

/// Tracks the state of one domain-glob group during crawling
///
/// Holds the group's FIFO queue together with the counters needed to
/// enforce its parallelism and dispatch spacing.
#[derive(Debug, Default)]
pub struct RateState {
    /// URLs waiting for dispatch, oldest first
    queue: VecDeque<FrontierEntry>,

    /// Number of dispatched URLs that have not completed
    in_flight: usize,

    /// When the last URL of this group was dispatched
    last_dispatch: Option<Instant>,

    /// Required spacing after `last_dispatch` (delay plus the rolled jitter)
    next_gap: Duration,
}

impl RateState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a URL to the back of the queue
    pub fn push(&mut self, entry: FrontierEntry) {
        self.queue.push_back(entry);
    }

    /// Number of queued URLs
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of dispatched URLs that have not completed
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Current status of the group under `rule`
    pub fn status(&self, rule: &LimitRule) -> GroupStatus {
        if self.is_saturated(rule) {
            GroupStatus::Saturated
        } else if self.queue.is_empty() && self.in_flight == 0 {
            GroupStatus::Idle
        } else {
            GroupStatus::Dispatching
        }
    }

    /// Checks if the group has reached its parallelism
    ///
    /// A parallelism of 0 never saturates.
    pub fn is_saturated(&self, rule: &LimitRule) -> bool {
        rule.parallelism > 0 && self.in_flight >= rule.parallelism
    }

    /// Calculates the time until the next dispatch is allowed
    ///
    /// Returns None if the spacing since the last dispatch has already elapsed.
    pub fn time_until_next_dispatch(&self, now: Instant) -> Option<Duration> {
        let last = self.last_dispatch?;
        let Some(ready_at) = last.checked_add(self.next_gap) else {
            // Past the clock's range; wait out the full gap
            return Some(self.next_gap);
        };
        (now < ready_at).then(|| ready_at - now)
    }

    /// Checks if the head of the queue may be dispatched now
    ///
    /// # Arguments
    ///
    /// * `rule` - The limit rule of this group
    /// * `now` - The current time instant
    ///
    /// # Returns
    ///
    /// * `true` - A URL is queued, the group is below its parallelism and
    ///   the dispatch spacing has elapsed
    /// * `false` - Dispatch must wait
    pub fn can_dispatch(&self, rule: &LimitRule, now: Instant) -> bool {
        !self.queue.is_empty()
            && !self.is_saturated(rule)
            && self.time_until_next_dispatch(now).is_none()
    }

    /// Pops the head of the queue and records the dispatch
    ///
    /// `gap` is the spacing the following dispatch must respect.
    pub fn record_dispatch(&mut self, now: Instant, gap: Duration) -> Option<FrontierEntry> {
        let entry = self.queue.pop_front()?;
        self.in_flight += 1;
        self.last_dispatch = Some(now);
        self.next_gap = gap;
        Some(entry)
    }

    /// Records that a dispatched URL finished, successfully or not
    pub fn record_completion(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Drops every queued URL
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
