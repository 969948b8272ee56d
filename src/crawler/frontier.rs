//! Frontier: pending URLs, the visited set and per-group rate limiting
//!
//! This module handles:
//! - Claiming each canonical URL exactly once (visited set)
//! - Filtering offered URLs through the allow/deny patterns
//! - FIFO queues per domain-glob group
//! - Enforcing each group's parallelism and dispatch spacing
//! - Detecting when the crawl is drained
//!
//! All bookkeeping sits behind one mutex, so the visited check, the enqueue
//! and the dispatch decision are atomic with respect to each other.

use super::limits::Limits;
use crate::state::{FrontierEntry, GroupStatus, RateState};
use crate::url::{canonical_key, normalize_parsed, UrlFilter};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use url::Url;

/// Outcome of offering a URL to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// Newly claimed and queued
    Queued,

    /// Already claimed earlier
    Seen,

    /// Rejected by the URL filter or not an HTTP(S) URL
    Filtered,

    /// The frontier is closed
    Closed,
}

/// Outcome of claiming the target of a redirect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectClaim {
    /// The target has the same canonical form as the requested URL
    Unchanged,

    /// The target was not claimed before and now is
    Claimed,

    /// The target was already claimed by another fetch or offer
    Seen,

    /// The target is rejected by the URL filter
    Filtered,
}

/// A URL released to a worker
///
/// The group's in-flight slot is held until this guard is dropped, whether
/// the fetch succeeded or not.
pub struct Dispatch<'a> {
    frontier: &'a Frontier,
    group: usize,

    /// The URL to process
    pub entry: FrontierEntry,

    /// When the frontier released the URL
    pub dispatched_at: Instant,
}

impl Drop for Dispatch<'_> {
    fn drop(&mut self) {
        self.frontier.complete(self.group);
    }
}

struct FrontierInner {
    groups: Vec<RateState>,
    visited: HashSet<String>,
    /// Group to look at first on the next dispatch
    cursor: usize,
    closed: bool,
}

impl FrontierInner {
    fn pending(&self) -> usize {
        self.groups.iter().map(RateState::pending).sum()
    }

    fn in_flight(&self) -> usize {
        self.groups.iter().map(RateState::in_flight).sum()
    }
}

/// What `next` should do after inspecting the groups
enum Poll {
    Ready(usize, FrontierEntry, Instant),
    /// Sleep at most this long, or until woken
    Wait(Option<Duration>),
    Drained,
}

/// The crawl frontier
pub struct Frontier {
    inner: Mutex<FrontierInner>,
    limits: Limits,
    filter: UrlFilter,
    notify: Notify,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `limits` - Grouping and pacing rules
    /// * `filter` - Allow/deny patterns every offered URL must pass
    pub fn new(limits: Limits, filter: UrlFilter) -> Self {
        let groups = (0..limits.group_count()).map(|_| RateState::new()).collect();
        Self {
            inner: Mutex::new(FrontierInner {
                groups,
                visited: HashSet::new(),
                cursor: 0,
                closed: false,
            }),
            limits,
            filter,
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierInner> {
        // No code path panics while holding the lock
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Offers a URL for crawling
    ///
    /// The URL is normalized (fragment removed) and checked against the
    /// filter. If its canonical form has not been claimed yet, it is claimed
    /// and appended to its group's queue.
    ///
    /// # Arguments
    ///
    /// * `url` - The discovered or seed URL
    /// * `depth` - Link distance from the start URL
    pub fn offer(&self, url: Url, depth: u32) -> Offer {
        let url = match normalize_parsed(url) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Not offering URL: {}", e);
                return Offer::Filtered;
            }
        };

        if !self.filter.allows(url.as_str()) {
            tracing::debug!("Filtered out: {}", url);
            return Offer::Filtered;
        }

        let entry = FrontierEntry::new(url, depth);
        let group = self.limits.group_for(&entry.url);

        {
            let mut inner = self.lock();
            if inner.closed {
                return Offer::Closed;
            }
            if !inner.visited.insert(entry.key.clone()) {
                return Offer::Seen;
            }
            tracing::trace!("Queued {} in group {}", entry.url, group);
            inner.groups[group].push(entry);
        }

        self.notify.notify_waiters();
        Offer::Queued
    }

    /// Claims the final URL of a fetch that was redirected
    ///
    /// The target passes the same filter and visited set as offered URLs,
    /// so a redirect cannot reach a denied page or emit a page twice. A
    /// claimed target is not queued; the redirected fetch already holds it.
    pub fn claim_redirect(&self, entry: &FrontierEntry, target: &Url) -> RedirectClaim {
        let target = match normalize_parsed(target.clone()) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Redirect target rejected: {}", e);
                return RedirectClaim::Filtered;
            }
        };

        let key = canonical_key(&target);
        if key == entry.key {
            return RedirectClaim::Unchanged;
        }

        if !self.filter.allows(target.as_str()) {
            return RedirectClaim::Filtered;
        }

        if self.lock().visited.insert(key) {
            RedirectClaim::Claimed
        } else {
            RedirectClaim::Seen
        }
    }

    /// Offers several URLs, returning how many were newly queued
    pub fn offer_all<I>(&self, urls: I, depth: u32) -> usize
    where
        I: IntoIterator<Item = Url>,
    {
        urls.into_iter()
            .map(|url| self.offer(url, depth))
            .filter(|offer| *offer == Offer::Queued)
            .count()
    }

    /// Waits for the next URL that may be fetched
    ///
    /// Groups are visited round robin so that one busy group cannot starve
    /// the others.
    ///
    /// # Returns
    ///
    /// * `Some(Dispatch)` - A URL whose group allows a dispatch now
    /// * `None` - The frontier is drained (nothing queued, nothing in flight)
    ///   or closed
    pub async fn next(&self) -> Option<Dispatch<'_>> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before inspecting state so a wakeup in between is not lost
            notified.as_mut().enable();

            let poll = {
                let mut inner = self.lock();
                if inner.closed {
                    return None;
                }
                self.poll_dispatch(&mut inner, Instant::now())
            };

            match poll {
                Poll::Ready(group, entry, dispatched_at) => {
                    return Some(Dispatch {
                        frontier: self,
                        group,
                        entry,
                        dispatched_at,
                    });
                }
                Poll::Drained => {
                    // Wake the other idle workers so they observe the drain too
                    self.notify.notify_waiters();
                    return None;
                }
                Poll::Wait(Some(wait)) => {
                    tokio::select! {
                        _ = &mut notified => {}
                        _ = tokio::time::sleep(wait) => {}
                    }
                }
                Poll::Wait(None) => notified.await,
            }
        }
    }

    fn poll_dispatch(&self, inner: &mut FrontierInner, now: Instant) -> Poll {
        let count = inner.groups.len();
        let mut shortest_wait: Option<Duration> = None;

        for offset in 0..count {
            let group = (inner.cursor + offset) % count;
            let rule = self.limits.rule(group);
            let state = &mut inner.groups[group];

            if state.can_dispatch(rule, now) {
                if let Some(entry) = state.record_dispatch(now, rule.roll_gap()) {
                    inner.cursor = (group + 1) % count;
                    return Poll::Ready(group, entry, now);
                }
            } else if state.pending() > 0 && !state.is_saturated(rule) {
                if let Some(wait) = state.time_until_next_dispatch(now) {
                    shortest_wait = Some(shortest_wait.map_or(wait, |w| w.min(wait)));
                }
            }
        }

        if shortest_wait.is_none() && inner.pending() == 0 && inner.in_flight() == 0 {
            return Poll::Drained;
        }

        Poll::Wait(shortest_wait)
    }

    fn complete(&self, group: usize) {
        self.lock().groups[group].record_completion();
        self.notify.notify_waiters();
    }

    /// Stops the frontier: queued URLs are dropped, further offers are
    /// refused and every waiting `next` returns `None`
    pub fn close(&self) {
        {
            let mut inner = self.lock();
            inner.closed = true;
            inner.groups.iter_mut().for_each(RateState::clear);
        }
        self.notify.notify_waiters();
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of queued URLs across all groups
    pub fn pending(&self) -> usize {
        self.lock().pending()
    }

    /// Number of dispatched URLs that have not completed
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight()
    }

    /// Number of URLs ever claimed
    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    /// Status of every group, in group order (the default group last)
    pub fn group_status(&self) -> Vec<GroupStatus> {
        let inner = self.lock();
        inner
            .groups
            .iter()
            .enumerate()
            .map(|(group, state)| state.status(self.limits.rule(group)))
            .collect()
    }

    /// The limits this frontier enforces
    pub fn limits(&self) -> &Limits {
        &self.limits
    }
}
