//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `FrontierEntry`: A claimed URL waiting in (or released from) the frontier
//! - `RateState`: Per-group queue and dispatch bookkeeping for rate limiting
//! - `GroupStatus`: Whether a group is idle, dispatching or saturated

mod entry;
mod rate_state;

// Re-export main types
pub use entry::FrontierEntry;
pub use rate_state::{GroupStatus, RateState};
