//! Journey build metrics.
//!
//! Opt-in timing and counters for one journey build, returned by
//! `JourneyBuilder::build_with_metrics`. The plain `build` path discards them.
//!
//! `OrderingMetrics::unplaced` lists in-scope services that never reached a
//! phase because they sit on (or behind) a REQUIRES cycle. The journey itself
//! silently omits them; this is where that omission becomes visible.

use super::journey::JourneyResult;
use std::time::Duration;

/// A journey bundled with the metrics of the build that produced it.
#[derive(Debug, Clone)]
pub struct JourneyRun<'a> {
    pub journey: JourneyResult<'a>,
    pub metrics: JourneyMetrics,
}

#[derive(Debug, Default, Clone)]
pub struct JourneyMetrics {
    /// Total elapsed time for the build.
    pub total: Duration,
    pub discovery: DiscoveryMetrics,
    pub ordering: OrderingMetrics,
}

/// Breadth-first discovery over all edge types.
#[derive(Debug, Default, Clone)]
pub struct DiscoveryMetrics {
    pub duration: Duration,
    /// Entry services seeded from known life events.
    pub seeded: usize,
    /// Queue pops, including re-visits caused by tag growth.
    pub visits: usize,
    /// Outgoing edges inspected.
    pub edges_examined: usize,
    /// Requested life event ids that matched nothing.
    pub unknown_events: Vec<String>,
}

/// Kahn layering over REQUIRES edges.
#[derive(Debug, Default, Clone)]
pub struct OrderingMetrics {
    pub duration: Duration,
    pub phases: usize,
    pub placed: usize,
    pub unplaced: Vec<String>,
}
