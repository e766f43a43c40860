//! Journey planning and eligibility engine.
//!
//! Everything here is a pure function of an immutable corpus, its prebuilt
//! [`GraphIndex`] and (for eligibility) a caller-owned fact sheet. Nothing is
//! cached between calls, so the same index can be shared by any number of
//! concurrent readers.
//!
//! ## How the parts work together
//!
//! ```text
//! Corpus ── GraphIndex::from_corpus ──▶ GraphIndex       (index.rs)
//!                                          │
//! life event ids ──▶ JourneyBuilder::build ┤              (journey.rs)
//!                      - discover (BFS, all edges, event tags)
//!                      - layer (Kahn, REQUIRES only)
//!                                          │
//!                                          ▼
//!                                   JourneyResult
//!                                          │
//! UserContext ── FactSheet ──▶ evaluate_journey          (aggregate.rs)
//!                                - evaluate_rule per top-level rule
//!                                  (evaluate.rs, three-valued)
//!                                - fold to a service verdict
//!                                          │
//!                                          ▼
//!                        Vec<ServiceEligibilityResult> ──▶ next_question
//! ```
//!
//! ## Responsibilities by module
//!
//! - `index.rs`: outgoing/incoming adjacency, built once.
//! - `journey.rs`: discovery, phase layering and result shaping.
//! - `metrics.rs`: optional timing and counters for a journey build.
//! - `evaluate.rs`: `pass | fail | unknown` for one rule tree.
//! - `aggregate.rs`: per-service verdicts, pending questions, deadline status.
//! - `diagnostics.rs`: corpus lint; reports, never repairs.
//!
//! ## Debugging
//!
//! Set `CIVICROUTE_LOG=civicroute=trace` on the CLI to see discovery and
//! layering traces.

#[path = "engine/aggregate.rs"]
mod aggregate;
#[path = "engine/diagnostics.rs"]
mod diagnostics;
#[path = "engine/evaluate.rs"]
mod evaluate;
#[path = "engine/index.rs"]
mod index;
#[path = "engine/journey.rs"]
mod journey;
#[path = "engine/metrics.rs"]
mod metrics;


pub use aggregate::{
    DeadlineStatus, NextQuestion, ServiceEligibilityResult, ServiceVerdict, evaluate_journey,
    evaluate_service_eligibility, next_question,
};
pub use diagnostics::{Finding, lint};
pub use evaluate::{RuleResult, RuleVerdict, all_of, any_of, evaluate_rule};
pub use index::{GraphIndex, Link};
pub use journey::{JourneyBuilder, JourneyPhase, JourneyResult, JourneyService, JourneySummary, phase_label};
pub use metrics::{DiscoveryMetrics, JourneyMetrics, JourneyRun, OrderingMetrics};
