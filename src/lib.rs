//! civicroute: government-service journey planning and three-valued
//! eligibility checks over a static service graph.
//!
//! ```text
//! Corpus (services, edges, life events)
//!    │
//!    ├─ Planner::build_journey(["baby"])      ──▶ phases of services
//!    └─ Planner::evaluate_journey(.., facts)  ──▶ eligible / not_eligible / needs_more_info
//! ```
//!
//! The core is pure and infallible: unknown ids and missing facts shrink or
//! soften the output instead of raising errors. Only loading a corpus or a
//! facts file can fail.

#[macro_use]
mod macros;
mod api;
mod corpus;
mod engine;
mod error;
mod facts;
mod model;
mod rule;

pub use api::{Assessment, Options, Planner};
pub use corpus::Corpus;
pub use engine::{
    DeadlineStatus, DiscoveryMetrics, Finding, GraphIndex, JourneyBuilder, JourneyMetrics, JourneyPhase,
    JourneyResult, JourneyRun, JourneyService, JourneySummary, Link, NextQuestion, OrderingMetrics, RuleResult,
    RuleVerdict, ServiceEligibilityResult, ServiceVerdict, all_of, any_of, evaluate_journey, evaluate_rule,
    evaluate_service_eligibility, lint, next_question, phase_label,
};
pub use error::{CorpusError, FactError};
pub use facts::{FactSheet, UserContext, parse_assignment, parse_fact_date};
pub use model::{Edge, EdgeKind, Eligibility, LifeEvent, Nation, NationSet, ServiceCategory, ServiceNode};
pub use rule::{DependencyCondition, Operator, Rule};
