//! Journey planning: discovery, then phase layering.
//!
//! A journey is built in three steps over the immutable [`GraphIndex`]:
//!
//! ```text
//! life event ids ── seed ──▶ entry services (tagged with their event)
//!                               │
//!                               ▼
//!               discover (BFS, REQUIRES + ENABLES)
//!                 - scope grows, never shrinks
//!                 - event tags flow along every edge
//!                               │
//!                               ▼
//!               layer (Kahn, REQUIRES only, in-scope only)
//!                 - phase k = nodes whose last prerequisite sat in phase k-1
//!                               │
//!                               ▼
//!               shape (requires / enables / triggeredBy views + summary)
//! ```
//!
//! ## Tags
//!
//! A service's `triggeredBy` set is the union of the event tags of every
//! in-scope service with an edge into it, transitively. When a service that has
//! already been visited picks up new tags it is queued again, so the tags
//! reach everything downstream no matter which path found the service first.
//! Each re-queue needs a strictly larger tag set, so discovery still ends.
//!
//! ## REQUIRES cycles
//!
//! Services on a REQUIRES cycle inside the scope never reach in-degree zero,
//! and neither does anything that requires them. They are left out of every
//! phase without an error. The journey does not mention them; the build
//! metrics (`OrderingMetrics::unplaced`) and a `warn!` trace do.

use super::index::GraphIndex;
use super::metrics::{DiscoveryMetrics, JourneyMetrics, JourneyRun, OrderingMetrics};
use crate::corpus::Corpus;
use crate::model::{EdgeKind, ServiceNode};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::time::Instant;

/// In-scope services in discovery order, each with its triggering events.
pub(crate) type Scope<'a> = IndexMap<&'a str, BTreeSet<&'a str>>;

// --- Results ------------------------------------------------------------------------

/// A service placed in a journey phase.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyService<'a> {
    #[serde(flatten)]
    pub node: &'a ServiceNode,
    /// In-scope services that must be completed first.
    pub requires: Vec<&'a str>,
    /// In-scope services this one leads to, over any edge type.
    pub enables: Vec<&'a str>,
    /// Requested life events whose discovery reached this service.
    pub triggered_by: Vec<&'a str>,
}

impl JourneyService<'_> {
    pub fn id(&self) -> &str {
        &self.node.id
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyPhase<'a> {
    /// 1-based phase number.
    pub phase: usize,
    pub label: String,
    pub services: Vec<JourneyService<'a>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneySummary {
    pub total_services: usize,
    /// Number of distinct departments touched.
    pub departments: usize,
    /// Services carrying a deadline description.
    pub with_deadlines: usize,
    pub phases: usize,
    /// The requested life event ids, as given (unknown ids included).
    pub life_events: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyResult<'a> {
    pub phases: Vec<JourneyPhase<'a>>,
    pub summary: JourneySummary,
}

impl<'a> JourneyResult<'a> {
    /// Every placed service, phase by phase.
    pub fn services(&self) -> impl Iterator<Item = &JourneyService<'a>> {
        self.phases.iter().flat_map(|p| p.services.iter())
    }

    pub fn service(&self, id: &str) -> Option<&JourneyService<'a>> {
        self.services().find(|s| s.node.id == id)
    }

    /// The 1-based phase holding `id`, if it was placed.
    pub fn phase_of(&self, id: &str) -> Option<usize> {
        self.phases.iter().find(|p| p.services.iter().any(|s| s.node.id == id)).map(|p| p.phase)
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

pub fn phase_label(phase: usize) -> String {
    if phase == 1 { "Start here".to_string() } else { format!("Step {phase}") }
}

// --- Builder --------------------------------------------------------------------------

/// Plans journeys over a corpus and its prebuilt index.
///
/// Holds only shared references; every build allocates its own scope and
/// in-degree state, so one builder can serve any number of callers.
#[derive(Debug, Clone, Copy)]
pub struct JourneyBuilder<'a> {
    corpus: &'a Corpus,
    index: &'a GraphIndex,
}

impl<'a> JourneyBuilder<'a> {
    pub fn new(corpus: &'a Corpus, index: &'a GraphIndex) -> Self {
        JourneyBuilder { corpus, index }
    }

    /// Plan a journey for the given life events. Unknown ids seed nothing.
    pub fn build<S: AsRef<str>>(&self, event_ids: &[S]) -> JourneyResult<'a> {
        self.build_with_metrics(event_ids).journey
    }

    /// Like [`build`](Self::build), also returning per-stage metrics.
    pub fn build_with_metrics<S: AsRef<str>>(&self, event_ids: &[S]) -> JourneyRun<'a> {
        let total_start = Instant::now();
        let mut metrics = JourneyMetrics::default();

        let discovery_start = Instant::now();
        let scope = self.discover(event_ids, &mut metrics.discovery);
        metrics.discovery.duration = discovery_start.elapsed();

        let ordering_start = Instant::now();
        let layers = self.layer(&scope, &mut metrics.ordering);
        metrics.ordering.duration = ordering_start.elapsed();

        let journey = self.shape(layers, &scope, event_ids);
        metrics.total = total_start.elapsed();

        tracing::debug!(
            services = journey.summary.total_services,
            phases = journey.summary.phases,
            visits = metrics.discovery.visits,
            "journey built"
        );
        JourneyRun { journey, metrics }
    }

    /// Seed from life events, then BFS over every edge type.
    pub(crate) fn discover<S: AsRef<str>>(&self, event_ids: &[S], metrics: &mut DiscoveryMetrics) -> Scope<'a> {
        let mut scope: Scope<'a> = IndexMap::new();
        let mut queue: VecDeque<&'a str> = VecDeque::new();
        let mut queued: HashSet<&'a str> = HashSet::new();

        for requested in event_ids {
            let Some(event) = self.corpus.life_event(requested.as_ref()) else {
                tracing::debug!(event = requested.as_ref(), "unknown life event ignored");
                metrics.unknown_events.push(requested.as_ref().to_string());
                continue;
            };
            for entry in &event.entry_nodes {
                let Some(node) = self.corpus.service(entry) else {
                    tracing::warn!(event = %event.id, entry = %entry, "life event entry is not a known service");
                    continue;
                };
                let id = node.id.as_str();
                scope.entry(id).or_default().insert(event.id.as_str());
                if queued.insert(id) {
                    queue.push_back(id);
                    metrics.seeded += 1;
                }
            }
        }

        while let Some(id) = queue.pop_front() {
            queued.remove(id);
            metrics.visits += 1;
            let tags = scope.get(id).cloned().unwrap_or_default();

            for link in self.index.outgoing(id) {
                metrics.edges_examined += 1;
                let neighbor = link.id.as_str();
                let grew = match scope.get_mut(neighbor) {
                    Some(existing) => {
                        let before = existing.len();
                        existing.extend(tags.iter().copied());
                        existing.len() > before
                    }
                    None => {
                        tracing::trace!(from = id, to = neighbor, kind = ?link.kind, "discovered");
                        scope.insert(neighbor, tags.clone());
                        true
                    }
                };
                if grew && queued.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }

        scope
    }

    /// Kahn layering over in-scope REQUIRES edges.
    pub(crate) fn layer(&self, scope: &Scope<'a>, metrics: &mut OrderingMetrics) -> Vec<Vec<&'a str>> {
        let mut in_degree: HashMap<&'a str, usize> = HashMap::with_capacity(scope.len());
        for &id in scope.keys() {
            let count = self
                .index
                .incoming(id)
                .iter()
                .filter(|link| link.kind == EdgeKind::Requires && scope.contains_key(link.id.as_str()))
                .count();
            in_degree.insert(id, count);
        }

        let mut frontier: Vec<&'a str> = scope.keys().copied().filter(|id| in_degree.get(id) == Some(&0)).collect();
        let mut layers: Vec<Vec<&'a str>> = Vec::new();

        while !frontier.is_empty() {
            let mut next = Vec::new();
            for &id in &frontier {
                for link in self.index.outgoing(id).iter().filter(|link| link.kind == EdgeKind::Requires) {
                    let child = link.id.as_str();
                    // Children outside the scope have no entry.
                    if let Some(degree) = in_degree.get_mut(child) {
                        if *degree == 0 {
                            continue;
                        }
                        *degree -= 1;
                        if *degree == 0 {
                            next.push(child);
                        }
                    }
                }
            }
            tracing::trace!(phase = layers.len() + 1, services = ?frontier, "phase");
            layers.push(frontier);
            frontier = next;
        }

        metrics.phases = layers.len();
        metrics.placed = layers.iter().map(Vec::len).sum();
        if metrics.placed < scope.len() {
            let placed: HashSet<&str> = layers.iter().flatten().copied().collect();
            metrics.unplaced = scope.keys().filter(|id| !placed.contains(*id)).map(|id| id.to_string()).collect();
            tracing::warn!(unplaced = ?metrics.unplaced, "REQUIRES cycle in scope; services left out of the journey");
        }

        layers
    }

    fn shape<S: AsRef<str>>(&self, layers: Vec<Vec<&'a str>>, scope: &Scope<'a>, event_ids: &[S]) -> JourneyResult<'a> {
        let mut departments: BTreeSet<&str> = BTreeSet::new();
        let mut total_services = 0;
        let mut with_deadlines = 0;

        let phases: Vec<JourneyPhase<'a>> = layers
            .into_iter()
            .enumerate()
            .map(|(idx, layer)| {
                let services: Vec<JourneyService<'a>> = layer
                    .into_iter()
                    .filter_map(|id| {
                        let node = self.corpus.service(id)?;
                        Some(JourneyService {
                            node,
                            requires: self.requires_of(id, scope),
                            enables: self.enables_of(id, scope),
                            triggered_by: scope.get(id).map(|tags| tags.iter().copied().collect()).unwrap_or_default(),
                        })
                    })
                    .collect();

                for service in &services {
                    total_services += 1;
                    departments.insert(service.node.dept.as_str());
                    if service.node.deadline.is_some() {
                        with_deadlines += 1;
                    }
                }

                JourneyPhase { phase: idx + 1, label: phase_label(idx + 1), services }
            })
            .collect();

        let summary = JourneySummary {
            total_services,
            departments: departments.len(),
            with_deadlines,
            phases: phases.len(),
            life_events: event_ids.iter().map(|id| id.as_ref().to_string()).collect(),
        };
        JourneyResult { phases, summary }
    }

    fn requires_of(&self, id: &str, scope: &Scope<'a>) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        self.index
            .incoming(id)
            .iter()
            .filter(|link| link.kind == EdgeKind::Requires)
            .filter_map(|link| scope.get_key_value(link.id.as_str()).map(|(k, _)| *k))
            .filter(|k| seen.insert(*k))
            .collect()
    }

    fn enables_of(&self, id: &str, scope: &Scope<'a>) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        self.index
            .outgoing(id)
            .iter()
            .filter_map(|link| scope.get_key_value(link.id.as_str()).map(|(k, _)| *k))
            .filter(|k| seen.insert(*k))
            .collect()
    }
}
