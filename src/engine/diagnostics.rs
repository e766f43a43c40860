//! Read-only corpus checks.
//!
//! The planner assumes a consistent corpus and degrades quietly when it is
//! not: dangling edges are skipped, unknown entry services seed nothing, and
//! REQUIRES cycles drop services from journeys. [`lint`] surfaces each of
//! those conditions up front. It reports and never repairs.

use super::index::GraphIndex;
use crate::corpus::Corpus;
use crate::model::EdgeKind;
use crate::rule::Rule;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// An edge endpoint that is not a service.
    DanglingEdge { from: String, to: String, missing: String },
    DuplicateEdge { from: String, to: String, edge: EdgeKind },
    /// A life event entry that is not a service.
    UnknownEntryNode { life_event: String, service: String },
    EmptyLifeEvent { life_event: String },
    /// A dependency rule naming a service that does not exist.
    UnknownDependency { service: String, depends_on: String },
    /// A rule field that is not a dotted identifier path.
    MalformedFieldPath { service: String, field: String },
    /// Services on, or between, REQUIRES cycles. They never get a phase.
    RequiresCycle { services: Vec<String> },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::DanglingEdge { from, to, missing } => {
                write!(f, "edge {from} -> {to} references unknown service '{missing}'")
            }
            Finding::DuplicateEdge { from, to, edge } => write!(f, "duplicate {edge:?} edge {from} -> {to}"),
            Finding::UnknownEntryNode { life_event, service } => {
                write!(f, "life event '{life_event}' enters at unknown service '{service}'")
            }
            Finding::EmptyLifeEvent { life_event } => write!(f, "life event '{life_event}' has no entry services"),
            Finding::UnknownDependency { service, depends_on } => {
                write!(f, "service '{service}' has a dependency rule on unknown service '{depends_on}'")
            }
            Finding::MalformedFieldPath { service, field } => {
                write!(f, "service '{service}' has a rule on malformed field path '{field}'")
            }
            Finding::RequiresCycle { services } => {
                write!(f, "REQUIRES cycle; never phased: {}", services.join(", "))
            }
        }
    }
}

/// Run every check. Findings come out in a stable order.
pub fn lint(corpus: &Corpus, index: &GraphIndex) -> Vec<Finding> {
    let mut findings = Vec::new();
    check_edges(corpus, index, &mut findings);
    check_life_events(corpus, index, &mut findings);
    check_rules(corpus, index, &mut findings);
    if let Some(cycle) = requires_cycle(corpus, index) {
        findings.push(cycle);
    }
    tracing::debug!(findings = findings.len(), "corpus lint finished");
    findings
}

fn check_edges(corpus: &Corpus, index: &GraphIndex, findings: &mut Vec<Finding>) {
    let mut seen: HashSet<(&str, &str, EdgeKind)> = HashSet::new();
    for edge in corpus.edges() {
        for endpoint in [&edge.from, &edge.to] {
            if !index.contains(endpoint) {
                findings.push(Finding::DanglingEdge {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
        if !seen.insert((edge.from.as_str(), edge.to.as_str(), edge.kind)) {
            findings.push(Finding::DuplicateEdge { from: edge.from.clone(), to: edge.to.clone(), edge: edge.kind });
        }
    }
}

fn check_life_events(corpus: &Corpus, index: &GraphIndex, findings: &mut Vec<Finding>) {
    for event in corpus.life_events() {
        if event.entry_nodes.is_empty() {
            findings.push(Finding::EmptyLifeEvent { life_event: event.id.clone() });
        }
        for entry in event.entry_nodes.iter().filter(|id| !index.contains(id)) {
            findings.push(Finding::UnknownEntryNode { life_event: event.id.clone(), service: entry.clone() });
        }
    }
}

fn check_rules(corpus: &Corpus, index: &GraphIndex, findings: &mut Vec<Finding>) {
    let path = regex!(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_-]+)*$");
    for service in corpus.services() {
        let Some(rules) = service.eligibility.structured_rules() else {
            continue;
        };
        for top in rules {
            top.walk(&mut |rule| match rule {
                Rule::Dependency { service_id, .. } if !index.contains(service_id) => {
                    findings.push(Finding::UnknownDependency {
                        service: service.id.clone(),
                        depends_on: service_id.clone(),
                    });
                }
                Rule::Comparison { field, .. } | Rule::Boolean { field, .. } | Rule::Enum { field, .. }
                    if !path.is_match(field) =>
                {
                    findings.push(Finding::MalformedFieldPath { service: service.id.clone(), field: field.clone() });
                }
                _ => {}
            });
        }
    }
}

/// Kahn-peel the REQUIRES graph from both ends; whatever survives both
/// passes sits on a cycle or on a path between cycles.
fn requires_cycle(corpus: &Corpus, index: &GraphIndex) -> Option<Finding> {
    let ids: Vec<&str> = corpus.services().map(|s| s.id.as_str()).collect();
    let forward = peel(&ids, |id| index.incoming(id), |id| index.outgoing(id));
    let backward = peel(&ids, |id| index.outgoing(id), |id| index.incoming(id));

    let services: BTreeSet<String> = forward.intersection(&backward).map(|id| id.to_string()).collect();
    if services.is_empty() {
        None
    } else {
        Some(Finding::RequiresCycle { services: services.into_iter().collect() })
    }
}

/// Repeatedly remove nodes with no remaining REQUIRES predecessors (as given
/// by `preds`); return the ones that could not be removed.
fn peel<'a>(
    ids: &[&'a str],
    preds: impl Fn(&str) -> &'a [super::index::Link],
    succs: impl Fn(&str) -> &'a [super::index::Link],
) -> HashSet<&'a str> {
    let mut degree: HashMap<&'a str, usize> = ids
        .iter()
        .map(|&id| (id, preds(id).iter().filter(|l| l.kind == EdgeKind::Requires).count()))
        .collect();
    let mut ready: Vec<&'a str> = ids.iter().copied().filter(|id| degree.get(id) == Some(&0)).collect();

    while let Some(id) = ready.pop() {
        for link in succs(id).iter().filter(|l| l.kind == EdgeKind::Requires) {
            if let Some(d) = degree.get_mut(link.id.as_str()) {
                if *d > 0 {
                    *d -= 1;
                    if *d == 0 {
                        ready.push(link.id.as_str());
                    }
                }
            }
        }
    }

    degree.into_iter().filter(|(_, d)| *d > 0).map(|(id, _)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, LifeEvent, ServiceNode};
    use serde_json::json;

    fn corpus(edges: Vec<Edge>, events: Vec<LifeEvent>) -> Corpus {
        let services: Vec<ServiceNode> = serde_json::from_value(json!([
            {"id": "a", "name": "A", "dept": "d", "category": "benefit"},
            {"id": "b", "name": "B", "dept": "d", "category": "benefit"},
            {"id": "c", "name": "C", "dept": "d", "category": "benefit"},
            {"id": "d", "name": "D", "dept": "d", "category": "benefit", "eligibility": {"rules": [
                {"type": "dependency", "serviceId": "ghost", "label": "?"},
                {"type": "not", "label": "?", "rule":
                    {"type": "boolean", "field": "bad path!", "value": true, "label": "?"}}
            ]}}
        ]))
        .unwrap();
        Corpus::new(services, edges, events).unwrap()
    }

    #[test]
    fn clean_corpus_has_no_findings() {
        let corpus = Corpus::builtin().unwrap();
        let index = GraphIndex::from_corpus(&corpus);
        assert_eq!(lint(&corpus, &index), Vec::<Finding>::new());
    }

    #[test]
    fn reports_structural_problems() {
        let c = corpus(
            vec![
                Edge::new("a", "zzz", EdgeKind::Enables),
                Edge::new("a", "b", EdgeKind::Enables),
                Edge::new("a", "b", EdgeKind::Enables),
            ],
            vec![LifeEvent { id: "e".into(), name: "E".into(), description: None, entry_nodes: vec!["nope".into()] }],
        );
        let index = GraphIndex::from_corpus(&c);
        let findings = lint(&c, &index);

        assert!(findings.contains(&Finding::DanglingEdge { from: "a".into(), to: "zzz".into(), missing: "zzz".into() }));
        assert!(findings.contains(&Finding::DuplicateEdge { from: "a".into(), to: "b".into(), edge: EdgeKind::Enables }));
        assert!(findings.contains(&Finding::UnknownEntryNode { life_event: "e".into(), service: "nope".into() }));
        assert!(findings.contains(&Finding::UnknownDependency { service: "d".into(), depends_on: "ghost".into() }));
        assert!(findings.contains(&Finding::MalformedFieldPath { service: "d".into(), field: "bad path!".into() }));
    }

    #[test]
    fn cycle_members_are_reported_but_not_their_neighbours() {
        // a -> b -> c -> b, plus d -> a. Only b and c are on the cycle.
        let c = corpus(
            vec![
                Edge::new("a", "b", EdgeKind::Requires),
                Edge::new("b", "c", EdgeKind::Requires),
                Edge::new("c", "b", EdgeKind::Requires),
                Edge::new("d", "a", EdgeKind::Requires),
            ],
            vec![],
        );
        let index = GraphIndex::from_corpus(&c);
        let findings = lint(&c, &index);

        assert!(findings.contains(&Finding::RequiresCycle { services: vec!["b".into(), "c".into()] }));
        assert_eq!(findings[findings.len() - 1].to_string(), "REQUIRES cycle; never phased: b, c");
    }

    #[test]
    fn enables_cycles_are_fine() {
        let c = corpus(vec![Edge::new("a", "b", EdgeKind::Enables), Edge::new("b", "a", EdgeKind::Enables)], vec![]);
        let index = GraphIndex::from_corpus(&c);
        assert!(!lint(&c, &index).iter().any(|f| matches!(f, Finding::RequiresCycle { .. })));
    }
}
