//! The static corpus of services, edges and life events.
//!
//! The engine treats the corpus as given: it is read once, never mutated, and
//! assumed to be internally consistent. Loading only enforces what the
//! in-memory shape needs (unique ids); dangling references are left for
//! [`crate::engine::lint`] to report.

use crate::error::CorpusError;
use crate::model::{Edge, LifeEvent, ServiceNode};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

const BUILTIN_CORPUS: &str = include_str!("../data/corpus.json");

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CorpusDocument {
    services: Vec<ServiceNode>,
    #[serde(default)]
    edges: Vec<Edge>,
    #[serde(default)]
    life_events: Vec<LifeEvent>,
}

/// Services keyed by id (file order preserved), edges, and life events.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    services: IndexMap<String, ServiceNode>,
    edges: Vec<Edge>,
    life_events: IndexMap<String, LifeEvent>,
}

impl Corpus {
    pub fn new(services: Vec<ServiceNode>, edges: Vec<Edge>, life_events: Vec<LifeEvent>) -> Result<Self, CorpusError> {
        let mut by_id = IndexMap::with_capacity(services.len());
        for service in services {
            if by_id.contains_key(&service.id) {
                return Err(CorpusError::DuplicateService(service.id));
            }
            by_id.insert(service.id.clone(), service);
        }

        let mut events = IndexMap::with_capacity(life_events.len());
        for event in life_events {
            if events.contains_key(&event.id) {
                return Err(CorpusError::DuplicateLifeEvent(event.id));
            }
            events.insert(event.id.clone(), event);
        }

        tracing::debug!(services = by_id.len(), edges = edges.len(), life_events = events.len(), "corpus loaded");
        Ok(Corpus { services: by_id, edges, life_events: events })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CorpusError> {
        let doc: CorpusDocument = serde_json::from_str(raw)?;
        Corpus::new(doc.services, doc.edges, doc.life_events)
    }

    pub fn from_path(path: &Path) -> Result<Self, CorpusError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| CorpusError::Io { path: path.to_path_buf(), source })?;
        Corpus::from_json_str(&raw)
    }

    /// The sample corpus shipped with the crate.
    pub fn builtin() -> Result<Self, CorpusError> {
        Corpus::from_json_str(BUILTIN_CORPUS)
    }

    pub fn service(&self, id: &str) -> Option<&ServiceNode> {
        self.services.get(id)
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceNode> {
        self.services.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn life_event(&self, id: &str) -> Option<&LifeEvent> {
        self.life_events.get(id)
    }

    pub fn life_events(&self) -> impl Iterator<Item = &LifeEvent> {
        self.life_events.values()
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_corpus_loads() {
        let corpus = Corpus::builtin().unwrap();
        assert!(corpus.service_count() > 10);
        assert!(corpus.life_event("baby").is_some());
        assert!(corpus.life_event("bereavement").is_some());
        assert!(corpus.service("register-birth").is_some());
    }

    #[test]
    fn duplicate_service_ids_are_rejected() {
        let raw = r#"{
            "services": [
                {"id": "a", "name": "A", "dept": "x", "category": "benefit"},
                {"id": "a", "name": "A again", "dept": "x", "category": "grant"}
            ]
        }"#;
        assert!(matches!(Corpus::from_json_str(raw), Err(CorpusError::DuplicateService(id)) if id == "a"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Corpus::from_path(Path::new("/nonexistent/corpus.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/corpus.json"));
    }
}
