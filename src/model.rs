//! Static corpus records: services, edges and life events.
//!
//! Everything in this module is immutable once loaded. The engine only ever
//! borrows these records; results produced by the journey builder and the
//! eligibility aggregator point back into them.

use crate::rule::Rule;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// --- Nations ----------------------------------------------------------------

/// A UK nation, as named in corpus files and user facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nation {
    England,
    Scotland,
    Wales,
    NorthernIreland,
}

impl Nation {
    pub const ALL: [Nation; 4] = [Nation::England, Nation::Scotland, Nation::Wales, Nation::NorthernIreland];

    fn flag(self) -> NationSet {
        match self {
            Nation::England => NationSet::ENGLAND,
            Nation::Scotland => NationSet::SCOTLAND,
            Nation::Wales => NationSet::WALES,
            Nation::NorthernIreland => NationSet::NORTHERN_IRELAND,
        }
    }
}

bitflags::bitflags! {
    /// The nations a service is available in.
    ///
    /// Stored as a list of nation names in corpus files.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NationSet: u8 {
        const ENGLAND          = 1 << 0;
        const SCOTLAND         = 1 << 1;
        const WALES            = 1 << 2;
        const NORTHERN_IRELAND = 1 << 3;
    }
}

impl NationSet {
    pub fn contains_nation(&self, nation: Nation) -> bool {
        self.contains(nation.flag())
    }

    /// Nations in this set, in a fixed order.
    pub fn nations(&self) -> Vec<Nation> {
        Nation::ALL.into_iter().filter(|n| self.contains_nation(*n)).collect()
    }
}

impl FromIterator<Nation> for NationSet {
    fn from_iter<I: IntoIterator<Item = Nation>>(iter: I) -> Self {
        iter.into_iter().fold(NationSet::empty(), |acc, n| acc | n.flag())
    }
}

impl Serialize for NationSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.nations().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NationSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let list = Vec::<Nation>::deserialize(deserializer)?;
        Ok(list.into_iter().collect())
    }
}

// --- Services -----------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Benefit,
    Entitlement,
    Obligation,
    Registration,
    Application,
    LegalProcess,
    Document,
    Grant,
}

/// Eligibility metadata attached to every service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    /// Plain-language summary of who qualifies.
    #[serde(default)]
    pub summary: String,
    /// Everyone qualifies. Only consulted when there are no structured rules.
    #[serde(default)]
    pub universal: bool,
    #[serde(default)]
    pub means_tested: bool,
    /// Structured rules, evaluated in order. `None` and an empty list both
    /// mean "no structured rules".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Rule>>,
    /// Human-readable questions used when no structured rules exist.
    #[serde(default)]
    pub key_questions: Vec<String>,
}

impl Eligibility {
    /// Structured rules, if any are present.
    pub fn structured_rules(&self) -> Option<&[Rule]> {
        self.rules.as_deref().filter(|rules| !rules.is_empty())
    }
}

/// A single citizen-facing service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceNode {
    pub id: String,
    pub name: String,
    /// Owning department key (e.g. `"hmrc"`).
    pub dept: String,
    pub category: ServiceCategory,
    /// Free-text deadline description, e.g. `"within 42 days of birth"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    /// Nations the service is restricted to; `None` means UK-wide.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nations: Option<NationSet>,
    #[serde(default)]
    pub eligibility: Eligibility,
}

// --- Edges and life events -------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    /// `to` is not ready until `from` is complete. Only these edges order phases.
    Requires,
    /// `from` makes `to` relevant; no ordering constraint.
    Enables,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: EdgeKind) -> Self {
        Edge { from: from.into(), to: to.into(), kind }
    }
}

/// A named situation that seeds journey discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeEvent {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub entry_nodes: Vec<String>,
}
