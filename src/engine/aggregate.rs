//! Per-service eligibility.
//!
//! Folds the rule evaluator's per-rule verdicts into one service-level verdict
//! and the list of questions still worth asking.
//!
//! ```text
//! nation gate ──▶ excluded nation?           ──▶ not_eligible
//!      │
//!      ▼
//! structured rules? ── no ──▶ universal        ──▶ eligible
//!      │                      otherwise        ──▶ needs_more_info (keyQuestions)
//!      ▼ yes
//! evaluate each top-level rule
//!      any fail    ──▶ not_eligible
//!      any unknown ──▶ needs_more_info (labels of unknown top-level rules)
//!      else        ──▶ eligible
//! ```
//!
//! Deadline status is reported beside the verdict, never folded into it.

use super::evaluate::{RuleResult, RuleVerdict, evaluate_rule};
use super::journey::JourneyResult;
use crate::facts::FactSheet;
use crate::model::ServiceNode;
use crate::rule::Rule;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceVerdict {
    Eligible,
    NotEligible,
    NeedsMoreInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineStatus {
    /// Still inside the claim window.
    Ok,
    /// The window has passed.
    Overdue,
    /// The trigger date has not been supplied.
    UnknownTriggerDate,
}

impl DeadlineStatus {
    fn from_verdict(verdict: RuleVerdict) -> Self {
        match verdict {
            RuleVerdict::Pass => DeadlineStatus::Ok,
            RuleVerdict::Fail => DeadlineStatus::Overdue,
            RuleVerdict::Unknown => DeadlineStatus::UnknownTriggerDate,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEligibilityResult<'a> {
    pub service_id: &'a str,
    pub service_name: &'a str,
    pub verdict: ServiceVerdict,
    /// One result per top-level rule; empty when no rules were evaluated.
    pub rule_results: Vec<RuleResult<'a>>,
    /// Deduplicated questions that would move the verdict forward.
    pub pending_questions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_status: Option<DeadlineStatus>,
}

/// Evaluate one service against the facts.
pub fn evaluate_service_eligibility<'a>(node: &'a ServiceNode, facts: &FactSheet) -> ServiceEligibilityResult<'a> {
    let mut result = ServiceEligibilityResult {
        service_id: &node.id,
        service_name: &node.name,
        verdict: ServiceVerdict::NeedsMoreInfo,
        rule_results: Vec::new(),
        pending_questions: Vec::new(),
        deadline_status: None,
    };

    if let (Some(allowed), Some(nation)) = (node.nations, facts.nation()) {
        if !allowed.contains_nation(nation) {
            tracing::debug!(service = %node.id, ?nation, "outside service nations");
            result.verdict = ServiceVerdict::NotEligible;
            return result;
        }
    }

    let Some(rules) = node.eligibility.structured_rules() else {
        if node.eligibility.universal {
            result.verdict = ServiceVerdict::Eligible;
        } else {
            result.pending_questions = dedup(node.eligibility.key_questions.iter().map(String::as_str));
        }
        return result;
    };

    result.rule_results = rules.iter().map(|rule| evaluate_rule(rule, facts)).collect();

    result.verdict = if result.rule_results.iter().any(|r| r.verdict == RuleVerdict::Fail) {
        ServiceVerdict::NotEligible
    } else if result.rule_results.iter().any(|r| r.verdict == RuleVerdict::Unknown) {
        ServiceVerdict::NeedsMoreInfo
    } else {
        ServiceVerdict::Eligible
    };

    result.pending_questions = dedup(
        result
            .rule_results
            .iter()
            .filter(|r| r.verdict == RuleVerdict::Unknown)
            .filter_map(|r| r.missing_question.as_deref()),
    );

    result.deadline_status = result
        .rule_results
        .iter()
        .find(|r| matches!(r.rule, Rule::Deadline { .. }))
        .map(|r| DeadlineStatus::from_verdict(r.verdict));

    tracing::debug!(
        service = %node.id,
        verdict = ?result.verdict,
        pending = result.pending_questions.len(),
        "service evaluated"
    );
    result
}

/// Evaluate every service of a journey, phase by phase.
pub fn evaluate_journey<'a>(journey: &JourneyResult<'a>, facts: &FactSheet) -> Vec<ServiceEligibilityResult<'a>> {
    journey.services().map(|service| evaluate_service_eligibility(service.node, facts)).collect()
}

fn dedup<'q>(questions: impl Iterator<Item = &'q str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for question in questions {
        if !out.iter().any(|q| q == question) {
            out.push(question.to_string());
        }
    }
    out
}

// --- Next question ------------------------------------------------------------------

/// The single fact most worth asking about next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextQuestion {
    pub question: String,
    /// Fact path the question resolves; `None` for free-text key questions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Services whose verdict is waiting on this answer.
    pub services: Vec<String>,
}

/// Pick the next question across a set of service results.
///
/// Only services still at `needs_more_info` count. The missing field that
/// blocks the most services wins; ties go to the first one seen. When no
/// unknown rule names a field, the first pending question is returned.
pub fn next_question(results: &[ServiceEligibilityResult<'_>]) -> Option<NextQuestion> {
    let waiting = || results.iter().filter(|r| r.verdict == ServiceVerdict::NeedsMoreInfo);

    let mut by_field: IndexMap<&str, (&str, Vec<&str>)> = IndexMap::new();
    for result in waiting() {
        for rule in result.rule_results.iter().filter(|r| r.verdict == RuleVerdict::Unknown) {
            let (Some(field), Some(question)) = (rule.missing_field.as_deref(), rule.missing_question.as_deref())
            else {
                continue;
            };
            let (_, services) = by_field.entry(field).or_insert((question, Vec::new()));
            if !services.contains(&result.service_id) {
                services.push(result.service_id);
            }
        }
    }

    let mut best: Option<(&str, &(&str, Vec<&str>))> = None;
    for (field, entry) in &by_field {
        if best.is_none_or(|(_, (_, services))| entry.1.len() > services.len()) {
            best = Some((*field, entry));
        }
    }
    if let Some((field, (question, services))) = best {
        return Some(NextQuestion {
            question: question.to_string(),
            field: Some(field.to_string()),
            services: services.iter().map(|s| s.to_string()).collect(),
        });
    }

    let question = waiting().find_map(|r| r.pending_questions.first())?;
    let services =
        waiting().filter(|r| r.pending_questions.contains(question)).map(|r| r.service_id.to_string()).collect();
    Some(NextQuestion { question: question.clone(), field: None, services })
}
