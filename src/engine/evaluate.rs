//! Three-valued rule evaluation.
//!
//! [`evaluate_rule`] walks a [`Rule`] tree against a [`FactSheet`] and returns
//! `pass`, `fail` or `unknown`. Missing facts are never an error: they are the
//! normal reason for `unknown`, and the result carries the field that was
//! missing and the question (the rule's label) that would resolve it.
//!
//! ```text
//! leaf rules                    composites
//! ───────────────────────────   ─────────────────────────────────────────
//! comparison  number vs value   all  fail dominates, then unknown, else pass
//! boolean     bool == value     any  pass dominates, all-fail is fail,
//! enum        value in set           anything else unknown
//! dependency  id in list ⇒ pass not  pass <-> fail, unknown stays unknown
//!             otherwise unknown
//! deadline    days since trigger <= max
//! ```
//!
//! A dependency rule never fails. Not finding a service in the user's list
//! only means the list is incomplete.

use crate::facts::FactSheet;
use crate::rule::Rule;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleVerdict {
    Pass,
    Fail,
    Unknown,
}

impl RuleVerdict {
    fn from_bool(passed: bool) -> Self {
        if passed { RuleVerdict::Pass } else { RuleVerdict::Fail }
    }

    /// Three-valued negation: `unknown` is a fixed point.
    pub fn negate(self) -> Self {
        match self {
            RuleVerdict::Pass => RuleVerdict::Fail,
            RuleVerdict::Fail => RuleVerdict::Pass,
            RuleVerdict::Unknown => RuleVerdict::Unknown,
        }
    }
}

/// Three-valued conjunction. Empty input is `pass`.
pub fn all_of(verdicts: impl IntoIterator<Item = RuleVerdict>) -> RuleVerdict {
    let mut saw_unknown = false;
    for verdict in verdicts {
        match verdict {
            RuleVerdict::Fail => return RuleVerdict::Fail,
            RuleVerdict::Unknown => saw_unknown = true,
            RuleVerdict::Pass => {}
        }
    }
    if saw_unknown { RuleVerdict::Unknown } else { RuleVerdict::Pass }
}

/// Three-valued disjunction. Empty input is `fail`.
pub fn any_of(verdicts: impl IntoIterator<Item = RuleVerdict>) -> RuleVerdict {
    let mut saw_unknown = false;
    for verdict in verdicts {
        match verdict {
            RuleVerdict::Pass => return RuleVerdict::Pass,
            RuleVerdict::Unknown => saw_unknown = true,
            RuleVerdict::Fail => {}
        }
    }
    if saw_unknown { RuleVerdict::Unknown } else { RuleVerdict::Fail }
}

/// Outcome of evaluating one rule.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleResult<'a> {
    pub rule: &'a Rule,
    pub verdict: RuleVerdict,
    /// Fact path whose absence made this rule `unknown`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_field: Option<String>,
    /// Question that would resolve this rule. Set only when `unknown`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_question: Option<String>,
    /// Results of sub-rules, for composites.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RuleResult<'a>>,
}

impl<'a> RuleResult<'a> {
    fn decided(rule: &'a Rule, verdict: RuleVerdict, children: Vec<RuleResult<'a>>) -> Self {
        RuleResult { rule, verdict, missing_field: None, missing_question: None, children }
    }

    fn unknown(rule: &'a Rule, field: Option<String>, children: Vec<RuleResult<'a>>) -> Self {
        RuleResult {
            rule,
            verdict: RuleVerdict::Unknown,
            missing_field: field,
            missing_question: Some(rule.label().to_string()),
            children,
        }
    }

    fn leaf(rule: &'a Rule, outcome: Option<bool>, field: &str) -> Self {
        match outcome {
            Some(passed) => Self::decided(rule, RuleVerdict::from_bool(passed), Vec::new()),
            None => Self::unknown(rule, Some(field.to_string()), Vec::new()),
        }
    }

    /// Composite result over already-evaluated children.
    fn composite(rule: &'a Rule, verdict: RuleVerdict, children: Vec<RuleResult<'a>>) -> Self {
        if verdict == RuleVerdict::Unknown {
            let field = children
                .iter()
                .find(|c| c.verdict == RuleVerdict::Unknown)
                .and_then(|c| c.missing_field.clone());
            Self::unknown(rule, field, children)
        } else {
            Self::decided(rule, verdict, children)
        }
    }
}

/// JSON equality, except that numbers compare by value (`1` matches `1.0`).
fn same_value(expected: &serde_json::Value, actual: &serde_json::Value) -> bool {
    match (expected.as_f64(), actual.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => expected == actual,
    }
}

/// Evaluate `rule` against the facts in `facts`.
pub fn evaluate_rule<'a>(rule: &'a Rule, facts: &FactSheet) -> RuleResult<'a> {
    let result = match rule {
        Rule::Comparison { field, operator, value, .. } => {
            RuleResult::leaf(rule, facts.number(field).map(|actual| operator.apply(actual, *value)), field)
        }
        Rule::Boolean { field, value, .. } => {
            RuleResult::leaf(rule, facts.boolean(field).map(|actual| actual == *value), field)
        }
        Rule::Enum { field, values, .. } => {
            let member = facts.lookup(field).map(|actual| values.iter().any(|v| same_value(v, actual)));
            RuleResult::leaf(rule, member, field)
        }
        Rule::Dependency { service_id, condition, .. } => {
            let field = condition.field();
            match facts.list_contains(field, service_id) {
                Some(true) => RuleResult::decided(rule, RuleVerdict::Pass, Vec::new()),
                // Absent or not listed: no evidence either way.
                _ => RuleResult::unknown(rule, Some(field.to_string()), Vec::new()),
            }
        }
        Rule::Deadline { trigger_event, max_days, .. } => {
            let field = Rule::trigger_field(trigger_event);
            let elapsed = facts.date(&field).map(|date| (facts.today() - date).num_days());
            RuleResult::leaf(rule, elapsed.map(|days| days <= *max_days), &field)
        }
        Rule::All { rules, .. } => {
            let children: Vec<RuleResult<'a>> = rules.iter().map(|r| evaluate_rule(r, facts)).collect();
            let verdict = all_of(children.iter().map(|c| c.verdict));
            RuleResult::composite(rule, verdict, children)
        }
        Rule::Any { rules, .. } => {
            let children: Vec<RuleResult<'a>> = rules.iter().map(|r| evaluate_rule(r, facts)).collect();
            let verdict = any_of(children.iter().map(|c| c.verdict));
            RuleResult::composite(rule, verdict, children)
        }
        Rule::Not { rule: inner, .. } => {
            let child = evaluate_rule(inner, facts);
            let verdict = child.verdict.negate();
            RuleResult::composite(rule, verdict, vec![child])
        }
    };

    tracing::trace!(kind = rule.kind(), label = rule.label(), verdict = ?result.verdict, "rule evaluated");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::UserContext;
    use chrono::NaiveDate;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    fn rule(value: serde_json::Value) -> Rule {
        serde_json::from_value(value).unwrap()
    }

    fn sheet(context: UserContext) -> FactSheet {
        FactSheet::new(&context, today())
    }

    #[test]
    fn comparison_operators() {
        let facts = sheet(context!({"age": 18, "monthly_rent": "1200.50"}));
        let cases = [
            (">=", 18.0, RuleVerdict::Pass),
            (">", 18.0, RuleVerdict::Fail),
            ("<=", 18.0, RuleVerdict::Pass),
            ("<", 18.0, RuleVerdict::Fail),
            ("==", 18.0, RuleVerdict::Pass),
            ("!=", 18.0, RuleVerdict::Fail),
            ("≠", 17.0, RuleVerdict::Pass),
        ];
        for (op, value, expected) in cases {
            let r = rule(json!({"type": "comparison", "field": "age", "operator": op, "value": value, "label": "Age?"}));
            assert_eq!(evaluate_rule(&r, &facts).verdict, expected, "age {op} {value}");
        }

        let r = rule(json!({"type": "comparison", "field": "monthly_rent", "operator": "<", "value": 1600, "label": "?"}));
        assert_eq!(evaluate_rule(&r, &facts).verdict, RuleVerdict::Pass);
    }

    #[test]
    fn missing_or_non_numeric_comparison_is_unknown() {
        let facts = sheet(context!({"employment_status": "employed"}));
        let r = rule(json!({"type": "comparison", "field": "age", "operator": ">=", "value": 18, "label": "How old are you?"}));
        let out = evaluate_rule(&r, &facts);
        assert_eq!(out.verdict, RuleVerdict::Unknown);
        assert_eq!(out.missing_field.as_deref(), Some("age"));
        assert_eq!(out.missing_question.as_deref(), Some("How old are you?"));

        let r = rule(json!({"type": "comparison", "field": "employment_status", "operator": ">", "value": 1, "label": "?"}));
        assert_eq!(evaluate_rule(&r, &facts).verdict, RuleVerdict::Unknown);
    }

    #[test]
    fn boolean_and_enum_rules() {
        let facts = sheet(context!({"is_carer": false, "relationship_to_deceased": "spouse"}));

        let carer = rule(json!({"type": "boolean", "field": "is_carer", "value": true, "label": "Do you care for someone?"}));
        assert_eq!(evaluate_rule(&carer, &facts).verdict, RuleVerdict::Fail);

        let partner = rule(json!({
            "type": "enum", "field": "relationship_to_deceased",
            "values": ["spouse", "civil_partner"], "label": "How were you related?"
        }));
        assert_eq!(evaluate_rule(&partner, &facts).verdict, RuleVerdict::Pass);

        let child = rule(json!({"type": "enum", "field": "relationship_to_deceased", "values": ["child"], "label": "?"}));
        assert_eq!(evaluate_rule(&child, &facts).verdict, RuleVerdict::Fail);

        let pregnant = rule(json!({"type": "boolean", "field": "is_pregnant", "value": true, "label": "Are you pregnant?"}));
        assert_eq!(evaluate_rule(&pregnant, &facts).verdict, RuleVerdict::Unknown);
    }

    #[test]
    fn enum_numbers_match_by_value() {
        let facts = sheet(context!({"number_of_children": 1, "band": 2.0}));

        let one = rule(json!({"type": "enum", "field": "number_of_children", "values": [1.0, 2.0], "label": "?"}));
        assert_eq!(evaluate_rule(&one, &facts).verdict, RuleVerdict::Pass);

        let band = rule(json!({"type": "enum", "field": "band", "values": [2], "label": "?"}));
        assert_eq!(evaluate_rule(&band, &facts).verdict, RuleVerdict::Pass);

        let text = rule(json!({"type": "enum", "field": "band", "values": ["2"], "label": "?"}));
        assert_eq!(evaluate_rule(&text, &facts).verdict, RuleVerdict::Fail);
    }

    #[test]
    fn dependency_passes_or_stays_unknown() {
        let r = rule(json!({"type": "dependency", "serviceId": "child-benefit", "label": "Do you get Child Benefit?"}));

        let listed = sheet(context!({"services_receiving": ["child-benefit"]}));
        assert_eq!(evaluate_rule(&r, &listed).verdict, RuleVerdict::Pass);

        let empty = sheet(context!({"services_receiving": []}));
        let out = evaluate_rule(&r, &empty);
        assert_eq!(out.verdict, RuleVerdict::Unknown);
        assert_eq!(out.missing_field.as_deref(), Some("services_receiving"));

        let other = sheet(context!({"services_receiving": ["pip"]}));
        assert_eq!(evaluate_rule(&r, &other).verdict, RuleVerdict::Unknown);

        assert_eq!(evaluate_rule(&r, &sheet(UserContext::default())).verdict, RuleVerdict::Unknown);
    }

    #[test]
    fn dependency_on_completed_services() {
        let r = rule(json!({
            "type": "dependency", "serviceId": "register-death", "condition": "completed", "label": "Registered?"
        }));
        let facts = sheet(context!({"services_completed": ["register-death"], "services_receiving": []}));
        assert_eq!(evaluate_rule(&r, &facts).verdict, RuleVerdict::Pass);
    }

    #[test]
    fn deadline_window_is_inclusive() {
        let r = rule(json!({"type": "deadline", "triggerEvent": "birth", "maxDays": 42, "label": "When was the birth?"}));

        let on_limit = sheet(context!({"trigger_dates": {"birth": "2026-04-20"}}));
        assert_eq!(evaluate_rule(&r, &on_limit).verdict, RuleVerdict::Pass);

        let past = sheet(context!({"trigger_dates": {"birth": "2026-04-19"}}));
        assert_eq!(evaluate_rule(&r, &past).verdict, RuleVerdict::Fail);

        let missing = evaluate_rule(&r, &sheet(UserContext::default()));
        assert_eq!(missing.verdict, RuleVerdict::Unknown);
        assert_eq!(missing.missing_field.as_deref(), Some("trigger_dates.birth"));
    }

    #[test]
    fn composite_reports_its_own_label() {
        let r = rule(json!({
            "type": "all", "label": "Are you over 16 and living in the UK?", "rules": [
                {"type": "comparison", "field": "age", "operator": ">=", "value": 16, "label": "Age?"},
                {"type": "boolean", "field": "is_uk_resident", "value": true, "label": "UK resident?"}
            ]
        }));
        let out = evaluate_rule(&r, &sheet(context!({"age": 30})));

        assert_eq!(out.verdict, RuleVerdict::Unknown);
        assert_eq!(out.missing_question.as_deref(), Some("Are you over 16 and living in the UK?"));
        assert_eq!(out.missing_field.as_deref(), Some("is_uk_resident"));
        assert_eq!(out.children.len(), 2);
        assert_eq!(out.children[0].verdict, RuleVerdict::Pass);
    }

    #[test]
    fn all_fails_even_with_unknown_siblings() {
        let r = rule(json!({
            "type": "all", "label": "both", "rules": [
                {"type": "boolean", "field": "is_pregnant", "value": true, "label": "?"},
                {"type": "comparison", "field": "age", "operator": ">=", "value": 18, "label": "?"}
            ]
        }));
        let out = evaluate_rule(&r, &sheet(context!({"age": 12})));
        assert_eq!(out.verdict, RuleVerdict::Fail);
        assert!(out.missing_question.is_none());
    }

    #[test]
    fn not_inverts_and_keeps_unknown() {
        let r = rule(json!({
            "type": "not", "label": "Not in full-time education?",
            "rule": {"type": "boolean", "field": "in_education", "value": true, "label": "?"}
        }));
        assert_eq!(evaluate_rule(&r, &sheet(context!({"in_education": true}))).verdict, RuleVerdict::Fail);
        assert_eq!(evaluate_rule(&r, &sheet(context!({"in_education": false}))).verdict, RuleVerdict::Pass);

        let out = evaluate_rule(&r, &sheet(UserContext::default()));
        assert_eq!(out.verdict, RuleVerdict::Unknown);
        assert_eq!(out.missing_field.as_deref(), Some("in_education"));
        assert_eq!(out.missing_question.as_deref(), Some("Not in full-time education?"));
    }

    #[test]
    fn empty_composites() {
        assert_eq!(all_of([]), RuleVerdict::Pass);
        assert_eq!(any_of([]), RuleVerdict::Fail);
    }
}
