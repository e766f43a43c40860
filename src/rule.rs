use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = ">=", alias = "≥")]
    Gte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=", alias = "≤")]
    Lte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=", alias = "≠")]
    Ne,
}

impl Operator {
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Operator::Gte => lhs >= rhs,
            Operator::Gt => lhs > rhs,
            Operator::Lte => lhs <= rhs,
            Operator::Lt => lhs < rhs,
            Operator::Eq => lhs == rhs,
            Operator::Ne => lhs != rhs,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Gte => ">=",
            Operator::Gt => ">",
            Operator::Lte => "<=",
            Operator::Lt => "<",
            Operator::Eq => "==",
            Operator::Ne => "!=",
        }
    }
}

/// Which of the user's service lists a dependency rule looks in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyCondition {
    #[default]
    Receiving,
    Completed,
}

impl DependencyCondition {
    /// Fact path holding the service list for this condition.
    pub fn field(self) -> &'static str {
        match self {
            DependencyCondition::Receiving => "services_receiving",
            DependencyCondition::Completed => "services_completed",
        }
    }
}

/// A declarative eligibility rule.
///
/// Every variant carries a `label`, the question asked when the rule cannot
/// be decided from the facts at hand.
///
/// ```text
/// comparison  age >= 18
/// boolean     is_uk_resident == true
/// enum        relationship_to_deceased in [spouse, civil_partner]
/// dependency  "child-benefit" in services_receiving
/// deadline    trigger_dates.death within 42 days
/// all/any/not composite over sub-rules
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    #[serde(rename_all = "camelCase")]
    Comparison { field: String, operator: Operator, value: f64, label: String },
    #[serde(rename_all = "camelCase")]
    Boolean { field: String, value: bool, label: String },
    #[serde(rename_all = "camelCase")]
    Enum { field: String, values: Vec<serde_json::Value>, label: String },
    #[serde(rename_all = "camelCase")]
    Dependency {
        service_id: String,
        #[serde(default)]
        condition: DependencyCondition,
        label: String,
    },
    #[serde(rename_all = "camelCase")]
    Deadline { trigger_event: String, max_days: i64, label: String },
    All { rules: Vec<Rule>, label: String },
    Any { rules: Vec<Rule>, label: String },
    Not { rule: Box<Rule>, label: String },
}

impl Rule {
    pub fn label(&self) -> &str {
        match self {
            Rule::Comparison { label, .. }
            | Rule::Boolean { label, .. }
            | Rule::Enum { label, .. }
            | Rule::Dependency { label, .. }
            | Rule::Deadline { label, .. }
            | Rule::All { label, .. }
            | Rule::Any { label, .. }
            | Rule::Not { label, .. } => label,
        }
    }

    /// The `type` tag as it appears in corpus files.
    pub fn kind(&self) -> &'static str {
        match self {
            Rule::Comparison { .. } => "comparison",
            Rule::Boolean { .. } => "boolean",
            Rule::Enum { .. } => "enum",
            Rule::Dependency { .. } => "dependency",
            Rule::Deadline { .. } => "deadline",
            Rule::All { .. } => "all",
            Rule::Any { .. } => "any",
            Rule::Not { .. } => "not",
        }
    }

    /// Fact path for a deadline's trigger date.
    pub fn trigger_field(trigger_event: &str) -> String {
        format!("trigger_dates.{trigger_event}")
    }

    /// Visit this rule and every nested sub-rule, depth first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Rule)) {
        visit(self);
        match self {
            Rule::All { rules, .. } | Rule::Any { rules, .. } => {
                for rule in rules {
                    rule.walk(visit);
                }
            }
            Rule::Not { rule, .. } => rule.walk(visit),
            _ => {}
        }
    }
}
