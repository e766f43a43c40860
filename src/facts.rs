//! User facts and path-based lookup.
//!
//! A [`UserContext`] is a wide bag of optional facts about one person. Nothing
//! is required: a fact that has not been supplied is exactly what turns a rule
//! verdict into `unknown`.
//!
//! Rules address facts by dotted path (`age`, `trigger_dates.death`, or any
//! custom key). Rather than matching paths against struct fields, the context
//! is projected once into a JSON tree ([`FactSheet`]) and paths are walked
//! through it:
//!
//! ```text
//! UserContext ──serde──▶ Value::Object ──"trigger_dates.death"──▶ Some("2026-07-01")
//!                                      └─"income.band"──────────▶ None (missing)
//! ```
//!
//! Custom facts are flattened into the same tree, so a rule can name them
//! directly.

use crate::error::FactError;
use crate::model::Nation;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_english::Dialect;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Everything the caller knows about a person. Every field is optional, and a
/// typed field holding `null` or a value of the wrong shape reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    // Demographics
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
    pub nation: Option<Nation>,
    #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
    pub is_uk_resident: Option<bool>,
    #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
    pub immigration_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
    pub relationship_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
    pub employment_status: Option<String>,

    // Income
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub annual_income: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub weekly_earnings: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub household_income: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
    pub paid_national_insurance: Option<bool>,

    // Family
    #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
    pub is_pregnant: Option<bool>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub number_of_children: Option<u32>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub youngest_child_age: Option<u32>,
    #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
    pub is_responsible_for_child: Option<bool>,

    // Health
    #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
    pub has_disability: Option<bool>,
    #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
    pub has_long_term_condition: Option<bool>,
    #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
    pub is_terminally_ill: Option<bool>,

    // Caring
    #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
    pub is_carer: Option<bool>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub caring_hours_per_week: Option<f64>,

    // Assets
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub savings: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
    pub owns_home: Option<bool>,

    // Bereavement
    #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
    pub is_bereaved: Option<bool>,
    #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
    pub relationship_to_deceased: Option<String>,
    #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
    pub deceased_paid_national_insurance: Option<bool>,

    // Service history
    #[serde(default, deserialize_with = "lenient::strings", skip_serializing_if = "Option::is_none")]
    pub services_receiving: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::strings", skip_serializing_if = "Option::is_none")]
    pub services_completed: Option<Vec<String>>,

    /// Trigger name (`"death"`, `"birth"`, ...) to date string.
    #[serde(default, deserialize_with = "lenient::string_map", skip_serializing_if = "Option::is_none")]
    pub trigger_dates: Option<BTreeMap<String, String>>,

    /// Anything else. Flattened, so custom keys sit beside the typed ones.
    #[serde(flatten)]
    pub custom: BTreeMap<String, Value>,
}

impl UserContext {
    /// Read a context from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, FactError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| FactError::Io { path: path.to_path_buf(), source })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Apply `path=value` assignments on top of this context.
    ///
    /// Values are read as JSON when they parse (`30`, `true`, `["pip"]`) and
    /// as plain strings otherwise. Dotted paths create nested objects, so
    /// `trigger_dates.death=2026-05-01` fills the trigger map.
    pub fn with_assignments<S: AsRef<str>>(&self, assignments: &[S]) -> Result<Self, FactError> {
        let mut root = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => return Err(FactError::NotAnObject),
        };
        for raw in assignments {
            let (path, value) = parse_assignment(raw.as_ref())?;
            set_path(&mut root, &path, value)?;
        }
        Ok(serde_json::from_value(Value::Object(root))?)
    }
}

/// Split `path=value` into its path and JSON value.
pub fn parse_assignment(raw: &str) -> Result<(String, Value), FactError> {
    let re = regex!(r"^\s*([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_-]+)*)\s*=(.*)$");
    let caps = re.captures(raw).ok_or_else(|| FactError::MalformedAssignment(raw.to_string()))?;
    let path = caps[1].to_string();
    let text = caps[2].trim();
    let value = serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));
    Ok((path, value))
}

fn set_path(root: &mut Map<String, Value>, path: &str, value: Value) -> Result<(), FactError> {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(last) = segments.pop() else {
        return Err(FactError::MalformedAssignment(path.to_string()));
    };

    let mut current = root;
    for segment in segments {
        let slot = current.entry(segment.to_string()).or_insert_with(|| Value::Object(Map::new()));
        if slot.is_null() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => return Err(FactError::PathConflict(path.to_string())),
        };
    }
    current.insert(last.to_string(), value);
    Ok(())
}

// --- Lenient fields ---------------------------------------------------------------

mod lenient {
    use serde::Deserialize;
    use serde::de::{DeserializeOwned, Deserializer};
    use serde_json::{Number, Value};
    use std::collections::BTreeMap;

    pub fn option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(T::deserialize(value).ok())
    }

    /// Like [`option`], but a numeric string such as `"30"` counts as its number.
    pub fn number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = match Value::deserialize(deserializer)? {
            Value::String(s) => s.trim().parse::<Number>().map(Value::Number).unwrap_or(Value::Null),
            other => other,
        };
        Ok(T::deserialize(value).ok())
    }

    /// Keeps the string items of a list and drops the rest.
    pub fn strings<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        })
    }

    /// Keeps the string entries of an object and drops the rest.
    pub fn string_map<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Object(map) => Some(
                map.into_iter()
                    .filter_map(|(key, value)| match value {
                        Value::String(s) => Some((key, s)),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        })
    }
}

// --- Fact sheet ------------------------------------------------------------------

/// A read-only JSON projection of a [`UserContext`], plus the date that
/// "now" means for deadline arithmetic.
#[derive(Debug, Clone)]
pub struct FactSheet {
    root: Value,
    today: NaiveDate,
}

impl FactSheet {
    pub fn new(context: &UserContext, today: NaiveDate) -> Self {
        // Serializing plain data into a `Value` cannot fail; fall back to an
        // empty sheet rather than faulting.
        let root = serde_json::to_value(context).unwrap_or_else(|_| Value::Object(Map::new()));
        FactSheet { root, today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Resolve a dotted path. `None` when any segment is absent or `null`.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        // A custom key may itself contain dots.
        if let Some(value) = self.root.as_object().and_then(|map| map.get(path)) {
            return (!value.is_null()).then_some(value);
        }

        let mut current = &self.root;
        for segment in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        (!current.is_null()).then_some(current)
    }

    /// A numeric fact. Numeric strings are accepted.
    pub fn number(&self, path: &str) -> Option<f64> {
        match self.lookup(path)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn boolean(&self, path: &str) -> Option<bool> {
        self.lookup(path)?.as_bool()
    }

    /// The stated nation, if it names one.
    pub fn nation(&self) -> Option<Nation> {
        Nation::deserialize(self.lookup("nation")?).ok()
    }

    /// A date fact, see [`parse_fact_date`].
    pub fn date(&self, path: &str) -> Option<NaiveDate> {
        parse_fact_date(self.lookup(path)?.as_str()?, self.today)
    }

    /// Whether the list at `path` contains `item`. `None` when the list is
    /// absent.
    pub fn list_contains(&self, path: &str, item: &str) -> Option<bool> {
        let items = self.lookup(path)?.as_array()?;
        Some(items.iter().any(|v| v.as_str() == Some(item)))
    }
}

/// Parse a trigger date: `YYYY-MM-DD`, RFC 3339, or a relative English phrase
/// ("yesterday", "last friday") anchored at `today`.
pub fn parse_fact_date(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.date_naive());
    }
    let now = Utc.from_utc_datetime(&today.and_hms_opt(12, 0, 0)?);
    chrono_english::parse_date_string(raw, now, Dialect::Uk).ok().map(|stamp| stamp.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    #[test]
    fn missing_and_null_facts_resolve_to_none() {
        let ctx: UserContext = serde_json::from_value(json!({"age": 40, "household": null})).unwrap();
        let sheet = FactSheet::new(&ctx, today());

        assert_eq!(sheet.number("age"), Some(40.0));
        assert!(sheet.lookup("savings").is_none());
        assert!(sheet.lookup("household").is_none());
        assert!(sheet.lookup("household.size").is_none());
        assert!(sheet.lookup("age.years").is_none());
    }

    #[test]
    fn custom_facts_are_addressable_by_nested_path() {
        let ctx: UserContext = serde_json::from_value(json!({
            "tenancy": {"type": "private", "weekly_rent": "180"}
        }))
        .unwrap();
        let sheet = FactSheet::new(&ctx, today());

        assert_eq!(sheet.lookup("tenancy.type"), Some(&json!("private")));
        assert_eq!(sheet.number("tenancy.weekly_rent"), Some(180.0));
    }

    #[test]
    fn trigger_dates_parse_iso_and_rfc3339() {
        let ctx: UserContext = serde_json::from_value(json!({
            "trigger_dates": {"death": "2026-01-05", "birth": "2026-02-01T09:30:00+00:00", "move": "whenever"}
        }))
        .unwrap();
        let sheet = FactSheet::new(&ctx, today());

        assert_eq!(sheet.date("trigger_dates.death"), NaiveDate::from_ymd_opt(2026, 1, 5));
        assert_eq!(sheet.date("trigger_dates.birth"), NaiveDate::from_ymd_opt(2026, 2, 1));
        assert_eq!(sheet.date("trigger_dates.move"), None);
        assert_eq!(sheet.date("trigger_dates.marriage"), None);
    }

    #[test]
    fn relative_dates_are_anchored_at_today() {
        assert_eq!(parse_fact_date("yesterday", today()), NaiveDate::from_ymd_opt(2026, 3, 9));
    }

    #[test]
    fn list_contains_distinguishes_absent_from_empty() {
        let ctx = UserContext { services_receiving: Some(vec![]), ..UserContext::default() };
        let sheet = FactSheet::new(&ctx, today());

        assert_eq!(sheet.list_contains("services_receiving", "pip"), Some(false));
        assert_eq!(sheet.list_contains("services_completed", "pip"), None);
    }

    #[test]
    fn assignments_merge_into_typed_and_custom_fields() {
        let base = UserContext { age: Some(30), ..UserContext::default() };
        let ctx = base
            .with_assignments(&[
                "age=67",
                "is_carer=true",
                "trigger_dates.death=2026-02-20",
                "services_receiving=[\"pension-credit\"]",
                "tenancy.kind = council",
            ])
            .unwrap();

        assert_eq!(ctx.age, Some(67));
        assert_eq!(ctx.is_carer, Some(true));
        assert_eq!(ctx.trigger_dates.as_ref().and_then(|t| t.get("death")).map(String::as_str), Some("2026-02-20"));
        assert_eq!(ctx.services_receiving, Some(vec!["pension-credit".to_string()]));
        assert_eq!(ctx.custom.get("tenancy"), Some(&json!({"kind": "council"})));
    }

    #[test]
    fn malformed_assignments_are_rejected() {
        assert!(matches!(parse_assignment("no equals sign"), Err(FactError::MalformedAssignment(_))));
        assert!(matches!(
            UserContext::default().with_assignments(&["age=40", "age.years=4"]),
            Err(FactError::PathConflict(_))
        ));
    }

    #[test]
    fn typed_facts_of_the_wrong_shape_read_as_absent() {
        let ctx: UserContext = serde_json::from_value(json!({
            "age": "30",
            "savings": " 1200.5 ",
            "number_of_children": -1,
            "nation": "france",
            "is_carer": "yes",
            "owns_home": null,
            "trigger_dates": {"death": null, "birth": "2026-02-01"},
            "services_receiving": ["pip", 3]
        }))
        .unwrap();

        assert_eq!(ctx.age, Some(30));
        assert_eq!(ctx.savings, Some(1200.5));
        assert_eq!(ctx.number_of_children, None);
        assert_eq!(ctx.nation, None);
        assert_eq!(ctx.is_carer, None);
        assert_eq!(ctx.owns_home, None);
        assert_eq!(ctx.services_receiving, Some(vec!["pip".to_string()]));

        let sheet = FactSheet::new(&ctx, today());
        assert_eq!(sheet.date("trigger_dates.death"), None);
        assert_eq!(sheet.date("trigger_dates.birth"), NaiveDate::from_ymd_opt(2026, 2, 1));
        assert_eq!(sheet.nation(), None);
    }

    #[test]
    fn assignments_of_the_wrong_shape_leave_the_fact_unset() {
        let ctx = UserContext::default()
            .with_assignments(&["age=old", "trigger_dates.death=null", "trigger_dates.birth=2026-02-01"])
            .unwrap();

        assert_eq!(ctx.age, None);
        let dates = ctx.trigger_dates.unwrap();
        assert!(!dates.contains_key("death"));
        assert_eq!(dates.get("birth").map(String::as_str), Some("2026-02-01"));
    }
}
