use crate::corpus::Corpus;
use crate::engine::{
    self, Finding, GraphIndex, JourneyBuilder, JourneyResult, JourneyRun, NextQuestion, RuleResult,
    ServiceEligibilityResult,
};
use crate::error::CorpusError;
use crate::facts::{FactSheet, UserContext};
use crate::model::{LifeEvent, ServiceNode};
use crate::rule::Rule;
use chrono::{Local, NaiveDate};
use serde::Serialize;

/// Options that affect evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// The evaluation date: deadlines and relative trigger dates are measured
    /// from here.
    pub today: NaiveDate,
}

impl Default for Options {
    fn default() -> Self {
        if cfg!(test) {
            Self { today: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap_or_default() }
        } else {
            Self { today: Local::now().date_naive() }
        }
    }
}

impl Options {
    pub fn on(today: NaiveDate) -> Self {
        Self { today }
    }
}

/// A journey with every placed service evaluated, plus the question most
/// worth asking next.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment<'a> {
    pub journey: JourneyResult<'a>,
    pub eligibility: Vec<ServiceEligibilityResult<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_question: Option<NextQuestion>,
}

/// A corpus together with its graph index.
///
/// The index is built once in [`Planner::new`] and only read afterwards, so a
/// `Planner` can be shared freely between threads.
///
/// # Example
/// ```
/// use civicroute::Planner;
///
/// let planner = Planner::builtin().unwrap();
/// let journey = planner.build_journey(&["baby"]);
/// assert_eq!(journey.phases[0].label, "Start here");
/// ```
#[derive(Debug, Clone)]
pub struct Planner {
    corpus: Corpus,
    index: GraphIndex,
}

impl Planner {
    pub fn new(corpus: Corpus) -> Self {
        let index = GraphIndex::from_corpus(&corpus);
        Planner { corpus, index }
    }

    /// Planner over the bundled sample corpus.
    pub fn builtin() -> Result<Self, CorpusError> {
        Ok(Self::new(Corpus::builtin()?))
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn index(&self) -> &GraphIndex {
        &self.index
    }

    fn builder(&self) -> JourneyBuilder<'_> {
        JourneyBuilder::new(&self.corpus, &self.index)
    }

    // --- Journeys ---------------------------------------------------------------------

    /// Plan a journey for the given life events. Unknown ids are ignored.
    pub fn build_journey<S: AsRef<str>>(&self, event_ids: &[S]) -> JourneyResult<'_> {
        self.builder().build(event_ids)
    }

    /// Like [`build_journey`](Self::build_journey), with build metrics.
    pub fn build_journey_verbose<S: AsRef<str>>(&self, event_ids: &[S]) -> JourneyRun<'_> {
        self.builder().build_with_metrics(event_ids)
    }

    // --- Eligibility ------------------------------------------------------------------

    pub fn evaluate_service<'a>(
        &self,
        node: &'a ServiceNode,
        context: &UserContext,
        options: &Options,
    ) -> ServiceEligibilityResult<'a> {
        engine::evaluate_service_eligibility(node, &FactSheet::new(context, options.today))
    }

    /// Evaluate a service by id; `None` when the id is not in the corpus.
    pub fn evaluate_service_by_id(
        &self,
        id: &str,
        context: &UserContext,
        options: &Options,
    ) -> Option<ServiceEligibilityResult<'_>> {
        let node = self.corpus.service(id)?;
        Some(self.evaluate_service(node, context, options))
    }

    pub fn evaluate_journey<'a>(
        &self,
        journey: &JourneyResult<'a>,
        context: &UserContext,
        options: &Options,
    ) -> Vec<ServiceEligibilityResult<'a>> {
        engine::evaluate_journey(journey, &FactSheet::new(context, options.today))
    }

    /// Evaluate a single rule tree.
    pub fn evaluate_rule<'a>(&self, rule: &'a Rule, context: &UserContext, options: &Options) -> RuleResult<'a> {
        engine::evaluate_rule(rule, &FactSheet::new(context, options.today))
    }

    /// Build the journey for `event_ids`, evaluate every placed service and pick
    /// the next question.
    pub fn assess<S: AsRef<str>>(&self, event_ids: &[S], context: &UserContext, options: &Options) -> Assessment<'_> {
        let journey = self.build_journey(event_ids);
        let eligibility = self.evaluate_journey(&journey, context, options);
        let next_question = engine::next_question(&eligibility);
        Assessment { journey, eligibility, next_question }
    }

    // --- Lookup -----------------------------------------------------------------------

    pub fn life_events(&self) -> impl Iterator<Item = &LifeEvent> {
        self.corpus.life_events()
    }

    pub fn service(&self, id: &str) -> Option<&ServiceNode> {
        self.corpus.service(id)
    }

    /// Services owned by `dept`, in corpus order. Matching ignores ASCII case.
    pub fn services_in_department<'a>(&'a self, dept: &'a str) -> impl Iterator<Item = &'a ServiceNode> + 'a {
        self.corpus.services().filter(move |s| s.dept.eq_ignore_ascii_case(dept))
    }

    pub fn lint(&self) -> Vec<Finding> {
        engine::lint(&self.corpus, &self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ServiceVerdict;

    fn planner() -> Planner {
        Planner::builtin().unwrap()
    }

    #[test]
    fn default_options_are_fixed_under_test() {
        assert_eq!(Options::default().today, NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
    }

    #[test]
    fn verbose_build_matches_plain_build() {
        let planner = planner();
        let plain = planner.build_journey(&["bereavement"]);
        let run = planner.build_journey_verbose(&["bereavement"]);

        assert_eq!(plain.summary, run.journey.summary);
        assert!(run.metrics.discovery.visits >= run.journey.summary.total_services);
        assert_eq!(run.metrics.ordering.placed, run.journey.summary.total_services);
        assert!(run.metrics.ordering.unplaced.is_empty());
        assert!(run.metrics.total >= run.metrics.ordering.duration);
    }

    #[test]
    fn unknown_service_id_evaluates_to_none() {
        let planner = planner();
        assert!(planner.evaluate_service_by_id("no-such-service", &UserContext::default(), &Options::default()).is_none());

        let result = planner
            .evaluate_service_by_id("register-birth", &UserContext::default(), &Options::default())
            .unwrap();
        assert_eq!(result.verdict, ServiceVerdict::Eligible);
    }

    #[test]
    fn assessment_asks_something_for_an_empty_context() {
        let planner = planner();
        let assessment = planner.assess(&["baby"], &UserContext::default(), &Options::default());

        assert_eq!(assessment.eligibility.len(), assessment.journey.summary.total_services);
        assert!(assessment.next_question.is_some());
    }

    #[test]
    fn answering_moves_verdicts_forward() {
        let planner = planner();
        let options = Options::default();
        let before = planner.evaluate_service_by_id("child-benefit", &UserContext::default(), &options).unwrap();
        assert_eq!(before.verdict, ServiceVerdict::NeedsMoreInfo);

        let context = UserContext::default()
            .with_assignments(&["is_responsible_for_child=true", "is_uk_resident=true", "youngest_child_age=0"])
            .unwrap();
        let after = planner.evaluate_service_by_id("child-benefit", &context, &options).unwrap();
        assert_eq!(after.verdict, ServiceVerdict::Eligible);
    }

    #[test]
    fn departments_match_case_insensitively() {
        let planner = planner();
        let hmrc: Vec<&str> = planner.services_in_department("HMRC").map(|s| s.id.as_str()).collect();

        assert!(hmrc.contains(&"child-benefit"));
        assert!(planner.services_in_department("nobody").next().is_none());
    }

    #[test]
    fn builtin_corpus_lints_clean() {
        assert!(planner().lint().is_empty());
    }
}
