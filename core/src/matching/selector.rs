use super::rule::score_rules;
use crate::types::{DisplaySetSelector, MatchContext, MatchOptions};
use log::trace;

/// A series that satisfied a selector, with its cumulative score
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "camelCase"))]
pub struct MatchedDisplaySet {
    /// Position of the study in the context (0 = current)
    pub study_index: usize,

    /// Position of the series within its study
    pub series_index: usize,

    pub study_id: String,
    pub series_id: String,

    /// Study score plus series score
    pub score: f64,
}

impl MatchedDisplaySet {
    /// Returns whether both entries point at the same series
    pub fn same_display_set(&self, other: &MatchedDisplaySet) -> bool {
        self.study_index == other.study_index && self.series_index == other.series_index
    }
}

/// Candidates for one selector, best first
///
/// Ties keep context order (study index, then series index), so identical
/// input always ranks identically.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(transparent))]
pub struct RankedCandidates {
    candidates: Vec<MatchedDisplaySet>,
}

impl RankedCandidates {
    /// Ranks candidates by descending score, stable on ties
    pub fn from_unranked(mut candidates: Vec<MatchedDisplaySet>) -> Self {
        // Vec::sort_by is stable, preserving context order between equal scores
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        Self { candidates }
    }

    /// Candidate at a zero-based rank
    pub fn at(&self, rank: usize) -> Option<&MatchedDisplaySet> {
        self.candidates.get(rank)
    }

    /// Best candidate
    pub fn best(&self) -> Option<&MatchedDisplaySet> {
        self.at(0)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MatchedDisplaySet> {
        self.candidates.iter()
    }
}

/// Matches a selector against every series in the context
///
/// A study qualifies when all of its required study rules pass; within it,
/// a series qualifies when all required series rules pass. Optional rules
/// only add score. An empty context or an unsatisfiable selector yields an
/// empty list.
///
/// # Arguments
///
/// * `selector` - Study and series rules
/// * `context` - Studies in priority order
/// * `options` - Caller options; `studyInstanceUIDsIndex` is bound per study
///
/// # Returns
///
/// Ranked candidates, best first
pub fn match_selector(
    selector: &DisplaySetSelector,
    context: &MatchContext,
    options: &MatchOptions,
) -> RankedCandidates {
    let mut candidates = Vec::new();

    for (study_index, study) in context.studies.iter().enumerate() {
        let study_options = options.for_study(study_index);

        let study_score = match score_rules(
            &selector.study_matching_rules,
            &study.attributes,
            &study_options,
        ) {
            Some(score) => score,
            None => {
                trace!("Study {} ({}) rejected by study rules", study_index, study.id);
                continue;
            }
        };

        for (series_index, series) in study.series.iter().enumerate() {
            let Some(series_score) = score_rules(
                &selector.series_matching_rules,
                &series.attributes,
                &study_options,
            ) else {
                trace!("Series {} ({}) rejected by series rules", series_index, series.id);
                continue;
            };

            candidates.push(MatchedDisplaySet {
                study_index,
                series_index,
                study_id: study.id.clone(),
                series_id: series.id.clone(),
                score: study_score + series_score,
            });
        }
    }

    RankedCandidates::from_unranked(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Constraint, Rule, Series, Study, STUDY_INDEX_OPTION};

    fn image_series(id: &str, description: &str) -> Series {
        Series::new(id)
            .with_attribute("numImageFrames", 1)
            .with_attribute("SeriesDescription", description)
    }

    fn study_index_rule(index: i32) -> Rule {
        Rule::new(STUDY_INDEX_OPTION, Constraint::Equals(index.into()))
            .from_options()
            .required()
    }

    fn series_ids(ranked: &RankedCandidates) -> Vec<&str> {
        ranked.iter().map(|c| c.series_id.as_str()).collect()
    }

    fn make_context() -> MatchContext {
        MatchContext::new(vec![
            Study::new("current")
                .with_series(image_series("S0", "PA"))
                .with_series(image_series("S1", "Bitewing Left"))
                .with_series(image_series("S2", "Bitewing Right"))
                .with_series(Series::new("S3").with_attribute("numImageFrames", 0)),
            Study::new("prior").with_series(image_series("P0", "PA")),
        ])
    }

    #[test]
    fn test_empty_selector_matches_everything_with_zero_score() {
        let ranked = match_selector(&DisplaySetSelector::new(), &make_context(), &MatchOptions::new());

        assert_eq!(series_ids(&ranked), vec!["S0", "S1", "S2", "S3", "P0"]);
        assert!(ranked.iter().all(|c| c.score == 0.0));
    }

    #[test]
    fn test_empty_context_yields_empty_list() {
        let selector = DisplaySetSelector::new().with_study_rule(study_index_rule(0));
        let ranked = match_selector(&selector, &MatchContext::default(), &MatchOptions::new());
        assert!(ranked.is_empty());
        assert!(ranked.best().is_none());
    }

    #[test]
    fn test_required_rules_filter_in_context_order() {
        let selector = DisplaySetSelector::new()
            .with_series_rule(Rule::new("numImageFrames", Constraint::GreaterThan(0.0)).required());
        let ranked = match_selector(&selector, &make_context(), &MatchOptions::new());

        assert_eq!(series_ids(&ranked), vec!["S0", "S1", "S2", "P0"]);
    }

    #[test]
    fn test_study_index_binds_to_context_position() {
        let selector = DisplaySetSelector::new().with_study_rule(study_index_rule(1));
        let ranked = match_selector(&selector, &make_context(), &MatchOptions::new());

        assert_eq!(series_ids(&ranked), vec!["P0"]);
        assert_eq!(ranked.best().map(|c| c.study_index), Some(1));
    }

    #[test]
    fn test_weighted_rule_ranks_without_filtering() {
        let selector = DisplaySetSelector::new()
            .with_study_rule(study_index_rule(0))
            .with_series_rule(Rule::new("numImageFrames", Constraint::GreaterThan(0.0)))
            .with_series_rule(
                Rule::new("SeriesDescription", Constraint::ContainsInsensitive("bitewing".into()))
                    .weight(10.0),
            );
        let ranked = match_selector(&selector, &make_context(), &MatchOptions::new());

        assert_eq!(series_ids(&ranked), vec!["S1", "S2", "S0", "S3"]);
        let scores: Vec<f64> = ranked.iter().map(|c| c.score).collect();
        assert_eq!(scores, vec![12.0, 12.0, 2.0, 1.0]);
    }

    #[test]
    fn test_unsatisfiable_selector_is_empty() {
        let selector = DisplaySetSelector::new().with_study_rule(study_index_rule(5));
        assert!(match_selector(&selector, &make_context(), &MatchOptions::new()).is_empty());
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let selector = DisplaySetSelector::new()
            .with_series_rule(Rule::new("SeriesDescription", Constraint::Equals("PA".into())));
        let context = make_context();
        let first = match_selector(&selector, &context, &MatchOptions::new());
        let second = match_selector(&selector, &context, &MatchOptions::new());

        assert_eq!(first, second);
        assert_eq!(series_ids(&first), vec!["S0", "P0", "S1", "S2", "S3"]);
    }

    #[test]
    fn test_same_display_set() {
        let ranked = match_selector(&DisplaySetSelector::new(), &make_context(), &MatchOptions::new());
        let first = ranked.at(0).unwrap();
        assert!(first.same_display_set(first));
        assert!(!first.same_display_set(ranked.at(1).unwrap()));
    }
}
