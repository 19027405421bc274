use super::resolver::ResolvedSelectors;
use super::selector::MatchedDisplaySet;
use crate::types::{ActivationThreshold, Stage};
use log::{debug, warn};
use std::fmt;

/// Availability of a stage given the resolved selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "lowercase"))]
pub enum StageStatus {
    /// Unconditional, or its enabled threshold is met; may be auto-selected
    Enabled,
    /// Only its passive threshold is met; offered for navigation
    Passive,
    /// No threshold met
    Disabled,
}

impl StageStatus {
    /// Returns simple name for display
    pub fn simple_name(&self) -> &'static str {
        match self {
            StageStatus::Enabled => "enabled",
            StageStatus::Passive => "passive",
            StageStatus::Disabled => "disabled",
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// Counts the viewports of a stage that would show a display set
///
/// A viewport counts when its primary reference resolves at the requested
/// rank to a display set not already counted for an earlier viewport of
/// the same stage.
pub fn matched_viewport_count(stage: &Stage, resolved: &ResolvedSelectors) -> usize {
    let mut claimed: Vec<&MatchedDisplaySet> = Vec::new();

    for viewport in &stage.viewports {
        let Some(reference) = viewport.primary() else {
            continue;
        };
        let Some(candidate) = resolved
            .get(&reference.selector_id)
            .and_then(|ranked| ranked.at(reference.rank()))
        else {
            continue;
        };

        if !claimed.iter().any(|c| c.same_display_set(candidate)) {
            claimed.push(candidate);
        }
    }

    claimed.len()
}

/// Computes the status of one stage
///
/// A stage without `stageActivation` is always enabled. A stage whose
/// activation declares no `enabled` threshold (`{}` or passive-only) is never
/// enabled, so it is only reached through navigation or the last-stage
/// fallback.
pub fn stage_status(stage: &Stage, resolved: &ResolvedSelectors) -> StageStatus {
    let Some(activation) = &stage.stage_activation else {
        return StageStatus::Enabled;
    };

    let matched = matched_viewport_count(stage, resolved);
    let meets = |threshold: Option<ActivationThreshold>| {
        threshold.is_some_and(|t| matched >= t.min_viewports_matched)
    };

    if meets(activation.enabled) {
        StageStatus::Enabled
    } else if meets(activation.passive) {
        StageStatus::Passive
    } else {
        StageStatus::Disabled
    }
}

/// Computes the status of every stage, in declared order
pub fn stage_statuses(stages: &[Stage], resolved: &ResolvedSelectors) -> Vec<StageStatus> {
    stages.iter().map(|stage| stage_status(stage, resolved)).collect()
}

/// Picks the active stage
///
/// Returns the first enabled stage in declared order. When no stage is
/// enabled the last stage is used, so a choice is always made for a
/// non-empty stage list. Returns `None` only for an empty list.
///
/// # Returns
///
/// Index and reference of the chosen stage
pub fn select_stage<'a>(
    stages: &'a [Stage],
    resolved: &ResolvedSelectors,
) -> Option<(usize, &'a Stage)> {
    for (index, stage) in stages.iter().enumerate() {
        let status = stage_status(stage, resolved);
        debug!("Stage {} '{}' is {}", index, stage.name, status);

        if status == StageStatus::Enabled {
            return Some((index, stage));
        }
    }

    let last = stages.len().checked_sub(1)?;
    warn!(
        "No stage is enabled; falling back to last stage '{}'",
        stages[last].name
    );
    Some((last, &stages[last]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::resolve_protocol;
    use crate::types::{
        DisplaySetRef, DisplaySetSelector, MatchContext, MatchOptions, Protocol, Series,
        StageActivation, Study, ViewportConfig,
    };

    fn make_context(series: usize) -> MatchContext {
        let mut study = Study::new("study");
        for i in 0..series {
            study = study.with_series(Series::new(format!("S{}", i)));
        }
        MatchContext::new(vec![study])
    }

    fn resolve(series: usize) -> ResolvedSelectors {
        let protocol = Protocol::new("p").with_selector("any", DisplaySetSelector::new());
        resolve_protocol(&protocol, &make_context(series), &MatchOptions::new())
    }

    fn ranked_stage(name: &str, ranks: &[usize]) -> Stage {
        ranks.iter().fold(Stage::new(name, 1, ranks.len()), |stage, rank| {
            stage.with_viewport(ViewportConfig::single(DisplaySetRef::ranked("any", *rank)))
        })
    }

    #[test]
    fn test_matched_viewport_count_by_rank() {
        let stage = ranked_stage("1x3", &[0, 1, 2]);

        assert_eq!(matched_viewport_count(&stage, &resolve(0)), 0);
        assert_eq!(matched_viewport_count(&stage, &resolve(2)), 2);
        assert_eq!(matched_viewport_count(&stage, &resolve(5)), 3);
    }

    #[test]
    fn test_matched_viewport_count_ignores_repeated_display_set() {
        let stage = ranked_stage("1x2", &[0, 0]);
        assert_eq!(matched_viewport_count(&stage, &resolve(3)), 1);
    }

    #[test]
    fn test_matched_viewport_count_unknown_selector() {
        let stage = Stage::new("1x1", 1, 1).with_viewport(ViewportConfig::single(DisplaySetRef::best("gone")));
        assert_eq!(matched_viewport_count(&stage, &resolve(3)), 0);
    }

    #[test]
    fn test_stage_status_levels() {
        let stage = ranked_stage("1x3", &[0, 1, 2])
            .min_viewports_matched(3)
            .passive_min_viewports_matched(1);

        assert_eq!(stage_status(&stage, &resolve(3)), StageStatus::Enabled);
        assert_eq!(stage_status(&stage, &resolve(1)), StageStatus::Passive);
        assert_eq!(stage_status(&stage, &resolve(0)), StageStatus::Disabled);
        assert_eq!(
            stage_status(&Stage::new("plain", 1, 1), &resolve(0)),
            StageStatus::Enabled
        );

        let passive_only = ranked_stage("1x1", &[0]).passive_min_viewports_matched(1);
        assert_eq!(stage_status(&passive_only, &resolve(3)), StageStatus::Passive);

        let mut empty_activation = ranked_stage("1x1", &[0]);
        empty_activation.stage_activation = Some(StageActivation::default());
        assert_eq!(stage_status(&empty_activation, &resolve(3)), StageStatus::Disabled);
    }

    #[test]
    fn test_select_first_enabled_stage() {
        let stages = vec![
            ranked_stage("1x3", &[0, 1, 2]).min_viewports_matched(3),
            ranked_stage("1x2", &[0, 1]).min_viewports_matched(2),
            ranked_stage("1x1", &[0]),
        ];

        assert_eq!(select_stage(&stages, &resolve(4)).map(|(i, _)| i), Some(0));
        assert_eq!(select_stage(&stages, &resolve(2)).map(|(i, _)| i), Some(1));
        assert_eq!(select_stage(&stages, &resolve(0)).map(|(i, _)| i), Some(2));
    }

    #[test]
    fn test_select_falls_back_to_last_stage() {
        let stages = vec![
            ranked_stage("1x2", &[0, 1]).min_viewports_matched(2),
            ranked_stage("1x1", &[0]).min_viewports_matched(1),
        ];

        let (index, stage) = select_stage(&stages, &resolve(0)).unwrap();
        assert_eq!(index, 1);
        assert_eq!(stage.name, "1x1");
    }

    #[test]
    fn test_select_stage_is_deterministic() {
        let stages = vec![
            ranked_stage("1x2", &[0, 1]).min_viewports_matched(2),
            ranked_stage("1x1", &[0]),
        ];
        let resolved = resolve(1);

        let first = select_stage(&stages, &resolved).map(|(i, _)| i);
        for _ in 0..5 {
            assert_eq!(select_stage(&stages, &resolved).map(|(i, _)| i), first);
        }
    }

    #[test]
    fn test_select_stage_empty() {
        assert!(select_stage(&[], &resolve(1)).is_none());
    }

    #[test]
    fn test_stage_statuses_in_order() {
        let stages = vec![
            ranked_stage("1x2", &[0, 1]).min_viewports_matched(2),
            ranked_stage("1x1", &[0]),
        ];
        assert_eq!(
            stage_statuses(&stages, &resolve(1)),
            vec![StageStatus::Disabled, StageStatus::Enabled]
        );
    }
}
