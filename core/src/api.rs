use crate::error::{HangingProtocolError, Result};
use crate::matching::{
    bind_layout, rank_protocols, resolve_protocol, select_stage, stage_statuses,
    validate_protocol, ResolvedSelectors, StageStatus, ViewportBinding,
};
use crate::types::{MatchContext, MatchOptions, Protocol, Stage};
use log::info;

/// Main entry point of the hanging protocol engine
///
/// Validates a protocol, ranks candidates for each of its selectors, picks
/// the active stage and binds its viewports, in one call.
///
/// # Example
///
/// ```
/// use hangprot_core::{protocols, HangingProtocolEngine, MatchContext, MatchOptions, Series, Study};
///
/// let context = MatchContext::new(vec![
///     Study::new("1.2.3")
///         .with_series(Series::new("pa").with_attribute("numImageFrames", 1))
///         .with_series(
///             Series::new("bw")
///                 .with_attribute("numImageFrames", 1)
///                 .with_attribute("SeriesDescription", "Bitewing Left"),
///         ),
///     Study::new("1.2.0").with_series(Series::new("prior").with_attribute("numImageFrames", 1)),
/// ]);
///
/// let layout = HangingProtocolEngine::run(&protocols::dental(), &context, &MatchOptions::new()).unwrap();
///
/// assert_eq!(layout.stage.name, "dental2x2");
/// assert_eq!(layout.bindings[0].primary().unwrap().series_id, "pa");
/// assert_eq!(layout.bindings[1].primary().unwrap().series_id, "prior");
/// assert_eq!(layout.bindings[2].primary().unwrap().series_id, "bw");
/// ```
pub struct HangingProtocolEngine;

impl HangingProtocolEngine {
    /// Runs one protocol against a context
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the protocol fails validation.
    /// Selectors or viewports that match nothing are not errors.
    pub fn run(
        protocol: &Protocol,
        context: &MatchContext,
        options: &MatchOptions,
    ) -> Result<LayoutResult> {
        validate_protocol(protocol)?;

        let selectors = resolve_protocol(protocol, context, options);
        let (stage_index, stage) =
            select_stage(&protocol.stages, &selectors).ok_or_else(|| {
                HangingProtocolError::NoStages {
                    protocol_id: protocol.id.clone(),
                }
            })?;
        let bindings = bind_layout(stage, &protocol.default_viewport, &selectors);

        let result = LayoutResult {
            protocol_id: protocol.id.clone(),
            stage_index,
            stage: stage.clone(),
            stage_statuses: stage_statuses(&protocol.stages, &selectors),
            bindings,
            selectors,
        };

        info!(
            "Protocol '{}' activated stage '{}' with {}/{} viewports matched",
            result.protocol_id,
            result.stage.name,
            result.matched_viewports(),
            result.bindings.len()
        );

        Ok(result)
    }

    /// Picks the best-matching protocol for the context and runs it
    ///
    /// Every protocol is validated first. Returns `Ok(None)` when no
    /// protocol's required matching rules hold for the primary study.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error among `protocols`.
    pub fn select_and_run(
        protocols: &[Protocol],
        context: &MatchContext,
        options: &MatchOptions,
    ) -> Result<Option<LayoutResult>> {
        for protocol in protocols {
            validate_protocol(protocol)?;
        }

        match rank_protocols(protocols, context, options).first() {
            Some(best) => {
                info!("Selected protocol '{}' (score {})", best.protocol.id, best.score);
                Self::run(best.protocol, context, options).map(Some)
            }
            None => Ok(None),
        }
    }
}

/// Outcome of one resolution pass
///
/// Consumed by a layout renderer: build the grid from `stage`, then fill
/// its cells from `bindings`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "camelCase"))]
pub struct LayoutResult {
    pub protocol_id: String,

    /// Position of the active stage in the protocol
    pub stage_index: usize,

    /// The active stage
    pub stage: Stage,

    /// Status of every stage, for stage navigation
    pub stage_statuses: Vec<StageStatus>,

    /// One binding per viewport slot, in stage order
    pub bindings: Vec<ViewportBinding>,

    /// Ranked candidates per selector
    pub selectors: ResolvedSelectors,
}

impl LayoutResult {
    /// Number of slots whose primary reference bound to a display set
    pub fn matched_viewports(&self) -> usize {
        self.bindings.iter().filter(|b| b.is_matched()).count()
    }

    /// Serializes the result as pretty JSON
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::dental;
    use crate::types::{
        Constraint, DisplaySetRef, DisplaySetSelector, Rule, Series, Study, ViewportConfig,
    };

    fn image(id: &str, description: &str) -> Series {
        Series::new(id)
            .with_attribute("numImageFrames", 1)
            .with_attribute("SeriesDescription", description)
    }

    fn dental_context() -> MatchContext {
        MatchContext::new(vec![
            Study::new("current")
                .with_series(image("S0", "PA"))
                .with_series(image("S1", "Bitewing Left"))
                .with_series(image("S2", "Bitewing Right")),
            Study::new("prior").with_series(image("P0", "PA")),
        ])
    }

    #[test]
    fn test_run_dental() {
        let result = HangingProtocolEngine::run(&dental(), &dental_context(), &MatchOptions::new()).unwrap();

        assert_eq!(result.protocol_id, "hpDental");
        assert_eq!(result.stage_index, 0);
        assert_eq!(result.matched_viewports(), 4);
        assert_eq!(
            result.stage_statuses,
            vec![StageStatus::Enabled, StageStatus::Enabled]
        );
        assert_eq!(result.bindings[3].primary().unwrap().series_id, "S2");
    }

    #[test]
    fn test_run_empty_context() {
        let result =
            HangingProtocolEngine::run(&dental(), &MatchContext::default(), &MatchOptions::new()).unwrap();

        assert_eq!(result.stage.name, "dental1x1");
        assert_eq!(result.bindings.len(), 1);
        assert_eq!(result.matched_viewports(), 0);
        assert_eq!(result.stage_statuses[0], StageStatus::Disabled);
        assert!(result.selectors.iter().all(|(_, ranked)| ranked.is_empty()));
    }

    #[test]
    fn test_run_rejects_invalid_protocol_before_matching() {
        let mut protocol = dental();
        protocol.stages[0].viewports[1] = ViewportConfig::single(DisplaySetRef::best("missing"));

        let err = HangingProtocolEngine::run(&protocol, &dental_context(), &MatchOptions::new()).unwrap_err();
        assert!(matches!(err, HangingProtocolError::UnknownSelector { .. }));
    }

    #[test]
    fn test_run_rejects_protocol_without_stages() {
        let mut protocol = dental();
        protocol.stages.clear();

        assert!(matches!(
            HangingProtocolEngine::run(&protocol, &dental_context(), &MatchOptions::new()),
            Err(HangingProtocolError::NoStages { .. })
        ));
    }

    #[test]
    fn test_run_rejects_oversized_grid() {
        let mut protocol = dental();
        protocol.stages[1].viewport_structure.properties.rows = usize::MAX;
        protocol.stages[1].viewport_structure.properties.columns = usize::MAX;

        assert!(matches!(
            HangingProtocolEngine::run(&protocol, &dental_context(), &MatchOptions::new()),
            Err(HangingProtocolError::InvalidRule { .. })
        ));
    }

    #[test]
    fn test_select_and_run_skips_protocol_failing_required_rule() {
        let ct_only = Protocol::new("ct")
            .with_protocol_rule(Rule::new("Modality", Constraint::Equals("CT".into())).required())
            .with_selector("any", DisplaySetSelector::new())
            .with_stage(
                Stage::new("1x1", 1, 1)
                    .with_viewport(ViewportConfig::single(DisplaySetRef::best("any"))),
            );
        let protocols = vec![ct_only, dental()];

        let result = HangingProtocolEngine::select_and_run(&protocols, &dental_context(), &MatchOptions::new())
            .unwrap()
            .unwrap();
        assert_eq!(result.protocol_id, "hpDental");
    }

    #[test]
    fn test_select_and_run_none_qualify() {
        let protocol = dental()
            .with_protocol_rule(Rule::new("Modality", Constraint::Equals("MR".into())).required());

        let result =
            HangingProtocolEngine::select_and_run(&[protocol], &dental_context(), &MatchOptions::new()).unwrap();
        assert!(result.is_none());
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_layout_result_json() {
        let result = HangingProtocolEngine::run(&dental(), &dental_context(), &MatchOptions::new()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();

        assert_eq!(json["stage"]["name"], "dental2x2");
        assert_eq!(json["stageStatuses"][1], "enabled");
        assert_eq!(json["bindings"][1]["displaySets"][0]["matched"]["seriesId"], "P0");
        assert_eq!(json["selectors"]["bitewingDisplaySetId"][0]["seriesId"], "S1");
    }
}
