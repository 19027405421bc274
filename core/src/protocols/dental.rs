use crate::types::{
    Constraint, DisplaySetRef, DisplaySetSelector, Protocol, Rule, Stage, ViewportConfig,
    ViewportOptions, STUDY_INDEX_OPTION,
};

/// Id of the dental protocol
pub const DENTAL_PROTOCOL_ID: &str = "hpDental";

pub const CURRENT_SELECTOR: &str = "currentDisplaySetId";
pub const PRIOR_SELECTOR: &str = "priorDisplaySetId";
pub const BITEWING_SELECTOR: &str = "bitewingDisplaySetId";

fn study_at(index: i32) -> Rule {
    Rule::new(STUDY_INDEX_OPTION, Constraint::Equals(index.into()))
        .from_options()
        .required()
}

/// Series without image frames (SR, KO, PR) never fill a dental viewport
fn has_frames() -> Rule {
    Rule::new("numImageFrames", Constraint::GreaterThan(0.0)).required()
}

fn viewport(reference: DisplaySetRef) -> ViewportConfig {
    ViewportConfig {
        viewport_options: ViewportOptions {
            tool_group_id: Some("default".to_string()),
            allow_unmatched_view: true,
            ..ViewportOptions::default()
        },
        display_sets: vec![reference],
    }
}

/// Dental 2x2: current image, prior exam, and two bitewings
///
/// ```text
/// +-----------------+-----------------+
/// | current (s0)    | prior (s0)      |
/// +-----------------+-----------------+
/// | bitewing rank 0 | bitewing rank 1 |
/// +-----------------+-----------------+
/// ```
///
/// Every selector requires image frames. Bitewing-labelled series outrank
/// others by weight 10 but any series with frames can still fill the bottom
/// row. Falls back to a single current
/// image when fewer than two distinct display sets can be shown.
pub fn dental() -> Protocol {
    let current = viewport(DisplaySetRef::best(CURRENT_SELECTOR));

    let mut protocol = Protocol::new(DENTAL_PROTOCOL_ID)
        .with_selector(
            CURRENT_SELECTOR,
            DisplaySetSelector::new()
                .with_study_rule(study_at(0))
                .with_series_rule(has_frames()),
        )
        .with_selector(
            PRIOR_SELECTOR,
            DisplaySetSelector::new()
                .with_study_rule(study_at(1))
                .with_series_rule(has_frames()),
        )
        .with_selector(
            BITEWING_SELECTOR,
            DisplaySetSelector::new()
                .with_study_rule(study_at(0))
                .with_series_rule(has_frames())
                .with_series_rule(
                    Rule::new(
                        "SeriesDescription",
                        Constraint::ContainsInsensitive("bitewing".to_string()),
                    )
                    .weight(10.0),
                ),
        )
        .with_default_viewport(ViewportConfig {
            viewport_options: ViewportOptions {
                viewport_type: Some("stack".to_string()),
                tool_group_id: Some("default".to_string()),
                allow_unmatched_view: true,
                ..ViewportOptions::default()
            },
            display_sets: vec![DisplaySetRef::best(CURRENT_SELECTOR)],
        })
        .with_stage(
            Stage::new("dental2x2", 2, 2)
                .min_viewports_matched(2)
                .with_viewport(current.clone())
                .with_viewport(viewport(DisplaySetRef::best(PRIOR_SELECTOR)))
                .with_viewport(viewport(DisplaySetRef::ranked(BITEWING_SELECTOR, 0)))
                .with_viewport(viewport(DisplaySetRef::ranked(BITEWING_SELECTOR, 1))),
        )
        .with_stage(Stage::new("dental1x1", 1, 1).with_viewport(current));

    protocol.name = Some("Dental 2x2".to_string());
    protocol.description =
        Some("Dental 2x2: current image, prior exam, and bitewing placeholders".to_string());
    protocol.number_of_priors_referenced = 1;
    protocol.tool_group_ids = vec!["default".to_string()];
    protocol
}
