use super::resolver::ResolvedSelectors;
use super::selector::MatchedDisplaySet;
use crate::types::{DisplaySetRef, Stage, ViewportConfig, ViewportOptions};
use log::warn;

/// One display-set reference of a viewport and what it bound to
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "camelCase"))]
pub struct BoundDisplaySet {
    pub reference: DisplaySetRef,

    /// `None` when the requested rank does not exist
    pub matched: Option<MatchedDisplaySet>,
}

/// Final assignment of one viewport slot
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "camelCase"))]
pub struct ViewportBinding {
    /// Slot index in stage order
    pub slot: usize,

    pub viewport_options: ViewportOptions,

    /// Every reference of the viewport, primary first
    pub display_sets: Vec<BoundDisplaySet>,

    /// Slot was filled from the protocol's default viewport
    pub from_default_viewport: bool,
}

impl ViewportBinding {
    /// Display set bound to the primary reference
    pub fn primary(&self) -> Option<&MatchedDisplaySet> {
        self.display_sets.first().and_then(|bound| bound.matched.as_ref())
    }

    /// Returns whether the primary reference bound to a display set
    pub fn is_matched(&self) -> bool {
        self.primary().is_some()
    }

    /// Returns whether an unmatched slot may be rendered empty
    pub fn allows_unmatched(&self) -> bool {
        self.viewport_options.allow_unmatched_view
    }
}

fn bind_viewport(
    slot: usize,
    viewport: &ViewportConfig,
    resolved: &ResolvedSelectors,
    from_default_viewport: bool,
) -> ViewportBinding {
    let display_sets = viewport
        .display_sets
        .iter()
        .map(|reference| BoundDisplaySet {
            reference: reference.clone(),
            matched: resolved
                .get(&reference.selector_id)
                .and_then(|ranked| ranked.at(reference.rank()))
                .cloned(),
        })
        .collect();

    let binding = ViewportBinding {
        slot,
        viewport_options: viewport.viewport_options.clone(),
        display_sets,
        from_default_viewport,
    };

    if !binding.is_matched() && !binding.allows_unmatched() {
        warn!(
            "Viewport {} has no matching display set and does not allow unmatched views",
            slot
        );
    }

    binding
}

/// Binds each viewport of a stage to concrete display sets
///
/// Rank -1 binds the best candidate; any other rank binds exactly that
/// position. A missing rank leaves the reference unmatched; the stage is
/// never reconsidered.
///
/// # Returns
///
/// One binding per viewport, in stage order
pub fn bind_viewports(stage: &Stage, resolved: &ResolvedSelectors) -> Vec<ViewportBinding> {
    stage
        .viewports
        .iter()
        .enumerate()
        .map(|(slot, viewport)| bind_viewport(slot, viewport, resolved, false))
        .collect()
}

/// Binds a stage and pads the remaining grid cells with the default viewport
pub fn bind_layout(
    stage: &Stage,
    default_viewport: &ViewportConfig,
    resolved: &ResolvedSelectors,
) -> Vec<ViewportBinding> {
    let mut bindings = bind_viewports(stage, resolved);

    let cells = stage.viewport_structure.cell_count().unwrap_or(0);
    for slot in bindings.len()..cells {
        bindings.push(bind_viewport(slot, default_viewport, resolved, true));
    }

    bindings
}
