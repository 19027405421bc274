use super::{DisplaySetSelector, Rule};
use std::collections::BTreeMap;

/// Reference from a viewport to a selector's ranked candidates
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "camelCase"))]
pub struct DisplaySetRef {
    /// Key into [`Protocol::display_set_selectors`]
    #[cfg_attr(feature = "json", serde(rename = "id", alias = "selectorId"))]
    pub selector_id: String,

    /// Rank to bind; -1 means best match
    #[cfg_attr(feature = "json", serde(default = "default_matched_index"))]
    pub matched_display_sets_index: i32,
}

fn default_matched_index() -> i32 {
    -1
}

impl DisplaySetRef {
    /// Reference to the best match of a selector
    pub fn best(selector_id: impl Into<String>) -> Self {
        Self {
            selector_id: selector_id.into(),
            matched_display_sets_index: default_matched_index(),
        }
    }

    /// Reference to a specific rank (0 = best, 1 = second best, ...)
    pub fn ranked(selector_id: impl Into<String>, rank: usize) -> Self {
        Self {
            selector_id: selector_id.into(),
            matched_display_sets_index: rank as i32,
        }
    }

    /// Zero-based rank into the candidate list
    pub fn rank(&self) -> usize {
        if self.matched_display_sets_index < 0 {
            0
        } else {
            self.matched_display_sets_index as usize
        }
    }
}

/// Per-viewport options passed through to the renderer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "camelCase", default))]
pub struct ViewportOptions {
    pub viewport_id: Option<String>,
    pub viewport_type: Option<String>,
    pub tool_group_id: Option<String>,

    /// Render an empty slot instead of complaining when nothing binds
    pub allow_unmatched_view: bool,
}

/// One logical display slot of a stage
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "camelCase"))]
pub struct ViewportConfig {
    #[cfg_attr(feature = "json", serde(default))]
    pub viewport_options: ViewportOptions,

    /// Display sets shown in this viewport; the first is the primary
    #[cfg_attr(feature = "json", serde(default))]
    pub display_sets: Vec<DisplaySetRef>,
}

impl ViewportConfig {
    /// Viewport showing a single display set, tolerating no match
    pub fn single(display_set: DisplaySetRef) -> Self {
        Self {
            viewport_options: ViewportOptions {
                allow_unmatched_view: true,
                ..ViewportOptions::default()
            },
            display_sets: vec![display_set],
        }
    }

    /// The reference whose match decides if the viewport counts as matched
    pub fn primary(&self) -> Option<&DisplaySetRef> {
        self.display_sets.first()
    }
}

/// Grid dimensions of a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "camelCase"))]
pub struct LayoutProperties {
    pub rows: usize,
    pub columns: usize,
}

/// Screen layout of a stage
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "camelCase"))]
pub struct ViewportStructure {
    pub layout_type: String,
    pub properties: LayoutProperties,
}

impl ViewportStructure {
    /// Rectangular grid layout
    pub fn grid(rows: usize, columns: usize) -> Self {
        Self {
            layout_type: "grid".to_string(),
            properties: LayoutProperties { rows, columns },
        }
    }

    /// Returns whether this is a rectangular grid
    pub fn is_grid(&self) -> bool {
        self.layout_type == "grid"
    }

    /// Number of cells the layout offers
    ///
    /// Only grids have a fixed count. `None` for other layouts and for
    /// grids whose cell count overflows.
    pub fn cell_count(&self) -> Option<usize> {
        if self.is_grid() {
            self.properties.rows.checked_mul(self.properties.columns)
        } else {
            None
        }
    }
}

impl Default for ViewportStructure {
    fn default() -> Self {
        Self::grid(1, 1)
    }
}

/// Minimum matched viewports for an activation level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "camelCase"))]
pub struct ActivationThreshold {
    pub min_viewports_matched: usize,
}

/// Activation conditions of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "camelCase", default))]
pub struct StageActivation {
    /// Threshold at which the stage may be auto-selected
    pub enabled: Option<ActivationThreshold>,

    /// Threshold at which the stage is offered for navigation only
    pub passive: Option<ActivationThreshold>,
}

/// One alternative screen layout
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "camelCase"))]
pub struct Stage {
    pub name: String,

    #[cfg_attr(
        feature = "json",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub stage_activation: Option<StageActivation>,

    #[cfg_attr(feature = "json", serde(default))]
    pub viewport_structure: ViewportStructure,

    #[cfg_attr(feature = "json", serde(default))]
    pub viewports: Vec<ViewportConfig>,
}

impl Stage {
    /// Creates an unconditional grid stage
    pub fn new(name: impl Into<String>, rows: usize, columns: usize) -> Self {
        Self {
            name: name.into(),
            stage_activation: None,
            viewport_structure: ViewportStructure::grid(rows, columns),
            viewports: Vec::new(),
        }
    }

    /// Builder: require `count` matched viewports before auto-selection
    pub fn min_viewports_matched(mut self, count: usize) -> Self {
        let activation = self.stage_activation.get_or_insert_with(StageActivation::default);
        activation.enabled = Some(ActivationThreshold {
            min_viewports_matched: count,
        });
        self
    }

    /// Builder: offer the stage for navigation once `count` viewports match
    pub fn passive_min_viewports_matched(mut self, count: usize) -> Self {
        let activation = self.stage_activation.get_or_insert_with(StageActivation::default);
        activation.passive = Some(ActivationThreshold {
            min_viewports_matched: count,
        });
        self
    }

    /// Builder: append a viewport
    pub fn with_viewport(mut self, viewport: ViewportConfig) -> Self {
        self.viewports.push(viewport);
        self
    }

    /// Returns whether the stage is always eligible
    pub fn is_unconditional(&self) -> bool {
        self.stage_activation.is_none()
    }
}

/// A hanging protocol: selectors plus ordered alternative stages
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "camelCase"))]
pub struct Protocol {
    pub id: String,

    #[cfg_attr(feature = "json", serde(default))]
    pub name: Option<String>,

    #[cfg_attr(feature = "json", serde(default))]
    pub description: Option<String>,

    /// Number of prior studies the protocol expects to be loaded
    #[cfg_attr(feature = "json", serde(default))]
    pub number_of_priors_referenced: usize,

    /// Rules scored against the primary study when choosing between protocols
    #[cfg_attr(feature = "json", serde(default))]
    pub protocol_matching_rules: Vec<Rule>,

    #[cfg_attr(feature = "json", serde(default))]
    pub tool_group_ids: Vec<String>,

    pub display_set_selectors: BTreeMap<String, DisplaySetSelector>,

    /// Fills grid cells not covered by a stage's viewport list
    #[cfg_attr(feature = "json", serde(default))]
    pub default_viewport: ViewportConfig,

    pub stages: Vec<Stage>,
}

impl Protocol {
    /// Creates a protocol with no selectors and no stages
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: None,
            number_of_priors_referenced: 0,
            protocol_matching_rules: Vec::new(),
            tool_group_ids: Vec::new(),
            display_set_selectors: BTreeMap::new(),
            default_viewport: ViewportConfig::default(),
            stages: Vec::new(),
        }
    }

    /// Builder: declare a selector
    pub fn with_selector(mut self, id: impl Into<String>, selector: DisplaySetSelector) -> Self {
        self.display_set_selectors.insert(id.into(), selector);
        self
    }

    /// Builder: append a stage
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Builder: set the default viewport
    pub fn with_default_viewport(mut self, viewport: ViewportConfig) -> Self {
        self.default_viewport = viewport;
        self
    }

    /// Builder: add a protocol matching rule
    pub fn with_protocol_rule(mut self, rule: Rule) -> Self {
        self.protocol_matching_rules.push(rule);
        self
    }

    /// Human-readable name, falling back to the id
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Parses a protocol from a JSON document
    ///
    /// Parsing does not validate referential integrity; see
    /// [`crate::matching::validate_protocol`].
    #[cfg(feature = "json")]
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_set_ref_rank() {
        assert_eq!(DisplaySetRef::best("a").rank(), 0);
        assert_eq!(DisplaySetRef::ranked("a", 0).rank(), 0);
        assert_eq!(DisplaySetRef::ranked("a", 1).rank(), 1);
    }

    #[test]
    fn test_cell_count() {
        assert_eq!(ViewportStructure::grid(2, 2).cell_count(), Some(4));
        let custom = ViewportStructure {
            layout_type: "custom".to_string(),
            properties: LayoutProperties { rows: 1, columns: 3 },
        };
        assert_eq!(custom.cell_count(), None);
        assert_eq!(ViewportStructure::grid(usize::MAX, 2).cell_count(), None);
    }

    #[test]
    fn test_stage_builders() {
        let stage = Stage::new("2x2", 2, 2)
            .min_viewports_matched(2)
            .passive_min_viewports_matched(1);
        let activation = stage.stage_activation.unwrap();

        assert_eq!(activation.enabled.unwrap().min_viewports_matched, 2);
        assert_eq!(activation.passive.unwrap().min_viewports_matched, 1);
        assert!(Stage::new("1x1", 1, 1).is_unconditional());
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_protocol_from_json() {
        let json = r#"{
            "id": "twoUp",
            "numberOfPriorsReferenced": 1,
            "protocolMatchingRules": [],
            "displaySetSelectors": {
                "current": {
                    "seriesMatchingRules": [
                        { "attribute": "numImageFrames", "constraint": { "greaterThan": { "value": 0 } } }
                    ]
                }
            },
            "defaultViewport": {
                "viewportOptions": { "viewportType": "stack", "allowUnmatchedView": true },
                "displaySets": [ { "id": "current", "matchedDisplaySetsIndex": -1 } ]
            },
            "stages": [
                {
                    "name": "1x2",
                    "stageActivation": { "enabled": { "minViewportsMatched": 2 } },
                    "viewportStructure": { "layoutType": "grid", "properties": { "rows": 1, "columns": 2 } },
                    "viewports": [
                        { "viewportOptions": { "toolGroupId": "default" }, "displaySets": [ { "id": "current" } ] },
                        { "displaySets": [ { "id": "current", "matchedDisplaySetsIndex": 1 } ] }
                    ]
                }
            ]
        }"#;

        let protocol = Protocol::from_json(json).unwrap();
        assert_eq!(protocol.number_of_priors_referenced, 1);
        assert_eq!(protocol.display_name(), "twoUp");

        let stage = &protocol.stages[0];
        assert_eq!(stage.viewport_structure.cell_count(), Some(2));
        assert_eq!(
            stage.stage_activation.and_then(|a| a.enabled),
            Some(ActivationThreshold {
                min_viewports_matched: 2
            })
        );
        assert_eq!(stage.viewports[0].display_sets[0].matched_display_sets_index, -1);
        assert_eq!(stage.viewports[1].display_sets[0].rank(), 1);
        assert_eq!(
            stage.viewports[0].viewport_options.tool_group_id.as_deref(),
            Some("default")
        );
        assert!(protocol.default_viewport.viewport_options.allow_unmatched_view);
    }
}
