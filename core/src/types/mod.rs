//! Core type definitions for hanging protocols
//!
//! This module provides the data model consumed and produced by the engine:
//! - [`AttributeValue`]: Value of a study/series attribute or option
//! - [`MatchContext`], [`Study`], [`Series`]: The images available for layout
//! - [`MatchOptions`]: Caller bindings read by `from: "options"` rules
//! - [`Rule`], [`Constraint`], [`DisplaySetSelector`]: Candidate scoring rules
//! - [`Protocol`], [`Stage`], [`ViewportConfig`], [`DisplaySetRef`]: Declarative layouts

mod context;
mod protocol;
mod rule;
mod value;

pub use context::{MatchContext, MatchOptions, Series, Study, STUDY_INDEX_OPTION};
pub use protocol::{
    ActivationThreshold, DisplaySetRef, LayoutProperties, Protocol, Stage, StageActivation,
    ViewportConfig, ViewportOptions, ViewportStructure,
};
pub use rule::{Constraint, DisplaySetSelector, Rule, RuleSource};
pub use value::{AttributeValue, Attributes};
