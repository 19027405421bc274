//! Hanging protocol matching engine
//!
//! Leaf-first: rules are evaluated per attribute, selectors rank candidate
//! series, the resolver runs every selector of a protocol, the stage
//! selector picks a layout from the matched counts, and the binder assigns
//! display sets to that layout's viewports.

mod binder;
mod protocol;
mod resolver;
mod rule;
mod selector;
mod stage;
mod validate;

pub use binder::{bind_layout, bind_viewports, BoundDisplaySet, ViewportBinding};
pub use protocol::{rank_protocols, ProtocolMatch};
pub use resolver::{resolve_protocol, ResolvedSelectors};
pub use rule::{constraint_holds, evaluate_rule, score_rules, RuleOutcome};
pub use selector::{match_selector, MatchedDisplaySet, RankedCandidates};
pub use stage::{matched_viewport_count, select_stage, stage_status, stage_statuses, StageStatus};
pub use validate::validate_protocol;
