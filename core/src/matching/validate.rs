use crate::error::{HangingProtocolError, Result};
use crate::types::{Constraint, LayoutProperties, Protocol, Rule, Stage, ViewportConfig};

/// Largest grid a stage may declare
pub const MAX_GRID_CELLS: usize = 64;

/// Checks a protocol before any matching runs
///
/// Rejects, in order of discovery:
/// - a protocol with no stages
/// - a grid stage that is empty, larger than [`MAX_GRID_CELLS`], or has
///   fewer cells than viewports
/// - a viewport (stage or default) referencing an undeclared selector
/// - a reference rank below -1
/// - a rule with an unsupported or malformed constraint, an empty
///   attribute name, or a non-finite weight
///
/// # Errors
///
/// Returns the first configuration error found, naming the protocol and
/// the offending element.
pub fn validate_protocol(protocol: &Protocol) -> Result<()> {
    if protocol.stages.is_empty() {
        return Err(HangingProtocolError::NoStages {
            protocol_id: protocol.id.clone(),
        });
    }

    for stage in &protocol.stages {
        validate_grid(protocol, stage)?;
        for (index, viewport) in stage.viewports.iter().enumerate() {
            let location = format!("stage '{}' viewport {}", stage.name, index);
            validate_viewport(protocol, viewport, &location)?;
        }
    }
    validate_viewport(protocol, &protocol.default_viewport, "default viewport")?;

    for (id, selector) in &protocol.display_set_selectors {
        for (index, rule) in selector.study_matching_rules.iter().enumerate() {
            validate_rule(protocol, rule, &format!("selector '{}' study rule {}", id, index))?;
        }
        for (index, rule) in selector.series_matching_rules.iter().enumerate() {
            validate_rule(protocol, rule, &format!("selector '{}' series rule {}", id, index))?;
        }
    }

    for (index, rule) in protocol.protocol_matching_rules.iter().enumerate() {
        validate_rule(protocol, rule, &format!("protocol rule {}", index))?;
    }

    Ok(())
}

fn validate_grid(protocol: &Protocol, stage: &Stage) -> Result<()> {
    let structure = &stage.viewport_structure;
    if !structure.is_grid() {
        return Ok(());
    }

    let LayoutProperties { rows, columns } = structure.properties;
    let reason = match structure.cell_count() {
        _ if rows == 0 || columns == 0 => Some(format!("grid {}x{} has no cells", rows, columns)),
        None => Some(format!("grid {}x{} is too large", rows, columns)),
        Some(cells) if cells > MAX_GRID_CELLS => Some(format!(
            "grid {}x{} exceeds {} cells",
            rows, columns, MAX_GRID_CELLS
        )),
        Some(cells) if cells < stage.viewports.len() => Some(format!(
            "grid {}x{} has fewer cells than its {} viewports",
            rows,
            columns,
            stage.viewports.len()
        )),
        Some(_) => None,
    };

    match reason {
        Some(reason) => Err(HangingProtocolError::InvalidRule {
            protocol_id: protocol.id.clone(),
            location: format!("stage '{}' viewport structure", stage.name),
            reason,
        }),
        None => Ok(()),
    }
}

fn validate_viewport(protocol: &Protocol, viewport: &ViewportConfig, location: &str) -> Result<()> {
    for reference in &viewport.display_sets {
        if !protocol
            .display_set_selectors
            .contains_key(&reference.selector_id)
        {
            return Err(HangingProtocolError::UnknownSelector {
                protocol_id: protocol.id.clone(),
                location: location.to_string(),
                selector_id: reference.selector_id.clone(),
            });
        }

        if reference.matched_display_sets_index < -1 {
            return Err(HangingProtocolError::InvalidRule {
                protocol_id: protocol.id.clone(),
                location: location.to_string(),
                reason: format!(
                    "matchedDisplaySetsIndex {} is below -1",
                    reference.matched_display_sets_index
                ),
            });
        }
    }
    Ok(())
}

fn validate_rule(protocol: &Protocol, rule: &Rule, location: &str) -> Result<()> {
    let invalid = |reason: String| HangingProtocolError::InvalidRule {
        protocol_id: protocol.id.clone(),
        location: location.to_string(),
        reason,
    };

    if rule.attribute.trim().is_empty() {
        return Err(invalid("attribute name is empty".to_string()));
    }
    if !rule.weight.is_finite() {
        return Err(invalid(format!("weight {} is not finite", rule.weight)));
    }

    validate_constraint(protocol, &rule.constraint, location)
}

fn validate_constraint(protocol: &Protocol, constraint: &Constraint, location: &str) -> Result<()> {
    match constraint {
        Constraint::Unsupported { operator } => Err(HangingProtocolError::UnsupportedConstraint {
            protocol_id: protocol.id.clone(),
            location: location.to_string(),
            operator: operator.clone(),
        }),
        Constraint::Malformed { operator, reason } => Err(HangingProtocolError::InvalidRule {
            protocol_id: protocol.id.clone(),
            location: location.to_string(),
            reason: format!("constraint '{}': {}", operator, reason),
        }),
        Constraint::Range { min, max } if min > max => Err(HangingProtocolError::InvalidRule {
            protocol_id: protocol.id.clone(),
            location: location.to_string(),
            reason: format!("range [{}, {}] is empty", min, max),
        }),
        Constraint::All(inner) => inner
            .iter()
            .try_for_each(|c| validate_constraint(protocol, c, location)),
        _ => Ok(()),
    }
}
