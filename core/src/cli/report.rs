use crate::api::LayoutResult;
use std::fmt;

/// Text report formatter for a resolved layout
pub struct TextReport<'a> {
    layout: &'a LayoutResult,
}

impl<'a> TextReport<'a> {
    /// Creates a new text report
    pub fn new(layout: &'a LayoutResult) -> Self {
        Self { layout }
    }
}

impl<'a> fmt::Display for TextReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = self.layout;
        let structure = &layout.stage.viewport_structure;

        writeln!(f, "Hanging Protocol Layout")?;
        writeln!(f, "=======================")?;
        writeln!(f)?;
        writeln!(f, "Protocol:  {}", layout.protocol_id)?;
        writeln!(
            f,
            "Stage:     {} (#{})",
            layout.stage.name, layout.stage_index
        )?;
        writeln!(
            f,
            "Layout:    {} {}x{}",
            structure.layout_type, structure.properties.rows, structure.properties.columns
        )?;
        writeln!(
            f,
            "Matched:   {}/{} viewports",
            layout.matched_viewports(),
            layout.bindings.len()
        )?;
        writeln!(f)?;

        writeln!(f, "Viewports")?;
        writeln!(f, "---------")?;
        for binding in &layout.bindings {
            let selector = binding
                .display_sets
                .first()
                .map(|bound| bound.reference.selector_id.as_str())
                .unwrap_or("-");
            write!(f, "[{}] {}: ", binding.slot, selector)?;
            match binding.primary() {
                Some(matched) => write!(
                    f,
                    "study {} series {} (score {})",
                    matched.study_id, matched.series_id, matched.score
                )?,
                None => write!(f, "unmatched")?,
            }
            if binding.from_default_viewport {
                write!(f, " [default]")?;
            }
            writeln!(f)?;
        }
        writeln!(f)?;

        writeln!(f, "Stages")?;
        writeln!(f, "------")?;
        for (index, status) in layout.stage_statuses.iter().enumerate() {
            let marker = if index == layout.stage_index { "*" } else { " " };
            writeln!(f, "{} {}: {}", marker, index, status)?;
        }

        Ok(())
    }
}
