use crate::types::{AttributeValue, Attributes, Constraint, MatchOptions, Rule, RuleSource};

/// Result of evaluating one rule against one candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleOutcome {
    /// Whether the constraint held
    pub passed: bool,

    /// The rule's weight when passed, 0 otherwise
    pub contributed_score: f64,
}

/// Evaluates a rule against a candidate's attributes
///
/// The target value comes from `attributes`, or from `options` when the rule
/// reads `from: "options"`. A missing value fails the constraint; it is
/// never an error.
///
/// # Example
///
/// ```
/// use hangprot_core::matching::evaluate_rule;
/// use hangprot_core::{Attributes, Constraint, MatchOptions, Rule};
///
/// let rule = Rule::new("SeriesDescription", Constraint::ContainsInsensitive("bitewing".into()))
///     .weight(10.0);
///
/// let mut attributes = Attributes::new();
/// attributes.insert("SeriesDescription".into(), "Bitewing Left".into());
///
/// let outcome = evaluate_rule(&rule, &attributes, &MatchOptions::new());
/// assert!(outcome.passed);
/// assert_eq!(outcome.contributed_score, 10.0);
/// ```
pub fn evaluate_rule(rule: &Rule, attributes: &Attributes, options: &MatchOptions) -> RuleOutcome {
    let target = match rule.source {
        RuleSource::Context => attributes.get(&rule.attribute),
        RuleSource::Options => options.get(&rule.attribute),
    };

    let passed = constraint_holds(&rule.constraint, target);
    RuleOutcome {
        passed,
        contributed_score: if passed { rule.weight } else { 0.0 },
    }
}

/// Sums the scores of `rules`, or returns `None` when a required rule fails
pub fn score_rules(rules: &[Rule], attributes: &Attributes, options: &MatchOptions) -> Option<f64> {
    let mut score = 0.0;
    for rule in rules {
        let outcome = evaluate_rule(rule, attributes, options);
        if rule.required && !outcome.passed {
            return None;
        }
        score += outcome.contributed_score;
    }
    Some(score)
}

/// Tests a constraint against an optional attribute value
///
/// Absent and null values fail every constraint. Operators that could not
/// be decoded fail closed; validation rejects them before matching starts.
pub fn constraint_holds(constraint: &Constraint, value: Option<&AttributeValue>) -> bool {
    let value = match value {
        Some(v) if !v.is_null() => v,
        _ => return false,
    };

    match constraint {
        Constraint::Equals(expected) => value.matches_exactly(expected),
        Constraint::DoesNotEqual(expected) => !value.matches_exactly(expected),
        Constraint::GreaterThan(bound) => value.as_number().is_some_and(|n| n > *bound),
        Constraint::LessThan(bound) => value.as_number().is_some_and(|n| n < *bound),
        Constraint::Range { min, max } => value
            .as_number()
            .is_some_and(|n| n >= *min && n <= *max),
        Constraint::Contains(needle) => value.any_text(|s| s.contains(needle.as_str())),
        Constraint::DoesNotContain(needle) => !value.any_text(|s| s.contains(needle.as_str())),
        Constraint::ContainsInsensitive(needle) => {
            let needle = needle.to_lowercase();
            value.any_text(|s| s.to_lowercase().contains(&needle))
        }
        Constraint::DoesNotContainInsensitive(needle) => {
            let needle = needle.to_lowercase();
            !value.any_text(|s| s.to_lowercase().contains(&needle))
        }
        Constraint::StartsWith(prefix) => value.any_text(|s| s.starts_with(prefix.as_str())),
        Constraint::EndsWith(suffix) => value.any_text(|s| s.ends_with(suffix.as_str())),
        Constraint::NotNull => true,
        Constraint::All(inner) => inner.iter().all(|c| constraint_holds(c, Some(value))),
        Constraint::Unsupported { .. } | Constraint::Malformed { .. } => false,
    }
}
