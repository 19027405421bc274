use super::selector::{match_selector, RankedCandidates};
use crate::types::{MatchContext, MatchOptions, Protocol};
use log::debug;
use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Ranked candidates of every selector in a protocol, keyed by selector id
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(transparent))]
pub struct ResolvedSelectors {
    by_selector: BTreeMap<String, RankedCandidates>,
}

impl ResolvedSelectors {
    /// Candidates of one selector; `None` for an undeclared id
    pub fn get(&self, selector_id: &str) -> Option<&RankedCandidates> {
        self.by_selector.get(selector_id)
    }

    /// Iterates selectors in id order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &RankedCandidates)> {
        self.by_selector.iter()
    }

    pub fn len(&self) -> usize {
        self.by_selector.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_selector.is_empty()
    }
}

impl FromIterator<(String, RankedCandidates)> for ResolvedSelectors {
    fn from_iter<T: IntoIterator<Item = (String, RankedCandidates)>>(iter: T) -> Self {
        Self {
            by_selector: iter.into_iter().collect(),
        }
    }
}

/// Runs every selector of a protocol against the context
///
/// Selectors are independent: each reads the shared context and nothing
/// else, so with the `parallel` feature they are matched on the rayon pool.
pub fn resolve_protocol(
    protocol: &Protocol,
    context: &MatchContext,
    options: &MatchOptions,
) -> ResolvedSelectors {
    #[cfg(feature = "parallel")]
    let by_selector: BTreeMap<String, RankedCandidates> = protocol
        .display_set_selectors
        .par_iter()
        .map(|(id, selector)| (id.clone(), match_selector(selector, context, options)))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let by_selector: BTreeMap<String, RankedCandidates> = protocol
        .display_set_selectors
        .iter()
        .map(|(id, selector)| (id.clone(), match_selector(selector, context, options)))
        .collect();

    for (id, ranked) in &by_selector {
        debug!(
            "Selector '{}' of protocol '{}' matched {} display set(s)",
            id,
            protocol.id,
            ranked.len()
        );
    }

    ResolvedSelectors { by_selector }
}
