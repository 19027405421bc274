use super::rule::score_rules;
use crate::types::{Attributes, MatchContext, MatchOptions, Protocol};
use log::debug;

/// A protocol that qualified for the primary study, with its score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProtocolMatch<'a> {
    pub protocol: &'a Protocol,
    pub score: f64,
}

/// Ranks protocols by their `protocolMatchingRules` against the primary study
///
/// Protocols whose required rules fail are dropped; an empty rule list
/// scores 0 and always qualifies. With no studies, rules see no attributes.
/// Equal scores keep declaration order.
pub fn rank_protocols<'a>(
    protocols: &'a [Protocol],
    context: &MatchContext,
    options: &MatchOptions,
) -> Vec<ProtocolMatch<'a>> {
    let empty = Attributes::new();
    let primary = context
        .studies
        .first()
        .map(|study| &study.attributes)
        .unwrap_or(&empty);
    let primary_options = options.for_study(0);

    let mut matches: Vec<ProtocolMatch<'a>> = protocols
        .iter()
        .filter_map(|protocol| {
            let score = score_rules(&protocol.protocol_matching_rules, primary, &primary_options);
            debug!("Protocol '{}' scored {:?}", protocol.id, score);
            score.map(|score| ProtocolMatch { protocol, score })
        })
        .collect();

    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches
}
