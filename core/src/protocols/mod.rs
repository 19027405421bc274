//! Built-in hanging protocols

mod dental;

pub use dental::{dental, BITEWING_SELECTOR, CURRENT_SELECTOR, DENTAL_PROTOCOL_ID, PRIOR_SELECTOR};

use crate::error::{HangingProtocolError, Result};
use crate::types::Protocol;

/// Ids of every built-in protocol
pub const BUILTIN_PROTOCOL_IDS: [&str; 1] = [DENTAL_PROTOCOL_ID];

/// Looks up a built-in protocol by id
///
/// # Errors
///
/// Returns [`HangingProtocolError::UnknownProtocol`] for an unknown id
pub fn builtin(id: &str) -> Result<Protocol> {
    match id {
        DENTAL_PROTOCOL_ID => Ok(dental()),
        other => Err(HangingProtocolError::UnknownProtocol(other.to_string())),
    }
}
