use thiserror::Error;

/// Result type for hanging protocol operations
pub type Result<T> = std::result::Result<T, HangingProtocolError>;

/// Error types for hanging protocol operations
///
/// Only configuration and I/O problems are errors. A selector or viewport
/// that matches nothing is a normal outcome and never surfaces here.
#[derive(Error, Debug)]
pub enum HangingProtocolError {
    /// Protocol declares no stages
    #[error("protocol '{protocol_id}' declares no stages")]
    NoStages { protocol_id: String },

    /// A viewport references a selector id missing from `displaySetSelectors`
    #[error("protocol '{protocol_id}': {location} references unknown selector '{selector_id}'")]
    UnknownSelector {
        protocol_id: String,
        location: String,
        selector_id: String,
    },

    /// A rule uses a constraint operator the evaluator does not implement
    #[error("protocol '{protocol_id}': {location} uses unsupported constraint '{operator}'")]
    UnsupportedConstraint {
        protocol_id: String,
        location: String,
        operator: String,
    },

    /// A rule is malformed (bad weight, empty attribute, ...)
    #[error("protocol '{protocol_id}': {location} is invalid: {reason}")]
    InvalidRule {
        protocol_id: String,
        location: String,
        reason: String,
    },

    /// No built-in protocol with the given id
    #[error("Unknown protocol: {0}")]
    UnknownProtocol(String),

    /// Malformed `key=value` option binding
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// DICOM reading error
    #[error("DICOM error: {0}")]
    DicomError(String),

    /// JSON document error
    #[cfg(feature = "json")]
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// Convert dicom-object errors
impl From<dicom_object::ReadError> for HangingProtocolError {
    fn from(e: dicom_object::ReadError) -> Self {
        HangingProtocolError::DicomError(format!("{}", e))
    }
}
