//! Builds match contexts from DICOM instances

pub mod context;
pub mod instance;
pub mod tags;

pub use context::{build_context, collect_dicom_files, context_from_directory, context_from_files};
pub use instance::InstanceRecord;
