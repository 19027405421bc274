pub mod api;
pub mod cli;
pub mod error;
pub mod extraction;
pub mod matching;
pub mod protocols;
pub mod types;

pub use api::{HangingProtocolEngine, LayoutResult};
pub use cli::report::TextReport;
pub use error::{HangingProtocolError, Result};
pub use types::*;
