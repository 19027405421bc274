pub mod report;

use crate::error::{HangingProtocolError, Result};
use crate::types::{AttributeValue, MatchOptions};
use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for hangprot
#[derive(Parser, Debug)]
#[command(name = "hangprot")]
#[command(about = "Resolve a hanging protocol layout for a set of studies")]
#[command(version)]
#[command(group(ArgGroup::new("input").required(true).args(["context", "dicom_dir"])))]
pub struct Cli {
    /// Built-in protocol id or protocol JSON file (repeatable)
    #[arg(short, long = "protocol", value_name = "ID|FILE", default_value = "hpDental")]
    pub protocols: Vec<String>,

    /// Match context JSON file
    #[arg(short, long, value_name = "FILE")]
    pub context: Option<PathBuf>,

    /// Directory of DICOM files to build the context from
    #[arg(short, long, value_name = "DIR")]
    pub dicom_dir: Option<PathBuf>,

    /// Option binding for rules reading from options (key=value, repeatable)
    #[arg(short, long = "option", value_name = "KEY=VALUE", value_parser = parse_option)]
    pub options: Vec<(String, AttributeValue)>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Collects `--option` bindings into a match options map
    pub fn match_options(&self) -> MatchOptions {
        let mut options = MatchOptions::new();
        for (key, value) in &self.options {
            options.insert(key.clone(), value.clone());
        }
        options
    }
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
}

/// Parses `key=value`; numeric values become numbers, anything else text
pub fn parse_option(raw: &str) -> Result<(String, AttributeValue)> {
    let (key, value) = raw.split_once('=').ok_or_else(|| {
        HangingProtocolError::InvalidOption(format!("expected key=value, got '{}'", raw))
    })?;

    let key = key.trim();
    if key.is_empty() {
        return Err(HangingProtocolError::InvalidOption(format!(
            "empty key in '{}'",
            raw
        )));
    }

    let value = value.trim();
    let value = match value.parse::<f64>() {
        Ok(number) if number.is_finite() => AttributeValue::Number(number),
        _ => AttributeValue::from(value),
    };

    Ok((key.to_string(), value))
}
