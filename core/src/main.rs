use clap::Parser;
use hangprot_core::cli::{Cli, OutputFormat};
use hangprot_core::extraction::context_from_directory;
use hangprot_core::{protocols, HangingProtocolEngine, LayoutResult, MatchContext, Protocol, Result, TextReport};
use log::{error, info};
use std::path::Path;
use std::process;

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let protocols = match load_protocols(&cli.protocols) {
        Ok(protocols) => protocols,
        Err(e) => fail("Failed to load protocol", e),
    };

    let context = match load_context(&cli) {
        Ok(context) => context,
        Err(e) => fail("Failed to load context", e),
    };
    info!(
        "Loaded {} studies with {} series",
        context.studies.len(),
        context.series_count()
    );

    let options = cli.match_options();
    let layout = match protocols.as_slice() {
        [single] => HangingProtocolEngine::run(single, &context, &options).map(Some),
        _ => HangingProtocolEngine::select_and_run(&protocols, &context, &options),
    };

    match layout {
        Ok(Some(layout)) => output_layout(&layout, cli.format),
        Ok(None) => {
            eprintln!("Error: No protocol matches the current study");
            process::exit(1);
        }
        Err(e) => fail("Failed to resolve layout", e),
    }
}

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}

fn fail(what: &str, e: hangprot_core::HangingProtocolError) -> ! {
    error!("{}: {}", what, e);
    eprintln!("Error: {}: {}", what, e);
    process::exit(1);
}

/// Each argument is a protocol JSON file if one exists at that path,
/// otherwise a built-in protocol id
fn load_protocols(args: &[String]) -> Result<Vec<Protocol>> {
    args.iter()
        .map(|arg| {
            let path = Path::new(arg);
            if path.is_file() {
                info!("Loading protocol from {}", path.display());
                Protocol::from_json(&std::fs::read_to_string(path)?)
            } else {
                protocols::builtin(arg)
            }
        })
        .collect()
}

fn load_context(cli: &Cli) -> Result<MatchContext> {
    match (&cli.context, &cli.dicom_dir) {
        (Some(path), _) => MatchContext::from_json(&std::fs::read_to_string(path)?),
        (None, Some(dir)) => {
            if !dir.is_dir() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} is not a directory", dir.display()),
                )
                .into());
            }
            context_from_directory(dir)
        }
        (None, None) => Ok(MatchContext::default()),
    }
}

fn output_layout(layout: &LayoutResult, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            println!("{}", TextReport::new(layout));
        }
        OutputFormat::Json => match layout.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => fail("Failed to serialize to JSON", e),
        },
    }
}
