//! CLI Tool Example
//!
//! This example demonstrates how to build a command-line tool
//! using sverka for reconciling two Excel exports.

use std::fs::File;
use std::io::{self, Write};
use std::process;
use sverka::{OutputFormat, ReconcilerBuilder, SheetSelector, SverkaError};

/// Parsed command-line options
struct Options {
    first: String,
    second: String,
    sheet_selector: SheetSelector,
    output_format: OutputFormat,
    absolute: bool,
    min_key_overlap: Option<f64>,
    max_edit_distance: Option<usize>,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <first.xlsx> <second.xlsx> [options]", args[0]);
        eprintln!("\nOptions:");
        eprintln!("  --sheet-index <n>        Select sheet by index (0-based, default 0)");
        eprintln!("  --sheet-name <name>      Select sheet by name");
        eprintln!("  --format <text|md|json>  Report format (default text)");
        eprintln!("  --absolute               Sum unmatched amounts by absolute value");
        eprintln!("  --min-overlap <ratio>    Required share of common dates (default 0.2)");
        eprintln!("  --max-distance <n>       Product name edit distance (default 2)");
        eprintln!("\nExamples:");
        eprintln!("  {} ours.xlsx theirs.xlsx", args[0]);
        eprintln!("  {} ours.xlsx theirs.xlsx --format md", args[0]);
        eprintln!("  {} ours.xlsx theirs.xlsx --sheet-name \"Акт\"", args[0]);
        process::exit(1);
    }

    let options = parse_options(&args).unwrap_or_else(|message| {
        eprintln!("Error: {}", message);
        process::exit(1);
    });

    match reconcile_files(&options) {
        Ok(identical) => {
            if !identical {
                process::exit(2);
            }
        }
        Err(e) => {
            handle_error(e);
            process::exit(1);
        }
    }
}

fn parse_options(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        first: args[1].clone(),
        second: args[2].clone(),
        sheet_selector: SheetSelector::default(),
        output_format: OutputFormat::Text,
        absolute: false,
        min_key_overlap: None,
        max_edit_distance: None,
    };

    let mut i = 3;
    while i < args.len() {
        let value = args.get(i + 1);
        match (args[i].as_str(), value) {
            ("--sheet-index", Some(value)) => {
                let index = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid sheet index: {}", value))?;
                options.sheet_selector = SheetSelector::Index(index);
                i += 2;
            }
            ("--sheet-name", Some(value)) => {
                options.sheet_selector = SheetSelector::Name(value.clone());
                i += 2;
            }
            ("--format", Some(value)) => {
                options.output_format = match value.as_str() {
                    "text" => OutputFormat::Text,
                    "md" | "markdown" => OutputFormat::Markdown,
                    "json" => OutputFormat::Json,
                    other => return Err(format!("Unknown format: {}", other)),
                };
                i += 2;
            }
            ("--min-overlap", Some(value)) => {
                let ratio = value
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid overlap ratio: {}", value))?;
                options.min_key_overlap = Some(ratio);
                i += 2;
            }
            ("--max-distance", Some(value)) => {
                let distance = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid edit distance: {}", value))?;
                options.max_edit_distance = Some(distance);
                i += 2;
            }
            ("--absolute", _) => {
                options.absolute = true;
                i += 1;
            }
            (flag, None) if flag.starts_with("--") => {
                return Err(format!("{} requires a value", flag));
            }
            (other, _) => return Err(format!("Unknown option: {}", other)),
        }
    }

    Ok(options)
}

/// Reconcile both files and print the report; returns whether they agree
fn reconcile_files(options: &Options) -> Result<bool, SverkaError> {
    let mut builder = ReconcilerBuilder::new()
        .with_sheet_selector(options.sheet_selector.clone())
        .with_output_format(options.output_format)
        .compare_by_absolute_value(options.absolute);
    if let Some(ratio) = options.min_key_overlap {
        builder = builder.with_min_key_overlap(ratio);
    }
    if let Some(distance) = options.max_edit_distance {
        builder = builder.with_max_edit_distance(distance);
    }
    let reconciler = builder.build()?;

    let inputs = vec![File::open(&options.first)?, File::open(&options.second)?];
    let result = reconciler.reconcile(inputs)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    reconciler.render(&result, &mut handle)?;
    handle.flush()?;

    Ok(result.is_identical())
}

fn handle_error(error: SverkaError) {
    match error {
        SverkaError::Io(io_err) => {
            eprintln!("I/O Error: {}", io_err);
            eprintln!("Please check that the file exists and you have permission to access it.");
        }
        SverkaError::Parse(parse_err) => {
            eprintln!("Parse Error: {}", parse_err);
            eprintln!("The file may not be a valid Excel file or may be corrupted.");
        }
        SverkaError::LegacyFormat(msg) => {
            eprintln!("Legacy Format: {}", msg);
            eprintln!("Convert the file to .xlsx (e.g. with LibreOffice) and try again.");
        }
        SverkaError::Config(msg) => {
            eprintln!("Configuration Error: {}", msg);
        }
        SverkaError::SheetNotFound(sheet) => {
            eprintln!("Sheet Not Found: {}", sheet);
        }
        SverkaError::AmbiguousMergeInput { got } => {
            eprintln!("Product comparison needs exactly two files, got {}", got);
        }
        other => {
            eprintln!("Error: {}", other);
        }
    }
}
