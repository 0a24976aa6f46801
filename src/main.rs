//! FHIR Narrative CLI
//!
//! Usage:
//!   fhir-narrative [OPTIONS] [RECORD]
//!
//! Options:
//!   -m, --manifest <FILE>   Narrative manifest (TOML) instead of the bundled templates
//!   -p, --profile <URL>     Profile to render with instead of the record's own
//!   --strict                Report render failures instead of the empty narrative
//!   --require-templates     Treat a profile without a template as a failure
//!   --json                  Print the narrative as FHIR JSON
//!   --list                  List configured profiles and data types
//!   -v, --verbose           Debug logging
//!   -h, --help              Print help

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use serde_json::Value;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fhir_narrative::{
    profile_of, GeneratorConfig, NarrativeError, NarrativeGenerator, RenderError,
};

#[derive(Parser)]
#[command(name = "fhir-narrative")]
#[command(about = "Generate XHTML narratives for FHIR records")]
struct Cli {
    /// FHIR JSON record (reads from stdin if not provided)
    record: Option<PathBuf>,

    /// Narrative manifest (TOML); template paths are relative to it
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Render with this profile instead of the one the record declares
    #[arg(short, long)]
    profile: Option<String>,

    /// Report render failures instead of printing the empty narrative
    #[arg(long)]
    strict: bool,

    /// Treat a profile without a template as a failure
    #[arg(long)]
    require_templates: bool,

    /// Print the narrative as FHIR JSON (status and div)
    #[arg(long)]
    json: bool,

    /// List configured profiles and data types
    #[arg(long)]
    list: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "fhir_narrative=debug"
    } else {
        "fhir_narrative=info"
    };
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = default.parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load templates
    let generator = match &cli.manifest {
        Some(path) => NarrativeGenerator::from_manifest_file(path),
        None => NarrativeGenerator::bundled(),
    };
    let generator = match generator {
        Ok(g) => g.with_config(
            GeneratorConfig::new()
                .with_ignore_failures(!cli.strict)
                .with_ignore_missing_templates(!cli.require_templates),
        ),
        Err(e) => {
            eprintln!("Error loading narrative templates: {}", e);
            process::exit(1);
        }
    };

    if cli.list {
        print_registry(&generator);
        return;
    }

    // If no record file and stdin is a terminal (interactive), show usage
    if cli.record.is_none() && io::stdin().is_terminal() {
        print_intro();
        return;
    }

    // Read input
    let source = match &cli.record {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => buffer,
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    process::exit(1);
                }
            }
        }
    };

    let record: Value = match serde_json::from_str(&source) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error parsing record: {}", e);
            process::exit(1);
        }
    };

    let profile = cli
        .profile
        .clone()
        .or_else(|| profile_of(&record))
        .unwrap_or_default();

    match generator.generate_narrative(&profile, &record) {
        Ok(narrative) if cli.json => println!("{}", narrative.to_json()),
        Ok(narrative) => println!("{}", narrative.div),
        Err(e) => {
            report(&e);
            process::exit(1);
        }
    }
}

/// Print a failure, with source context for expression syntax errors
fn report(err: &NarrativeError) {
    match err.render_error() {
        RenderError::Expression {
            source_text,
            errors,
        } => {
            let NarrativeError::Format { profile, .. } = err;
            eprintln!("Error: {}", err);
            for e in errors {
                eprintln!("{}", e.format(source_text, profile));
            }
        }
        _ => eprintln!("Error: {}", err),
    }
}

fn print_registry(generator: &NarrativeGenerator) {
    let registry = generator.registry();
    println!("PROFILES");
    for profile in registry.profiles() {
        println!("    {}", profile);
    }
    println!("DATA TYPES");
    for data_type in registry.data_types() {
        println!("    {}", data_type);
    }
}

fn print_intro() {
    println!(
        r#"FHIR Narrative - XHTML narratives for FHIR records

USAGE:
    fhir-narrative [OPTIONS] [RECORD]
    cat patient.json | fhir-narrative

OPTIONS:
    -m, --manifest <FILE>   Narrative manifest (TOML) instead of the bundled templates
    -p, --profile <URL>     Profile to render with instead of the record's own
    --strict                Report render failures instead of the empty narrative
    --require-templates     Treat a profile without a template as a failure
    --json                  Print the narrative as FHIR JSON
    --list                  List configured profiles and data types
    -v, --verbose           Debug logging
    -h, --help              Print help

MANIFEST:
    patient.profile = "http://hl7.org/fhir/profiles/Patient"
    patient.narrative = "templates/patient.html"
    quantity.dtclass = "Quantity"
    quantity.dtnarrative = "templates/quantity.html""#
    );
}
