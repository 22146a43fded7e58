//! featpack - command-line entry point
//!
//! Exit codes: 0 when the profile resolves, 1 when it has violations,
//! 2 when the profile or catalog cannot be loaded at all.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use featpack::cli::{Cli, Commands, OutputFormat};
use featpack::{resolve, BuildState, ComponentCatalog, RawProfile, ValidationReport};

/// Initialize logging. `RUST_LOG` overrides the default level; output goes to
/// stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("✗ {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let catalog = match &cli.catalog {
        Some(path) => ComponentCatalog::load_from_file(path)?,
        None => {
            debug!("using builtin component catalog");
            ComponentCatalog::builtin()
        }
    };

    match cli.command {
        Commands::Validate { profile } => {
            info!("Validating profile: {:?}", profile);
            let raw = RawProfile::load_from_file(&profile)?;
            match resolve(&raw, &catalog) {
                Ok(plan) => {
                    info!("Profile validation successful");
                    println!(
                        "✓ {} is valid: {} full, {} stub, {} excluded",
                        profile.display(),
                        plan.count(BuildState::Full),
                        plan.count(BuildState::Stub),
                        plan.count(BuildState::Excluded),
                    );
                    Ok(ExitCode::SUCCESS)
                }
                Err(report) => {
                    report_violations(&profile, &raw, &report);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Resolve { profile, format } => {
            let raw = RawProfile::load_from_file(&profile)?;
            let plan = match resolve(&raw, &catalog) {
                Ok(plan) => plan,
                Err(report) => {
                    report_violations(&profile, &raw, &report);
                    return Ok(ExitCode::FAILURE);
                }
            };

            match format {
                OutputFormat::Text => print!("{}", plan),
                OutputFormat::Json => println!("{}", plan.to_json()?),
                OutputFormat::Defines => {
                    for define in plan.defines() {
                        println!("{}", define);
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Catalog { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&catalog.to_catalog_file())?);
            } else {
                print_catalog(&catalog);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Print every violation, prefixed with `path:line` when the key is known
fn report_violations(path: &Path, raw: &RawProfile, report: &ValidationReport) {
    error!("Profile validation failed with {} violation(s)", report.len());
    eprintln!("✗ {} has {} violation(s):", path.display(), report.len());

    for violation in report.errors() {
        match violation.key().and_then(|key| raw.line_of(key)) {
            Some(line) => eprintln!("  {}:{}: {}", path.display(), line, violation),
            None => eprintln!("  {}: {}", path.display(), violation),
        }
    }
}

fn print_catalog(catalog: &ComponentCatalog) {
    let width = catalog
        .components()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0);

    println!("Components:");
    for spec in catalog.components() {
        let mut notes = Vec::new();
        if spec.has_empty_variant {
            notes.push("stub".to_string());
        }
        if !spec.depends_on.is_empty() {
            let deps: Vec<&str> = spec.depends_on.iter().map(String::as_str).collect();
            notes.push(format!("needs {}", deps.join(", ")));
        }
        println!(
            "  {:<width$}  {:<24}  {}",
            spec.name,
            format!("[{}]", notes.join("; ")),
            spec.description,
            width = width
        );
    }

    if catalog.groups().next().is_some() {
        println!("Groups:");
        for group in catalog.groups() {
            let members: Vec<&str> = group.members.iter().map(String::as_str).collect();
            println!("  {} ({}): {}", group.name, group.define, members.join(", "));
        }
    }

    if catalog.options().next().is_some() {
        println!("Options:");
        for option in catalog.options() {
            println!("  {} ({}): {}", option.name, option.define, option.description);
        }
    }
}
