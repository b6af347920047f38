//! obsgen CLI - observable event wrapper generator

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use obsgen::classifier::{classify, WellKnownTypes};
use obsgen::{
    Compilation, Diagnostic, DirectorySink, EmissionSink, FixSuggestion, GeneratorConfig,
    MemorySink, ObsgenError, Pipeline, RunReport, Severity,
};

#[derive(Parser)]
#[command(name = "obsgen")]
#[command(about = "Generate observable wrappers for the events of a type hierarchy")]
#[command(version)]
struct Cli {
    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate wrappers for a snapshot file or directory
    Generate {
        /// Path to a .obsgen.yaml file or a directory of them
        snapshot: PathBuf,

        /// Output directory for generated artifacts
        #[arg(short, long, default_value = "generated")]
        out: PathBuf,

        /// Generator config (defaults to obsgen.yaml next to the snapshot)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Run the pipeline without writing files
        #[arg(long)]
        dry_run: bool,
    },

    /// Load a snapshot and list the classified roots (no generation)
    Check {
        /// Path to a .obsgen.yaml file or a directory of them
        snapshot: PathBuf,

        /// Generator config (defaults to obsgen.yaml next to the snapshot)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Generate {
            snapshot,
            out,
            config,
            format,
            dry_run,
        } => generate(&snapshot, &out, config.as_deref(), format, dry_run),
        Commands::Check { snapshot, config } => check(&snapshot, config.as_deref()),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            if let Some(suggestion) = e.downcast_ref::<ObsgenError>().and_then(|e| e.fix_suggestion()) {
                eprintln!("  {} {}", "Fix:".yellow(), suggestion);
            }
            std::process::exit(1);
        }
    }
}

fn load_config(snapshot: &Path, explicit: Option<&Path>) -> Result<GeneratorConfig> {
    if let Some(path) = explicit {
        return GeneratorConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path));
    }
    let dir = if snapshot.is_dir() {
        snapshot
    } else {
        snapshot.parent().unwrap_or_else(|| Path::new("."))
    };
    Ok(GeneratorConfig::discover(dir)?)
}

fn load_compilation(snapshot: &Path, config: &GeneratorConfig) -> Result<Compilation> {
    Compilation::from_path(snapshot, config)
        .with_context(|| format!("Failed to load snapshot {:?}", snapshot))
}

/// Returns `Ok(false)` when warnings must fail the run
fn generate(
    snapshot: &Path,
    out: &Path,
    config_path: Option<&Path>,
    format: Format,
    dry_run: bool,
) -> Result<bool> {
    let config = load_config(snapshot, config_path)?;
    let compilation = load_compilation(snapshot, &config)?;
    let pipeline = Pipeline::new(&config);
    let mut diagnostics: Vec<Diagnostic> = Vec::new();

    let mut memory = MemorySink::new();
    let mut directory;
    let sink: &mut dyn EmissionSink = if dry_run {
        &mut memory
    } else {
        directory = DirectorySink::create(out)
            .with_context(|| format!("Failed to create output directory {:?}", out))?;
        &mut directory
    };
    let report = pipeline.run(&compilation, compilation.candidates(), sink, &mut diagnostics)?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report.to_json())?),
        Format::Text => print_report(&report, out, dry_run),
    }

    Ok(!(config.warnings_as_errors && report.has_warnings()))
}

fn print_report(report: &RunReport, out: &Path, dry_run: bool) {
    for diagnostic in &report.diagnostics {
        let label = match diagnostic.severity {
            Severity::Warning => "warning".yellow().bold(),
            Severity::Error => "error".red().bold(),
        };
        eprintln!(
            "{}: {} {}: {}",
            diagnostic.location, label, diagnostic.code, diagnostic.message
        );
    }

    let verb = if dry_run { "Would write" } else { "Wrote" };
    println!(
        "{} {} {} artifacts to {}",
        "✓".green(),
        verb,
        report.artifacts.len(),
        out.display()
    );
    for artifact in &report.artifacts {
        println!("  {} ({} bytes)", artifact.name.cyan(), artifact.bytes);
    }
    if report.has_warnings() {
        println!("  {} {} warning(s)", "!".yellow(), report.warning_count());
    }
}

fn check(snapshot: &Path, config_path: Option<&Path>) -> Result<bool> {
    let config = load_config(snapshot, config_path)?;
    let compilation = load_compilation(snapshot, &config)?;
    let well_known = WellKnownTypes::locate(&compilation, &config)?;
    let worklists = classify(compilation.candidates(), &compilation, &well_known);

    println!("{} Snapshot '{}' is valid", "✓".green(), snapshot.display());
    println!("  Types: {}", compilation.len());
    println!("  Candidates: {}", compilation.candidates().len());
    println!("  Instance roots: {}", worklists.instance.len());
    for target in &worklists.instance {
        println!("    {} {}", "→".cyan(), target.ty);
    }
    println!("  Static roots: {}", worklists.statics.len());
    for target in &worklists.statics {
        println!("    {} {}", "→".cyan(), target.ty);
    }

    Ok(true)
}
