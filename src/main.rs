//! scorm-report - SCORM package report generator

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use scorm_report::pipeline::{extract_pages, generate_report, load_manifest};
use scorm_report::{Error, OutputFormat, Package, ReportConfig, Result};

#[derive(Parser)]
#[command(name = "scorm-report")]
#[command(version, about = "Generate PDF or text reports from SCORM packages", long_about = None)]
#[command(after_help = "EXAMPLES:
    scorm-report course.zip                 Write <title>_<timestamp>.pdf here
    scorm-report course.zip -f text -o r.txt
    scorm-report course.zip --info          Show the manifest summary
    scorm-report course.zip --json          Dump extracted page records")]
struct Cli {
    /// SCORM package (.zip)
    #[arg(value_name = "PACKAGE")]
    package: PathBuf,

    /// Output file
    #[arg(short, long, value_name = "FILE", conflicts_with = "dir")]
    output: Option<PathBuf>,

    /// Directory for the generated file name
    #[arg(short, long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Output format: pdf or text
    #[arg(short, long, default_value = "pdf")]
    format: OutputFormat,

    /// TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Truncate raw file dumps to N characters
    #[arg(long, value_name = "N")]
    truncate: Option<usize>,

    /// Leave out the raw content appendix
    #[arg(long)]
    no_raw: bool,

    /// Show the manifest summary without generating a report
    #[arg(short, long, conflicts_with = "json")]
    info: bool,

    /// Print extracted page records as JSON
    #[arg(long)]
    json: bool,

    /// Log pipeline stages
    #[arg(short, long)]
    verbose: bool,

    /// Suppress output messages
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            if e.is_client_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };
    if let Some(limit) = cli.truncate {
        config = config.with_truncate_limit(limit);
    }
    if cli.no_raw {
        config = config.with_raw_content(false);
    }

    let package = Package::open(&cli.package)?;

    if cli.info {
        return show_info(&cli.package, &package);
    }
    if cli.json {
        return dump_json(&package, &config);
    }

    let report = generate_report(&package, &config)?;
    let bytes = report.render(cli.format, &config)?;

    let path = match (&cli.output, &cli.dir) {
        (Some(path), _) => path.clone(),
        (None, Some(dir)) => dir.join(report.filename(cli.format)),
        (None, None) => PathBuf::from(report.filename(cli.format)),
    };
    std::fs::write(&path, &bytes)?;

    if !cli.quiet {
        println!("Wrote {} ({} bytes)", path.display(), bytes.len());
        let unresolved = report.unresolved_images();
        if unresolved > 0 {
            println!("{unresolved} image(s) could not be resolved and were drawn as placeholders");
        }
    }
    Ok(())
}

fn show_info(path: &std::path::Path, package: &Package) -> Result<()> {
    let manifest = load_manifest(package)?;

    println!("File: {}", path.display());
    println!("Title: {}", manifest.title());
    println!("Identifier: {}", manifest.identifier);
    if !manifest.version.is_empty() {
        println!("Version: {}", manifest.version);
    }
    if !manifest.schema.is_empty() {
        println!("Schema: {} {}", manifest.schema, manifest.schema_version);
    }
    for org in &manifest.organizations {
        let marker = if org.identifier == manifest.default_organization {
            " (default)"
        } else {
            ""
        };
        println!(
            "Organization: {} [{}] {} items{marker}",
            org.title,
            org.identifier,
            org.item_count()
        );
    }
    println!("Resources: {}", manifest.resources.len());
    println!("Files: {}", package.len());
    println!("HTML pages: {}", package.html_files().count());

    Ok(())
}

fn dump_json(package: &Package, config: &ReportConfig) -> Result<()> {
    load_manifest(package)?;
    let rules = config.rules.compile()?;
    let pages = extract_pages(package, &rules);
    if pages.is_empty() {
        return Err(Error::NoContent);
    }
    let json = serde_json::to_string_pretty(&pages).map_err(|e| Error::Render(e.to_string()))?;
    println!("{json}");
    Ok(())
}
