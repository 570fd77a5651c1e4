//! Command-line interface for ccure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::classify::HttpClassifier;
use crate::extract;
use crate::monitor::Monitor;
use crate::report;
use crate::scan::Scanner;
use crate::store::Store;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FINDINGS: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Environment variable consulted when --api-url is not given.
const API_URL_ENV: &str = "CCURE_API_URL";

/// C/C++ vulnerability analysis pipeline.
///
/// ccure extracts function definitions from C/C++ sources with tree-sitter,
/// sends each through an external classifier, persists the verdicts, and
/// tracks watched folders for cheap incremental re-scans.
#[derive(Parser)]
#[command(name = "ccure")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SQLite database path
    #[arg(long, default_value = "ccure.db", global = true)]
    pub db: PathBuf,

    /// Classifier service base URL (default: $CCURE_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a C/C++ file or folder
    #[command(visible_alias = "analyze")]
    Scan(ScanArgs),
    /// Extract functions without classifying them
    Extract(ExtractArgs),
    /// List past analyses
    History(FormatArgs),
    /// Show a stored analysis report
    Report(ReportArgs),
    /// Delete a stored analysis and its results
    Delete(IdArgs),
    /// Aggregate statistics across all analyses
    Dashboard(FormatArgs),
    /// Probe the classifier service
    Health,
    /// Manage watched projects
    #[command(subcommand)]
    Watch(WatchCommands),
}

#[derive(Subcommand)]
pub enum WatchCommands {
    /// Register a folder for change monitoring
    Register(RegisterArgs),
    /// List watched projects
    List(FormatArgs),
    /// Report changes since the last saved snapshot
    Check(ProjectArgs),
    /// Re-hash the folder and overwrite the stored snapshot
    Refresh(IdArgs),
    /// Stop watching a project
    Remove(IdArgs),
}

#[derive(Parser)]
pub struct ScanArgs {
    /// Path to analyze (file or directory)
    pub path: PathBuf,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

#[derive(Parser)]
pub struct ExtractArgs {
    /// Source file to extract from
    pub file: PathBuf,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

#[derive(Parser)]
pub struct FormatArgs {
    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

#[derive(Parser)]
pub struct ReportArgs {
    /// Analysis id
    pub id: i64,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

#[derive(Parser)]
pub struct IdArgs {
    /// Target id
    pub id: i64,
}

#[derive(Parser)]
pub struct ProjectArgs {
    /// Watched project id
    pub id: i64,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

#[derive(Parser)]
pub struct RegisterArgs {
    /// Folder to watch
    pub folder: PathBuf,
}

/// Dispatch a parsed command line.
pub fn run(cli: Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Scan(args) => run_scan(&cli, args),
        Commands::Extract(args) => run_extract(args),
        Commands::History(args) => run_history(&cli, args),
        Commands::Report(args) => run_report(&cli, args),
        Commands::Delete(args) => run_delete(&cli, args),
        Commands::Dashboard(args) => run_dashboard(&cli, args),
        Commands::Health => run_health(&cli),
        Commands::Watch(watch) => match watch {
            WatchCommands::Register(args) => run_watch_register(&cli, args),
            WatchCommands::List(args) => run_watch_list(&cli, args),
            WatchCommands::Check(args) => run_watch_check(&cli, args),
            WatchCommands::Refresh(args) => run_watch_refresh(&cli, args),
            WatchCommands::Remove(args) => run_watch_remove(&cli, args),
        },
    }
}

fn validate_format(format: &str) -> anyhow::Result<()> {
    if format != "pretty" && format != "json" {
        anyhow::bail!("invalid format {:?}, must be 'pretty' or 'json'", format);
    }
    Ok(())
}

fn resolve_api_url(cli: &Cli) -> anyhow::Result<String> {
    if let Some(url) = &cli.api_url {
        return Ok(url.clone());
    }
    std::env::var(API_URL_ENV).map_err(|_| {
        anyhow::anyhow!(
            "no classifier URL configured; pass --api-url or set {}",
            API_URL_ENV
        )
    })
}

fn open_store(cli: &Cli) -> anyhow::Result<Store> {
    Ok(Store::open(&cli.db)?)
}

fn run_scan(cli: &Cli, args: &ScanArgs) -> anyhow::Result<i32> {
    validate_format(&args.format)?;

    let store = open_store(cli)?;
    let classifier = HttpClassifier::new(&resolve_api_url(cli)?)?;
    let scanner = Scanner::new(&store, &classifier);

    let summary = if args.path.is_dir() {
        scanner.scan_folder(&args.path)?
    } else {
        scanner.scan_file(&args.path)?
    };

    match args.format.as_str() {
        "json" => report::write_scan_json(&summary)?,
        _ => report::write_scan_pretty(&summary),
    }

    if summary.vuln_count > 0 {
        Ok(EXIT_FINDINGS)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

fn run_extract(args: &ExtractArgs) -> anyhow::Result<i32> {
    validate_format(&args.format)?;

    if !args.file.exists() {
        anyhow::bail!("path not found: {}", args.file.display());
    }

    let extraction = extract::extract_file(&args.file);
    match args.format.as_str() {
        "json" => report::write_extraction_json(&extraction)?,
        _ => report::write_extraction_pretty(&extraction),
    }
    Ok(EXIT_SUCCESS)
}

fn run_history(cli: &Cli, args: &FormatArgs) -> anyhow::Result<i32> {
    validate_format(&args.format)?;

    let store = open_store(cli)?;
    let entries = store.get_all_analyses()?;
    match args.format.as_str() {
        "json" => report::write_history_json(&entries)?,
        _ => report::write_history_pretty(&entries),
    }
    Ok(EXIT_SUCCESS)
}

fn run_report(cli: &Cli, args: &ReportArgs) -> anyhow::Result<i32> {
    validate_format(&args.format)?;

    let store = open_store(cli)?;
    let stored = store.get_report(args.id)?;
    match args.format.as_str() {
        "json" => report::write_report_json(&stored)?,
        _ => report::write_report_pretty(&stored),
    }
    Ok(EXIT_SUCCESS)
}

fn run_delete(cli: &Cli, args: &IdArgs) -> anyhow::Result<i32> {
    let store = open_store(cli)?;
    if !store.delete_analysis(args.id)? {
        anyhow::bail!("no analysis found with id {}", args.id);
    }
    println!("Deleted analysis #{}", args.id);
    Ok(EXIT_SUCCESS)
}

fn run_dashboard(cli: &Cli, args: &FormatArgs) -> anyhow::Result<i32> {
    validate_format(&args.format)?;

    let store = open_store(cli)?;
    let stats = store.get_dashboard_stats()?;
    match args.format.as_str() {
        "json" => report::write_dashboard_json(&stats)?,
        _ => report::write_dashboard_pretty(&stats),
    }
    Ok(EXIT_SUCCESS)
}

fn run_health(cli: &Cli) -> anyhow::Result<i32> {
    let url = resolve_api_url(cli)?;
    let classifier = HttpClassifier::new(&url)?;

    if classifier.health() {
        println!("classifier at {} is reachable", classifier.base_url());
        Ok(EXIT_SUCCESS)
    } else {
        eprintln!("classifier at {} is not reachable", classifier.base_url());
        Ok(EXIT_FINDINGS)
    }
}

fn run_watch_register(cli: &Cli, args: &RegisterArgs) -> anyhow::Result<i32> {
    let store = open_store(cli)?;
    let monitor = Monitor::new(&store);

    let registered = monitor.register(&args.folder)?;
    println!(
        "Watching {} (#{}) - {} file(s) tracked",
        registered.name, registered.id, registered.files_tracked
    );
    Ok(EXIT_SUCCESS)
}

fn run_watch_list(cli: &Cli, args: &FormatArgs) -> anyhow::Result<i32> {
    validate_format(&args.format)?;

    let store = open_store(cli)?;
    let projects = Monitor::new(&store).list()?;
    match args.format.as_str() {
        "json" => report::write_watched_json(&projects)?,
        _ => report::write_watched_pretty(&projects),
    }
    Ok(EXIT_SUCCESS)
}

fn run_watch_check(cli: &Cli, args: &ProjectArgs) -> anyhow::Result<i32> {
    validate_format(&args.format)?;

    let store = open_store(cli)?;
    let change_report = Monitor::new(&store).check(args.id)?;

    match args.format.as_str() {
        "json" => report::write_change_report_json(&change_report)?,
        _ => report::write_change_report_pretty(&change_report),
    }

    if change_report.total_changes > 0 {
        Ok(EXIT_FINDINGS)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

fn run_watch_refresh(cli: &Cli, args: &IdArgs) -> anyhow::Result<i32> {
    let store = open_store(cli)?;
    let tracked = Monitor::new(&store).refresh(args.id)?;
    println!("Refreshed snapshot - {} file(s) tracked", tracked);
    Ok(EXIT_SUCCESS)
}

fn run_watch_remove(cli: &Cli, args: &IdArgs) -> anyhow::Result<i32> {
    let store = open_store(cli)?;
    Monitor::new(&store).unregister(args.id)?;
    println!("Stopped watching project #{}", args.id);
    Ok(EXIT_SUCCESS)
}
