//! CLI tool for auditing legacy API usage across a source tree

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use legacy_api_audit::{
    aggregate, read_inventory_csv, AuditConfig, DependencyCoordinate, DependencyInventory,
    FindingsLog, LegacyResolver, ResolveReport, ScanOutputs, FINDINGS_FILE,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "legacy-audit")]
#[command(about = "Inventory JVM dependencies in a source tree and flag artifacts using legacy javax APIs", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to custom configuration file (TOML)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Directory to skip, relative to the scanned root (can be specified multiple times)
    #[arg(long = "exclude-dir", global = true)]
    exclude_dirs: Vec<String>,

    /// Dependency group to leave out of the inventory (can be specified multiple times)
    #[arg(long = "exclude-group", global = true)]
    exclude_groups: Vec<String>,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the dependency inventory of a source tree
    Scan {
        /// Root of the source tree
        root: PathBuf,

        /// Directory receiving full.csv, duplicated.csv and logs.log
        #[arg(short = 'o', long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Check the artifacts listed in an inventory file for legacy APIs
    Resolve {
        /// Inventory file with `group,artifact,version,kind,path` lines
        #[arg(short = 'i', long)]
        inventory: PathBuf,

        /// Project checkout whose Gradle cache is searched first
        #[arg(short = 'p', long, default_value = ".")]
        project_root: PathBuf,

        /// Findings file (default: legacy.log)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scan a source tree, then check every dependency found
    Audit {
        /// Root of the source tree
        root: PathBuf,

        /// Directory receiving the inventory files and legacy.log
        #[arg(short = 'o', long, default_value = ".")]
        output_dir: PathBuf,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Load configuration
    let base = if let Some(config_path) = &cli.config {
        match AuditConfig::from_toml_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{} Failed to load config: {}", "Error:".red().bold(), e);
                process::exit(1);
            }
        }
    } else {
        AuditConfig::default()
    };

    // Add exclusions from CLI
    let config = cli
        .exclude_dirs
        .iter()
        .fold(AuditConfig::builder().base(base), |builder, dir| {
            builder.exclude_dir(dir.clone())
        });
    let config = cli
        .exclude_groups
        .iter()
        .fold(config, |builder, group| builder.exclude_group(group.clone()))
        .build();

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn run(command: Commands, config: &AuditConfig) -> anyhow::Result<()> {
    match command {
        Commands::Scan { root, output_dir } => {
            let inventory = scan(&root, &output_dir, config)?;
            display_inventory_summary(&inventory);
        }

        Commands::Resolve {
            inventory,
            project_root,
            output,
            json,
        } => {
            let coordinates = read_inventory_csv(&inventory)
                .with_context(|| format!("cannot read inventory {}", inventory.display()))?;
            let output = output.unwrap_or_else(|| PathBuf::from(FINDINGS_FILE));

            let report = resolve(coordinates, &project_root, &output, config).await?;
            display_report(&report, &output, json)?;
        }

        Commands::Audit {
            root,
            output_dir,
            json,
        } => {
            let inventory = scan(&root, &output_dir, config)?;
            if !json {
                display_inventory_summary(&inventory);
            }

            let output = output_dir.join(FINDINGS_FILE);
            let report = resolve(inventory.coordinates(), &root, &output, config).await?;
            display_report(&report, &output, json)?;
        }
    }

    Ok(())
}

fn scan(root: &Path, output_dir: &Path, config: &AuditConfig) -> anyhow::Result<DependencyInventory> {
    let aggregation = aggregate(root, config)?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("cannot create {}", output_dir.display()))?;
    let outputs = ScanOutputs::in_dir(output_dir);
    outputs
        .write(&aggregation.inventory, &aggregation.diagnostics)
        .with_context(|| format!("cannot write scan results to {}", output_dir.display()))?;

    Ok(aggregation.inventory)
}

async fn resolve(
    coordinates: Vec<DependencyCoordinate>,
    project_root: &Path,
    output: &Path,
    config: &AuditConfig,
) -> anyhow::Result<ResolveReport> {
    let resolver = LegacyResolver::from_config(config, project_root)?;
    let mut findings = FindingsLog::create(output)
        .with_context(|| format!("cannot open findings file {}", output.display()))?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message(format!("Checking {} dependencies...", coordinates.len()));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = resolver.resolve(coordinates, &mut findings).await;

    spinner.finish_and_clear();

    Ok(result?)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn display_inventory_summary(inventory: &DependencyInventory) {
    let duplicated: BTreeSet<(&str, &str)> = inventory
        .duplicated_rows()
        .map(|row| (row.group, row.artifact))
        .collect();

    println!("\n{}", "=== Inventory Summary ===".bold());
    println!("Groups: {}", inventory.groups().len());
    println!("Coordinates: {}", inventory.len());
    println!(
        "Declaring sites: {}",
        inventory.rows().count()
    );
    if duplicated.is_empty() {
        println!("Duplicated artifacts: {}", "0".green());
    } else {
        println!(
            "Duplicated artifacts: {}",
            duplicated.len().to_string().yellow()
        );
    }
}

fn display_report(report: &ResolveReport, output: &Path, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let summary = &report.summary;

    println!("\n{}", "=== Legacy API Summary ===".bold());
    println!("Dependencies checked: {}", summary.checked);
    println!("  {} {}", "●".red(), format!("Using legacy APIs: {}", summary.flagged).red());
    println!("  {} {}", "●".green(), format!("Clean: {}", summary.clean).green());
    println!(
        "  {} {}",
        "●".yellow(),
        format!("Not inspectable: {}", summary.not_inspectable).yellow()
    );
    println!("  {} Unresolved: {}", "●".dimmed(), summary.unresolved);
    println!("  {} Host artifacts skipped: {}", "●".dimmed(), summary.skipped_host);

    for finding in &report.findings {
        println!("\n{}", finding.coordinate.to_string().bold());
        for reference in finding.legacy_references().unwrap_or_default() {
            println!("    - {}", reference.yellow());
        }
    }

    println!("\nFindings written to: {}", output.display().to_string().cyan());
    Ok(())
}
