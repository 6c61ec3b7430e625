use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use ts_ng_annotate::config::{resolve, AnnotateConfig};
use ts_ng_annotate::runner::{annotate_paths, check_fixtures, write_in_place};

#[derive(Parser)]
#[command(name = "ts-ng-annotate")]
#[command(about = "Add dependency-injection annotations to AngularJS sources", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./ng-annotate.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log recognized sites and skipped shapes
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate source files in place
    Annotate {
        /// Files to annotate
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Check fixtures against their annotated expectations
    Test {
        /// Fixture directory
        #[arg(default_value = "tests/fixtures")]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let cwd = env::current_dir().context("cannot determine working directory")?;
    let config = resolve(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Commands::Annotate {
            files,
            dry_run,
            diff,
        } => cmd_annotate(&config, &files, dry_run, diff),

        Commands::Test { dir } => cmd_test(&config, &dir),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Helper: Show unified diff between original and annotated content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!("\n{}", format!("--- {} (original)", file.display()).dimmed());
    println!("{}", format!("+++ {} (annotated)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn cmd_annotate(
    config: &AnnotateConfig,
    files: &[PathBuf],
    dry_run: bool,
    show_diff: bool,
) -> Result<()> {
    if dry_run {
        println!("{}", "[DRY RUN - no files will be written]".cyan());
    }

    let mut total_annotated = 0;
    let mut total_unchanged = 0;
    let mut total_failed = 0;

    for result in annotate_paths(files, config) {
        let annotated = match result {
            Ok(annotated) => annotated,
            Err(e) => {
                eprintln!("{} {}", "✗".red(), e);
                total_failed += 1;
                continue;
            }
        };

        if !annotated.changed() {
            println!("{} {}: Already annotated", "⊙".yellow(), annotated.path.display());
            total_unchanged += 1;
            continue;
        }

        if dry_run {
            println!(
                "{} {}: Would apply {} edits",
                "✓".green(),
                annotated.path.display(),
                annotated.edit_count
            );
        } else if let Err(e) = write_in_place(&annotated) {
            eprintln!("{} {}", "✗".red(), e);
            total_failed += 1;
            continue;
        } else {
            println!(
                "{} {}: Applied {} edits",
                "✓".green(),
                annotated.path.display(),
                annotated.edit_count
            );
        }
        total_annotated += 1;

        if show_diff {
            display_diff(&annotated.path, &annotated.original, &annotated.rewritten);
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} annotated", format!("{}", total_annotated).green());
    println!("  {} unchanged", format!("{}", total_unchanged).yellow());
    println!("  {} failed", format!("{}", total_failed).red());

    if total_failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_test(config: &AnnotateConfig, dir: &Path) -> Result<()> {
    let report = check_fixtures(dir, config)
        .with_context(|| format!("cannot read fixtures in {}", dir.display()))?;

    for mismatch in &report.mismatches {
        eprintln!("{} {}: MISMATCH", "✗".red(), mismatch.input.display());
        eprintln!("  Expected: {}", mismatch.expected.display());
        eprint!("{}", mismatch.patch);
    }
    for error in &report.errors {
        eprintln!("{} {}", "✗".red(), error);
    }

    println!("{}", "Summary:".bold());
    println!("  {} checked", format!("{}", report.checked).cyan());
    println!("  {} mismatch", format!("{}", report.mismatches.len()).red());
    println!("  {} errors", format!("{}", report.errors.len()).red());

    if !report.passed() {
        std::process::exit(1);
    }

    println!("{}", "All fixtures match".green());
    Ok(())
}
