use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use tabclean::cleaner::{DEFAULT_COLUMN_NULL_THRESHOLD, DEFAULT_ROW_FILL_RATIO};
use tabclean::logging::{init_logging, LoggingConfig};
use tabclean::report::{print_report, render_preview};
use tabclean::{clean_directory, clean_file, BatchOptions, CleanOptions, FileOptions};

#[derive(Parser)]
#[command(name = "tabclean")]
#[command(author, version, about = "Automatic cleaner for CSV and Excel data files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Thresholds {
    /// Drop columns whose share of missing values is above this ratio
    #[arg(long, default_value_t = DEFAULT_COLUMN_NULL_THRESHOLD)]
    column_null_threshold: f64,

    /// Keep rows with at least this share of non-missing cells
    #[arg(long, default_value_t = DEFAULT_ROW_FILL_RATIO)]
    row_fill_ratio: f64,
}

impl From<Thresholds> for CleanOptions {
    fn from(t: Thresholds) -> Self {
        CleanOptions {
            column_null_threshold: t.column_null_threshold,
            row_fill_ratio: t.row_fill_ratio,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a CSV or Excel file
    Clean {
        /// Path to the input file (.csv or .xlsx)
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the cleaned CSV (defaults to <input>_cleaned.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the report as JSON to this path
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,

        /// Print the first N cleaned rows
        #[arg(long, value_name = "N")]
        preview: Option<usize>,

        #[command(flatten)]
        thresholds: Thresholds,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Clean every matching file in a directory
    Batch {
        /// Directory to search recursively
        #[arg(short, long)]
        dir: PathBuf,

        /// Glob matched against file names
        #[arg(short, long, default_value = tabclean::batch::DEFAULT_PATTERN)]
        pattern: String,

        /// Directory for cleaned files (defaults to next to each input)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Write a JSON report next to each cleaned file
        #[arg(long)]
        reports: bool,

        #[command(flatten)]
        thresholds: Thresholds,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the shape and column types of a file without cleaning it
    Inspect {
        /// Path to the input file (.csv or .xlsx)
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn logging_config(verbose: bool) -> LoggingConfig {
    if verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Clean {
            input,
            output,
            report,
            json,
            preview,
            thresholds,
            verbose,
        } => {
            init_logging(logging_config(verbose));

            let options = FileOptions {
                input_path: input,
                output_path: output,
                report_path: report,
                clean: thresholds.into(),
            };
            let outcome = clean_file(&options)?;

            if json {
                println!("{}", outcome.report.to_json()?);
            } else {
                print_report(&outcome.report);
                println!("Cleaned data written to {}", outcome.output_path.display());
            }

            if let Some(limit) = preview {
                println!();
                print!("{}", render_preview(&outcome.table, limit));
            }
        }
        Commands::Batch {
            dir,
            pattern,
            output_dir,
            reports,
            thresholds,
            verbose,
        } => {
            init_logging(logging_config(verbose));

            let options = BatchOptions {
                input_dir: dir,
                pattern,
                output_dir,
                write_reports: reports,
                clean: thresholds.into(),
            };
            let summary = clean_directory(&options)?;

            for outcome in &summary.outcomes {
                match &outcome.result {
                    Ok(path) => println!("OK   {} -> {}", outcome.input.display(), path.display()),
                    Err(e) => println!("FAIL {}: {}", outcome.input.display(), e),
                }
            }
            let failed = summary.failed().len();
            println!(
                "Cleaned {} file(s), {} failed",
                summary.succeeded(),
                failed
            );
            if failed > 0 {
                anyhow::bail!("{} file(s) could not be cleaned", failed);
            }
        }
        Commands::Inspect { input } => {
            init_logging(LoggingConfig::default());

            let loaded = tabclean::loader::load_path(&input)?;
            println!(
                "{}: {} rows x {} columns",
                input.display(),
                loaded.table.num_rows(),
                loaded.table.num_columns()
            );
            for column in tabclean::inspect(&loaded.table) {
                println!(
                    "  {:<24} {:<16} nulls={:<6} unique={}",
                    column.name, column.dtype, column.null_count, column.unique_count
                );
            }
        }
    }

    Ok(())
}
