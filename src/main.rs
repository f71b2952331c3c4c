use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use covexport::cli;
use covexport::export::ExportOptions;
use covexport::ingest;

/// covexport: aggregate computed coverage into a single JSON report.
#[derive(Parser)]
#[command(name = "covexport", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export coverage as a JSON document.
    Export {
        /// Coverage input (JSON model or LCOV tracefile).
        input: PathBuf,

        /// Override format detection (model, lcov).
        #[arg(long)]
        format: Option<String>,

        /// Export only summary information for each file and the totals.
        #[arg(long)]
        summary_only: bool,

        /// Don't export expansion data.
        #[arg(long)]
        skip_expansions: bool,

        /// Don't export per-function data.
        #[arg(long)]
        skip_functions: bool,

        /// Worker threads for rendering (0 = one per core, capped at the file count).
        #[arg(short = 'j', long, default_value_t = 0)]
        num_threads: usize,

        /// Read export options from a JSON file; flags given here are applied on top.
        #[arg(long)]
        options: Option<PathBuf>,

        /// Skip source files whose names match this regex (repeatable).
        #[arg(long)]
        ignore_filename_regex: Vec<String>,

        /// Write the document here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON.
        #[arg(long)]
        pretty: bool,
    },

    /// Show whole-program coverage totals.
    Summary {
        /// Coverage input (JSON model or LCOV tracefile).
        input: PathBuf,

        /// Override format detection (model, lcov).
        #[arg(long)]
        format: Option<String>,

        /// Skip source files whose names match this regex (repeatable).
        #[arg(long)]
        ignore_filename_regex: Vec<String>,
    },

    /// List per-file coverage.
    Files {
        /// Coverage input (JSON model or LCOV tracefile).
        input: PathBuf,

        /// Override format detection (model, lcov).
        #[arg(long)]
        format: Option<String>,

        /// Skip source files whose names match this regex (repeatable).
        #[arg(long)]
        ignore_filename_regex: Vec<String>,

        /// Sort by line coverage ascending (show worst files first).
        #[arg(long)]
        sort_by_coverage: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            input,
            format,
            summary_only,
            skip_expansions,
            skip_functions,
            num_threads,
            options: options_path,
            ignore_filename_regex,
            output,
            pretty,
        } => {
            let mut options = match options_path {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    ExportOptions::from_json(&raw)?
                }
                None => ExportOptions::default(),
            };
            options.summary_only |= summary_only;
            options.skip_expansions |= skip_expansions;
            options.skip_functions |= skip_functions;
            if num_threads != 0 {
                options.num_threads = num_threads;
            }

            let (model, _) = ingest::load(&input, format.as_deref())
                .with_context(|| format!("Failed to load {}", input.display()))?;
            let json = cli::cmd_export(&model, &ignore_filename_regex, &options, pretty)?;
            match output {
                Some(path) => std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => std::io::stdout()
                    .lock()
                    .write_all(json.as_bytes())
                    .context("Failed to write to stdout")?,
            }
            Ok(())
        }
        Commands::Summary {
            input,
            format,
            ignore_filename_regex,
        } => {
            let (model, _) = ingest::load(&input, format.as_deref())
                .with_context(|| format!("Failed to load {}", input.display()))?;
            print!("{}", cli::cmd_summary(&model, &ignore_filename_regex)?);
            Ok(())
        }
        Commands::Files {
            input,
            format,
            ignore_filename_regex,
            sort_by_coverage,
        } => {
            let (model, _) = ingest::load(&input, format.as_deref())
                .with_context(|| format!("Failed to load {}", input.display()))?;
            print!(
                "{}",
                cli::cmd_files(&model, &ignore_filename_regex, sort_by_coverage)?
            );
            Ok(())
        }
    }
}
