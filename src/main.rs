use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

use csat_bro::cost::{rank_by_efficiency, validate_efficiency, CostCalculator};
use csat_bro::results::{
    audit_records, discover_models, load_results, load_token_usage, models_by_sheet,
    records_on_sheet,
};
use tracing_subscriber::EnvFilter;
use csat_bro::scoring::{validate_scoring, ScoreAggregator, SubjectFilter};

const EXIT_SUCCESS: i32 = 0;
const EXIT_DATA: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank models by composite score (default if no subcommand)
    Scores,
    /// Show the per-subject breakdown of one model
    Detail {
        /// Model name, or 1-based index as shown by `scores`
        target: String,
    },
    /// Rank models by cost efficiency (needs token usage)
    Cost,
    /// List subjects, maxima and accepted filter tokens
    Subjects,
    /// List models per sheet with their accuracy
    Models {
        /// Only list this sheet, e.g. "국어-화작" or "영어"
        #[arg(long)]
        sheet: Option<String>,
    },
    /// Check the result dataset for consistency problems
    Validate {
        /// Only check this sheet, e.g. "국어-화작" or "영어"
        #[arg(long)]
        sheet: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Tsv,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "csat-bro")]
#[command(about = "Rank LLMs on CSAT exam results by score and cost efficiency", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/csat-bro/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Result dataset (JSON array of result records)
    #[arg(short, long, global = true)]
    results: Option<PathBuf>,

    /// Token usage file (JSON object keyed by model)
    #[arg(short, long, global = true)]
    usage: Option<PathBuf>,

    /// Comma-separated subject filter, e.g. "국어-화작,수학"
    #[arg(short, long, global = true)]
    subjects: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Log filter: `RUST_LOG` directives when set, WARN otherwise.
/// `--verbose` sets the global level to DEBUG, keeping any per-target directives.
fn log_filter(verbose: bool, env_directives: Option<&str>) -> EnvFilter {
    let filter = match env_directives.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directives) => EnvFilter::builder().parse_lossy(directives),
        None => EnvFilter::new("warn"),
    };

    if verbose {
        filter.add_directive(tracing::Level::DEBUG.into())
    } else {
        filter
    }
}

fn init_logging(verbose: bool) {
    let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(verbose, env_directives.as_deref()))
        .init();
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize output: {}", e);
            std::process::exit(EXIT_DATA);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Scores);
    let start_time = Instant::now();

    // Load config
    let config_path = cli.config.map(PathBuf::from);
    let config = match csat_bro::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate scoring config at startup
    let hierarchy = config.hierarchy();
    let weights = config.efficiency();
    let mut errors = Vec::new();
    if let Err(e) = validate_scoring(&hierarchy) {
        errors.extend(e);
    }
    if let Err(e) = validate_efficiency(&weights) {
        errors.extend(e);
    }
    if !errors.is_empty() {
        eprintln!("Scoring config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let aggregator = ScoreAggregator::new(hierarchy);

    if let Commands::Subjects = command {
        println!("{}", csat_bro::output::format_subjects(aggregator.hierarchy()));
        std::process::exit(EXIT_SUCCESS);
    }

    // Load results
    let Some(results_path) = cli.results.or_else(|| config.results.clone()) else {
        eprintln!("No result dataset configured.");
        eprintln!("Pass --results <file> or add it to ~/.config/csat-bro/config.yaml:");
        eprintln!("  results: path/to/all_results.json");
        std::process::exit(EXIT_CONFIG);
    };

    let records = match load_results(&results_path, &config.model_aliases) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Data error: {:#}", e);
            std::process::exit(EXIT_DATA);
        }
    };

    let filter = match cli.subjects {
        Some(ref s) => SubjectFilter::parse_list(s),
        None => config.default_filter(),
    };

    let models = discover_models(&records);
    tracing::debug!(
        records = records.len(),
        models = models.len(),
        filter = %filter,
        "scoring results"
    );

    let scores = aggregator.all_model_scores(&records, &models, &filter);
    let max_score = aggregator.max_score_for(&filter);
    let use_colors = csat_bro::output::should_use_colors();

    match command {
        Commands::Scores => match cli.format {
            OutputFormat::Table => println!(
                "{}",
                csat_bro::output::format_score_table(&scores, max_score, use_colors)
            ),
            OutputFormat::Tsv => println!("{}", csat_bro::output::format_score_tsv(&scores)),
            OutputFormat::Json => print_json(&scores),
        },
        Commands::Detail { target } => {
            // Index into the ranked list (1-based), otherwise a model name
            let model = match target.parse::<usize>() {
                Ok(index) => {
                    if index < 1 || index > scores.len() {
                        eprintln!(
                            "Invalid index {}. Must be between 1 and {}.",
                            index,
                            scores.len()
                        );
                        std::process::exit(EXIT_CONFIG);
                    }
                    scores[index - 1].model.clone()
                }
                Err(_) => {
                    if !models.contains(&target) {
                        eprintln!("Unknown model '{}'.", target);
                        std::process::exit(EXIT_CONFIG);
                    }
                    target
                }
            };

            let detail = aggregator.score_for(&model, &records);
            match cli.format {
                OutputFormat::Json => print_json(&detail),
                _ => println!(
                    "{}",
                    csat_bro::output::format_detail(&detail, aggregator.hierarchy(), use_colors)
                ),
            }
        }
        Commands::Cost => {
            let Some(usage_path) = cli.usage.or_else(|| config.token_usage.clone()) else {
                eprintln!("No token usage file configured.");
                eprintln!("Pass --usage <file> or add `token_usage:` to the config file.");
                std::process::exit(EXIT_CONFIG);
            };

            let usage = match load_token_usage(&usage_path, &config.model_aliases) {
                Ok(u) => u,
                Err(e) => {
                    eprintln!("Data error: {:#}", e);
                    std::process::exit(EXIT_DATA);
                }
            };

            let calculator = CostCalculator::new(weights);
            let rows = rank_by_efficiency(calculator.cost_rows_for(
                &aggregator,
                &records,
                &scores,
                &usage,
                &config.price_overrides(),
                &filter,
            ));

            match cli.format {
                OutputFormat::Table => {
                    println!("{}", csat_bro::output::format_cost_table(&rows, use_colors))
                }
                OutputFormat::Tsv => println!("{}", csat_bro::output::format_cost_tsv(&rows)),
                OutputFormat::Json => print_json(&rows),
            }
        }
        Commands::Models { sheet } => {
            let groups = models_by_sheet(&records, sheet.as_deref());
            match cli.format {
                OutputFormat::Json => print_json(&groups),
                _ => println!("{}", csat_bro::output::format_models(&groups, use_colors)),
            }
        }
        Commands::Validate { sheet } => {
            let scoped;
            let checked = match sheet {
                Some(ref sheet) => {
                    scoped = records_on_sheet(&records, sheet);
                    if scoped.is_empty() {
                        eprintln!("No records for sheet '{}'.", sheet);
                        std::process::exit(EXIT_CONFIG);
                    }
                    &scoped[..]
                }
                None => &records[..],
            };

            let issues = audit_records(checked, aggregator.hierarchy());
            if issues.is_empty() {
                println!("No issues found in {} records.", checked.len());
            } else {
                for issue in &issues {
                    println!("{}", issue);
                }
                eprintln!("{} issues found.", issues.len());
                std::process::exit(EXIT_CONFIG);
            }
        }
        // Printed before the results were loaded
        Commands::Subjects => {}
    }

    tracing::debug!(elapsed = ?start_time.elapsed(), "done");
    std::process::exit(EXIT_SUCCESS);
}
