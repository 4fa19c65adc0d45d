//! CredRank command line
//!
//! Loads a JSON graph and a weight configuration, runs PageRank and prints
//! either a ranked table or one node's score breakdown. Logs go to stderr
//! so stdout carries only results.

mod report;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use credrank_common::{config::AppConfig, metrics::register_metrics, AppError, VERSION};
use credrank_core::attribution::{evaluator_from_config, run_pagerank, PagerankOptions, PagerankRun};
use credrank_core::Graph;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "credrank", version)]
#[command(about = "Rank the nodes of a contribution graph and explain their cred", long_about = None)]
struct Cli {
    /// Configuration file; defaults to config/ layering plus CREDRANK__ env vars
    #[arg(long, global = true, env = "CREDRANK_CONFIG")]
    config: Option<PathBuf>,

    /// Log every solver iteration
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print nodes sorted by score
    Rank {
        #[command(flatten)]
        input: GraphArgs,

        /// Only show nodes under this `/`-separated prefix
        #[arg(long, default_value = "")]
        prefix: String,

        /// Print the full decomposition as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the contributions behind one node's score
    Explain {
        #[command(flatten)]
        input: GraphArgs,

        /// `/`-separated node address
        node: String,
    },
}

#[derive(Args)]
struct GraphArgs {
    /// Graph JSON file
    graph: PathBuf,

    /// Maximum rows to print
    #[arg(long)]
    limit: Option<usize>,

    /// Override the solver's iteration budget
    #[arg(long)]
    max_iterations: Option<usize>,
}

fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "credrank failed");
            eprintln!("error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config);
    register_metrics();
    info!("Starting credrank v{}", VERSION);

    match cli.command {
        Commands::Rank { input, prefix, json } => {
            let (run, limit) = rank_graph(&config, &input, cli.verbose)?;
            let rows = report::ranked(&run.decomposition, &report::parse_address(&prefix), limit);
            if json {
                println!("{}", report::json_report(&rows)?);
            } else {
                print!("{}", report::render_ranking(&rows, config.report.log_score_offset));
            }
        }
        Commands::Explain { input, node } => {
            let (run, limit) = rank_graph(&config, &input, cli.verbose)?;
            let address = report::parse_address(&node);
            let decomposition = run
                .decomposition
                .get(&address)
                .ok_or_else(|| AppError::NodeNotFound {
                    address: address.to_string(),
                })?;
            print!(
                "{}",
                report::render_explanation(&address, decomposition, limit, config.report.log_score_offset)
            );
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => {
            let name = path.to_str().context("configuration path is not valid UTF-8")?;
            AppConfig::from_file(name)
                .map_err(AppError::from)
                .with_context(|| format!("loading configuration from {}", path.display()))?
        }
        None => AppConfig::load().map_err(AppError::from)?,
    };
    Ok(config)
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_graph(path: &Path) -> Result<Graph> {
    let text = std::fs::read_to_string(path)
        .map_err(AppError::from)
        .with_context(|| format!("reading graph {}", path.display()))?;
    let graph: Graph = serde_json::from_str(&text)
        .map_err(|err| AppError::InvalidFormat {
            message: err.to_string(),
        })
        .with_context(|| format!("parsing graph {}", path.display()))?;
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "Graph loaded"
    );
    Ok(graph)
}

fn rank_graph(config: &AppConfig, input: &GraphArgs, verbose: bool) -> Result<(PagerankRun, usize)> {
    let graph = load_graph(&input.graph)?;
    let evaluator = evaluator_from_config(&config.weights);

    let mut options = PagerankOptions::from(&config.pagerank);
    options.verbose |= verbose;
    if let Some(max_iterations) = input.max_iterations {
        options.max_iterations = max_iterations;
    }

    let run = run_pagerank(&graph, &evaluator, &options)?;
    Ok((run, input.limit.unwrap_or(config.report.limit)))
}

/// Exit code of the first `AppError` in the cause chain, 1 otherwise
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<AppError>())
        .map(|app| app.exit_code())
        .and_then(|code| u8::try_from(code).ok())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_rank() {
        let cli = Cli::try_parse_from([
            "credrank", "rank", "graph.json", "--prefix", "git/commit", "--limit", "5", "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Rank { input, prefix, json } => {
                assert_eq!(input.graph, PathBuf::from("graph.json"));
                assert_eq!(input.limit, Some(5));
                assert_eq!(prefix, "git/commit");
                assert!(json);
            }
            Commands::Explain { .. } => panic!("expected rank"),
        }
    }

    #[test]
    fn test_cli_parses_explain() {
        let cli = Cli::try_parse_from([
            "credrank", "explain", "graph.json", "git/commit/abc", "--max-iterations", "10", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Explain { input, node } => {
                assert_eq!(node, "git/commit/abc");
                assert_eq!(input.max_iterations, Some(10));
            }
            Commands::Rank { .. } => panic!("expected explain"),
        }
    }

    #[test]
    fn test_exit_code_from_app_error() {
        let err = anyhow::Error::from(AppError::EmptyGraph).context("ranking graph");
        assert_eq!(exit_code(&err), 2);

        let err = anyhow::Error::from(AppError::invariant("broken index"));
        assert_eq!(exit_code(&err), 70);

        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_code(&err), 1);
    }

    #[test]
    fn test_malformed_graph_is_input_error() {
        let path = std::env::temp_dir().join(format!("credrank-missing-endpoint-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"nodes": [["a"]], "edges": [{"address": ["e"], "src": ["a"], "dst": ["b"]}]}"#,
        )
        .unwrap();
        let err = load_graph(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(exit_code(&err), 2);
    }
}
