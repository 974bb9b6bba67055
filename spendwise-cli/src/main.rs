use anyhow::Result;
use clap::{Parser, Subcommand};
use spendwise_core::summarize;
use spendwise_finance::{
    categorize, categorize_all, categorize_with_llm, export_categorized_csv, OpenAiClient,
};
use spendwise_ingest::load_transactions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

mod config;
mod report;
mod state;

use config::{Effective, API_KEY_VAR};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SPENDWISE_BUILD_SHA"), ")");
const PREVIEW_ROWS: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "spendwise", version = VERSION, about = "Categorize and summarize spending from a transaction CSV")]
struct Cli {
    /// Logging verbosity: off, error, warn, info, debug, trace. RUST_LOG overrides this.
    #[arg(long, global = true, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load, categorize (rules, then LLM for leftovers), summarize and export
    Run {
        /// Transaction CSV with `description` and `amount` columns
        /// (default from config, else data/transactions.csv)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Where to write the categorized CSV
        /// (default from config, else data/categorized_transactions.csv)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Skip the LLM refinement step even if an API key is set
        #[arg(long)]
        no_llm: bool,
    },

    /// Print the keyword-rule category for each description
    Categorize {
        #[arg(required = true)]
        descriptions: Vec<String>,
    },

    /// Manage ~/.spendwise/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config file if none exists
    Init,
    /// Print the effective configuration (file + environment)
    Show,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.log_level);
    debug!("Log level set to {}", cli.log_level.to_string().to_lowercase());

    match main_inner(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn main_inner(cli: Cli) -> Result<()> {
    trace!("{cli:?}");
    match cli.command {
        Command::Run {
            input,
            output,
            no_llm,
        } => {
            let eff = config::load_effective()?;
            let input = input.unwrap_or_else(|| eff.config.paths.input.clone());
            let output = output.unwrap_or_else(|| eff.config.paths.output.clone());
            run_pipeline(&eff, &input, &output, no_llm);
        }

        Command::Categorize { descriptions } => {
            for d in &descriptions {
                println!("{}\t{}", categorize(d), d);
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let eff = config::load_effective()?;
                match config::config_path() {
                    Ok(p) => println!("config file: {}", p.display()),
                    Err(_) => println!("config file: (HOME not set)"),
                }
                println!("api key:     {}", eff.masked_key());
                println!("base url:    {}", eff.config.llm.base_url);
                println!("model:       {}", eff.config.llm.model);
                println!("temperature: {}", eff.config.llm.temperature);
                println!("input:       {}", eff.config.paths.input.display());
                println!("output:      {}", eff.config.paths.output.display());
            }
        },
    }
    Ok(())
}

/// Every stage logs its own failure and the run carries on where it can.
fn run_pipeline(eff: &Effective, input: &Path, output: &Path, no_llm: bool) {
    println!(
        "# Spending report ({})\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M")
    );

    info!("Loading transactions from {}", input.display());
    let mut table = load_transactions(input);
    if table.is_empty() {
        println!("No transactions found. Exiting.");
        return;
    }

    info!("Performing initial categorization");
    categorize_all(&mut table);
    println!("## Rule-based categories\n");
    println!("{}", report::render_preview(&table, PREVIEW_ROWS));

    if no_llm {
        info!("Skipping LLM step (--no-llm)");
    } else {
        match eff.llm_settings() {
            Some(settings) => {
                info!("Refining 'Other' transactions using {}", settings.model);
                let client = OpenAiClient::new(settings);
                let outcome = categorize_with_llm(&mut table, &client);
                debug!("LLM outcome: {outcome:?}");
            }
            None => warn!("Skipping LLM step: {API_KEY_VAR} is not set"),
        }
    }

    match summarize(&table) {
        Some(summary) => {
            println!("## Spending summary by category\n");
            println!("{}", report::render_summary_table(&summary));
            println!("## Spending by category\n");
            println!("{}", report::render_bar_chart(&summary));
            println!("{}", report::render_overall(&summary));
        }
        None => warn!("Analysis step skipped: nothing to summarize"),
    }

    match export_categorized_csv(&table, output) {
        Ok(Some(path)) => println!("Exported categorized data to: {}", path.display()),
        Ok(None) => {}
        Err(e) => warn!("Export failed: {e:#}"),
    }
}

/// Initializes the tracing subscriber.
fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(
            [
                env!("CARGO_CRATE_NAME"),
                "spendwise_core",
                "spendwise_ingest",
                "spendwise_finance",
            ]
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(","),
        ),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
