//! portfolio-var CLI - Value-at-Risk for a basket of holdings.
//!
//! Responses are JSON on stdout; logs go to stderr (adjust with `RUST_LOG`).

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Days, Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use portfolio_var::config::{Config, ProviderSource};
use portfolio_var::provider::provider_from_config;
use portfolio_var::{ApiResponse, SharedPortfolio, VarMethod, VarParams};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "portfolio-var")]
#[command(about = "Portfolio Value-at-Risk - historical, parametric and Monte Carlo")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Holding as IDENTIFIER=QUANTITY (repeatable; duplicates are summed)
    #[arg(short = 'H', long = "holding", value_parser = parse_holding, global = true)]
    holdings: Vec<(String, f64)>,
    /// First day of the price window (YYYY-MM-DD); one year before --end by default
    #[arg(long, global = true)]
    start: Option<NaiveDate>,
    /// Last day of the price window (YYYY-MM-DD); today by default
    #[arg(long, global = true)]
    end: Option<NaiveDate>,
    /// Price source, overrides the config file
    #[arg(long, value_enum, global = true)]
    source: Option<SourceArg>,
    /// Directory of <IDENTIFIER>.csv price files (implies --source csv)
    #[arg(long, global = true)]
    csv_dir: Option<PathBuf>,
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the portfolio value history
    Value,
    /// Print the joint return table
    Returns,
    /// Show each holding and the outcome of its price fetch
    Holdings,
    /// Calculate Value-at-Risk
    Var {
        /// Estimator to run
        #[arg(value_enum)]
        method: MethodArg,
        /// Confidence level (0.95 = 95%)
        #[arg(short, long)]
        confidence: Option<f64>,
        /// Horizon in days
        #[arg(short = 't', long)]
        horizon: Option<f64>,
        /// Monte Carlo scenario count
        #[arg(short = 'n', long)]
        simulations: Option<usize>,
        /// Monte Carlo seed
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    Historical,
    Parametric,
    MonteCarlo,
    All,
}

impl MethodArg {
    fn methods(self) -> Vec<VarMethod> {
        match self {
            MethodArg::Historical => vec![VarMethod::Historical],
            MethodArg::Parametric => vec![VarMethod::Parametric],
            MethodArg::MonteCarlo => vec![VarMethod::MonteCarlo],
            MethodArg::All => VarMethod::ALL.to_vec(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Yahoo,
    Csv,
}

impl GlobalArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(source) = self.source {
            config.provider.source = match source {
                SourceArg::Yahoo => ProviderSource::Yahoo,
                SourceArg::Csv => ProviderSource::Csv,
            };
        }
        if let Some(dir) = &self.csv_dir {
            config.provider.csv_dir = Some(dir.clone());
            if self.source.is_none() {
                config.provider.source = ProviderSource::Csv;
            }
        }
    }

    fn window(&self) -> Result<(NaiveDate, NaiveDate)> {
        let end = self.end.unwrap_or_else(|| Local::now().date_naive());
        let start = match self.start {
            Some(start) => start,
            None => end
                .checked_sub_days(Days::new(365))
                .ok_or_else(|| anyhow!("cannot derive a start date from {}", end))?,
        };
        if start > end {
            bail!("start date {} is after end date {}", start, end);
        }
        Ok((start, end))
    }
}

fn parse_holding(raw: &str) -> std::result::Result<(String, f64), String> {
    let (identifier, quantity) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected IDENTIFIER=QUANTITY, got {:?}", raw))?;
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(format!("missing identifier in {:?}", raw));
    }
    let quantity: f64 = quantity
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity in {:?}", raw))?;
    Ok((identifier.to_string(), quantity))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let output = match run(cli).await {
        Ok(data) => render(&ApiResponse::ok(data)),
        Err(e) => render(&ApiResponse::<()>::err(format!("{:#}", e))),
    };

    println!("{}", output);
}

fn render<T: Serialize>(response: &ApiResponse<T>) -> String {
    serde_json::to_string_pretty(response)
        .unwrap_or_else(|e| json!({ "ok": false, "error": e.to_string() }).to_string())
}

async fn run(cli: Cli) -> Result<Value> {
    let config_path = cli.global.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_from_path(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    cli.global.apply(&mut config);

    match cli.command {
        Commands::Config { action } => handle_config(action, &config, &config_path),
        Commands::Value => {
            let portfolio = load_portfolio(&cli.global, &config).await?;
            Ok(json!({ "value_history": portfolio.value_history() }))
        }
        Commands::Returns => {
            let portfolio = load_portfolio(&cli.global, &config).await?;
            Ok(json!({ "returns": portfolio.returns() }))
        }
        Commands::Holdings => {
            let portfolio = load_portfolio(&cli.global, &config).await?;
            let holdings = portfolio.with(|p| {
                p.instruments()
                    .map(|i| {
                        json!({
                            "identifier": i.identifier(),
                            "kind": i.kind(),
                            "quantity": i.quantity(),
                            "points": i.prices().len(),
                            "last_price": i.last_price(),
                            "fetch": i.fetch_status(),
                        })
                    })
                    .collect::<Vec<_>>()
            });
            Ok(json!({ "holdings": holdings }))
        }
        Commands::Var {
            method,
            confidence,
            horizon,
            simulations,
            seed,
        } => {
            let mut params = config.risk.params();
            if let Some(confidence) = confidence {
                params.confidence = confidence;
            }
            if let Some(horizon) = horizon {
                params.time_horizon = horizon;
            }
            if let Some(simulations) = simulations {
                params.num_simulations = simulations;
            }
            let seed = seed.or(config.risk.seed);

            let portfolio = load_portfolio(&cli.global, &config).await?;
            handle_var(&portfolio, method, &params, seed)
        }
    }
}

/// Build the portfolio from `--holding` args and fetch prices off the async runtime.
async fn load_portfolio(global: &GlobalArgs, config: &Config) -> Result<SharedPortfolio> {
    if global.holdings.is_empty() {
        bail!("no holdings given; pass --holding IDENTIFIER=QUANTITY");
    }
    let (start, end) = global.window()?;
    let provider = provider_from_config(&config.provider)?;

    let portfolio = SharedPortfolio::default();
    for (identifier, quantity) in &global.holdings {
        portfolio.add_instrument(identifier, *quantity);
    }

    let worker = portfolio.clone();
    tokio::task::spawn_blocking(move || worker.fetch_all(provider.as_ref(), start, end))
        .await
        .context("price fetch worker failed")?;

    Ok(portfolio)
}

fn handle_var(
    portfolio: &SharedPortfolio,
    method: MethodArg,
    params: &VarParams,
    seed: Option<u64>,
) -> Result<Value> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let reports = method
        .methods()
        .into_iter()
        .map(|m| portfolio.var_report(m, params, &mut rng))
        .collect::<portfolio_var::Result<Vec<_>>>()?;

    Ok(json!({
        "reports": reports,
        "seed": seed,
    }))
}

fn handle_config(action: ConfigAction, config: &Config, path: &Path) -> Result<Value> {
    match action {
        ConfigAction::Show => Ok(json!({
            "path": path,
            "exists": path.exists(),
            "config": config,
        })),
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                bail!("{} already exists; pass --force to overwrite", path.display());
            }
            Config::default().save_to_path(path)?;
            Ok(json!({
                "path": path,
                "written": true,
            }))
        }
    }
}
