//! Finnhub collector CLI.

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};

use fundlake_collector::modules::{self, CandleOptions, FetchRequest};
use fundlake_collector::{CollectorConfig, CollectorContext};
use fundlake_core::{init_logging, LogConfig, OutputFormat, Overrides, ParamValue};

#[derive(Parser)]
#[command(name = "fundlake")]
#[command(about = "Finnhub fundamentals collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Config file (default: config/fundlake.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or reuse today's investable universe
    Universe {
        /// Rebuild even if today's cache exists
        #[arg(long)]
        refresh: bool,
    },

    /// Fetch one endpoint for every ticker
    Fetch {
        /// Endpoint name, e.g. "financials"
        #[arg(long)]
        endpoint: String,

        /// Sub-endpoint parameter set, e.g. "bs_annual"
        #[arg(long)]
        sub_endpoint: Option<String>,

        /// Comma separated tickers (default: the universe)
        #[arg(long)]
        tickers: Option<String>,

        /// Query parameter override, key=value (repeatable)
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// API setting override, key=value (repeatable)
        #[arg(long = "setting", value_name = "KEY=VALUE")]
        settings: Vec<String>,

        /// Output format (csv, jsonl)
        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Fetch profile, statements, recommendations and estimates
    Fundamentals {
        /// Comma separated tickers (default: the universe)
        #[arg(long)]
        tickers: Option<String>,
    },

    /// Fetch recent candles
    Candles {
        /// Window start in days before today
        #[arg(long, default_value_t = 8)]
        days: u64,

        /// Candle resolution
        #[arg(long, default_value = "D")]
        resolution: String,

        /// Comma separated tickers (default: the universe)
        #[arg(long)]
        tickers: Option<String>,
    },
}

fn overrides(params: &[String], settings: &[String]) -> anyhow::Result<Overrides> {
    let mut overrides = Overrides::new();
    for (key, value) in Overrides::parse_pairs(params)? {
        overrides = overrides.param(key, ParamValue::parse(&value));
    }
    for (key, value) in Overrides::parse_pairs(settings)? {
        overrides = overrides.setting(key, value);
    }
    Ok(overrides)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = CollectorConfig::from_env(cli.config.as_deref()).context("loading configuration")?;

    let mut log_config = LogConfig::from_config(&config.app.logging);
    if let Some(level) = cli.log_level {
        log_config.level = level;
    }
    let _log_guard = init_logging(log_config).map_err(|e| anyhow!("logging setup failed: {}", e))?;

    tracing::info!("Fundlake collector starting");

    let ctx = CollectorContext::new(config).context("initializing collector")?;

    match cli.command {
        Commands::Universe { refresh } => {
            let universe = modules::sync_universe(&ctx, refresh).await?;
            tracing::info!(tickers = universe.len(), "Universe sync done");
        }
        Commands::Fetch {
            endpoint,
            sub_endpoint,
            tickers,
            params,
            settings,
            format,
        } => {
            let mut request = FetchRequest::new(endpoint)
                .overrides(overrides(&params, &settings)?)
                .format(format);
            if let Some(sub) = sub_endpoint {
                request = request.sub_endpoint(sub);
            }
            let tickers = modules::resolve_tickers(&ctx, tickers.as_deref()).await?;
            modules::fetch_endpoint(&ctx, &request, &tickers)
                .await
                .with_context(|| format!("fetching {}", request.endpoint))?;
        }
        Commands::Fundamentals { tickers } => {
            let tickers = modules::resolve_tickers(&ctx, tickers.as_deref()).await?;
            let stats = modules::collect_fundamentals(&ctx, &tickers).await?;
            stats.log_summary("fundamentals");
        }
        Commands::Candles {
            days,
            resolution,
            tickers,
        } => {
            let tickers = modules::resolve_tickers(&ctx, tickers.as_deref()).await?;
            let options = CandleOptions { days, resolution };
            modules::collect_candles(&ctx, &tickers, &options).await?;
        }
    }

    tracing::info!("Fundlake collector finished");
    Ok(())
}
