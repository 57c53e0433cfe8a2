use anyhow::Context;
use clap::Parser;
use livechart::api::{BinanceClient, PriceFeed, SyntheticFeed, SyntheticScenario};
use livechart::chart::{ChartController, ChartSession, SystemClock};
use livechart::config::ChartConfig;
use livechart::render::LogRenderer;
use std::path::PathBuf;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

/// Live scrolling price chart with a rolling one-minute reference window
#[derive(Parser, Debug)]
#[command(name = "livechart", version)]
struct Args {
    /// TOML config file layered over the built-in defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Symbol to chart, e.g. BTCUSDT
    #[arg(long)]
    symbol: Option<String>,

    /// Tick every 250ms instead of every second
    #[arg(long)]
    smooth: bool,

    /// Use an offline random-walk feed instead of Binance
    #[arg(long)]
    simulate: bool,

    /// RNG seed for --simulate
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long)]
    run_for: Option<u64>,

    /// Log every tick
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let mut config =
        ChartConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(symbol) = &args.symbol {
        config.symbol = symbol.to_uppercase();
    }
    if args.smooth {
        config = config.smooth();
    }
    config.validate()?;

    tracing::info!("📈 livechart starting");
    tracing::info!("  Symbol: {}", config.symbol);
    tracing::info!("  Tick: {}ms", config.interval_ms.as_millis());
    tracing::info!(
        "  Window: {}s, lead {}s, {} points",
        config.window_duration_ms / 1000,
        config.axis_lead_ms / 1000,
        config.max_points
    );

    let renderer = LogRenderer::new(config.symbol.clone(), config.theme.clone());

    if args.simulate {
        tracing::info!("  Feed: synthetic (seed {})", args.seed);
        let feed = SyntheticFeed::new(args.seed, SyntheticScenario::Flaky(20));
        run_chart(feed, renderer, config, args.run_for).await
    } else {
        tracing::info!("  Feed: {}", config.api.base_url);
        let feed = BinanceClient::new(&config.api).context("Failed to build HTTP client")?;
        run_chart(feed, renderer, config, args.run_for).await
    }
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        "livechart=debug"
    } else {
        "livechart=info"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_chart<F: PriceFeed + 'static>(
    feed: F,
    renderer: LogRenderer,
    config: ChartConfig,
    run_for: Option<u64>,
) -> anyhow::Result<()> {
    let controller = ChartController::new(feed, renderer, SystemClock, config);
    let mut session = ChartSession::new(controller);

    let seeded = session
        .start()
        .await
        .context("Failed to seed chart from history")?;
    tracing::info!("✅ Seeded {} points, session {}", seeded, session.id());

    let handle = session.spawn(CancellationToken::new());

    match run_for {
        Some(secs) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("⚠️  Received Ctrl+C, shutting down...");
                }
                _ = sleep(Duration::from_secs(secs)) => {
                    tracing::info!("Run time of {}s elapsed", secs);
                }
            }
        }
        None => {
            tracing::info!("Press Ctrl+C to stop...");
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl+C")?;
            tracing::info!("⚠️  Received Ctrl+C, shutting down...");
        }
    }

    let controller = handle.stop().await.context("Chart session task failed")?;
    tracing::info!(
        "👋 Stopped after {} ticks, last price {}",
        controller.ticks(),
        controller
            .last_price()
            .map(|p| format!("{:.2}", p))
            .unwrap_or_else(|| "n/a".to_string())
    );

    Ok(())
}
