use clap::{Parser, ValueEnum};
use livechart::api::{SyntheticFeed, SyntheticScenario};
use livechart::chart::{ChartController, Clock, ManualClock, WindowTransition};
use livechart::config::ChartConfig;
use livechart::models::{Direction, PriceSource};
use livechart::render::RecordingRenderer;
use livechart::Result;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
    Calm,
    Trending,
    Volatile,
    Flaky,
}

impl From<Scenario> for SyntheticScenario {
    fn from(scenario: Scenario) -> Self {
        match scenario {
            Scenario::Calm => SyntheticScenario::Calm,
            Scenario::Trending => SyntheticScenario::Trending,
            Scenario::Volatile => SyntheticScenario::Volatile,
            Scenario::Flaky => SyntheticScenario::Flaky(5),
        }
    }
}

/// Replay a synthetic session on a simulated clock and summarize it
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, value_enum, default_value_t = Scenario::Volatile)]
    scenario: Scenario,

    #[arg(long, default_value_t = 180)]
    ticks: u32,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long)]
    smooth: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("livechart=warn")
        .init();

    let args = Args::parse();

    let mut config = ChartConfig::default();
    if args.smooth {
        config = config.smooth();
    }
    let step_ms = config.interval_ms.as_millis() as i64;

    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║              LIVECHART SESSION REPLAY                 ║");
    println!("╚═══════════════════════════════════════════════════════╝");
    println!("Scenario: {:?}, {} ticks every {}ms\n", args.scenario, args.ticks, step_ms);

    let feed = SyntheticFeed::new(args.seed, args.scenario.into());
    let clock = ManualClock::new(chrono::Utc::now().timestamp_millis());
    let mut chart = ChartController::new(feed, RecordingRenderer::new(), clock.clone(), config);

    let seeded = chart.start().await?;
    println!("✓ Seeded {} points", seeded);

    let mut rolls = 0u32;
    let mut up = 0u32;
    let mut down = 0u32;
    let mut carried = 0u32;

    for _ in 0..args.ticks {
        clock.advance(step_ms);
        let frame = chart.tick().await?;

        match frame.point.direction {
            Some(Direction::Up) => up += 1,
            Some(Direction::Down) => down += 1,
            None => {}
        }
        if frame.source == PriceSource::CarriedForward {
            carried += 1;
        }
        if let WindowTransition::Rolled { previous, next } = frame.transition {
            rolls += 1;
            let change = next.reference_price - previous.reference_price;
            println!(
                "  Window {:>2}: {:.2} → {:.2} ({:+.2}, {})",
                rolls,
                previous.reference_price,
                next.reference_price,
                change,
                if change >= 0.0 { "📈" } else { "📉" }
            );
        }
    }

    let buffer = chart.buffer();
    println!("\n📊 Summary");
    println!("  Points in view:   {}", buffer.len());
    println!("  Up markers:       {}", up);
    println!("  Down markers:     {}", down);
    println!("  Carried forward:  {}", carried);
    println!("  Windows rolled:   {}", rolls);
    println!("  Renderer redraws: {}", chart.renderer().redraws());
    if let Some(window) = chart.window().active() {
        println!(
            "  Active window:    ref {:.2}, {}s remaining",
            window.reference_price,
            (window.end_mark - clock.now_ms()) / 1000
        );
    }

    Ok(())
}

