use super::clock::Clock;
use super::controller::ChartController;
use crate::api::PriceFeed;
use crate::error::FetchError;
use crate::render::Renderer;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// One live chart: a controller driven by a fixed-period timer
///
/// Ticks run one at a time on a single task. A tick whose fetch outlasts the
/// period delays the next tick; any timer ticks missed meanwhile are dropped
/// rather than queued.
pub struct ChartSession<F, R, C> {
    id: Uuid,
    controller: ChartController<F, R, C>,
}

impl<F, R, C> ChartSession<F, R, C>
where
    F: PriceFeed + 'static,
    R: Renderer + 'static,
    C: Clock + 'static,
{
    pub fn new(controller: ChartController<F, R, C>) -> Self {
        Self {
            id: Uuid::new_v4(),
            controller,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn controller(&self) -> &ChartController<F, R, C> {
        &self.controller
    }

    fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "chart_session",
            session = %self.id,
            symbol = %self.controller.config().symbol
        )
    }

    /// Seed the chart from history. Must succeed before ticking starts.
    pub async fn start(&mut self) -> Result<usize, FetchError> {
        let span = self.span();
        self.controller.start().instrument(span).await
    }

    /// Tick until `cancel` fires, then hand back the controller
    pub async fn run(self, cancel: CancellationToken) -> ChartController<F, R, C> {
        let span = self.span();
        run_ticks(self.controller, cancel).instrument(span).await
    }

    /// Run on a background task
    pub fn spawn(self, cancel: CancellationToken) -> SessionHandle<F, R, C> {
        let id = self.id;
        let task = tokio::spawn(self.run(cancel.clone()));

        SessionHandle { id, cancel, task }
    }
}

async fn run_ticks<F, R, C>(
    mut controller: ChartController<F, R, C>,
    cancel: CancellationToken,
) -> ChartController<F, R, C>
where
    F: PriceFeed,
    R: Renderer,
    C: Clock,
{
    let period = controller.config().interval_ms.period();
    // First tick fires one period after start
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(period_ms = period.as_millis() as u64, "Chart session ticking");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let started = Instant::now();

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Abandoning in-flight fetch");
                break;
            }
            fetched = controller.fetch_latest() => fetched,
        };

        // No mutation once stop has been requested
        if cancel.is_cancelled() {
            break;
        }

        if let Err(e) = controller.commit(fetched) {
            tracing::error!(error = %e, "Tick rejected by series buffer");
        }

        let elapsed = started.elapsed();
        if elapsed > period {
            tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                period_ms = period.as_millis() as u64,
                "Tick overran its period, skipping missed ticks"
            );
        }
    }

    tracing::info!(ticks = controller.ticks(), "Chart session stopped");
    controller
}

/// Handle to a spawned session
///
/// Dropping the handle cancels the session; `stop` also waits for it.
pub struct SessionHandle<F, R, C> {
    id: Uuid,
    cancel: CancellationToken,
    task: JoinHandle<ChartController<F, R, C>>,
}

impl<F, R, C> SessionHandle<F, R, C> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop ticking and wait for the session task to hand back its state
    pub async fn stop(mut self) -> Result<ChartController<F, R, C>, JoinError> {
        self.cancel.cancel();
        (&mut self.task).await
    }
}

impl<F, R, C> Drop for SessionHandle<F, R, C> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
