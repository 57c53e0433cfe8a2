use super::annotation_window::{AnnotationWindow, WindowTransition};
use super::clock::Clock;
use super::series_buffer::SeriesBuffer;
use crate::api::PriceFeed;
use crate::config::ChartConfig;
use crate::error::{BufferError, FetchError, RenderError};
use crate::models::{AnnotationDirective, MarkerStyle, PlottedPoint, PricePoint, PriceSource};
use crate::render::Renderer;
use std::future::Future;

/// Everything one tick changed, as pushed to the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct TickFrame {
    pub tick: u64,
    pub point: PlottedPoint,
    pub source: PriceSource,
    pub evicted: Option<PricePoint>,
    pub demoted: Option<i64>,
    pub transition: WindowTransition,
    pub directives: Vec<AnnotationDirective>,
    pub axis_right_edge: i64,
}

/// Owns the chart state for one session and is its only mutator
///
/// A tick is split in two: `fetch_latest` is the only await point and
/// touches no state; `commit` applies the result synchronously. Holding
/// `&mut self` across `commit` keeps ticks from interleaving.
pub struct ChartController<F, R, C> {
    feed: F,
    renderer: R,
    clock: C,
    config: ChartConfig,
    buffer: SeriesBuffer,
    window: AnnotationWindow,
    last_price: Option<f64>,
    ticks: u64,
}

impl<F, R, C> ChartController<F, R, C>
where
    F: PriceFeed,
    R: Renderer,
    C: Clock,
{
    pub fn new(feed: F, renderer: R, clock: C, config: ChartConfig) -> Self {
        Self {
            buffer: SeriesBuffer::new(config.max_points),
            window: AnnotationWindow::new(config.window_duration_ms),
            feed,
            renderer,
            clock,
            config,
            last_price: None,
            ticks: 0,
        }
    }

    /// Seed the buffer from history and draw it
    ///
    /// A failed fetch leaves the buffer untouched and is returned to the caller.
    pub async fn start(&mut self) -> Result<usize, FetchError> {
        let points = self
            .feed
            .fetch_seed(
                &self.config.symbol,
                &self.config.seed_interval,
                self.config.seed_limit,
            )
            .await?;

        let fetched = points.len();
        let kept = self.buffer.seed(points);

        let hidden = MarkerStyle::disabled(self.config.theme.marker_radius);
        for plotted in self.buffer.points() {
            ignore_render_error(
                "append_point",
                self.renderer.append_point(plotted.point, &hidden),
            );
        }
        if let Some(newest) = self.buffer.latest() {
            let edge = newest.timestamp() + self.config.axis_lead_ms;
            ignore_render_error("set_axis_right_edge", self.renderer.set_axis_right_edge(edge));
        }
        ignore_render_error("redraw", self.renderer.redraw());

        tracing::info!(
            symbol = %self.config.symbol,
            fetched,
            kept,
            "Seeded chart from history"
        );

        Ok(kept)
    }

    /// Fetch the latest price without touching chart state
    ///
    /// Borrows only the feed and symbol, so the future stays `Send` even
    /// when the renderer is not `Sync`.
    pub fn fetch_latest(&self) -> impl Future<Output = Result<f64, FetchError>> + Send + '_ {
        self.feed.fetch_latest(&self.config.symbol)
    }

    /// Apply a fetched (or failed) price to the chart and render the frame
    pub fn commit(&mut self, fetched: Result<f64, FetchError>) -> Result<TickFrame, BufferError> {
        let (price, source) = match fetched {
            Ok(price) => (price, PriceSource::Live),
            Err(e) => {
                let carried = self.last_price.unwrap_or(0.0);
                tracing::warn!(
                    error = %e,
                    carried,
                    "Latest price fetch failed, carrying last price forward"
                );
                (carried, PriceSource::CarriedForward)
            }
        };

        let t = self.next_timestamp();
        let reference = self.window.reference_price().unwrap_or(0.0);
        let appended = self.buffer.append(PricePoint::new(t, price), reference)?;
        if source == PriceSource::Live {
            self.last_price = Some(price);
        }

        let transition = self.window.evaluate(t, price);
        let directives = transition.directives();
        let axis_right_edge = appended.point.timestamp() + self.config.axis_lead_ms;

        self.ticks += 1;
        let frame = TickFrame {
            tick: self.ticks,
            point: appended.point,
            source,
            evicted: appended.evicted,
            demoted: appended.demoted,
            transition,
            directives,
            axis_right_edge,
        };

        self.push_frame(&frame);

        tracing::debug!(
            tick = frame.tick,
            t,
            price,
            ?source,
            direction = ?frame.point.direction,
            window_changed = transition.is_change(),
            points = self.buffer.len(),
            "Tick committed"
        );

        Ok(frame)
    }

    /// Fetch then commit, for callers that do not need cancellation
    pub async fn tick(&mut self) -> Result<TickFrame, BufferError> {
        let fetched = self.fetch_latest().await;
        self.commit(fetched)
    }

    // Wall-clock time, nudged forward if the clock has not passed the newest point
    fn next_timestamp(&self) -> i64 {
        let now = self.clock.now_ms();
        match self.buffer.latest() {
            Some(newest) if now <= newest.timestamp() => {
                tracing::debug!(now, newest = newest.timestamp(), "Clock behind newest point");
                newest.timestamp().saturating_add(1)
            }
            _ => now,
        }
    }

    fn push_frame(&mut self, frame: &TickFrame) {
        if frame.evicted.is_some() {
            ignore_render_error("evict_oldest", self.renderer.evict_oldest());
        }
        if let Some(timestamp) = frame.demoted {
            ignore_render_error("clear_marker", self.renderer.clear_marker(timestamp));
        }

        let marker = MarkerStyle {
            enabled: true,
            fill_color: frame
                .point
                .direction
                .map(|d| self.config.theme.color_for(d).to_string()),
            radius: self.config.theme.marker_radius,
        };
        ignore_render_error(
            "append_point",
            self.renderer.append_point(frame.point.point, &marker),
        );

        for directive in &frame.directives {
            let result = match directive {
                AnnotationDirective::Remove { id } => self.renderer.remove_annotation(*id),
                AnnotationDirective::Set {
                    id, value, label, ..
                } => self.renderer.set_annotation(*id, *value, label),
            };
            ignore_render_error("annotation", result);
        }

        ignore_render_error(
            "set_axis_right_edge",
            self.renderer.set_axis_right_edge(frame.axis_right_edge),
        );
        // Always redraw, even when only the carried-forward point changed
        ignore_render_error("redraw", self.renderer.redraw());
    }

    pub fn buffer(&self) -> &SeriesBuffer {
        &self.buffer
    }

    pub fn window(&self) -> &AnnotationWindow {
        &self.window
    }

    pub fn last_price(&self) -> Option<f64> {
        self.last_price
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }
}

fn ignore_render_error(op: &str, result: Result<(), RenderError>) {
    if let Err(e) = result {
        tracing::debug!(op, error = %e, "Renderer rejected command");
    }
}
