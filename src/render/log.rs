use super::Renderer;
use crate::config::Theme;
use crate::error::RenderError;
use crate::models::{AnnotationId, AnnotationValue, MarkerStyle, PricePoint};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Format a millisecond timestamp the way the time axis labels it
pub fn format_time(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

/// Renders the chart as a stream of log lines
///
/// Keeps just enough state to describe each frame on redraw.
pub struct LogRenderer {
    symbol: String,
    theme: Theme,
    points: usize,
    latest: Option<(PricePoint, MarkerStyle)>,
    annotations: HashMap<AnnotationId, (AnnotationValue, String)>,
    axis_right_edge: Option<i64>,
}

impl LogRenderer {
    pub fn new(symbol: impl Into<String>, theme: Theme) -> Self {
        Self {
            symbol: symbol.into(),
            theme,
            points: 0,
            latest: None,
            annotations: HashMap::new(),
            axis_right_edge: None,
        }
    }

    fn describe_annotation(&self, id: AnnotationId) -> String {
        match self.annotations.get(&id) {
            Some((AnnotationValue::Time(t), label)) => format!("{} {}", label, format_time(*t)),
            Some((AnnotationValue::Price(_), label)) => format!("ref {}", label),
            None => "-".to_string(),
        }
    }

    fn describe_marker(&self, marker: &MarkerStyle) -> &'static str {
        match marker.fill_color.as_deref() {
            Some(color) if marker.enabled && color == self.theme.up_color => "▲",
            Some(color) if marker.enabled && color == self.theme.down_color => "▼",
            _ => "·",
        }
    }
}

impl Renderer for LogRenderer {
    fn append_point(&mut self, point: PricePoint, marker: &MarkerStyle) -> Result<(), RenderError> {
        self.points += 1;
        self.latest = Some((point, marker.clone()));
        Ok(())
    }

    fn clear_marker(&mut self, _timestamp: i64) -> Result<(), RenderError> {
        Ok(())
    }

    fn evict_oldest(&mut self) -> Result<(), RenderError> {
        if self.points == 0 {
            return Err(RenderError::Backend("series is empty".to_string()));
        }
        self.points -= 1;
        Ok(())
    }

    fn set_annotation(
        &mut self,
        id: AnnotationId,
        value: AnnotationValue,
        label: &str,
    ) -> Result<(), RenderError> {
        tracing::debug!(id = %id, ?value, label, color = %self.theme.plot_line_color, "Annotation set");
        self.annotations.insert(id, (value, label.to_string()));
        Ok(())
    }

    fn remove_annotation(&mut self, id: AnnotationId) -> Result<(), RenderError> {
        self.annotations
            .remove(&id)
            .map(|_| ())
            .ok_or(RenderError::UnknownAnnotation(id))
    }

    fn set_axis_right_edge(&mut self, timestamp: i64) -> Result<(), RenderError> {
        self.axis_right_edge = Some(timestamp);
        Ok(())
    }

    fn redraw(&mut self) -> Result<(), RenderError> {
        let Some((point, marker)) = &self.latest else {
            return Ok(());
        };

        tracing::info!(
            "{} {} {:.2} {} | {} | {} | {} | axis→{} | {} pts",
            self.symbol,
            format_time(point.timestamp),
            point.price,
            self.describe_marker(marker),
            self.describe_annotation(AnnotationId::CurrentX),
            self.describe_annotation(AnnotationId::EndX),
            self.describe_annotation(AnnotationId::CurrentY),
            self.axis_right_edge
                .map(format_time)
                .unwrap_or_else(|| "auto".to_string()),
            self.points
        );
        Ok(())
    }
}
