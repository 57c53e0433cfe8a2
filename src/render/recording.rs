use super::Renderer;
use crate::error::RenderError;
use crate::models::{AnnotationId, AnnotationValue, MarkerStyle, PricePoint};
use std::collections::{HashMap, VecDeque};

/// A renderer call, as recorded
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    AppendPoint {
        point: PricePoint,
        marker: MarkerStyle,
    },
    ClearMarker {
        timestamp: i64,
    },
    EvictOldest,
    SetAnnotation {
        id: AnnotationId,
        value: AnnotationValue,
        label: String,
    },
    RemoveAnnotation {
        id: AnnotationId,
    },
    SetAxisRightEdge {
        timestamp: i64,
    },
    Redraw,
}

/// Renderer that records every command and mirrors the resulting chart state
///
/// Mirrors the behaviour of a real chart surface closely enough for
/// assertions: removing an unknown annotation or evicting from an empty
/// series is reported as an error.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    commands: Vec<RenderCommand>,
    series: VecDeque<(PricePoint, MarkerStyle)>,
    annotations: HashMap<AnnotationId, (AnnotationValue, String)>,
    axis_right_edge: Option<i64>,
    redraws: usize,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Commands of the most recent frame, ending with its redraw
    pub fn last_frame(&self) -> &[RenderCommand] {
        let end = self.commands.len();
        let start = self.commands[..end.saturating_sub(1)]
            .iter()
            .rposition(|c| *c == RenderCommand::Redraw)
            .map(|i| i + 1)
            .unwrap_or(0);
        &self.commands[start..end]
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn series(&self) -> impl Iterator<Item = &(PricePoint, MarkerStyle)> {
        self.series.iter()
    }

    pub fn series_len(&self) -> usize {
        self.series.len()
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&(AnnotationValue, String)> {
        self.annotations.get(&id)
    }

    pub fn annotation_count(&self) -> usize {
        self.annotations.len()
    }

    pub fn axis_right_edge(&self) -> Option<i64> {
        self.axis_right_edge
    }

    pub fn redraws(&self) -> usize {
        self.redraws
    }
}

impl Renderer for RecordingRenderer {
    fn append_point(&mut self, point: PricePoint, marker: &MarkerStyle) -> Result<(), RenderError> {
        self.commands.push(RenderCommand::AppendPoint {
            point,
            marker: marker.clone(),
        });
        self.series.push_back((point, marker.clone()));
        Ok(())
    }

    fn clear_marker(&mut self, timestamp: i64) -> Result<(), RenderError> {
        self.commands.push(RenderCommand::ClearMarker { timestamp });
        let (_, marker) = self
            .series
            .iter_mut()
            .find(|(p, _)| p.timestamp == timestamp)
            .ok_or_else(|| RenderError::Backend(format!("no point at {}", timestamp)))?;
        marker.enabled = false;
        Ok(())
    }

    fn evict_oldest(&mut self) -> Result<(), RenderError> {
        self.commands.push(RenderCommand::EvictOldest);
        self.series
            .pop_front()
            .map(|_| ())
            .ok_or_else(|| RenderError::Backend("series is empty".to_string()))
    }

    fn set_annotation(
        &mut self,
        id: AnnotationId,
        value: AnnotationValue,
        label: &str,
    ) -> Result<(), RenderError> {
        self.commands.push(RenderCommand::SetAnnotation {
            id,
            value,
            label: label.to_string(),
        });
        self.annotations.insert(id, (value, label.to_string()));
        Ok(())
    }

    fn remove_annotation(&mut self, id: AnnotationId) -> Result<(), RenderError> {
        self.commands.push(RenderCommand::RemoveAnnotation { id });
        self.annotations
            .remove(&id)
            .map(|_| ())
            .ok_or(RenderError::UnknownAnnotation(id))
    }

    fn set_axis_right_edge(&mut self, timestamp: i64) -> Result<(), RenderError> {
        self.commands.push(RenderCommand::SetAxisRightEdge { timestamp });
        self.axis_right_edge = Some(timestamp);
        Ok(())
    }

    fn redraw(&mut self) -> Result<(), RenderError> {
        self.commands.push(RenderCommand::Redraw);
        self.redraws += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker() -> MarkerStyle {
        MarkerStyle {
            enabled: true,
            fill_color: Some("#00ff00".to_string()),
            radius: 4,
        }
    }

    #[test]
    fn test_mirrors_series() {
        let mut renderer = RecordingRenderer::new();
        renderer.append_point(PricePoint::new(1, 1.0), &marker()).unwrap();
        renderer.append_point(PricePoint::new(2, 2.0), &marker()).unwrap();
        renderer.clear_marker(1).unwrap();
        renderer.evict_oldest().unwrap();

        let remaining: Vec<_> = renderer.series().collect();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].0.timestamp, 2);
        assert!(remaining[0].1.enabled);
    }

    #[test]
    fn test_remove_unknown_annotation() {
        let mut renderer = RecordingRenderer::new();
        let result = renderer.remove_annotation(AnnotationId::EndX);

        assert_eq!(result, Err(RenderError::UnknownAnnotation(AnnotationId::EndX)));
        assert_eq!(renderer.commands().len(), 1);
    }

    #[test]
    fn test_last_frame() {
        let mut renderer = RecordingRenderer::new();
        renderer.set_axis_right_edge(10).unwrap();
        renderer.redraw().unwrap();
        renderer.evict_oldest().ok();
        renderer.set_axis_right_edge(20).unwrap();
        renderer.redraw().unwrap();

        assert_eq!(
            renderer.last_frame(),
            &[
                RenderCommand::EvictOldest,
                RenderCommand::SetAxisRightEdge { timestamp: 20 },
                RenderCommand::Redraw,
            ]
        );
        assert_eq!(renderer.redraws(), 2);
        assert_eq!(renderer.axis_right_edge(), Some(20));
    }

    #[test]
    fn test_clear_commands_keeps_chart_state() {
        let mut renderer = RecordingRenderer::new();
        renderer.append_point(PricePoint::new(1, 1.0), &marker()).unwrap();
        renderer
            .set_annotation(AnnotationId::CurrentY, AnnotationValue::Price(1.0), "1.00")
            .unwrap();
        renderer.redraw().unwrap();

        renderer.clear_commands();

        assert!(renderer.commands().is_empty());
        assert!(renderer.last_frame().is_empty());
        assert_eq!(renderer.series_len(), 1);
        assert_eq!(renderer.annotation_count(), 1);
        assert_eq!(renderer.redraws(), 1);
    }
}
