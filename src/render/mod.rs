// Chart rendering surface
pub mod log;
pub mod recording;

use crate::error::RenderError;
use crate::models::{AnnotationId, AnnotationValue, MarkerStyle, PricePoint};

pub use log::LogRenderer;
pub use recording::{RecordingRenderer, RenderCommand};

/// Narrow capability the chart core drives
///
/// Implementations own whatever drawing surface they target. Commands are
/// batched until `redraw` is called.
pub trait Renderer: Send {
    fn append_point(&mut self, point: PricePoint, marker: &MarkerStyle) -> Result<(), RenderError>;

    /// Turn off the highlight marker on the point at `timestamp`
    fn clear_marker(&mut self, timestamp: i64) -> Result<(), RenderError>;

    fn evict_oldest(&mut self) -> Result<(), RenderError>;

    fn set_annotation(
        &mut self,
        id: AnnotationId,
        value: AnnotationValue,
        label: &str,
    ) -> Result<(), RenderError>;

    fn remove_annotation(&mut self, id: AnnotationId) -> Result<(), RenderError>;

    fn set_axis_right_edge(&mut self, timestamp: i64) -> Result<(), RenderError>;

    fn redraw(&mut self) -> Result<(), RenderError>;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn append_point(&mut self, point: PricePoint, marker: &MarkerStyle) -> Result<(), RenderError> {
        (**self).append_point(point, marker)
    }

    fn clear_marker(&mut self, timestamp: i64) -> Result<(), RenderError> {
        (**self).clear_marker(timestamp)
    }

    fn evict_oldest(&mut self) -> Result<(), RenderError> {
        (**self).evict_oldest()
    }

    fn set_annotation(
        &mut self,
        id: AnnotationId,
        value: AnnotationValue,
        label: &str,
    ) -> Result<(), RenderError> {
        (**self).set_annotation(id, value, label)
    }

    fn remove_annotation(&mut self, id: AnnotationId) -> Result<(), RenderError> {
        (**self).remove_annotation(id)
    }

    fn set_axis_right_edge(&mut self, timestamp: i64) -> Result<(), RenderError> {
        (**self).set_axis_right_edge(timestamp)
    }

    fn redraw(&mut self) -> Result<(), RenderError> {
        (**self).redraw()
    }
}
