// Streaming chart state: buffer, annotation window, tick orchestration
pub mod annotation_window;
pub mod clock;
pub mod controller;
pub mod series_buffer;
pub mod session;

pub use annotation_window::{ActiveWindow, AnnotationWindow, WindowState, WindowTransition};
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{ChartController, TickFrame};
pub use series_buffer::{Appended, SeriesBuffer};
pub use session::{ChartSession, SessionHandle};
