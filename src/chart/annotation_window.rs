use crate::models::{AnnotationDirective, AnnotationId, AnnotationValue, LabelPlacement};

pub const CURRENT_LABEL: &str = "Current";
pub const END_LABEL: &str = "End";

/// Bounds and reference price of an active comparison window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveWindow {
    pub current_mark: i64,
    pub end_mark: i64,
    pub reference_price: f64,
}

impl ActiveWindow {
    fn starting_at(t: i64, price: f64, duration_ms: i64) -> Self {
        Self {
            current_mark: t,
            end_mark: t + duration_ms,
            reference_price: price,
        }
    }

    fn set_directives(&self, price_placement: LabelPlacement) -> [AnnotationDirective; 3] {
        [
            AnnotationDirective::Set {
                id: AnnotationId::CurrentX,
                value: AnnotationValue::Time(self.current_mark),
                label: CURRENT_LABEL.to_string(),
                placement: LabelPlacement::TIME_LINE,
            },
            AnnotationDirective::Set {
                id: AnnotationId::EndX,
                value: AnnotationValue::Time(self.end_mark),
                label: END_LABEL.to_string(),
                placement: LabelPlacement::TIME_LINE,
            },
            AnnotationDirective::Set {
                id: AnnotationId::CurrentY,
                value: AnnotationValue::Price(self.reference_price),
                label: format_price(self.reference_price),
                placement: price_placement,
            },
        ]
    }
}

/// Price label text, two decimal places
pub fn format_price(price: f64) -> String {
    format!("{:.2}", price)
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum WindowState {
    #[default]
    Uninitialized,
    Active(ActiveWindow),
}

/// Outcome of evaluating the window against one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowTransition {
    /// First tick of the session opened the window
    Opened(ActiveWindow),
    /// Tick fell inside the active window
    Held,
    /// Tick reached the end mark; the window was replaced wholesale
    Rolled {
        previous: ActiveWindow,
        next: ActiveWindow,
    },
}

impl WindowTransition {
    /// Annotation changes for the renderer, removals first
    pub fn directives(&self) -> Vec<AnnotationDirective> {
        match self {
            WindowTransition::Held => Vec::new(),
            WindowTransition::Opened(window) => window
                .set_directives(LabelPlacement::PRICE_LINE_INITIAL)
                .to_vec(),
            WindowTransition::Rolled { next, .. } => AnnotationId::ALL
                .iter()
                .map(|id| AnnotationDirective::Remove { id: *id })
                .chain(next.set_directives(LabelPlacement::PRICE_LINE_ROLLED))
                .collect(),
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, WindowTransition::Held)
    }
}

/// Rolling reference window anchoring the "current" and "end" markers
#[derive(Debug, Clone)]
pub struct AnnotationWindow {
    state: WindowState,
    duration_ms: i64,
}

impl AnnotationWindow {
    pub fn new(duration_ms: i64) -> Self {
        Self {
            state: WindowState::Uninitialized,
            duration_ms,
        }
    }

    /// Advance the state machine with a tick at `t` carrying `price`
    pub fn evaluate(&mut self, t: i64, price: f64) -> WindowTransition {
        match self.state {
            WindowState::Uninitialized => {
                let window = ActiveWindow::starting_at(t, price, self.duration_ms);
                self.state = WindowState::Active(window);
                tracing::debug!(
                    current = window.current_mark,
                    end = window.end_mark,
                    reference = window.reference_price,
                    "Annotation window opened"
                );
                WindowTransition::Opened(window)
            }
            WindowState::Active(previous) if t >= previous.end_mark => {
                let next = ActiveWindow::starting_at(t, price, self.duration_ms);
                self.state = WindowState::Active(next);
                tracing::debug!(
                    current = next.current_mark,
                    end = next.end_mark,
                    reference = next.reference_price,
                    previous_reference = previous.reference_price,
                    "Annotation window rolled"
                );
                WindowTransition::Rolled { previous, next }
            }
            WindowState::Active(_) => WindowTransition::Held,
        }
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn active(&self) -> Option<ActiveWindow> {
        match self.state {
            WindowState::Active(window) => Some(window),
            WindowState::Uninitialized => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }

    pub fn reference_price(&self) -> Option<f64> {
        self.active().map(|w| w.reference_price)
    }

    pub fn duration_ms(&self) -> i64 {
        self.duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;

    #[test]
    fn test_starts_uninitialized() {
        let window = AnnotationWindow::new(60_000);
        assert_eq!(window.state(), WindowState::Uninitialized);
        assert!(window.reference_price().is_none());
    }

    #[test]
    fn test_first_tick_opens_window() {
        let mut window = AnnotationWindow::new(60_000);
        let transition = window.evaluate(T0 + 65_000, 100.0);

        let expected = ActiveWindow {
            current_mark: T0 + 65_000,
            end_mark: T0 + 125_000,
            reference_price: 100.0,
        };
        assert_eq!(transition, WindowTransition::Opened(expected));
        assert_eq!(window.active(), Some(expected));

        let directives = transition.directives();
        assert_eq!(directives.len(), 3);
        assert_eq!(
            directives[0],
            AnnotationDirective::Set {
                id: AnnotationId::CurrentX,
                value: AnnotationValue::Time(T0 + 65_000),
                label: "Current".to_string(),
                placement: LabelPlacement::TIME_LINE,
            }
        );
        assert_eq!(
            directives[1],
            AnnotationDirective::Set {
                id: AnnotationId::EndX,
                value: AnnotationValue::Time(T0 + 125_000),
                label: "End".to_string(),
                placement: LabelPlacement::TIME_LINE,
            }
        );
        assert_eq!(
            directives[2],
            AnnotationDirective::Set {
                id: AnnotationId::CurrentY,
                value: AnnotationValue::Price(100.0),
                label: "100.00".to_string(),
                placement: LabelPlacement::PRICE_LINE_INITIAL,
            }
        );
    }

    #[test]
    fn test_ticks_inside_window_hold() {
        let mut window = AnnotationWindow::new(60_000);
        window.evaluate(T0, 100.0);

        for offset in [1_000, 30_000, 59_999] {
            let transition = window.evaluate(T0 + offset, 250.0);
            assert_eq!(transition, WindowTransition::Held);
            assert!(transition.directives().is_empty());
        }

        assert_eq!(window.reference_price(), Some(100.0));
    }

    #[test]
    fn test_tick_at_end_mark_rolls() {
        let mut window = AnnotationWindow::new(60_000);
        window.evaluate(T0, 100.0);

        let transition = window.evaluate(T0 + 60_000, 104.5);
        let next = window.active().unwrap();

        assert!(matches!(transition, WindowTransition::Rolled { .. }));
        assert_eq!(next.current_mark, T0 + 60_000);
        assert_eq!(next.end_mark, T0 + 120_000);
        assert_eq!(next.reference_price, 104.5);
    }

    #[test]
    fn test_late_tick_rolls_from_tick_time() {
        let mut window = AnnotationWindow::new(60_000);
        window.evaluate(T0, 100.0);

        // A gap longer than the window restarts from the late tick, not the old end
        window.evaluate(T0 + 95_000, 90.0);
        let next = window.active().unwrap();

        assert_eq!(next.current_mark, T0 + 95_000);
        assert_eq!(next.end_mark - next.current_mark, 60_000);
        assert_eq!(next.reference_price, 90.0);
    }

    #[test]
    fn test_roll_removes_before_setting() {
        let mut window = AnnotationWindow::new(60_000);
        window.evaluate(T0, 100.0);
        let directives = window.evaluate(T0 + 61_000, 99.999).directives();

        assert_eq!(directives.len(), 6);
        for (directive, id) in directives[..3].iter().zip(AnnotationId::ALL) {
            assert_eq!(directive, &AnnotationDirective::Remove { id });
        }
        assert!(directives[3..]
            .iter()
            .all(|d| matches!(d, AnnotationDirective::Set { .. })));

        match &directives[5] {
            AnnotationDirective::Set {
                label, placement, ..
            } => {
                assert_eq!(label, "100.00");
                assert_eq!(*placement, LabelPlacement::PRICE_LINE_ROLLED);
            }
            other => panic!("unexpected directive {:?}", other),
        }
    }

    #[test]
    fn test_window_width_invariant() {
        let mut window = AnnotationWindow::new(45_000);
        let mut t = T0;

        for i in 0..500 {
            t += 750 + (i % 7) * 100;
            window.evaluate(t, i as f64);
            let active = window.active().unwrap();
            assert_eq!(active.end_mark - active.current_mark, 45_000);
            assert!(active.current_mark <= t && t < active.end_mark);
        }
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(100.0), "100.00");
        assert_eq!(format_price(2456.789), "2456.79");
        assert_eq!(format_price(0.0), "0.00");
    }
}
