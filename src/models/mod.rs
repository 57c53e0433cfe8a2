use serde::{Deserialize, Serialize};
use std::fmt;

/// A single price sample on the chart timeline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    pub timestamp: i64, // ms since epoch
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: i64, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// Price direction relative to the window's reference price
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Prices at or above the reference are "up"
    pub fn from_reference(price: f64, reference: f64) -> Self {
        if price >= reference {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

/// A point as held by the series buffer, with its derived marker attributes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PlottedPoint {
    pub point: PricePoint,
    pub highlighted: bool,
    /// None for seeded history, which never carries a directional marker
    pub direction: Option<Direction>,
}

impl PlottedPoint {
    pub fn seeded(point: PricePoint) -> Self {
        Self {
            point,
            highlighted: false,
            direction: None,
        }
    }

    pub fn timestamp(&self) -> i64 {
        self.point.timestamp
    }

    pub fn price(&self) -> f64 {
        self.point.price
    }
}

/// Marker style handed to the renderer alongside an appended point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub enabled: bool,
    pub fill_color: Option<String>,
    pub radius: u8,
}

impl MarkerStyle {
    pub fn disabled(radius: u8) -> Self {
        Self {
            enabled: false,
            fill_color: None,
            radius,
        }
    }
}

/// Identifiers of the three annotation lines
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AnnotationId {
    /// Vertical line at the start of the active window
    CurrentX,
    /// Vertical line at the end of the active window
    EndX,
    /// Horizontal line at the window's reference price
    CurrentY,
}

impl AnnotationId {
    pub const ALL: [AnnotationId; 3] = [
        AnnotationId::CurrentX,
        AnnotationId::EndX,
        AnnotationId::CurrentY,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationId::CurrentX => "current-x",
            AnnotationId::EndX => "end-x",
            AnnotationId::CurrentY => "current-y",
        }
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an annotation line sits: on the time axis or the price axis
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum AnnotationValue {
    Time(i64),
    Price(f64),
}

/// Vertical label offset in pixels relative to the annotation line
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelPlacement {
    pub offset_x: i32,
    pub offset_y: i32,
}

impl LabelPlacement {
    pub const TIME_LINE: LabelPlacement = LabelPlacement {
        offset_x: -3,
        offset_y: 0,
    };
    pub const PRICE_LINE_INITIAL: LabelPlacement = LabelPlacement {
        offset_x: 50,
        offset_y: 2,
    };
    pub const PRICE_LINE_ROLLED: LabelPlacement = LabelPlacement {
        offset_x: 50,
        offset_y: -10,
    };
}

/// One change to the chart's annotation lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnnotationDirective {
    Set {
        id: AnnotationId,
        value: AnnotationValue,
        label: String,
        placement: LabelPlacement,
    },
    Remove {
        id: AnnotationId,
    },
}

impl AnnotationDirective {
    pub fn id(&self) -> AnnotationId {
        match self {
            AnnotationDirective::Set { id, .. } | AnnotationDirective::Remove { id } => *id,
        }
    }
}

/// Where a tick's price came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PriceSource {
    Live,
    /// Fetch failed; the last observed price (or zero) was reused
    CarriedForward,
}
