use crate::error::BufferError;
use crate::models::{Direction, PlottedPoint, PricePoint};
use std::collections::VecDeque;

/// Result of a single append
#[derive(Debug, Clone, PartialEq)]
pub struct Appended {
    /// The newly appended, highlighted point
    pub point: PlottedPoint,
    /// Oldest point dropped to make room, if any
    pub evicted: Option<PricePoint>,
    /// Timestamp of the previous newest point, whose highlight was cleared
    pub demoted: Option<i64>,
}

/// Bounded rolling window of chart points
///
/// Points are kept in strictly increasing timestamp order. Only the most
/// recently appended point is highlighted.
#[derive(Debug, Clone)]
pub struct SeriesBuffer {
    points: VecDeque<PlottedPoint>,
    max_points: usize,
}

impl SeriesBuffer {
    /// Create a new series buffer
    ///
    /// # Arguments
    /// * `max_points` - Maximum number of points to keep, at least 1
    pub fn new(max_points: usize) -> Self {
        let max_points = max_points.max(1);
        Self {
            points: VecDeque::with_capacity(max_points),
            max_points,
        }
    }

    /// Replace the buffer contents with seed history
    ///
    /// Points that do not advance the timestamp are dropped, and only the
    /// newest `max_points` are kept. Returns the number of points kept.
    pub fn seed(&mut self, points: impl IntoIterator<Item = PricePoint>) -> usize {
        self.points.clear();

        let mut dropped = 0usize;
        for point in points {
            if let Some(newest) = self.points.back() {
                if point.timestamp <= newest.timestamp() {
                    dropped += 1;
                    continue;
                }
            }
            self.points.push_back(PlottedPoint::seeded(point));

            while self.points.len() > self.max_points {
                self.points.pop_front();
            }
        }

        if dropped > 0 {
            tracing::warn!(dropped, "Dropped out-of-order seed points");
        }

        self.points.len()
    }

    /// Append a point, evicting the oldest if full
    ///
    /// The new point's direction compares its price against `reference_price`
    /// (zero while no annotation window is active).
    pub fn append(
        &mut self,
        point: PricePoint,
        reference_price: f64,
    ) -> Result<Appended, BufferError> {
        if let Some(newest) = self.points.back() {
            if point.timestamp <= newest.timestamp() {
                return Err(BufferError::OutOfOrder {
                    timestamp: point.timestamp,
                    newest: newest.timestamp(),
                });
            }
        }

        let evicted = if self.points.len() >= self.max_points {
            self.points.pop_front().map(|p| p.point)
        } else {
            None
        };

        let demoted = self.points.back_mut().map(|last| {
            last.highlighted = false;
            last.timestamp()
        });

        let plotted = PlottedPoint {
            point,
            highlighted: true,
            direction: Some(Direction::from_reference(point.price, reference_price)),
        };
        self.points.push_back(plotted);

        Ok(Appended {
            point: plotted,
            evicted,
            demoted,
        })
    }

    /// Iterate points oldest first
    pub fn points(&self) -> impl Iterator<Item = &PlottedPoint> {
        self.points.iter()
    }

    /// Copy of all points, oldest first
    pub fn to_vec(&self) -> Vec<PlottedPoint> {
        self.points.iter().copied().collect()
    }

    pub fn latest(&self) -> Option<&PlottedPoint> {
        self.points.back()
    }

    pub fn oldest(&self) -> Option<&PlottedPoint> {
        self.points.front()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }

    pub fn highlighted_count(&self) -> usize {
        self.points.iter().filter(|p| p.highlighted).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spaced_points(start: i64, count: usize, step: i64) -> Vec<PricePoint> {
        (0..count)
            .map(|i| PricePoint::new(start + i as i64 * step, 100.0 + i as f64))
            .collect()
    }

    fn assert_strictly_increasing(buffer: &SeriesBuffer) {
        let timestamps: Vec<i64> = buffer.points().map(|p| p.timestamp()).collect();
        assert!(
            timestamps.windows(2).all(|w| w[0] < w[1]),
            "timestamps not strictly increasing: {:?}",
            timestamps
        );
    }

    #[test]
    fn test_new_buffer() {
        let buffer = SeriesBuffer::new(67);
        assert_eq!(buffer.max_points(), 67);
        assert!(buffer.is_empty());
        assert!(buffer.latest().is_none());
    }

    #[test]
    fn test_seed_replaces_contents() {
        let mut buffer = SeriesBuffer::new(67);
        buffer.append(PricePoint::new(1, 1.0), 0.0).unwrap();

        let kept = buffer.seed(spaced_points(1_000, 65, 1_000));

        assert_eq!(kept, 65);
        assert_eq!(buffer.oldest().unwrap().timestamp(), 1_000);
        assert_eq!(buffer.latest().unwrap().timestamp(), 65_000);
        assert_eq!(buffer.highlighted_count(), 0);
    }

    #[test]
    fn test_seed_keeps_newest_when_oversized() {
        let mut buffer = SeriesBuffer::new(10);
        buffer.seed(spaced_points(0, 25, 1_000));

        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.oldest().unwrap().timestamp(), 15_000);
        assert_eq!(buffer.latest().unwrap().timestamp(), 24_000);
    }

    #[test]
    fn test_seed_drops_duplicates() {
        let mut buffer = SeriesBuffer::new(10);
        let points = vec![
            PricePoint::new(1_000, 1.0),
            PricePoint::new(2_000, 2.0),
            PricePoint::new(2_000, 2.5),
            PricePoint::new(1_500, 3.0),
            PricePoint::new(3_000, 4.0),
        ];

        assert_eq!(buffer.seed(points), 3);
        assert_strictly_increasing(&buffer);
    }

    #[test]
    fn test_append_highlights_only_newest() {
        let mut buffer = SeriesBuffer::new(67);
        buffer.seed(spaced_points(0, 5, 1_000));

        let first = buffer.append(PricePoint::new(10_000, 100.0), 0.0).unwrap();
        assert_eq!(first.demoted, Some(4_000));
        assert!(first.point.highlighted);

        let second = buffer.append(PricePoint::new(11_000, 101.0), 0.0).unwrap();
        assert_eq!(second.demoted, Some(10_000));

        assert_eq!(buffer.highlighted_count(), 1);
        assert!(buffer.latest().unwrap().highlighted);
    }

    #[test]
    fn test_append_to_empty_has_nothing_to_demote() {
        let mut buffer = SeriesBuffer::new(67);
        let appended = buffer.append(PricePoint::new(1_000, 10.0), 0.0).unwrap();

        assert!(appended.demoted.is_none());
        assert!(appended.evicted.is_none());
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_seventy_appends_keep_newest_67() {
        let mut buffer = SeriesBuffer::new(67);

        for (i, point) in spaced_points(0, 70, 1_000).into_iter().enumerate() {
            let appended = buffer.append(point, 0.0).unwrap();
            if i < 67 {
                assert!(appended.evicted.is_none());
            } else {
                assert_eq!(
                    appended.evicted.unwrap().timestamp,
                    (i as i64 - 67) * 1_000
                );
            }
            assert!(buffer.len() <= 67);
        }

        assert_eq!(buffer.len(), 67);
        assert_eq!(buffer.oldest().unwrap().timestamp(), 3_000);
        assert_eq!(buffer.latest().unwrap().timestamp(), 69_000);
        assert_strictly_increasing(&buffer);
        assert_eq!(buffer.highlighted_count(), 1);
    }

    #[test]
    fn test_direction_against_reference() {
        let mut buffer = SeriesBuffer::new(67);

        let up = buffer.append(PricePoint::new(1_000, 105.0), 100.0).unwrap();
        assert_eq!(up.point.direction, Some(Direction::Up));

        let flat = buffer.append(PricePoint::new(2_000, 100.0), 100.0).unwrap();
        assert_eq!(flat.point.direction, Some(Direction::Up));

        let down = buffer.append(PricePoint::new(3_000, 95.0), 100.0).unwrap();
        assert_eq!(down.point.direction, Some(Direction::Down));
    }

    #[test]
    fn test_rejects_out_of_order() {
        let mut buffer = SeriesBuffer::new(67);
        buffer.append(PricePoint::new(5_000, 1.0), 0.0).unwrap();

        let result = buffer.append(PricePoint::new(5_000, 2.0), 0.0);
        assert_eq!(
            result,
            Err(BufferError::OutOfOrder {
                timestamp: 5_000,
                newest: 5_000
            })
        );
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.latest().unwrap().price(), 1.0);
        assert!(buffer.latest().unwrap().highlighted);
    }

    #[test]
    fn test_small_cap_eviction_order() {
        let mut buffer = SeriesBuffer::new(3);
        for point in spaced_points(0, 5, 10) {
            buffer.append(point, 0.0).unwrap();
        }

        let prices: Vec<f64> = buffer.points().map(|p| p.price()).collect();
        assert_eq!(prices, vec![102.0, 103.0, 104.0]);
    }

    #[test]
    fn test_zero_cap_holds_one_point() {
        let mut buffer = SeriesBuffer::new(0);
        assert_eq!(buffer.max_points(), 1);

        buffer.append(PricePoint::new(1_000, 1.0), 0.0).unwrap();
        let second = buffer.append(PricePoint::new(2_000, 2.0), 0.0).unwrap();

        assert_eq!(second.evicted.map(|p| p.timestamp), Some(1_000));
        assert!(second.demoted.is_none());
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.highlighted_count(), 1);
    }

    #[test]
    fn test_to_vec_snapshot() {
        let mut buffer = SeriesBuffer::new(67);
        buffer.seed(spaced_points(0, 3, 1_000));
        buffer.append(PricePoint::new(5_000, 50.0), 100.0).unwrap();

        let snapshot = buffer.to_vec();
        buffer.append(PricePoint::new(6_000, 60.0), 100.0).unwrap();

        assert_eq!(snapshot.len(), 4);
        assert!(snapshot[..3].iter().all(|p| !p.highlighted && p.direction.is_none()));
        assert_eq!(snapshot[3].direction, Some(Direction::Down));
        assert!(snapshot[3].highlighted);
    }
}
