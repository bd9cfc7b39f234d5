//! Highlight detection over a bucketed density curve.
//!
//! Three strategies share the [`Detector`] interface:
//!
//! 1. **`MovingAverageDetector`** – count above a multiple of the local baseline
//! 2. **`SurpriseDetector`** – Poisson tail surprise against the local baseline
//! 3. **`PeakMarkerDetector`** – global threshold with fixed-radius non-max suppression
//!
//! The first two walk the chart left to right and keep the first qualifying
//! window of any cluster: a later window within the minimum spacing of an
//! accepted one is dropped even if it is larger.
//!
//! ```rust
//! use danmaku_spike::analysis::ChartPoint;
//! use danmaku_spike::spike::{Detector, MovingAverageDetector};
//!
//! let points: Vec<ChartPoint> = [5, 5, 50, 5, 5]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &c)| ChartPoint::new(i as u64 * 60, c, vec![]))
//!     .collect();
//! let highlights = MovingAverageDetector::default().detect(&points, 60);
//! assert_eq!(highlights.len(), 1);
//! assert_eq!(highlights[0].timestamp, 120);
//! ```

use crate::analysis::ChartPoint;
use crate::baseline::baseline;
use crate::math::surprise;
use serde::{Deserialize, Serialize};

/// A window whose comment volume spikes above its surroundings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub timestamp: u64,
    pub count: usize,
}

impl From<&ChartPoint> for Highlight {
    fn from(p: &ChartPoint) -> Self {
        Highlight {
            timestamp: p.time,
            count: p.count,
        }
    }
}

pub trait Detector {
    /// Highlights in ascending timestamp order, pairwise further apart than
    /// `2 * interval` seconds.
    fn detect(&self, points: &[ChartPoint], interval: u64) -> Vec<Highlight>;
}

/// Minimum gap between consecutive highlights.
pub fn min_spacing(interval: u64) -> u64 {
    interval.saturating_mul(2)
}

/// Greedy first-wins suppression; the only state is the last accepted highlight.
#[derive(Clone, Debug)]
struct Spacing {
    min_gap: u64,
    last: Option<Highlight>,
    accepted: Vec<Highlight>,
}

impl Spacing {
    fn new(interval: u64) -> Self {
        Self {
            min_gap: min_spacing(interval),
            last: None,
            accepted: Vec::new(),
        }
    }
    fn offer(&mut self, candidate: Highlight) {
        match self.last {
            Some(last) if candidate.timestamp.abs_diff(last.timestamp) <= self.min_gap => {
                tracing::trace!(
                    timestamp = candidate.timestamp,
                    count = candidate.count,
                    kept = last.timestamp,
                    "candidate suppressed by earlier highlight"
                );
            }
            _ => {
                self.last = Some(candidate);
                self.accepted.push(candidate);
            }
        }
    }
    fn finish(self) -> Vec<Highlight> {
        self.accepted
    }
}

/// Flags windows where `count > max(min_count, baseline * threshold_multiplier)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovingAverageDetector {
    threshold_multiplier: f64,
    min_count: usize,
    radius: usize,
}

impl Default for MovingAverageDetector {
    fn default() -> Self {
        Self {
            threshold_multiplier: 2.5,
            min_count: 10,
            radius: 5,
        }
    }
}

impl MovingAverageDetector {
    pub fn with_threshold(mut self, threshold_multiplier: f64, min_count: usize) -> Self {
        self.threshold_multiplier = threshold_multiplier;
        self.min_count = min_count;
        self
    }
    pub fn with_radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }
    fn is_candidate(&self, counts: &[usize], i: usize) -> bool {
        let avg = baseline(counts, i, self.radius);
        let bar = (self.min_count as f64).max(avg * self.threshold_multiplier);
        counts[i] as f64 > bar
    }
}

impl Detector for MovingAverageDetector {
    fn detect(&self, points: &[ChartPoint], interval: u64) -> Vec<Highlight> {
        let counts = counts(points);
        let mut spacing = Spacing::new(interval);
        for (i, point) in points.iter().enumerate() {
            if point.count == 0 {
                continue;
            }
            if self.is_candidate(&counts, i) {
                spacing.offer(point.into());
            }
        }
        spacing.finish()
    }
}

/// Flags windows with more than `min_count` comments whose Poisson tail
/// surprise against the local baseline exceeds `min_surprise`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurpriseDetector {
    min_surprise: f64,
    min_count: usize,
    radius: usize,
}

impl Default for SurpriseDetector {
    fn default() -> Self {
        Self {
            min_surprise: 6.0,
            min_count: 10,
            radius: 5,
        }
    }
}

impl SurpriseDetector {
    pub fn with_threshold(mut self, min_surprise: f64, min_count: usize) -> Self {
        self.min_surprise = min_surprise;
        self.min_count = min_count;
        self
    }
    pub fn with_radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }
    pub fn score(&self, counts: &[usize], i: usize) -> f64 {
        surprise(counts[i], baseline(counts, i, self.radius))
    }
}

impl Detector for SurpriseDetector {
    fn detect(&self, points: &[ChartPoint], interval: u64) -> Vec<Highlight> {
        let counts = counts(points);
        let mut spacing = Spacing::new(interval);
        for (i, point) in points.iter().enumerate() {
            if point.count <= self.min_count {
                continue;
            }
            if self.score(&counts, i) > self.min_surprise {
                spacing.offer(point.into());
            }
        }
        spacing.finish()
    }
}

/// Chart-marker peaks: above `ratio` of the global maximum and not exceeded
/// by any count within `radius`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeakMarkerDetector {
    ratio: f64,
    radius: usize,
    max_peaks: usize,
}

impl Default for PeakMarkerDetector {
    fn default() -> Self {
        Self {
            ratio: 0.6,
            radius: 5,
            max_peaks: 5,
        }
    }
}

impl PeakMarkerDetector {
    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = ratio;
        self
    }
    pub fn with_radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }
    pub fn with_max_peaks(mut self, max_peaks: usize) -> Self {
        self.max_peaks = max_peaks;
        self
    }

    /// `(index, count)` of each peak. When more than `max_peaks` qualify, the
    /// highest are kept, ordered by count descending; otherwise index order.
    pub fn peaks(&self, counts: &[usize]) -> Vec<(usize, usize)> {
        let Some(&global_max) = counts.iter().max() else {
            return Vec::new();
        };
        let threshold = global_max as f64 * self.ratio;
        let mut peaks: Vec<(usize, usize)> = counts
            .iter()
            .enumerate()
            .filter(|&(i, &c)| {
                let lo = i.saturating_sub(self.radius);
                let hi = i.saturating_add(self.radius).min(counts.len() - 1);
                c as f64 > threshold && counts[lo..=hi].iter().all(|&n| c >= n)
            })
            .map(|(i, &c)| (i, c))
            .collect();
        if peaks.len() > self.max_peaks {
            peaks.sort_by(|a, b| b.1.cmp(&a.1));
            peaks.truncate(self.max_peaks);
        }
        peaks
    }

    pub fn markers(&self, points: &[ChartPoint]) -> Vec<Highlight> {
        self.peaks(&counts(points))
            .into_iter()
            .map(|(i, _)| Highlight::from(&points[i]))
            .collect()
    }
}

impl Detector for PeakMarkerDetector {
    fn detect(&self, points: &[ChartPoint], interval: u64) -> Vec<Highlight> {
        let mut markers = self.markers(points);
        markers.sort_by_key(|h| h.timestamp);
        let mut spacing = Spacing::new(interval);
        markers.into_iter().for_each(|h| spacing.offer(h));
        spacing.finish()
    }
}

/// Selects one of the strategies at runtime.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HighlightDetector {
    MovingAverage(MovingAverageDetector),
    Surprise(SurpriseDetector),
    PeakMarker(PeakMarkerDetector),
}

impl Default for HighlightDetector {
    fn default() -> Self {
        HighlightDetector::MovingAverage(MovingAverageDetector::default())
    }
}

impl Detector for HighlightDetector {
    fn detect(&self, points: &[ChartPoint], interval: u64) -> Vec<Highlight> {
        let highlights = match self {
            HighlightDetector::MovingAverage(d) => d.detect(points, interval),
            HighlightDetector::Surprise(d) => d.detect(points, interval),
            HighlightDetector::PeakMarker(d) => d.detect(points, interval),
        };
        tracing::debug!(
            strategy = self.name(),
            highlights = highlights.len(),
            "highlight detection finished"
        );
        highlights
    }
}

impl HighlightDetector {
    pub fn name(&self) -> &'static str {
        match self {
            HighlightDetector::MovingAverage(_) => "moving-average",
            HighlightDetector::Surprise(_) => "surprise",
            HighlightDetector::PeakMarker(_) => "peak-marker",
        }
    }
}

fn counts(points: &[ChartPoint]) -> Vec<usize> {
    points.iter().map(|p| p.count).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(counts: &[usize], interval: u64) -> Vec<ChartPoint> {
        counts
            .iter()
            .enumerate()
            .map(|(i, &c)| ChartPoint::new(i as u64 * interval, c, vec![]))
            .collect()
    }

    #[test]
    fn quiet_chart_has_no_highlights() {
        let points = chart(&[0; 12], 60);
        assert!(MovingAverageDetector::default().detect(&points, 60).is_empty());
        assert!(SurpriseDetector::default().detect(&points, 60).is_empty());
        assert!(PeakMarkerDetector::default().detect(&points, 60).is_empty());
    }

    #[test]
    fn spike_over_baseline_is_accepted() {
        let points = chart(&[5, 5, 5, 5, 5, 50, 5, 5, 5, 5, 5], 60);
        let hs = MovingAverageDetector::default().detect(&points, 60);
        assert_eq!(hs, vec![Highlight { timestamp: 300, count: 50 }]);
    }

    #[test]
    fn min_count_gates_small_spikes() {
        // 10 is not > max(10, 0 * 2.5)
        let points = chart(&[0, 0, 10, 0, 0], 60);
        assert!(MovingAverageDetector::default().detect(&points, 60).is_empty());
        let points = chart(&[0, 0, 11, 0, 0], 60);
        assert_eq!(MovingAverageDetector::default().detect(&points, 60).len(), 1);
    }

    #[test]
    fn first_qualifying_wins() {
        // 20s windows: the larger spike 40s later is within 2 * 20s of the first
        let points = chart(&[1, 1, 60, 1, 90, 1, 1, 1], 20);
        let hs = MovingAverageDetector::default().detect(&points, 20);
        assert_eq!(hs, vec![Highlight { timestamp: 40, count: 60 }]);
    }

    #[test]
    fn spacing_uses_the_given_interval() {
        // both leading points qualify; 30s apart is inside 2 * 60s
        let mut points = vec![
            ChartPoint::new(0, 40, vec![]),
            ChartPoint::new(30, 50, vec![]),
        ];
        points.extend((0..5).map(|i| ChartPoint::new(90 + i * 60, 2, vec![])));
        let detector = MovingAverageDetector::default();
        assert!(detector.is_candidate(&counts(&points), 1));
        let hs = detector.detect(&points, 60);
        assert_eq!(hs, vec![Highlight { timestamp: 0, count: 40 }]);
    }

    #[test]
    fn spacing_boundary_is_exclusive() {
        let points = chart(&[0, 40, 0, 0, 40, 0, 0], 60);
        let hs = MovingAverageDetector::default().detect(&points, 60);
        // 60 and 240 are 180s apart (> 120s)
        assert_eq!(
            hs.iter().map(|h| h.timestamp).collect::<Vec<_>>(),
            vec![60, 240]
        );
        let points = chart(&[0, 40, 0, 40, 0], 60);
        let hs = MovingAverageDetector::default().detect(&points, 60);
        // 60 and 180 are exactly 120s apart
        assert_eq!(hs.len(), 1);
    }

    #[test]
    fn surprise_flags_spike() {
        let points = chart(&[5, 5, 5, 5, 5, 50, 5, 5, 5, 5, 5], 60);
        let hs = SurpriseDetector::default().detect(&points, 60);
        assert_eq!(hs, vec![Highlight { timestamp: 300, count: 50 }]);
        // ordinary noise around a high baseline is not surprising
        let points = chart(&[100, 104, 98, 101, 103, 99, 100], 60);
        assert!(SurpriseDetector::default().detect(&points, 60).is_empty());
    }

    #[test]
    fn peaks_suppress_neighbours() {
        let counts = [1, 10, 3, 2, 1, 9, 3, 2, 2, 1, 0, 0, 0, 8, 1];
        let peaks = PeakMarkerDetector::default().peaks(&counts);
        // 9 sits within 5 of 10; 8 at index 13 is clear of both
        assert_eq!(peaks, vec![(1, 10), (13, 8)]);
    }

    #[test]
    fn peaks_are_capped_by_value() {
        let mut counts = vec![0usize; 7 * 7];
        for (k, v) in [10, 12, 14, 16, 18, 20, 22].iter().enumerate() {
            counts[k * 7] = *v;
        }
        let peaks = PeakMarkerDetector::default().with_ratio(0.3).peaks(&counts);
        assert_eq!(peaks.len(), 5);
        assert_eq!(
            peaks.iter().map(|p| p.1).collect::<Vec<_>>(),
            vec![22, 20, 18, 16, 14]
        );
    }

    #[test]
    fn peak_strategy_respects_spacing() {
        // plateau: both windows are >= their neighbourhood
        let points = chart(&[0, 20, 20, 0, 0, 0, 0, 0], 60);
        let hs = PeakMarkerDetector::default().detect(&points, 60);
        assert_eq!(hs, vec![Highlight { timestamp: 60, count: 20 }]);
    }

    #[test]
    fn dispatch_names() {
        assert_eq!(HighlightDetector::default().name(), "moving-average");
        let d = HighlightDetector::PeakMarker(PeakMarkerDetector::default());
        assert_eq!(d.name(), "peak-marker");
    }
}
