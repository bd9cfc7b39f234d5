use serde::{Deserialize, Serialize};

/// A single timestamped comment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommentEvent {
    /// Seconds from the start of playback.
    pub timestamp: f64,
    #[serde(alias = "content")]
    pub text: String,
}

impl CommentEvent {
    pub fn new(timestamp: f64, text: impl Into<String>) -> Self {
        Self {
            timestamp,
            text: text.into(),
        }
    }
}

/// Events falling in `[start_time, start_time + interval)`, in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub struct Bucket<'a> {
    pub index: usize,
    pub start_time: u64,
    pub events: Vec<&'a CommentEvent>,
}

impl Bucket<'_> {
    pub fn count(&self) -> usize {
        self.events.len()
    }
}

/// Upper bound on windows per analysis, about two years of one-minute windows.
pub const MAX_INTERVALS: usize = 1 << 20;

/// Number of windows covering `[0, duration)`; zero for non-positive or
/// non-finite durations. Capped at [`MAX_INTERVALS`], in which case comments
/// past the last window are dropped.
pub fn num_intervals(duration: f64, interval: u64) -> usize {
    if interval == 0 || !duration.is_finite() || duration <= 0.0 {
        return 0;
    }
    let n = (duration / interval as f64).ceil();
    if n > MAX_INTERVALS as f64 {
        tracing::warn!(
            duration,
            interval,
            max = MAX_INTERVALS,
            "duration needs too many windows, truncating"
        );
        return MAX_INTERVALS;
    }
    n as usize
}

/// Window index of a timestamp, or `None` for malformed timestamps.
pub fn bucket_index(timestamp: f64, interval: u64) -> Option<usize> {
    if interval == 0 || !timestamp.is_finite() || timestamp < 0.0 {
        return None;
    }
    Some((timestamp / interval as f64).floor() as usize)
}

/// Partition `events` into `num_intervals(duration, interval)` windows.
///
/// Every window is present even when empty. Events with malformed
/// timestamps, or at or past `duration`, are dropped.
pub fn aggregate(events: &[CommentEvent], duration: f64, interval: u64) -> Vec<Bucket<'_>> {
    let n = num_intervals(duration, interval);
    let mut buckets: Vec<Bucket> = (0..n)
        .map(|index| Bucket {
            index,
            start_time: index as u64 * interval,
            events: Vec::new(),
        })
        .collect();
    let mut dropped = 0usize;
    for event in events {
        let slot = bucket_index(event.timestamp, interval)
            .filter(|_| event.timestamp < duration)
            .and_then(|i| buckets.get_mut(i));
        match slot {
            Some(bucket) => bucket.events.push(event),
            None => dropped += 1,
        }
    }
    tracing::debug!(
        buckets = n,
        events = events.len(),
        dropped,
        "aggregated comment events"
    );
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(ts: &[f64]) -> Vec<CommentEvent> {
        ts.iter()
            .enumerate()
            .map(|(i, t)| CommentEvent::new(*t, format!("c{i}")))
            .collect()
    }

    #[test]
    fn interval_count_rounds_up() {
        assert_eq!(num_intervals(180.0, 60), 3);
        assert_eq!(num_intervals(181.0, 60), 4);
        assert_eq!(num_intervals(0.5, 60), 1);
        assert_eq!(num_intervals(0.0, 60), 0);
        assert_eq!(num_intervals(-3.0, 60), 0);
        assert_eq!(num_intervals(f64::NAN, 60), 0);
        assert_eq!(num_intervals(f64::INFINITY, 60), 0);
    }

    #[test]
    fn routes_by_floor() {
        let evs = events(&[10., 15., 20., 70., 75., 200.]);
        let buckets = aggregate(&evs, 180.0, 60);
        let counts: Vec<_> = buckets.iter().map(Bucket::count).collect();
        assert_eq!(counts, vec![3, 2, 0]);
        assert_eq!(
            buckets.iter().map(|b| b.start_time).collect::<Vec<_>>(),
            vec![0, 60, 120]
        );
        for b in &buckets {
            for e in &b.events {
                assert_eq!(bucket_index(e.timestamp, 60), Some(b.index));
            }
        }
    }

    #[test]
    fn drops_malformed() {
        let evs = events(&[-1.0, f64::NAN, f64::INFINITY, 59.999, 60.0, 99.5, 100.0, 119.0]);
        let buckets = aggregate(&evs, 100.0, 60);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].count(), 1);
        // 100.0 and 119.0 fall inside the last window but past the duration
        assert_eq!(buckets[1].count(), 2);
    }

    #[test]
    fn keeps_arrival_order() {
        let evs = vec![
            CommentEvent::new(30.0, "b"),
            CommentEvent::new(5.0, "a"),
            CommentEvent::new(30.0, "c"),
        ];
        let buckets = aggregate(&evs, 60.0, 60);
        let texts: Vec<_> = buckets[0].events.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["b", "a", "c"]);
    }

    #[test]
    fn zero_duration_is_empty() {
        let evs = events(&[1.0, 2.0]);
        assert!(aggregate(&evs, 0.0, 60).is_empty());
    }

    #[test]
    fn huge_duration_is_capped() {
        assert_eq!(num_intervals(1e15, 60), MAX_INTERVALS);
        assert_eq!(num_intervals(f64::MAX, 1), MAX_INTERVALS);
        let evs = events(&[30.0, 1e14]);
        let buckets = aggregate(&evs, 1e15, 60);
        assert_eq!(buckets.len(), MAX_INTERVALS);
        assert_eq!(buckets[0].count(), 1);
        let total: usize = buckets.iter().map(Bucket::count).sum();
        assert_eq!(total, 1);
    }
}
