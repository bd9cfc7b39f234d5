//! The bucketing → ranking → detection pipeline.
//!
//! Each stage builds a fresh sequence from the previous one; nothing is
//! shared between calls, so an [`Analyzer`] can serve concurrent requests.

use crate::bucket::{Bucket, CommentEvent, aggregate};
use crate::config::AnalysisConfig;
use crate::error::{ConfigError, Result};
use crate::hotword::{HotWord, HotWordRanker};
use crate::spike::{Detector, Highlight, HighlightDetector, PeakMarkerDetector};
use crate::text::CommentCategory;
use serde::{Deserialize, Serialize};

/// One chart sample per window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    /// Window start, in seconds.
    pub time: u64,
    /// `time` as `HH:MM:SS`.
    pub display_time: String,
    pub count: usize,
    pub hot_words: Vec<String>,
}

impl ChartPoint {
    pub fn new(time: u64, count: usize, hot_words: Vec<String>) -> Self {
        Self {
            time,
            display_time: display_time(time),
            count,
            hot_words,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub chart_data: Vec<ChartPoint>,
    pub highlights: Vec<Highlight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_markers: Option<Vec<Highlight>>,
}

impl AnalysisResult {
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let s = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(s)
    }
}

/// Top words with counts for one window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketSummary {
    pub time: u64,
    pub display_time: String,
    pub popular: Vec<HotWord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub second: u64,
    pub text: String,
}

/// `HH:MM:SS`; hours are not wrapped.
pub fn display_time(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

#[derive(Clone, Debug)]
pub struct Analyzer {
    config: AnalysisConfig,
    ranker: HotWordRanker,
    detector: HighlightDetector,
    markers: PeakMarkerDetector,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::from_valid(AnalysisConfig::default())
    }
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: AnalysisConfig) -> Self {
        Self {
            ranker: HotWordRanker::new(config.normalizer()),
            detector: config.detector(),
            markers: config.peak_detector(),
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn buckets<'a>(&self, events: &'a [CommentEvent], duration: f64) -> Vec<Bucket<'a>> {
        if !(duration > 0.0) {
            tracing::warn!(duration, "non-positive duration, nothing to analyze");
        }
        aggregate(events, duration, self.config.interval_seconds)
    }

    pub fn chart(&self, buckets: &[Bucket<'_>]) -> Vec<ChartPoint> {
        buckets
            .iter()
            .map(|b| {
                ChartPoint::new(
                    b.start_time,
                    b.count(),
                    self.ranker.hot_words(b, self.config.hot_words_per_bucket),
                )
            })
            .collect()
    }

    pub fn highlights(&self, chart: &[ChartPoint]) -> Vec<Highlight> {
        self.detector.detect(chart, self.config.interval_seconds)
    }

    pub fn analyze(&self, events: &[CommentEvent], duration: f64) -> AnalysisResult {
        let buckets = self.buckets(events, duration);
        let chart_data = self.chart(&buckets);
        let highlights = self.highlights(&chart_data);
        let peak_markers = self
            .config
            .peak_markers
            .then(|| self.markers.markers(&chart_data));
        tracing::info!(
            events = events.len(),
            buckets = chart_data.len(),
            highlights = highlights.len(),
            "analysis complete"
        );
        AnalysisResult {
            chart_data,
            highlights,
            peak_markers,
        }
    }

    /// Per-window top `summary_words` with counts.
    pub fn summary(&self, events: &[CommentEvent], duration: f64) -> Vec<BucketSummary> {
        self.buckets(events, duration)
            .iter()
            .map(|b| BucketSummary {
                time: b.start_time,
                display_time: display_time(b.start_time),
                popular: self.ranker.rank(b, self.config.summary_words),
            })
            .collect()
    }

    /// Per-window count of comments normalizing to exactly `token`.
    pub fn token_density(&self, events: &[CommentEvent], duration: f64, token: &str) -> Vec<usize> {
        self.buckets(events, duration)
            .iter()
            .map(|b| self.ranker.token_count(b, token))
            .collect()
    }

    /// Per-window count of comments whose raw text falls in `category`.
    pub fn category_density(
        &self,
        events: &[CommentEvent],
        duration: f64,
        category: CommentCategory,
    ) -> Vec<usize> {
        self.buckets(events, duration)
            .iter()
            .map(|b| b.events.iter().filter(|e| category.matches(&e.text)).count())
            .collect()
    }
}

/// Analyze with the default configuration.
pub fn analyze(events: &[CommentEvent], duration: f64) -> AnalysisResult {
    Analyzer::default().analyze(events, duration)
}

/// Comments whose raw text contains `query`, by playback second.
pub fn search(events: &[CommentEvent], query: &str) -> Vec<SearchHit> {
    if query.is_empty() {
        return Vec::new();
    }
    let mut hits: Vec<SearchHit> = events
        .iter()
        .filter(|e| e.timestamp.is_finite() && e.timestamp >= 0.0)
        .filter(|e| e.text.contains(query))
        .map(|e| SearchHit {
            second: e.timestamp.floor() as u64,
            text: e.text.clone(),
        })
        .collect();
    hits.sort_by_key(|h| h.second);
    hits
}
