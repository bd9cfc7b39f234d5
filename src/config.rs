//! Deployment-level analysis settings.

use crate::error::ConfigError;
use crate::spike::{
    HighlightDetector, MovingAverageDetector, PeakMarkerDetector, SurpriseDetector, min_spacing,
};
use crate::text::{Normalizer, NormalizerProfile};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum HighlightStrategy {
    #[default]
    MovingAverage,
    Surprise,
    PeakMarker,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Width of each chart window, in seconds.
    pub interval_seconds: u64,
    pub threshold_multiplier: f64,
    /// A window needs strictly more comments than this to be a highlight.
    pub min_count: usize,
    /// Windows on each side averaged into the baseline.
    pub baseline_radius: usize,
    pub hot_words_per_bucket: usize,
    pub summary_words: usize,
    pub strategy: HighlightStrategy,
    pub normalizer: NormalizerProfile,
    /// Attach chart-marker peaks to the result.
    pub peak_markers: bool,
    /// Fraction of the global maximum a marker peak must exceed.
    pub peak_ratio: f64,
    pub peak_radius: usize,
    pub max_peak_markers: usize,
    /// `-ln P` cutoff for the surprise strategy.
    pub min_surprise: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 60,
            threshold_multiplier: 2.5,
            min_count: 10,
            baseline_radius: 5,
            hot_words_per_bucket: 5,
            summary_words: 3,
            strategy: HighlightStrategy::MovingAverage,
            normalizer: NormalizerProfile::Standard,
            peak_markers: false,
            peak_ratio: 0.6,
            peak_radius: 5,
            max_peak_markers: 5,
            min_surprise: 6.0,
        }
    }
}

impl AnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config: AnalysisConfig =
            toml::from_str(&raw).map_err(|e| ConfigError::parse(path, e))?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded analysis config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_seconds == 0 {
            return Err(ConfigError::invalid(
                "interval_seconds",
                "must be greater than 0",
            ));
        }
        for (field, value) in [
            ("threshold_multiplier", self.threshold_multiplier),
            ("peak_ratio", self.peak_ratio),
            ("min_surprise", self.min_surprise),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be a finite, non-negative number (got {value})"),
                ));
            }
        }
        if self.peak_ratio > 1.0 {
            return Err(ConfigError::invalid("peak_ratio", "must not exceed 1.0"));
        }
        if self.hot_words_per_bucket == 0 {
            return Err(ConfigError::invalid(
                "hot_words_per_bucket",
                "must be at least 1",
            ));
        }
        if self.summary_words == 0 {
            return Err(ConfigError::invalid("summary_words", "must be at least 1"));
        }
        Ok(())
    }

    pub fn min_highlight_spacing(&self) -> u64 {
        min_spacing(self.interval_seconds)
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::from_profile(self.normalizer)
    }

    pub fn peak_detector(&self) -> PeakMarkerDetector {
        PeakMarkerDetector::default()
            .with_ratio(self.peak_ratio)
            .with_radius(self.peak_radius)
            .with_max_peaks(self.max_peak_markers)
    }

    pub fn detector(&self) -> HighlightDetector {
        match self.strategy {
            HighlightStrategy::MovingAverage => HighlightDetector::MovingAverage(
                MovingAverageDetector::default()
                    .with_threshold(self.threshold_multiplier, self.min_count)
                    .with_radius(self.baseline_radius),
            ),
            HighlightStrategy::Surprise => HighlightDetector::Surprise(
                SurpriseDetector::default()
                    .with_threshold(self.min_surprise, self.min_count)
                    .with_radius(self.baseline_radius),
            ),
            HighlightStrategy::PeakMarker => HighlightDetector::PeakMarker(self.peak_detector()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_highlight_spacing(), 120);
        assert_eq!(config.detector().name(), "moving-average");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: AnalysisConfig = toml::from_str(
            r#"
            interval_seconds = 30
            strategy = "peak-marker"
            normalizer = "extended"
            "#,
        )
        .unwrap();
        assert_eq!(config.interval_seconds, 30);
        assert_eq!(config.strategy, HighlightStrategy::PeakMarker);
        assert_eq!(config.normalizer, NormalizerProfile::Extended);
        assert_eq!(config.min_count, 10);
        assert_eq!(config.detector().name(), "peak-marker");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let parsed = toml::from_str::<AnalysisConfig>("intervall_seconds = 30");
        assert!(parsed.is_err());
    }

    #[test]
    fn rejects_bad_values() {
        let bad = AnalysisConfig {
            interval_seconds: 0,
            ..Default::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::Invalid {
                field: "interval_seconds",
                ..
            })
        ));
        let bad = AnalysisConfig {
            threshold_multiplier: f64::NAN,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = AnalysisConfig {
            peak_ratio: 1.5,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let path = std::env::temp_dir().join(format!(
            "danmaku-spike-config-{}.toml",
            std::process::id()
        ));
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "min_count = 3\npeak_markers = true").unwrap();
        let config = AnalysisConfig::from_file(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.min_count, 3);
        assert!(config.peak_markers);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = AnalysisConfig::from_file(Path::new("/nonexistent/danmaku.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
