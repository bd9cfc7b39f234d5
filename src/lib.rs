pub mod analysis;
pub mod baseline;
pub mod bucket;
pub mod config;
pub mod dict;
pub mod error;
pub mod hotword;
pub mod input;
pub mod logging;
pub mod math;
pub mod spike;
pub mod text;

pub use analysis::{AnalysisResult, Analyzer, ChartPoint, analyze, search};
pub use bucket::CommentEvent;
pub use config::{AnalysisConfig, HighlightStrategy};
pub use spike::{Detector, Highlight, HighlightDetector};
pub use text::CommentCategory;
