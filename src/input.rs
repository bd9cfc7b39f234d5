use crate::analysis::{AnalysisResult, Analyzer};
use crate::bucket::CommentEvent;
use crate::error::{Result, UpstreamError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A video's comment stream as handed over by the fetching side.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DanmakuFeed {
    /// Video length in seconds.
    pub duration: f64,
    #[serde(default)]
    pub danmaku: Vec<CommentEvent>,
}

impl DanmakuFeed {
    pub fn from_path(path: &Path) -> Result<Self, UpstreamError> {
        let file = File::open(path).map_err(|source| UpstreamError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let feed: DanmakuFeed =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| {
                UpstreamError::Decode {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
        tracing::debug!(
            path = %path.display(),
            duration = feed.duration,
            danmaku = feed.danmaku.len(),
            "loaded comment feed"
        );
        Ok(feed)
    }
}

/// Load a feed and analyze it. A feed that cannot be read or decoded is
/// reported as an upstream failure before any analysis runs.
pub fn analyze_path(analyzer: &Analyzer, path: &Path) -> Result<AnalysisResult> {
    let feed = DanmakuFeed::from_path(path)?;
    Ok(analyzer.analyze(&feed.danmaku, feed.duration))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_content_alias() {
        let feed: DanmakuFeed = serde_json::from_str(
            r#"{"duration": 90.5, "danmaku": [
                {"timestamp": 1.5, "content": "哈哈哈"},
                {"timestamp": 2.0, "text": "草"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(feed.duration, 90.5);
        assert_eq!(feed.danmaku[0], CommentEvent::new(1.5, "哈哈哈"));
        assert_eq!(feed.danmaku[1].text, "草");
    }

    #[test]
    fn missing_danmaku_is_empty() {
        let feed: DanmakuFeed = serde_json::from_str(r#"{"duration": 10}"#).unwrap();
        assert!(feed.danmaku.is_empty());
    }

    #[test]
    fn unreadable_feed_is_upstream_error() {
        let err = DanmakuFeed::from_path(Path::new("/nonexistent/feed.json")).unwrap_err();
        assert!(matches!(err, UpstreamError::Read { .. }));
    }

    #[test]
    fn malformed_feed_never_reaches_analysis() {
        let path = std::env::temp_dir().join(format!(
            "danmaku-spike-feed-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{"duration": 60, "danmaku": [{"timestamp": "#).unwrap();
        let err = analyze_path(&Analyzer::default(), &path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            err,
            crate::error::Error::Upstream(UpstreamError::Decode { .. })
        ));
    }
}
