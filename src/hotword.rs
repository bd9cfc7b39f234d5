//! Per-window hot word ranking.

use crate::bucket::Bucket;
use crate::dict::{Dictionary, OrderedDictionary};
use crate::text::Normalizer;
use serde::{Deserialize, Serialize};

/// A normalized token and how many comments in the window produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotWord {
    pub text: String,
    pub count: usize,
}

#[derive(Clone, Debug, Default)]
pub struct HotWordRanker {
    normalizer: Normalizer,
}

impl HotWordRanker {
    pub fn new(normalizer: Normalizer) -> Self {
        Self { normalizer }
    }

    /// Normalized token frequencies for the window; empty tokens are skipped.
    pub fn tally(&self, bucket: &Bucket<'_>) -> OrderedDictionary {
        let mut dict = OrderedDictionary::default();
        bucket
            .events
            .iter()
            .map(|e| self.normalizer.normalize(&e.text))
            .filter(|token| !token.is_empty())
            .for_each(|token| dict.observe(&token));
        dict
    }

    /// Top `top_k` tokens by count, ties broken by first appearance.
    pub fn rank(&self, bucket: &Bucket<'_>, top_k: usize) -> Vec<HotWord> {
        self.tally(bucket)
            .most_common(top_k)
            .into_iter()
            .map(|(text, count)| HotWord { text, count })
            .collect()
    }

    /// Chart projection: words only.
    pub fn hot_words(&self, bucket: &Bucket<'_>, top_k: usize) -> Vec<String> {
        self.rank(bucket, top_k).into_iter().map(|w| w.text).collect()
    }

    /// How many comments in the window normalize to exactly `token`.
    pub fn token_count(&self, bucket: &Bucket<'_>, token: &str) -> usize {
        bucket
            .events
            .iter()
            .filter(|e| self.normalizer.normalize(&e.text) == token)
            .count()
    }
}
