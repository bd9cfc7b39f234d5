//! Canonicalisation of comment text into comparable tokens.
//!
//! A [`Normalizer`] is an ordered list of [`Rule`]s. Whole-text rules collapse
//! a comment into a canonical token when the trimmed text matches them
//! entirely; substitution rules rewrite matching runs in place. Whatever
//! survives the rules has its whitespace stripped.
//!
//! ```rust
//! use danmaku_spike::text::normalize;
//!
//! assert_eq!(normalize("哈哈哈哈哈"), "哈哈");
//! assert_eq!(normalize("caaaooo"), "草");
//! assert_eq!(normalize(" ab c "), "abc");
//! ```

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

pub const LAUGHTER: &str = "哈哈";
pub const CAO: &str = "草";

static STANDARD: Lazy<Normalizer> = Lazy::new(Normalizer::standard);

#[derive(Clone, Debug)]
pub enum Rule {
    /// Collapse the whole comment to `canonical` when `pattern` matches all of it.
    Whole { pattern: Regex, canonical: String },
    /// Replace every match of `pattern` with `replacement`.
    Substitute { pattern: Regex, replacement: String },
}

impl Rule {
    /// `pattern` is anchored to the full text.
    pub fn whole(pattern: &str, canonical: &str) -> Result<Self, regex::Error> {
        Self::anchored(pattern, canonical, false)
    }
    /// Like [`Rule::whole`], ignoring case.
    pub fn whole_ci(pattern: &str, canonical: &str) -> Result<Self, regex::Error> {
        Self::anchored(pattern, canonical, true)
    }
    fn anchored(pattern: &str, canonical: &str, ignore_case: bool) -> Result<Self, regex::Error> {
        Ok(Rule::Whole {
            pattern: RegexBuilder::new(&format!("^(?:{pattern})$"))
                .case_insensitive(ignore_case)
                .build()?,
            canonical: canonical.to_owned(),
        })
    }
    pub fn substitute(pattern: &str, replacement: &str) -> Result<Self, regex::Error> {
        Ok(Rule::Substitute {
            pattern: Regex::new(pattern)?,
            replacement: replacement.to_owned(),
        })
    }
}

/// Which built-in rule list a [`Normalizer`] starts from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NormalizerProfile {
    #[default]
    Standard,
    Extended,
}

#[derive(Clone, Debug)]
pub struct Normalizer {
    rules: Vec<Rule>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::standard()
    }
}

impl Normalizer {
    /// Empty rule list: only whitespace stripping applies.
    pub fn bare() -> Self {
        Self { rules: Vec::new() }
    }

    /// Laughter (`h+a+` in any case, `哈+`) and cao (`c+a+o+`, `草+`) collapsing.
    pub fn standard() -> Self {
        Self::bare()
            .with_rule(builtin(Rule::whole_ci("h+a+|哈+", LAUGHTER)))
            .with_rule(builtin(Rule::whole("c+a+o+|草+", CAO)))
    }

    /// Standard rules followed by in-text collapsing of common repeated runs.
    pub fn extended() -> Self {
        [
            ("哈{2,}", LAUGHTER),
            ("6{2,}", "66"),
            ("2{2,}3{2,}", "233"),
            ("[wW]{2,}", "ww"),
            ("草{2,}", CAO),
            ("艹{2,}", "艹"),
        ]
        .into_iter()
        .fold(Self::standard(), |n, (pattern, replacement)| {
            n.with_rule(builtin(Rule::substitute(pattern, replacement)))
        })
    }

    pub fn from_profile(profile: NormalizerProfile) -> Self {
        match profile {
            NormalizerProfile::Standard => Self::standard(),
            NormalizerProfile::Extended => Self::extended(),
        }
    }

    /// Append a rule; rules run in insertion order.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Map a comment to its canonical token. The result may be empty.
    pub fn normalize(&self, text: &str) -> String {
        let mut current = text.trim().to_owned();
        for rule in &self.rules {
            match rule {
                Rule::Whole { pattern, canonical } => {
                    if pattern.is_match(&current) {
                        return canonical.clone();
                    }
                }
                Rule::Substitute {
                    pattern,
                    replacement,
                } => {
                    current = pattern
                        .replace_all(&current, NoExpand(replacement))
                        .into_owned();
                }
            }
        }
        strip_whitespace(&current)
    }
}

// Built-in patterns are literals above; a failure here is a programming error.
fn builtin(rule: Result<Rule, regex::Error>) -> Rule {
    rule.unwrap_or_else(|e| panic!("invalid built-in normalizer rule: {e}"))
}

pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Normalize with the standard rule list.
pub fn normalize(text: &str) -> String {
    STANDARD.normalize(text)
}

static CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[oO]+[hH]*|[wW]+|666+|233+|前方高能|awsl|kksk|wsl|草|114514")
        .unwrap_or_else(|e| panic!("invalid call pattern: {e}"))
});
static LAUGH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[哈嗨]|h{2,}a+").unwrap_or_else(|e| panic!("invalid laughter pattern: {e}"))
});
static QUESTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?？]").unwrap_or_else(|e| panic!("invalid question pattern: {e}")));

/// Coarse reaction class of a comment. Unlike [`Normalizer`] rules these
/// search anywhere in the raw text, so mixed comments such as `"哈哈哈好笑"`
/// still count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CommentCategory {
    /// Cheers and memes: `awsl`, `666`, `233`, `前方高能`, `www`, ...
    Call,
    Laughter,
    Question,
}

impl CommentCategory {
    pub const ALL: [CommentCategory; 3] = [Self::Call, Self::Laughter, Self::Question];

    pub fn matches(self, text: &str) -> bool {
        let pattern = match self {
            Self::Call => &*CALL,
            Self::Laughter => &*LAUGH,
            Self::Question => &*QUESTION,
        };
        pattern.is_match(text)
    }
}
