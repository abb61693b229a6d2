//! Word-list sentiment scoring
//!
//! A deliberately small lexicon scorer: each whole word found in the positive
//! list adds one point, each negative word subtracts one, and the total is
//! scaled by 1/10 and clamped to `[-1, 1]`.

use crate::error::{MindwellError, Result};
use serde::Serialize;

const POSITIVE_WORDS: &[&str] = &["happy", "good", "great", "love", "joy", "peace"];
const NEGATIVE_WORDS: &[&str] = &["sad", "bad", "terrible", "hate", "angry", "anxious"];

/// Polarity of a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    fn from_score(score: f64) -> Self {
        if score > 0.0 {
            SentimentLabel::Positive
        } else if score < 0.0 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

/// Breakdown returned alongside the raw score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentAnalysis {
    pub score: f64,
    pub magnitude: f64,
    pub label: SentimentLabel,
}

/// Result of scoring one text
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentReport {
    pub sentiment: f64,
    pub analysis: SentimentAnalysis,
}

/// Score `text` in `[-1, 1]`
///
/// # Examples
///
/// ```
/// use mindwell::sentiment::score;
///
/// assert_eq!(score("what a great and happy day"), 0.2);
/// assert_eq!(score("nothing to report"), 0.0);
/// ```
pub fn score(text: &str) -> f64 {
    let total: i64 = text
        .to_lowercase()
        .split_whitespace()
        .map(|word| {
            let mut points = 0;
            if POSITIVE_WORDS.contains(&word) {
                points += 1;
            }
            if NEGATIVE_WORDS.contains(&word) {
                points -= 1;
            }
            points
        })
        .sum();
    (total as f64 / 10.0).clamp(-1.0, 1.0)
}

/// Score `text` and describe the result
///
/// # Errors
///
/// Returns `MindwellError::Validation` on `text` if it is empty
pub fn analyze(text: &str) -> Result<SentimentReport> {
    if text.is_empty() {
        return Err(MindwellError::invalid("text", "must not be empty").into());
    }
    let sentiment = score(text);
    Ok(SentimentReport {
        sentiment,
        analysis: SentimentAnalysis {
            score: sentiment,
            magnitude: sentiment.abs(),
            label: SentimentLabel::from_score(sentiment),
        },
    })
}
