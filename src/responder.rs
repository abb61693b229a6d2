//! Keyword-driven canned responses
//!
//! The [`ResponseSelector`] sorts a free-text message into a topical
//! [`Category`] by case-insensitive substring matching and picks one of the
//! category's pre-written replies at random. It is the leaf of the chat
//! pipeline and the fallback for the live completion path.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Topical bucket a message is sorted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Stress,
    Sadness,
    Anxiety,
    Loneliness,
    Default,
}

impl Category {
    /// Categories in match priority order; `Default` is never matched by keyword.
    pub const PRIORITY: [Category; 4] = [
        Category::Stress,
        Category::Sadness,
        Category::Anxiety,
        Category::Loneliness,
    ];

    /// Lower-case keyword fragments that select this category
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Category::Stress => &["stress", "overwhelm", "pressure"],
            Category::Sadness => &["sad", "depress", "down", "unhappy"],
            Category::Anxiety => &["anxious", "anxiety", "worry", "nervous", "fear"],
            Category::Loneliness => &["lonely", "alone", "isolated"],
            Category::Default => &[],
        }
    }

    /// The fixed replies for this category
    pub fn responses(self) -> &'static [&'static str] {
        match self {
            Category::Stress => STRESS_RESPONSES,
            Category::Sadness => SADNESS_RESPONSES,
            Category::Anxiety => ANXIETY_RESPONSES,
            Category::Loneliness => LONELINESS_RESPONSES,
            Category::Default => DEFAULT_RESPONSES,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Stress => "stress",
            Category::Sadness => "sadness",
            Category::Anxiety => "anxiety",
            Category::Loneliness => "loneliness",
            Category::Default => "default",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const STRESS_RESPONSES: &[&str] = &[
    "I understand you're feeling stressed. Would you like to talk about what's causing this?",
    "Stress can be overwhelming. Let's explore some coping strategies together.",
    "It's okay to feel stressed. Would you like to try some breathing exercises?",
    "That sounds like a lot to carry. What feels most pressing right now?",
    "Let's take this one step at a time. Which part feels most manageable to start with?",
    "When everything piles up, a short break can help. What usually helps you recharge?",
];

const SADNESS_RESPONSES: &[&str] = &[
    "I'm sorry you're feeling down. I'm here to listen whenever you want to share.",
    "Your feelings are valid, and it's okay to feel this way.",
    "That sounds really hard. Would you like to tell me more about what's been happening?",
    "Feeling low can be exhausting. Have you been able to rest or do something gentle for yourself?",
    "Thank you for telling me how you feel. What has been weighing on you the most?",
];

const ANXIETY_RESPONSES: &[&str] = &[
    "Anxiety can be challenging. Let's work through this together.",
    "I hear you're feeling anxious. Would you like to try some grounding techniques?",
    "It's okay to feel anxious. Let's explore what's triggering this feeling.",
    "Let's slow things down. Try breathing in for four counts, holding for four, and out for four.",
    "Worries can feel very real in the moment. What is the thought that keeps coming back?",
];

const LONELINESS_RESPONSES: &[&str] = &[
    "Feeling lonely is really hard. I'm glad you reached out.",
    "You're not alone in this conversation. Would you like to talk about what's been going on?",
    "Loneliness can hurt. Is there someone you've been meaning to reconnect with?",
    "I'm here with you right now. What would feel comforting at this moment?",
    "Many people feel isolated at times, and it says nothing bad about you. Want to tell me more?",
];

const DEFAULT_RESPONSES: &[&str] = &[
    "I'm here to listen. Can you tell me more about how you're feeling?",
    "That sounds difficult. Would you like to explore this further?",
    "I understand. How can I support you right now?",
    "Thank you for sharing. What else is on your mind today?",
    "I appreciate you opening up. How long have you been feeling this way?",
];

/// Classifies messages and picks canned replies
///
/// # Examples
///
/// ```
/// use mindwell::responder::{Category, ResponseSelector};
///
/// let selector = ResponseSelector::new();
/// assert_eq!(selector.classify("Work pressure is too much"), Category::Stress);
/// assert_eq!(selector.classify("Nice weather today"), Category::Default);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseSelector;

impl ResponseSelector {
    pub fn new() -> Self {
        Self
    }

    /// Returns the first category in priority order whose keyword occurs in
    /// the lower-cased message, or [`Category::Default`].
    pub fn classify(&self, message: &str) -> Category {
        let lowered = message.to_lowercase();
        Category::PRIORITY
            .into_iter()
            .find(|category| {
                category
                    .keywords()
                    .iter()
                    .any(|keyword| lowered.contains(keyword))
            })
            .unwrap_or(Category::Default)
    }

    /// Picks a reply for `category` uniformly at random from `rng`
    pub fn pick<R: Rng + ?Sized>(&self, category: Category, rng: &mut R) -> &'static str {
        let responses = category.responses();
        // Every category list is non-empty.
        responses.choose(rng).copied().unwrap_or(DEFAULT_RESPONSES[0])
    }

    /// Classifies `message` and returns one reply from the matched category
    pub fn classify_and_respond<R: Rng + ?Sized>(
        &self,
        message: &str,
        rng: &mut R,
    ) -> (Category, &'static str) {
        let category = self.classify(message);
        (category, self.pick(category, rng))
    }
}
