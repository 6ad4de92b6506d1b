use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The persona the engine role-plays during a session.
///
/// `personality` is free text made of comma-separated trait words. The engine
/// never parses it into a closed set; it only checks whether a trait occurs
/// as a substring, so descriptors like "data-driven, skeptical" keep working
/// when new traits are introduced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CustomerProfile {
    pub name: String,
    pub company: String,
    pub role_title: String,
    pub budget: String,
    #[serde(default)]
    pub pain_points: Vec<String>,
    #[serde(default)]
    pub personality: String,
}

impl CustomerProfile {
    /// Case-insensitive substring check against the personality descriptor.
    pub fn has_trait(&self, trait_word: &str) -> bool {
        self.personality
            .to_lowercase()
            .contains(&trait_word.to_lowercase())
    }

    /// Returns true if any of the given trait words occurs in the descriptor.
    pub fn has_any_trait(&self, trait_words: &[&str]) -> bool {
        trait_words.iter().any(|t| self.has_trait(t))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// A named customer situation with a fixed opening line and objectives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub customer_profile: CustomerProfile,
    pub opening_message: String,
    #[serde(default)]
    pub objectives: Vec<String>,
}
