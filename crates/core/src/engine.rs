//! Conversation Engine
//!
//! Rule-based customer replies. An utterance is classified into exactly one
//! reply pool by keyword, checked in a fixed priority order (pricing, features,
//! timeline, competitors); the first category that matches wins. Only the
//! choice of a line inside the pool is random.

use crate::{
    profile::CustomerProfile,
    random::RandomSource,
    session::ConversationMessage,
};
use serde::Serialize;

const PRICING_CUES: &[&str] = &["price", "cost", "budget"];
const FEATURE_CUES: &[&str] = &["feature", "integration", "technical", "functionality"];
const TIMELINE_CUES: &[&str] = &["when", "timeline", "implement"];
const COMPETITOR_CUES: &[&str] = &["competitor", "alternative", "compare"];

const COST_SENSITIVE_TRAITS: &[&str] = &["cost concerns", "cost-conscious", "price-sensitive", "frugal"];
const TECHNICAL_TRAITS: &[&str] = &["technical"];

const COST_SKEPTICAL: &[&str] = &[
    "Price is definitely a concern for us. We need to see clear ROI before committing to any increase.",
    "I've been asked to reduce costs across the board. Can you work with our current budget?",
    "We're comparing several options right now, and cost is a major factor in our decision.",
];

const BUDGET_CURIOUS: &[&str] = &[
    "Our budget is around {budget}. What options do you have in that range?",
    "Cost is important, but we're more focused on value and ROI.",
    "I need to understand the total cost of ownership, including implementation and training.",
];

const TECHNICAL_DETAIL: &[&str] = &[
    "I need detailed technical specifications. What APIs do you support?",
    "How does this integrate with our existing systems? We use Salesforce and HubSpot.",
    "Our team is very technical. Can you show us the developer documentation?",
];

const VALUE_FRAMING: &[&str] = &[
    "What specific features would help with our main challenges?",
    "How easy is it for non-technical users to adopt this?",
    "Can you walk me through how this would work for our use case?",
];

const TIMELINE: &[&str] = &[
    "We're looking to make a decision by the end of this quarter.",
    "How long does implementation typically take?",
    "What's the timeline for getting our team trained and up to speed?",
];

const COMPETITIVE: &[&str] = &[
    "We're also looking at another vendor. How do you differentiate?",
    "What makes your solution better than the alternatives?",
    "I've heard good things about a competing platform. Why should we choose you?",
];

const GENERIC_FALLBACK: &[&str] = &[
    "That's interesting. Tell me more about how that would work.",
    "I need to think about that. What else can you show me?",
    "That sounds good in theory, but how does it work in practice?",
    "Can you give me a specific example of how that's helped other companies like ours?",
];

/// Personality trait → extra fallback lines.
const PERSONALITY_SETS: &[(&str, &[&str])] = &[
    (
        "skeptical",
        &[
            "I've heard promises like this before. What proof do you have?",
            "How do I know this will actually work for our specific situation?",
            "What guarantees do you offer if this doesn't deliver the results you're promising?",
        ],
    ),
    (
        "busy",
        &[
            "I only have a few minutes. Can you give me the key points?",
            "Cut to the chase - what's the bottom line here?",
            "I need to see clear value quickly. What's your strongest case study?",
        ],
    ),
    (
        "frustrated",
        &[
            "Honestly, we've had a rough experience so far. Why would this time be different?",
            "I need you to understand the pressure I'm under here.",
        ],
    ),
    (
        "data-driven",
        &[
            "Do you have numbers to back that up?",
            "What metrics have your other customers actually improved?",
        ],
    ),
];

/// Fixed phrasing for well-known pain-point tags.
const PAIN_POINT_LINES: &[(&str, &str)] = &[
    ("low adoption", "Our biggest challenge is getting the team to actually use new tools."),
    ("manual processes", "We're spending way too much time on manual tasks that should be automated."),
    ("scalability issues", "Our current system can't handle our growth. We need something that scales."),
    ("integration complexity", "Every new tool creates more complexity. We need something that plays well with our stack."),
];

/// The reply set an utterance was classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyPool {
    CostSkeptical,
    BudgetCurious,
    TechnicalDetail,
    ValueFraming,
    Timeline,
    Competitive,
    Fallback,
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn pain_point_line(tag: &str) -> String {
    PAIN_POINT_LINES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(tag))
        .map(|(_, line)| line.to_string())
        .unwrap_or_else(|| format!("We're really struggling with {}.", tag))
}

fn lines(pool: &[&str]) -> Vec<String> {
    pool.iter().map(|l| l.to_string()).collect()
}

/// Stateless reply generator. History is accepted so callers can hand over
/// the running conversation, but classification only looks at the current
/// utterance.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConversationEngine;

impl ConversationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Classifies `utterance` for `profile`. First matching rule wins.
    pub fn classify(&self, utterance: &str, profile: &CustomerProfile) -> ReplyPool {
        let text = utterance.to_lowercase();

        if contains_any(&text, PRICING_CUES) {
            if profile.has_any_trait(COST_SENSITIVE_TRAITS) {
                ReplyPool::CostSkeptical
            } else {
                ReplyPool::BudgetCurious
            }
        } else if contains_any(&text, FEATURE_CUES) {
            if profile.has_any_trait(TECHNICAL_TRAITS) {
                ReplyPool::TechnicalDetail
            } else {
                ReplyPool::ValueFraming
            }
        } else if contains_any(&text, TIMELINE_CUES) {
            ReplyPool::Timeline
        } else if contains_any(&text, COMPETITOR_CUES) {
            ReplyPool::Competitive
        } else {
            ReplyPool::Fallback
        }
    }

    /// Every line the given pool can produce for `profile`, in a stable order.
    pub fn candidates(&self, pool: ReplyPool, profile: &CustomerProfile) -> Vec<String> {
        match pool {
            ReplyPool::CostSkeptical => lines(COST_SKEPTICAL),
            ReplyPool::BudgetCurious => BUDGET_CURIOUS
                .iter()
                .map(|l| l.replace("{budget}", &profile.budget))
                .collect(),
            ReplyPool::TechnicalDetail => lines(TECHNICAL_DETAIL),
            ReplyPool::ValueFraming => lines(VALUE_FRAMING),
            ReplyPool::Timeline => lines(TIMELINE),
            ReplyPool::Competitive => lines(COMPETITIVE),
            ReplyPool::Fallback => {
                let mut pool: Vec<String> = PERSONALITY_SETS
                    .iter()
                    .filter(|(trait_word, _)| profile.has_trait(trait_word))
                    .flat_map(|(_, set)| set.iter().map(|l| l.to_string()))
                    .collect();
                pool.extend(profile.pain_points.iter().map(|p| pain_point_line(p)));
                pool.extend(lines(GENERIC_FALLBACK));
                pool
            }
        }
    }

    /// Produces the customer's reply to `utterance`.
    pub fn reply(
        &self,
        utterance: &str,
        profile: &CustomerProfile,
        _history: &[ConversationMessage],
        rng: &mut dyn RandomSource,
    ) -> String {
        let pool = self.classify(utterance, profile);
        let mut candidates = self.candidates(pool, profile);
        let index = rng.next_index(candidates.len());
        tracing::debug!(?pool, candidates = candidates.len(), index, "Selected reply");
        candidates.swap_remove(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::seeded;

    fn profile(personality: &str, pain_points: &[&str]) -> CustomerProfile {
        CustomerProfile {
            name: "Sarah Chen".into(),
            company: "TechCorp Industries".into(),
            role_title: "VP of Operations".into(),
            budget: "$150K".into(),
            pain_points: pain_points.iter().map(|p| p.to_string()).collect(),
            personality: personality.into(),
        }
    }

    #[test]
    fn test_pricing_with_cost_sensitive_personality() {
        let engine = ConversationEngine::new();
        let p = profile("cost concerns", &[]);
        assert_eq!(engine.classify("What's the price?", &p), ReplyPool::CostSkeptical);

        let first = engine.reply("What's the price?", &p, &[], &mut seeded(11));
        let second = engine.reply("What's the price?", &p, &[], &mut seeded(11));
        assert_eq!(first, second);
        assert!(COST_SKEPTICAL.contains(&first.as_str()));
    }

    #[test]
    fn test_pricing_without_cost_trait_mentions_budget() {
        let engine = ConversationEngine::new();
        let p = profile("busy", &[]);
        assert_eq!(engine.classify("what does it COST", &p), ReplyPool::BudgetCurious);
        let candidates = engine.candidates(ReplyPool::BudgetCurious, &p);
        assert_eq!(
            candidates[0],
            "Our budget is around $150K. What options do you have in that range?"
        );
    }

    #[test]
    fn test_feature_branch_depends_on_technical_trait() {
        let engine = ConversationEngine::new();
        assert_eq!(
            engine.classify("Tell me about the integration", &profile("technical, cautious", &[])),
            ReplyPool::TechnicalDetail
        );
        assert_eq!(
            engine.classify("Tell me about the integration", &profile("busy", &[])),
            ReplyPool::ValueFraming
        );
    }

    #[test]
    fn test_timeline_and_competitor_cues() {
        let engine = ConversationEngine::new();
        let p = profile("", &[]);
        assert_eq!(engine.classify("When could you start?", &p), ReplyPool::Timeline);
        assert_eq!(
            engine.classify("What about your competitor?", &p),
            ReplyPool::Competitive
        );
        assert_eq!(engine.classify("Hello there", &p), ReplyPool::Fallback);
    }

    #[test]
    fn test_priority_order_breaks_ties() {
        let engine = ConversationEngine::new();
        let p = profile("technical", &[]);
        assert_eq!(
            engine.classify("What's the price and the timeline?", &p),
            ReplyPool::BudgetCurious
        );
        assert_eq!(
            engine.classify("Compare the features to the alternative", &p),
            ReplyPool::TechnicalDetail
        );
        assert_eq!(
            engine.classify("When can we compare vendors?", &p),
            ReplyPool::Timeline
        );
    }

    #[test]
    fn test_fallback_unions_personality_pain_points_and_generic() {
        let engine = ConversationEngine::new();
        let p = profile("busy, skeptical", &["manual processes", "vendor lock-in"]);
        let pool = engine.candidates(ReplyPool::Fallback, &p);

        assert_eq!(pool.len(), 3 + 3 + 2 + GENERIC_FALLBACK.len());
        assert!(pool.contains(&"I've heard promises like this before. What proof do you have?".to_string()));
        assert!(pool.contains(&"Cut to the chase - what's the bottom line here?".to_string()));
        assert!(pool.contains(
            &"We're spending way too much time on manual tasks that should be automated.".to_string()
        ));
        assert!(pool.contains(&"We're really struggling with vendor lock-in.".to_string()));
        for line in GENERIC_FALLBACK {
            assert!(pool.contains(&line.to_string()));
        }
    }

    #[test]
    fn test_fallback_without_traits_is_generic_only() {
        let engine = ConversationEngine::new();
        let pool = engine.candidates(ReplyPool::Fallback, &profile("calm", &[]));
        assert_eq!(pool, lines(GENERIC_FALLBACK));
    }

    #[test]
    fn test_reply_ignores_history() {
        let engine = ConversationEngine::new();
        let p = profile("skeptical", &["low adoption"]);
        let history = vec![
            ConversationMessage::new(crate::session::Sender::Ai, "Hi"),
            ConversationMessage::new(crate::session::Sender::User, "What's the price?"),
        ];
        let with_history = engine.reply("Hmm", &p, &history, &mut seeded(3));
        let without_history = engine.reply("Hmm", &p, &[], &mut seeded(3));
        assert_eq!(with_history, without_history);
    }
}
