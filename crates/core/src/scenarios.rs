//! Scenarios shipped with the service, keyed by trainee role.

use crate::profile::{CustomerProfile, Difficulty, Scenario};

fn profile(
    name: &str,
    company: &str,
    role_title: &str,
    budget: &str,
    pain_points: &[&str],
    personality: &str,
) -> CustomerProfile {
    CustomerProfile {
        name: name.to_string(),
        company: company.to_string(),
        role_title: role_title.to_string(),
        budget: budget.to_string(),
        pain_points: pain_points.iter().map(|p| p.to_string()).collect(),
        personality: personality.to_string(),
    }
}

fn objectives(items: &[&str]) -> Vec<String> {
    items.iter().map(|o| o.to_string()).collect()
}

/// The built-in catalog content as `(role, scenarios)` pairs.
pub fn builtin_scenarios() -> Vec<(String, Vec<Scenario>)> {
    vec![
        (
            "AE".to_string(),
            vec![
                Scenario {
                    id: "ae_enterprise_renewal".to_string(),
                    title: "Enterprise Contract Renewal".to_string(),
                    difficulty: Difficulty::Intermediate,
                    customer_profile: profile(
                        "Sarah Chen",
                        "TechCorp Industries",
                        "VP of Operations",
                        "$150K",
                        &["cost concerns", "feature gaps", "competitor interest"],
                        "analytical, data-driven, skeptical",
                    ),
                    opening_message: "Hi there, I wanted to discuss our contract renewal. I've been reviewing our costs and I'm not sure we're getting the value we expected from your platform.".to_string(),
                    objectives: objectives(&["Address cost concerns", "Highlight ROI", "Secure renewal"]),
                },
                Scenario {
                    id: "ae_new_enterprise".to_string(),
                    title: "New Enterprise Prospect".to_string(),
                    difficulty: Difficulty::Advanced,
                    customer_profile: profile(
                        "Michael Rodriguez",
                        "GlobalTech Solutions",
                        "CTO",
                        "$300K",
                        &["scalability issues", "integration complexity", "team productivity"],
                        "technical, detail-oriented, cautious",
                    ),
                    opening_message: "We're evaluating solutions for our growing team. I've heard good things about your platform, but I need to understand how it would integrate with our existing tech stack.".to_string(),
                    objectives: objectives(&[
                        "Understand technical requirements",
                        "Demo integration capabilities",
                        "Move to next stage",
                    ]),
                },
            ],
        ),
        (
            "SDR".to_string(),
            vec![Scenario {
                id: "sdr_cold_outreach".to_string(),
                title: "Cold Outreach - SaaS Startup".to_string(),
                difficulty: Difficulty::Beginner,
                customer_profile: profile(
                    "Alex Thompson",
                    "StartupFlow",
                    "Founder",
                    "$25K",
                    &["manual processes", "time management", "scaling challenges"],
                    "busy, results-focused, open to innovation",
                ),
                opening_message: "I got your message about improving our workflow processes. We're pretty busy scaling right now - what exactly are you proposing?".to_string(),
                objectives: objectives(&[
                    "Qualify budget and timeline",
                    "Identify pain points",
                    "Schedule demo",
                ]),
            }],
        ),
        (
            "BDR".to_string(),
            vec![Scenario {
                id: "bdr_inbound_lead".to_string(),
                title: "Inbound Lead Follow-up".to_string(),
                difficulty: Difficulty::Beginner,
                customer_profile: profile(
                    "Jennifer Park",
                    "MidSize Corp",
                    "Director of Marketing",
                    "$75K",
                    &["lead generation", "campaign tracking", "ROI measurement"],
                    "marketing-focused, metrics-driven, collaborative",
                ),
                opening_message: "Hi! I downloaded your whitepaper last week about marketing automation. I'm interested in learning more about how your solution could help us improve our lead generation.".to_string(),
                objectives: objectives(&[
                    "Understand current challenges",
                    "Qualify decision process",
                    "Book qualified meeting",
                ]),
            }],
        ),
        (
            "CSM".to_string(),
            vec![Scenario {
                id: "csm_churn_risk".to_string(),
                title: "At-Risk Customer Check-in".to_string(),
                difficulty: Difficulty::Advanced,
                customer_profile: profile(
                    "David Kim",
                    "TechServices Inc",
                    "Head of Operations",
                    "$100K",
                    &["low adoption", "team resistance", "unclear ROI"],
                    "frustrated, time-pressed, needs support",
                ),
                opening_message: "I need to be honest - our team is struggling with adoption of your platform. Usage has been declining and I'm getting pressure from leadership about our investment.".to_string(),
                objectives: objectives(&[
                    "Identify adoption barriers",
                    "Create success plan",
                    "Prevent churn",
                ]),
            }],
        ),
        (
            "AM".to_string(),
            vec![Scenario {
                id: "am_upsell_opportunity".to_string(),
                title: "Expansion Opportunity".to_string(),
                difficulty: Difficulty::Intermediate,
                customer_profile: profile(
                    "Lisa Wang",
                    "GrowthCo",
                    "VP of Sales",
                    "$200K",
                    &["team growth", "process scaling", "advanced analytics needs"],
                    "growth-oriented, ambitious, data-focused",
                ),
                opening_message: "Our team has been really successful with your current package. We're scaling rapidly and I'm wondering if there are additional features that could help us manage this growth better.".to_string(),
                objectives: objectives(&[
                    "Identify expansion needs",
                    "Present relevant features",
                    "Negotiate upgrade",
                ]),
            }],
        ),
    ]
}
