// src/extractor/classifier.rs
use crate::extractor::types::ServiceType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceTypeRule {
    pub service_type: ServiceType,
    pub keywords: Vec<String>,
}

/// The classification business rules, kept as data so a deployment targeting
/// a different directory can swap the tables without touching the algorithm.
/// Loaded from categories.yml; the compiled-in default mirrors the child
/// protection deployment this crawler was built for.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryRules {
    pub categories: Vec<CategoryRule>,
    /// Unioned into every classification result regardless of content. An
    /// explicit deployment policy, not a general rule.
    pub always_applied: Vec<String>,
    pub stop_phrases: Vec<String>,
    pub audience_keywords: Vec<String>,
    /// Checked in order; the first matching rule decides the type.
    pub service_types: Vec<ServiceTypeRule>,
    pub primary_focus: String,
}

impl Default for CategoryRules {
    fn default() -> Self {
        let cat = |name: &str, keywords: &[&str]| CategoryRule {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        };
        let stype = |service_type: ServiceType, keywords: &[&str]| ServiceTypeRule {
            service_type,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        };

        Self {
            categories: vec![
                cat(
                    "Missing Children Services",
                    &[
                        "missing", "amber alert", "search", "locate", "find", "lost child",
                        "missingkids", "enfants disparus",
                    ],
                ),
                cat(
                    "Child Protection",
                    &[
                        "protect", "safety", "prevention", "safeguard", "secure",
                        "protection de l'enfance", "cybertip",
                    ],
                ),
                cat(
                    "Prevention and Education",
                    &[
                        "education", "training", "prevention", "workshop", "awareness",
                        "learn", "teach", "program", "resource",
                    ],
                ),
                cat(
                    "Family Support Services",
                    &[
                        "family", "support", "assistance", "help", "guidance", "counseling",
                        "aide", "soutien",
                    ],
                ),
                cat(
                    "Emergency Response",
                    &[
                        "emergency", "crisis", "24/7", "hotline", "urgent", "immediate",
                        "urgence",
                    ],
                ),
                cat(
                    "Crisis Intervention",
                    &["crisis", "intervention", "urgent", "emergency", "immediate", "support"],
                ),
                cat(
                    "Child Safety Resources",
                    &["safety", "resources", "materials", "guide", "toolkit", "information", "tips"],
                ),
                cat(
                    "Public Awareness",
                    &["awareness", "public", "community", "campaign", "outreach", "inform"],
                ),
                cat(
                    "Law Enforcement Collaboration",
                    &["police", "law enforcement", "investigation", "report", "legal", "justice"],
                ),
            ],
            always_applied: vec![
                "Child Protection".to_string(),
                "Missing Children Services".to_string(),
            ],
            stop_phrases: vec![
                // Navigation / menu
                "contact us", "about", "privacy", "terms", "accessibility",
                "connect with us", "facebook", "twitter", "youtube", "instagram",
                "donate", "français", "english", "press", "media", "partners",
                "how can we help", "help us find", "en bref", "conditions",
                "politique", "suivez-nous", "zone médias",
                // Generic actions
                "download pdf", "learn more", "read more", "click here", "sign up",
                "newsletter", "make a", "order", "careers",
                // Common headers
                "resources", "initiatives", "programs", "services", "get involved",
                "about us", "contact", "history", "leadership", "policies", "faq",
                "donation",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            audience_keywords: vec!["children", "families", "parents", "youth", "survivors"]
                .into_iter()
                .map(String::from)
                .collect(),
            service_types: vec![
                stype(ServiceType::Emergency, &["crisis", "emergency", "24/7", "urgent"]),
                stype(ServiceType::Support, &["support", "assistance", "help"]),
                stype(ServiceType::Education, &["education", "prevention", "training"]),
                stype(ServiceType::Reporting, &["report", "tipline", "hotline"]),
            ],
            primary_focus: "Child Protection and Missing Children Services".to_string(),
        }
    }
}

pub async fn load_rules_from_yaml(
    path: &str,
) -> std::result::Result<CategoryRules, Box<dyn std::error::Error + Send + Sync>> {
    let content = tokio::fs::read_to_string(path).await?;
    let rules: CategoryRules = serde_yaml::from_str(&content)?;
    Ok(rules)
}

/// Keyword-driven categorizer plus the text-quality filter that decides
/// whether a candidate string is a genuine service/program name. Stateless
/// apart from the rule tables; identical input always yields identical
/// output.
pub struct ServiceClassifier {
    rules: CategoryRules,
}

impl ServiceClassifier {
    pub fn new(rules: CategoryRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &CategoryRules {
        &self.rules
    }

    /// Reject strings that cannot be a service name: too short, too long,
    /// shouty headers, boilerplate, URLs, or strings with no letters.
    pub fn is_genuine_service_name(&self, text: &str) -> bool {
        let text = text.trim();

        if text.chars().count() < 5 {
            return false;
        }
        if text.contains('\n') {
            return false;
        }
        if text.split_whitespace().count() > 10 {
            return false;
        }
        if text.starts_with("http") {
            return false;
        }

        let has_alpha = text.chars().any(|c| c.is_alphabetic());
        if !has_alpha {
            return false;
        }
        // ALL-CAPS strings are headers, not names.
        if !text.chars().any(|c| c.is_lowercase()) {
            return false;
        }

        let lowered = text.to_lowercase();
        !self
            .rules
            .stop_phrases
            .iter()
            .any(|phrase| lowered.contains(phrase.as_str()))
    }

    /// Map a (name, description) pair to category labels, then union in the
    /// always-applied defaults.
    pub fn categorize(&self, name: &str, description: &str) -> BTreeSet<String> {
        let combined = format!("{name} {description}").to_lowercase();

        let mut categories: BTreeSet<String> = self
            .rules
            .categories
            .iter()
            .filter(|rule| {
                rule.keywords
                    .iter()
                    .any(|keyword| combined.contains(&keyword.to_lowercase()))
            })
            .map(|rule| rule.name.clone())
            .collect();

        categories.extend(self.rules.always_applied.iter().cloned());
        categories
    }

    /// First service-type rule with a keyword hit wins; the rule order in
    /// the table is the priority order.
    pub fn detect_service_type(&self, page_text: &str) -> Option<ServiceType> {
        let lowered = page_text.to_lowercase();
        self.rules
            .service_types
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| lowered.contains(k.as_str())))
            .map(|rule| rule.service_type)
    }

    pub fn detect_target_audience(&self, page_text: &str) -> BTreeSet<String> {
        let lowered = page_text.to_lowercase();
        self.rules
            .audience_keywords
            .iter()
            .filter(|keyword| lowered.contains(keyword.as_str()))
            .cloned()
            .collect()
    }
}
