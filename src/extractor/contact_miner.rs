// src/extractor/contact_miner.rs
use crate::extractor::types::ContactInfo;
use regex::Regex;

/// Pure pattern engine over raw page text. Phone patterns are tried in
/// priority order and the first PATTERN that matches anywhere in the
/// document wins (not the earliest match position). The email pattern is
/// restricted to the configured organizational domains; an emergency contact
/// requires an urgency keyword near a phone-shaped substring.
pub struct ContactMiner {
    phone_patterns: Vec<Regex>,
    email_pattern: Regex,
    obfuscated_local: Regex,
    emergency_pattern: Regex,
}

impl ContactMiner {
    pub fn new(email_domains: &[String]) -> Self {
        let phone_patterns = vec![
            Regex::new(r"1-(?:\d{3}[-.)]\s*)+\d{4}").unwrap(),
            Regex::new(r"(?:\(\d{3}\)|\d{3})[-.\s]\d{3}[-.\s]\d{4}").unwrap(),
            Regex::new(r"\b\d{3}[-.\s]\d{3}[-.\s]\d{4}\b").unwrap(),
        ];

        let domain_alternation = email_domains
            .iter()
            .map(|d| regex::escape(d))
            .collect::<Vec<_>>()
            .join("|");
        let email_pattern = Regex::new(&format!(
            r"\b[A-Za-z0-9._%+-]+@(?:{domain_alternation})\b"
        ))
        .unwrap();

        Self {
            phone_patterns,
            email_pattern,
            // Hashed/obfuscated mailto local parts look like a 32-hex blob.
            obfuscated_local: Regex::new(r"^[a-f0-9]{32}@").unwrap(),
            emergency_pattern: Regex::new(
                r"(?is)(?:24/7|emergency|crisis|toll[-\s]?free).{0,80}?(?:1-)?\(?\d{3}\)?[-.\s]\d{3}[-.\s]\d{4}",
            )
            .unwrap(),
        }
    }

    /// All three extractions are independent and optional; no match is never
    /// an error.
    pub fn mine(&self, text: &str) -> ContactInfo {
        ContactInfo {
            phone: self.extract_phone(text),
            email: self.extract_email(text),
            emergency_contact: self.extract_emergency(text),
        }
    }

    fn extract_phone(&self, text: &str) -> Option<String> {
        self.phone_patterns
            .iter()
            .find_map(|pattern| pattern.find(text))
            .map(|m| m.as_str().to_string())
    }

    fn extract_email(&self, text: &str) -> Option<String> {
        self.email_pattern
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .find(|email| !self.obfuscated_local.is_match(email))
    }

    fn extract_emergency(&self, text: &str) -> Option<String> {
        self.emergency_pattern
            .find(text)
            .map(|m| collapse_whitespace(m.as_str()))
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
