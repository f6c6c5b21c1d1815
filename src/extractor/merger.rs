// src/extractor/merger.rs
use crate::extractor::types::{InitiativeDetail, MainService, ProviderAnalysis};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Link path fragments that are never initiatives.
const BOILERPLATE_FRAGMENTS: [&str; 3] = ["privacy", "terms", "accessibility"];

/// Accumulates one provider's nested analysis across page visits. Owns the
/// run-scoped visited set: a URL is marked the instant it is selected for
/// secondary crawling, before the fetch, so a mid-fetch failure still
/// prevents a retry loop on the same URL within the run.
pub struct RecordMerger {
    visited: HashSet<String>,
    allowed_domains: Vec<String>,
    analysis: ProviderAnalysis,
}

impl RecordMerger {
    /// `base_domain` is the provider's own host; it is allowed alongside the
    /// configured organizational domains.
    pub fn new(
        main_service: MainService,
        allowed_domains: &[String],
        base_domain: &str,
        service_areas: &[String],
    ) -> Self {
        let mut allowed: Vec<String> = allowed_domains.to_vec();
        if !base_domain.is_empty() {
            allowed.push(base_domain.to_string());
        }

        Self {
            visited: HashSet::new(),
            allowed_domains: allowed,
            analysis: ProviderAnalysis {
                main_service,
                core_initiatives: Default::default(),
                key_urls: Default::default(),
                service_areas: service_areas.iter().cloned().collect(),
            },
        }
    }

    /// A candidate link is followed only when its host belongs to the
    /// allow-listed domains and its path is not legal/navigation
    /// boilerplate.
    pub fn is_candidate_url(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };

        let lowered = url.to_lowercase();
        if BOILERPLATE_FRAGMENTS.iter().any(|f| lowered.contains(f)) {
            return false;
        }

        self.allowed_domains
            .iter()
            .any(|domain| host.contains(domain.as_str()))
    }

    /// Claim a URL for fetching. Returns false when it was already claimed
    /// this run, in which case the caller must not fetch it again.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        let fresh = self.visited.insert(url.to_string());
        if !fresh {
            debug!("Already visited {}", url);
        }
        fresh
    }

    pub fn add_initiative(&mut self, name: &str, detail: InitiativeDetail) {
        self.analysis.key_urls.insert(detail.url.clone());
        self.analysis
            .core_initiatives
            .entry(name.to_string())
            .or_insert(detail);
    }

    pub fn add_key_url(&mut self, url: &str) {
        self.analysis.key_urls.insert(url.to_string());
    }

    /// Fold another analysis in. Commutative and idempotent on the map/set
    /// parts (first writer wins per initiative name), so per-topic partitions
    /// of a parallel run can be merged in any order.
    pub fn merge(&mut self, other: ProviderAnalysis) {
        for (name, detail) in other.core_initiatives {
            self.analysis.core_initiatives.entry(name).or_insert(detail);
        }
        self.analysis.key_urls.extend(other.key_urls);
        self.analysis.service_areas.extend(other.service_areas);
    }

    pub fn into_analysis(self) -> ProviderAnalysis {
        self.analysis
    }
}

/// Drop duplicates, preserving first-occurrence order.
pub fn dedup_ordered(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
