// src/extractor/types.rs
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Mined contact facts. Fields default to absent, never to empty string, so
/// "not found" stays distinguishable from "found empty".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub emergency_contact: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Emergency,
    Support,
    Education,
    Reporting,
}

/// One named program found on a provider's own site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiativeDetail {
    pub url: String,
    pub title: String,
    pub description: String,
    /// Deduplicated, insertion order preserved.
    pub key_services: Vec<String>,
    pub contact: ContactInfo,
    pub target_audience: BTreeSet<String>,
    pub service_type: Option<ServiceType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainService {
    pub name: String,
    pub url: Option<String>,
    pub provider_url: String,
    pub primary_focus: String,
    pub service_categories: BTreeSet<String>,
}

/// The nested per-provider output document. BTree collections keep the
/// serialized order deterministic; sets flatten to sorted sequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderAnalysis {
    pub main_service: MainService,
    pub core_initiatives: BTreeMap<String, InitiativeDetail>,
    pub key_urls: BTreeSet<String>,
    pub service_areas: BTreeSet<String>,
}
