// src/crawler/types.rs
use serde::{Deserialize, Serialize};

/// A top-level taxonomy node on the search page. Identity is the visible
/// label; element handles are never stored because they go stale the moment
/// the page navigates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub name: String,
}

/// Second-level taxonomy node. Re-enumerated every time the parent topic
/// page is reloaded; the list is not assumed stable across navigations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtopic {
    pub name: String,
    pub parent_topic: String,
}

/// One page of a subtopic's listing. Immutable once yielded.
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub page_index: u32,
    pub entries: Vec<RawEntry>,
    pub next_page_url: Option<String>,
}

/// A listing entry that survived the empty/placeholder filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub service_name: String,
    pub service_url: Option<String>,
}

/// Flattened output row. The same service may legitimately appear under
/// several topic/subtopic pairs; uniqueness is only enforced within one
/// subtopic's listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub service_name: String,
    pub service_url: Option<String>,
    pub topic: String,
    pub subtopic: String,
}
