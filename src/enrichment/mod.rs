pub mod annotator;
pub mod fetcher;

pub use annotator::{LlmAnnotator, ServiceAnnotation};
pub use fetcher::PageFetcher;

use crate::crawler::types::ServiceRecord;
use serde::{Deserialize, Serialize};

/// One flattened record plus whatever the enrichment pass managed to add.
/// A record is never dropped because enrichment failed; the fields just
/// stay absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub id: String,
    #[serde(flatten)]
    pub record: ServiceRecord,
    pub provider_url: Option<String>,
    pub annotation: Option<ServiceAnnotation>,
    pub scrape_timestamp: String,
}
