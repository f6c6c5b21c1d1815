// src/extractor/analyzer.rs
use crate::config::ExtractionConfig;
use crate::crawler::locators;
use crate::crawler::types::ServiceRecord;
use crate::errors::{ScrapeError, ScrapeResult};
use crate::extractor::classifier::ServiceClassifier;
use crate::extractor::contact_miner::ContactMiner;
use crate::extractor::merger::{dedup_ordered, RecordMerger};
use crate::extractor::types::{InitiativeDetail, MainService, ProviderAnalysis};
use crate::gateway::{ElementGateway, Locator};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Places a provider site tends to link its programs from.
const INITIATIVE_LINK_SELECTORS: [&str; 7] = [
    "a[href*='programs']",
    "a[href*='initiatives']",
    "a[href*='services']",
    ".programs-menu a",
    "#programs-dropdown a",
    "nav a",
    ".menu-item a",
];

const TITLE_SELECTORS: [&str; 4] = ["h1", ".title", ".header-title", "#main-title"];

const DESCRIPTION_SELECTORS: [&str; 4] = [".description", ".content p", "#main-content p", "article p"];

const MAIN_DESCRIPTION_SELECTORS: [&str; 6] = [
    ".description",
    ".record-detail-content",
    ".service-description",
    "main p",
    ".content p",
    "#main-content p",
];

const SERVICE_ITEM_SELECTORS: [&str; 6] = [
    ".services li",
    ".programs li",
    ".initiatives li",
    "ul:not(.nav) li",
    ".content ul:not(.menu) li",
    ".main-content ul:not(.navigation) li",
];

/// How many description paragraphs to keep.
const DESCRIPTION_PARAGRAPHS: usize = 3;

const PROVIDER_LINK_TIMEOUT: Duration = Duration::from_secs(10);

/// Walks one provider's own site and folds what it finds into a
/// ProviderAnalysis. Per-initiative faults are absorbed: the initiative is
/// skipped, the analysis continues.
pub struct ProviderAnalyzer<'a, G: ElementGateway + ?Sized> {
    gateway: &'a G,
    miner: &'a ContactMiner,
    classifier: &'a ServiceClassifier,
}

impl<'a, G: ElementGateway + ?Sized> ProviderAnalyzer<'a, G> {
    pub fn new(
        gateway: &'a G,
        miner: &'a ContactMiner,
        classifier: &'a ServiceClassifier,
    ) -> Self {
        Self {
            gateway,
            miner,
            classifier,
        }
    }

    /// Open the directory's detail page for a record and read the external
    /// provider website link off it.
    pub async fn resolve_provider_url(&self, service_url: &str) -> ScrapeResult<String> {
        self.gateway.load(service_url).await?;
        let link = self
            .gateway
            .wait_until(&locators::provider_website_link(), PROVIDER_LINK_TIMEOUT)
            .await?;
        self.gateway
            .attribute(&link, "href")
            .await?
            .ok_or_else(|| ScrapeError::NotFound("provider website link has no href".to_string()))
    }

    /// Analyze the provider behind one service record.
    pub async fn analyze(
        &self,
        record: &ServiceRecord,
        extraction: &ExtractionConfig,
    ) -> ScrapeResult<ProviderAnalysis> {
        let service_url = record
            .service_url
            .as_deref()
            .ok_or_else(|| ScrapeError::NotFound("record carries no service url".to_string()))?;

        let provider_url = self.resolve_provider_url(service_url).await?;
        info!("Provider URL: {}", provider_url);

        let base_domain = Url::parse(&provider_url)
            .ok()
            .and_then(|u| u.host_str().map(String::from))
            .unwrap_or_default();

        self.gateway.load(&provider_url).await?;

        let description = match self.first_description(&MAIN_DESCRIPTION_SELECTORS).await {
            Some(description) => description,
            None => self
                .meta_description()
                .await
                .unwrap_or_else(|| "Service description not available".to_string()),
        };

        let main_service = MainService {
            name: record.service_name.clone(),
            url: record.service_url.clone(),
            provider_url: provider_url.clone(),
            primary_focus: self.classifier.rules().primary_focus.clone(),
            service_categories: self.classifier.categorize(&record.service_name, &description),
        };

        let mut merger = RecordMerger::new(
            main_service,
            &extraction.allowed_link_domains,
            &base_domain,
            &extraction.default_service_areas,
        );

        for (name, url) in self.find_initiative_links().await {
            if !merger.is_candidate_url(&url) || !merger.mark_visited(&url) {
                continue;
            }

            info!("Processing initiative: {}", name);
            match self.extract_initiative_detail(&url).await {
                Ok(detail) => {
                    // Sweep the initiative page itself for further
                    // program/service URLs worth recording.
                    for (_, extra) in self.find_initiative_links().await {
                        let lowered = extra.to_lowercase();
                        if merger.is_candidate_url(&extra)
                            && (lowered.contains("program") || lowered.contains("service"))
                        {
                            merger.add_key_url(&extra);
                        }
                    }
                    merger.add_initiative(&name, detail);
                }
                Err(e) => warn!("Skipping initiative '{}': {}", name, e),
            }
        }

        Ok(merger.into_analysis())
    }

    /// Extract the focused detail document for one initiative page.
    pub async fn extract_initiative_detail(&self, url: &str) -> ScrapeResult<InitiativeDetail> {
        self.gateway.load(url).await?;

        let title = self.first_text(&TITLE_SELECTORS).await.unwrap_or_default();
        let description = self
            .first_description(&DESCRIPTION_SELECTORS)
            .await
            .unwrap_or_default();

        let mut raw_services = Vec::new();
        for selector in SERVICE_ITEM_SELECTORS {
            let locator = Locator::css(selector, format!("service items {selector}"));
            let handles = match self.gateway.find_all(&locator).await {
                Ok(handles) => handles,
                Err(e) => {
                    debug!("Selector {} failed: {}", selector, e);
                    continue;
                }
            };
            for handle in handles {
                if let Ok(text) = self.gateway.text(&handle).await {
                    let text = text.trim().to_string();
                    if self.classifier.is_genuine_service_name(&text) {
                        raw_services.push(text);
                    }
                }
            }
        }
        let key_services = dedup_ordered(raw_services);

        let page_text = self.page_text().await;

        Ok(InitiativeDetail {
            url: url.to_string(),
            title,
            description,
            key_services,
            contact: self.miner.mine(&page_text),
            target_audience: self.classifier.detect_target_audience(&page_text),
            service_type: self.classifier.detect_service_type(&page_text),
        })
    }

    /// Candidate (label, href) pairs from the current page.
    async fn find_initiative_links(&self) -> Vec<(String, String)> {
        let mut links = Vec::new();
        for selector in INITIATIVE_LINK_SELECTORS {
            let locator = Locator::css(selector, format!("initiative links {selector}"));
            let handles = match self.gateway.find_all(&locator).await {
                Ok(handles) => handles,
                Err(e) => {
                    debug!("Selector {} failed: {}", selector, e);
                    continue;
                }
            };
            for handle in handles {
                let Ok(Some(href)) = self.gateway.attribute(&handle, "href").await else {
                    continue;
                };
                let Ok(text) = self.gateway.text(&handle).await else {
                    continue;
                };
                let text = text.trim().to_string();
                if !text.is_empty() && !href.is_empty() {
                    links.push((text, href));
                }
            }
        }
        links
    }

    async fn first_text(&self, selectors: &[&str]) -> Option<String> {
        for selector in selectors {
            let locator = Locator::css(*selector, format!("title {selector}"));
            if let Ok(Some(handle)) = self.gateway.find_one(&locator).await {
                if let Ok(text) = self.gateway.text(&handle).await {
                    let text = text.trim().to_string();
                    if !text.is_empty() {
                        return Some(text);
                    }
                }
            }
        }
        None
    }

    /// First selector that yields text wins; up to three paragraphs joined.
    async fn first_description(&self, selectors: &[&str]) -> Option<String> {
        for selector in selectors {
            let locator = Locator::css(*selector, format!("description {selector}"));
            let Ok(handles) = self.gateway.find_all(&locator).await else {
                continue;
            };
            let mut paragraphs = Vec::new();
            for handle in handles.iter().take(DESCRIPTION_PARAGRAPHS) {
                if let Ok(text) = self.gateway.text(handle).await {
                    let text = text.trim().to_string();
                    if !text.is_empty() {
                        paragraphs.push(text);
                    }
                }
            }
            if !paragraphs.is_empty() {
                return Some(paragraphs.join(" "));
            }
        }
        None
    }

    async fn meta_description(&self) -> Option<String> {
        let locator = Locator::css("meta[name='description']", "meta description");
        let handle = self.gateway.find_one(&locator).await.ok().flatten()?;
        self.gateway.attribute(&handle, "content").await.ok().flatten()
    }

    async fn page_text(&self) -> String {
        let locator = Locator::css("body", "page body");
        match self.gateway.find_one(&locator).await {
            Ok(Some(body)) => self.gateway.text(&body).await.unwrap_or_default(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::classifier::CategoryRules;
    use crate::gateway::fake::{FakeGateway, FakePage};

    const DETAIL: &str = "http://dir/service/1";
    const PROVIDER: &str = "https://provider.example/";
    const CYBERTIP: &str = "https://provider.example/programs/cybertip";

    fn extraction_config() -> ExtractionConfig {
        ExtractionConfig {
            email_domains: vec!["cybertip.ca".to_string()],
            allowed_link_domains: vec!["cybertip.ca".to_string()],
            rules_path: String::new(),
            default_service_areas: vec!["Canada".to_string()],
        }
    }

    fn build_provider_site(gateway: &FakeGateway) {
        gateway.add_page(
            DETAIL,
            FakePage::new().element(
                ".record-detail-content a[target='_blank']",
                "Website",
                &[("href", PROVIDER)],
            ),
        );

        // The same initiative URL is reachable via two different selector
        // paths; the visited set must keep it to a single fetch.
        gateway.add_page(
            PROVIDER,
            FakePage::new()
                .element(".description", "We protect children across Canada.", &[])
                .element("nav a", "Cybertip", &[("href", CYBERTIP)])
                .element("a[href*='programs']", "Cybertip", &[("href", CYBERTIP)])
                .element("nav a", "Facebook", &[("href", "https://facebook.com/x")]),
        );

        gateway.add_page(
            CYBERTIP,
            FakePage::new()
                .element("h1", "Cybertip", &[])
                .element(".content p", "Canada's tipline for reporting.", &[])
                .element("ul:not(.nav) li", "Report online exploitation", &[])
                .element("ul:not(.nav) li", "DOWNLOAD PDF", &[])
                .element("ul:not(.nav) li", "Report online exploitation", &[])
                .element(
                    "nav a",
                    "Education",
                    &[("href", "https://provider.example/services/education")],
                )
                .element(
                    "body",
                    "We help children. Call our 24/7 line 1-800-555-0123 \
                     or email info@cybertip.ca.",
                    &[],
                ),
        );
    }

    fn record() -> ServiceRecord {
        ServiceRecord {
            service_name: "Canadian Centre for Child Protection".to_string(),
            service_url: Some(DETAIL.to_string()),
            topic: "Abuse / Assault".to_string(),
            subtopic: "Child abuse services".to_string(),
        }
    }

    #[tokio::test]
    async fn analyzes_provider_with_single_fetch_per_initiative() {
        let gateway = FakeGateway::new();
        build_provider_site(&gateway);

        let miner = ContactMiner::new(&["cybertip.ca".to_string()]);
        let classifier = ServiceClassifier::new(CategoryRules::default());
        let analyzer = ProviderAnalyzer::new(&gateway, &miner, &classifier);

        let analysis = analyzer.analyze(&record(), &extraction_config()).await.unwrap();

        // The provider's own domain is allowed implicitly; facebook is not.
        assert_eq!(analysis.core_initiatives.len(), 1);
        assert_eq!(gateway.load_count(CYBERTIP), 1);

        let detail = analysis.core_initiatives.get("Cybertip").unwrap();
        assert_eq!(detail.title, "Cybertip");
        assert_eq!(detail.key_services, vec!["Report online exploitation"]);
        assert_eq!(detail.contact.phone.as_deref(), Some("1-800-555-0123"));
        assert_eq!(detail.contact.email.as_deref(), Some("info@cybertip.ca"));
        assert!(detail.contact.emergency_contact.is_some());
        assert!(detail.target_audience.contains("children"));
        assert_eq!(detail.service_type, Some(crate::extractor::ServiceType::Emergency));

        assert!(analysis.key_urls.contains(CYBERTIP));
        assert!(analysis
            .key_urls
            .contains("https://provider.example/services/education"));
        assert!(analysis.service_areas.contains("Canada"));

        let main = &analysis.main_service;
        assert_eq!(main.provider_url, PROVIDER);
        assert!(main.service_categories.contains("Child Protection"));
    }

    #[tokio::test]
    async fn record_without_service_url_is_not_found() {
        let gateway = FakeGateway::new();
        let miner = ContactMiner::new(&[]);
        let classifier = ServiceClassifier::new(CategoryRules::default());
        let analyzer = ProviderAnalyzer::new(&gateway, &miner, &classifier);

        let mut record = record();
        record.service_url = None;

        let err = analyzer
            .analyze(&record, &extraction_config())
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::NotFound(_)));
    }
}
