// src/crawler/traversal.rs
use crate::config::CrawlConfig;
use crate::crawler::locators;
use crate::crawler::pagination::{flatten_unique, PaginationWalker};
use crate::crawler::types::{ServiceRecord, Subtopic, Topic};
use crate::errors::{ScrapeError, ScrapeResult};
use crate::gateway::{click_with_retry, ElementGateway, ScriptArg};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Drives the Topic → Subtopic → Listing state machine. The controller owns
/// the browsing context for the whole run and never holds an element handle
/// across a navigation: every transition re-queries the page by a stable
/// text key. After a subtopic is drained it re-anchors by reloading the
/// search page and re-selecting the parent topic instead of trusting
/// history navigation.
pub struct TraversalController<'a, G: ElementGateway + ?Sized> {
    gateway: &'a G,
    config: &'a CrawlConfig,
}

impl<'a, G: ElementGateway + ?Sized> TraversalController<'a, G> {
    pub fn new(gateway: &'a G, config: &'a CrawlConfig) -> Self {
        Self { gateway, config }
    }

    /// Load the search page, clear interfering overlays, and fill in the
    /// configured location. This is the crawl's entry point; a failure here
    /// at the start of `crawl` is the one fatal error of a run.
    pub async fn open_search_page(&self) -> ScrapeResult<()> {
        self.gateway.load(&self.config.start_url).await?;
        self.dismiss_overlays().await;
        self.set_location().await;
        Ok(())
    }

    /// Remove cookie banners and other configured overlays from the DOM so
    /// they cannot intercept clicks.
    async fn dismiss_overlays(&self) {
        for id in &self.config.overlay_ids {
            let result = self
                .gateway
                .run_script(
                    "var e = document.getElementById(arguments[0]); if (e) { e.remove(); }",
                    &[ScriptArg::Text(id.clone())],
                )
                .await;
            if let Err(e) = result {
                debug!("Could not dismiss overlay '{}': {}", id, e);
            }
        }
    }

    async fn set_location(&self) {
        match self.gateway.find_one(&locators::location_input()).await {
            Ok(Some(input)) => {
                let result = self
                    .gateway
                    .run_script(
                        "arguments[0].value = arguments[1];",
                        &[
                            ScriptArg::Element(input),
                            ScriptArg::Text(self.config.location.clone()),
                        ],
                    )
                    .await;
                if let Err(e) = result {
                    warn!("Could not set search location: {}", e);
                }
            }
            Ok(None) => warn!("Location input not found on search page"),
            Err(e) => warn!("Could not query location input: {}", e),
        }
    }

    /// All topics currently visible on the search page. An empty list is a
    /// valid result, not an error.
    pub async fn enumerate_topics(&self) -> ScrapeResult<Vec<Topic>> {
        let handles = self.gateway.find_all(&locators::topic_links()).await?;
        let mut topics = Vec::new();
        for handle in handles {
            match self.gateway.text(&handle).await {
                Ok(text) => {
                    let name = text.trim().to_string();
                    if !name.is_empty() {
                        topics.push(Topic { name });
                    }
                }
                Err(e) => debug!("Skipping unreadable topic link: {}", e),
            }
        }
        Ok(topics)
    }

    /// Open a topic page by its visible label. `NotFound` if no matching
    /// link appears once the page has stabilized; `NavigationFailure` if the
    /// link exists but the click never lands.
    pub async fn select_topic(&self, name: &str) -> ScrapeResult<()> {
        let locator = locators::topic_by_name(name);
        let timeout = Duration::from_secs(self.config.stabilize_timeout_secs);

        match self.gateway.wait_until(&locator, timeout).await {
            Ok(_) => {}
            Err(e) if e.is_timeout() => {
                return Err(ScrapeError::NotFound(format!("topic '{name}'")))
            }
            Err(e) => return Err(e),
        }

        if !click_with_retry(self.gateway, &locator, &self.config.retry).await {
            return Err(ScrapeError::NavigationFailure(format!(
                "could not open topic '{name}'"
            )));
        }
        Ok(())
    }

    /// Subtopics visible on the currently loaded topic page. Identity is by
    /// name; the list is rebuilt after every reload of the parent page.
    pub async fn enumerate_subtopics(&self, parent_topic: &str) -> ScrapeResult<Vec<Subtopic>> {
        let handles = self.gateway.find_all(&locators::subtopic_headings()).await?;
        let mut subtopics = Vec::new();
        for handle in handles {
            match self.gateway.text(&handle).await {
                Ok(text) => {
                    let name = text.trim().to_string();
                    if !name.is_empty() {
                        subtopics.push(Subtopic {
                            name,
                            parent_topic: parent_topic.to_string(),
                        });
                    }
                }
                Err(e) => debug!("Skipping unreadable subtopic heading: {}", e),
            }
        }
        Ok(subtopics)
    }

    /// Open a subtopic's listing via its view-resources affordance. Same
    /// contract as `select_topic`: `NotFound` when the affordance never
    /// appears, `NavigationFailure` when it resists clicking.
    pub async fn select_subtopic(&self, name: &str) -> ScrapeResult<()> {
        let locator = locators::view_resources_for(name);
        let timeout = Duration::from_secs(self.config.stabilize_timeout_secs);

        match self.gateway.wait_until(&locator, timeout).await {
            Ok(_) => {}
            Err(e) if e.is_timeout() => {
                return Err(ScrapeError::NotFound(format!("subtopic '{name}'")))
            }
            Err(e) => return Err(e),
        }

        if !click_with_retry(self.gateway, &locator, &self.config.retry).await {
            return Err(ScrapeError::NavigationFailure(format!(
                "could not open listing for subtopic '{name}'"
            )));
        }
        Ok(())
    }

    /// Follow a subtopic's view-resources affordance and collect every
    /// record in its listing, tagged with the enclosing topic and subtopic.
    /// Failure to even reach the listing is reported and absorbed: the
    /// controller moves on to the next subtopic.
    pub async fn drain_subtopic(&self, topic: &str, subtopic: &str) -> Vec<ServiceRecord> {
        if let Err(e) = self.select_subtopic(subtopic).await {
            warn!("Could not reach listing for subtopic '{}': {}", subtopic, e);
            return Vec::new();
        }

        let walker = PaginationWalker::new(self.gateway, &self.config.pagination);
        let pages = walker.collect_pages().await;

        flatten_unique(&pages)
            .into_iter()
            .map(|entry| ServiceRecord {
                service_name: entry.service_name,
                service_url: entry.service_url,
                topic: topic.to_string(),
                subtopic: subtopic.to_string(),
            })
            .collect()
    }

    /// Run the full state machine over every topic and subtopic. Faults are
    /// absorbed at the topic/subtopic boundary; only the initial search-page
    /// load propagates.
    pub async fn crawl(&self) -> ScrapeResult<Vec<ServiceRecord>> {
        self.open_search_page().await?;
        let topics = self.enumerate_topics().await?;
        info!("Found {} topics", topics.len());

        let mut records = Vec::new();
        for topic in &topics {
            info!("===== Topic: {} =====", topic.name);

            if let Err(e) = self.open_search_page().await {
                warn!("Skipping topic '{}', search page reload failed: {}", topic.name, e);
                continue;
            }
            if let Err(e) = self.select_topic(&topic.name).await {
                warn!("Skipping topic '{}': {}", topic.name, e);
                continue;
            }

            let subtopics = match self.enumerate_subtopics(&topic.name).await {
                Ok(subtopics) => subtopics,
                Err(e) => {
                    warn!("Could not enumerate subtopics of '{}': {}", topic.name, e);
                    continue;
                }
            };
            info!("Found {} subtopics under {}", subtopics.len(), topic.name);

            for i in 0..subtopics.len() {
                // Re-enumerate each iteration; the page was rebuilt by the
                // reset below and positions may have shifted.
                let current = match self.enumerate_subtopics(&topic.name).await {
                    Ok(current) => current,
                    Err(e) => {
                        warn!("Lost subtopic list under '{}': {}", topic.name, e);
                        break;
                    }
                };
                let Some(subtopic) = current.get(i) else {
                    break;
                };

                info!("--> Subtopic: {}", subtopic.name);
                let drained = self
                    .drain_subtopic(&subtopic.parent_topic, &subtopic.name)
                    .await;
                info!("{} records from '{}'", drained.len(), subtopic.name);
                records.extend(drained);

                // RESET: back to a known page, then re-open the topic.
                if let Err(e) = self.open_search_page().await {
                    warn!("Reset failed after '{}': {}", subtopic.name, e);
                    break;
                }
                if let Err(e) = self.select_topic(&topic.name).await {
                    warn!("Could not re-open topic '{}': {}", topic.name, e);
                    break;
                }
            }
        }

        info!("🎯 Crawl complete: {} records", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PaginationConfig, RetryConfig};
    use crate::gateway::fake::{FakeGateway, FakePage};

    const SEARCH: &str = "http://dir/search";
    const TOPIC_LINKS: &str = "//a[contains(@class, 'topic')]";
    const SUBTOPIC_HEADINGS: &str = "//div[@class='subtopic-heading']";
    const TITLE: &str = ".title";

    fn topic_link_expr(name: &str) -> String {
        format!("//a[contains(text(), '{name}')]")
    }

    fn view_resources_expr(name: &str) -> String {
        format!(
            "//div[@class='subtopic-heading' and contains(text(), '{name}')]\
             /following-sibling::a[@class='red-button']"
        )
    }

    fn test_config() -> CrawlConfig {
        CrawlConfig {
            start_url: SEARCH.to_string(),
            location: "Toronto".to_string(),
            webdriver_url: String::new(),
            overlay_ids: vec!["cookie-banner".to_string()],
            stabilize_timeout_secs: 1,
            retry: RetryConfig {
                max_attempts: 3,
                delay_ms: 0,
            },
            pagination: PaginationConfig {
                next_page_timeout_secs: 1,
                max_pages: 10,
                timeouts_to_conclude: 1,
            },
        }
    }

    /// Canned two-subtopic directory: one topic, each subtopic listing one
    /// service page.
    fn build_directory(gateway: &FakeGateway) {
        let search = FakePage::new()
            .element("#searchLocation", "", &[])
            .element(TOPIC_LINKS, "Abuse / Assault", &[])
            .element(
                &topic_link_expr("Abuse / Assault"),
                "Abuse / Assault",
                &[("data-navigate", "http://dir/topic")],
            );
        gateway.add_page(SEARCH, search);

        let topic = FakePage::new()
            .element(SUBTOPIC_HEADINGS, "Child abuse services", &[])
            .element(SUBTOPIC_HEADINGS, "Crisis lines", &[])
            .element(
                &view_resources_expr("Child abuse services"),
                "View Resources",
                &[("data-navigate", "http://dir/listing-child")],
            )
            .element(
                &view_resources_expr("Crisis lines"),
                "View Resources",
                &[("data-navigate", "http://dir/listing-crisis")],
            );
        gateway.add_page("http://dir/topic", topic);

        let child_listing = FakePage::new()
            .element(TITLE, "Child Protection Centre", &[])
            .child("a", "Child Protection Centre", &[("href", "http://svc/child")]);
        gateway.add_page("http://dir/listing-child", child_listing);

        let crisis_listing = FakePage::new()
            .element(TITLE, "Crisis Line Network", &[])
            .child("a", "Crisis Line Network", &[("href", "http://svc/crisis")]);
        gateway.add_page("http://dir/listing-crisis", crisis_listing);
    }

    #[tokio::test]
    async fn enumerates_topics_from_search_page() {
        let gateway = FakeGateway::new();
        build_directory(&gateway);

        let config = test_config();
        let controller = TraversalController::new(&gateway, &config);
        controller.open_search_page().await.unwrap();

        let topics = controller.enumerate_topics().await.unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].name, "Abuse / Assault");
    }

    #[tokio::test]
    async fn empty_topic_list_is_valid() {
        let gateway = FakeGateway::new();
        gateway.add_page(SEARCH, FakePage::new());

        let config = test_config();
        let controller = TraversalController::new(&gateway, &config);
        controller.open_search_page().await.unwrap();

        assert!(controller.enumerate_topics().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn select_topic_reports_not_found_for_unknown_label() {
        let gateway = FakeGateway::new();
        build_directory(&gateway);

        let config = test_config();
        let controller = TraversalController::new(&gateway, &config);
        controller.open_search_page().await.unwrap();

        let err = controller.select_topic("No Such Topic").await.unwrap_err();
        assert!(matches!(err, ScrapeError::NotFound(_)));
    }

    #[tokio::test]
    async fn full_crawl_tags_records_and_re_anchors_between_subtopics() {
        let gateway = FakeGateway::new();
        build_directory(&gateway);

        let config = test_config();
        let controller = TraversalController::new(&gateway, &config);
        let records = controller.crawl().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].service_name, "Child Protection Centre");
        assert_eq!(records[0].topic, "Abuse / Assault");
        assert_eq!(records[0].subtopic, "Child abuse services");
        assert_eq!(records[1].subtopic, "Crisis lines");
        assert_eq!(records[1].service_url.as_deref(), Some("http://svc/crisis"));

        // Initial load + one reload per topic + one reset per drained
        // subtopic: the controller re-anchors instead of using history.
        assert!(gateway.load_count(SEARCH) >= 4);
    }

    #[tokio::test]
    async fn unreachable_listing_is_skipped_not_fatal() {
        let gateway = FakeGateway::new();
        build_directory(&gateway);

        // A third subtopic whose view-resources button never appears.
        let broken_topic = FakePage::new()
            .element(SUBTOPIC_HEADINGS, "Ghost subtopic", &[])
            .element(SUBTOPIC_HEADINGS, "Crisis lines", &[])
            .element(
                &view_resources_expr("Crisis lines"),
                "View Resources",
                &[("data-navigate", "http://dir/listing-crisis")],
            );
        gateway.add_page("http://dir/topic", broken_topic);

        let config = test_config();
        let controller = TraversalController::new(&gateway, &config);
        let records = controller.crawl().await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].subtopic, "Crisis lines");
    }

    #[tokio::test]
    async fn failing_entry_page_is_fatal() {
        let gateway = FakeGateway::new();
        // No canned search page at all.
        let config = test_config();
        let controller = TraversalController::new(&gateway, &config);
        assert!(controller.crawl().await.is_err());
    }
}
