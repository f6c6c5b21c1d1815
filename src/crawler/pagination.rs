// src/crawler/pagination.rs
use crate::config::PaginationConfig;
use crate::crawler::locators;
use crate::crawler::types::{ListingPage, RawEntry};
use crate::gateway::ElementGateway;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Placeholder the listing UI shows while results load. Never a real record.
const LOADING_SENTINEL: &str = "SEARCHING FOR";

/// Walks a subtopic's listing page by page until no further page exists.
/// Every fault while locating the next-page affordance is treated as
/// termination, not as an abort: partial results beat erroring on a
/// transient layout hiccup.
pub struct PaginationWalker<'a, G: ElementGateway + ?Sized> {
    gateway: &'a G,
    config: &'a PaginationConfig,
}

impl<'a, G: ElementGateway + ?Sized> PaginationWalker<'a, G> {
    pub fn new(gateway: &'a G, config: &'a PaginationConfig) -> Self {
        Self { gateway, config }
    }

    /// Scrape the currently loaded listing and every page after it.
    pub async fn collect_pages(&self) -> Vec<ListingPage> {
        let mut pages = Vec::new();
        let mut page_index: u32 = 1;

        loop {
            info!("🔍 Scraping listing page {}...", page_index);
            let entries = self.scrape_entries().await;
            debug!("Page {}: {} entries", page_index, entries.len());

            let next_page_url = self.find_next_page_url().await;
            pages.push(ListingPage {
                page_index,
                entries,
                next_page_url: next_page_url.clone(),
            });

            let Some(href) = next_page_url else {
                info!("No more pages after page {}", page_index);
                break;
            };

            if page_index >= self.config.max_pages {
                warn!(
                    "Page ceiling ({}) reached, stopping pagination",
                    self.config.max_pages
                );
                break;
            }

            if let Err(e) = self.gateway.load(&href).await {
                warn!("Could not open next listing page {}: {}", href, e);
                break;
            }
            page_index += 1;
        }

        pages
    }

    async fn scrape_entries(&self) -> Vec<RawEntry> {
        let handles = match self.gateway.find_all(&locators::listing_titles()).await {
            Ok(handles) => handles,
            Err(e) => {
                warn!("Could not enumerate listing entries: {}", e);
                return Vec::new();
            }
        };

        let mut entries = Vec::new();
        for handle in handles {
            let name = match self.gateway.text(&handle).await {
                Ok(text) => text.trim().to_string(),
                Err(e) => {
                    debug!("Skipping an entry: {}", e);
                    continue;
                }
            };

            if name.is_empty() || name.to_uppercase().contains(LOADING_SENTINEL) {
                continue;
            }

            let service_url = match self
                .gateway
                .find_within(&handle, &locators::entry_link())
                .await
            {
                Ok(Some(link)) => self.gateway.attribute(&link, "href").await.ok().flatten(),
                Ok(None) => None,
                Err(e) => {
                    debug!("No link for entry '{}': {}", name, e);
                    None
                }
            };

            entries.push(RawEntry {
                service_name: name,
                service_url,
            });
        }
        entries
    }

    /// Resolve the next-page destination, or conclude end-of-results. The
    /// wait is bounded; `timeouts_to_conclude` controls how many consecutive
    /// timeouts it takes before a timeout is read as "truly the last page".
    async fn find_next_page_url(&self) -> Option<String> {
        // The link tends to sit below the fold.
        let _ = self
            .gateway
            .run_script("window.scrollTo(0, document.body.scrollHeight);", &[])
            .await;

        let timeout = Duration::from_secs(self.config.next_page_timeout_secs);
        let required = self.config.timeouts_to_conclude.max(1);
        let mut timeouts = 0;

        loop {
            match self.gateway.wait_until(&locators::next_page_link(), timeout).await {
                Ok(handle) => {
                    return match self.gateway.attribute(&handle, "href").await {
                        Ok(Some(href)) => Some(href),
                        Ok(None) => {
                            info!("Next-page affordance carries no destination");
                            None
                        }
                        Err(e) => {
                            warn!("Could not read next-page destination: {}", e);
                            None
                        }
                    };
                }
                Err(e) if e.is_timeout() => {
                    timeouts += 1;
                    if timeouts >= required {
                        info!("No next-page link within {:?}", timeout);
                        return None;
                    }
                    debug!("Next-page wait timed out ({}/{}), retrying", timeouts, required);
                }
                Err(e) => {
                    warn!("Fault while locating next-page link: {}", e);
                    return None;
                }
            }
        }
    }
}

/// Flatten pages into entries, keeping the first occurrence per service URL.
/// Entries without a URL are keyed by name so distinct unlinked services all
/// survive.
pub fn flatten_unique(pages: &[ListingPage]) -> Vec<RawEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for page in pages {
        for entry in &page.entries {
            let key = entry
                .service_url
                .clone()
                .unwrap_or_else(|| format!("name:{}", entry.service_name));
            if seen.insert(key) {
                entries.push(entry.clone());
            }
        }
    }
    entries
}
