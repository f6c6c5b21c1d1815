// src/enrichment/fetcher.rs
use crate::config::EnrichmentConfig;
use crate::errors::{ScrapeError, ScrapeResult};
use scraper::Html;
use std::time::Duration;
use tracing::{debug, warn};

/// Tags whose text is noise for the annotator.
const EXCLUDED_TAGS: [&str; 6] = ["script", "style", "nav", "footer", "iframe", "head"];

/// Plain HTTP fetcher for provider pages that do not need a rendered DOM.
/// Fetches with bounded retries, strips chrome, and caps the text at the
/// configured budget so the annotator gets a digestible slice.
pub struct PageFetcher {
    client: reqwest::Client,
    max_retries: u32,
    retry_delay: Duration,
    max_content_chars: usize,
}

impl PageFetcher {
    pub fn new(config: &EnrichmentConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; ServiceScraper/1.0)")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("reqwest client with static configuration");

        Self {
            client,
            max_retries: config.max_retries.max(1),
            retry_delay: Duration::from_millis(config.delay_between_requests_ms),
            max_content_chars: config.max_content_chars,
        }
    }

    pub async fn fetch_clean_text(&self, url: &str) -> ScrapeResult<String> {
        let mut last_error = String::new();
        for attempt in 1..=self.max_retries {
            match self.try_fetch(url).await {
                Ok(html) => return Ok(self.clean(&html)),
                Err(e) => {
                    debug!("Fetch attempt {}/{} for {} failed: {}", attempt, self.max_retries, url, e);
                    last_error = e.to_string();
                    if attempt < self.max_retries {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        warn!("Giving up on {} after {} attempts", url, self.max_retries);
        Err(ScrapeError::NavigationFailure(format!(
            "{url}: {last_error}"
        )))
    }

    async fn try_fetch(&self, url: &str) -> ScrapeResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::NavigationFailure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScrapeError::NavigationFailure(format!(
                "HTTP {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| ScrapeError::NavigationFailure(e.to_string()))
    }

    /// Text content minus scripts/styles/navigation, one trimmed line per
    /// text node, truncated to the char budget.
    fn clean(&self, html: &str) -> String {
        let document = Html::parse_document(html);

        let mut lines: Vec<String> = Vec::new();
        for node in document.tree.root().descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let excluded = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map(|element| EXCLUDED_TAGS.contains(&element.name()))
                    .unwrap_or(false)
            });
            if excluded {
                continue;
            }
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.split_whitespace().collect::<Vec<_>>().join(" "));
            }
        }

        lines.join("\n").chars().take(self.max_content_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(max_chars: usize) -> PageFetcher {
        let config = EnrichmentConfig {
            api_url: String::new(),
            model: String::new(),
            timeout_secs: 5,
            max_retries: 1,
            delay_between_requests_ms: 0,
            max_content_chars: max_chars,
            backup_interval: 10,
        };
        PageFetcher::new(&config)
    }

    #[test]
    fn strips_scripts_and_navigation() {
        let html = r#"
            <html><head><title>T</title><script>var x = 1;</script></head>
            <body>
              <nav><a href="/">Home</a></nav>
              <p>Crisis support   for families.</p>
              <footer>All rights reserved</footer>
            </body></html>
        "#;

        let text = fetcher(15000).clean(html);
        assert!(text.contains("Crisis support for families."));
        assert!(!text.contains("var x"));
        assert!(!text.contains("Home"));
        assert!(!text.contains("All rights reserved"));
    }

    #[test]
    fn truncates_to_the_char_budget() {
        let html = format!("<body><p>{}</p></body>", "x".repeat(500));
        let text = fetcher(100).clean(&html);
        assert_eq!(text.chars().count(), 100);
    }
}
