// src/gateway/retry.rs
use crate::config::RetryConfig;
use crate::gateway::types::{ElementGateway, Locator, ScriptArg};
use std::time::Duration;
use tracing::{debug, warn};

/// Click an element with bounded retries. Each attempt re-resolves the
/// locator from scratch (a handle from a prior attempt may be stale), scrolls
/// the element into view, and clicks at script level so overlays cannot
/// intercept the pointer. Attempts are exhausted silently: the return value
/// says whether the click landed, and the caller decides whether that means
/// skip or abort.
pub async fn click_with_retry<G: ElementGateway + ?Sized>(
    gateway: &G,
    locator: &Locator,
    retry: &RetryConfig,
) -> bool {
    for attempt in 1..=retry.max_attempts {
        match try_click(gateway, locator).await {
            Ok(()) => {
                debug!("Clicked {} on attempt {}", locator, attempt);
                return true;
            }
            Err(e) => {
                warn!(
                    "Attempt {}/{} to click {} failed: {}",
                    attempt, retry.max_attempts, locator, e
                );
            }
        }

        if attempt < retry.max_attempts && retry.delay_ms > 0 {
            let jitter = fastrand::u64(0..=retry.delay_ms / 2);
            tokio::time::sleep(Duration::from_millis(retry.delay_ms + jitter)).await;
        }
    }

    false
}

async fn try_click<G: ElementGateway + ?Sized>(
    gateway: &G,
    locator: &Locator,
) -> crate::errors::ScrapeResult<()> {
    let handle = gateway
        .find_one(locator)
        .await?
        .ok_or_else(|| crate::errors::ScrapeError::NotFound(locator.description.clone()))?;

    gateway.scroll_into_view(&handle).await?;
    gateway
        .run_script("arguments[0].click();", &[ScriptArg::Element(handle)])
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::fake::{FakeGateway, FakePage};
    use crate::gateway::types::By;

    fn zero_delay(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            delay_ms: 0,
        }
    }

    #[tokio::test]
    async fn exhausts_exactly_max_attempts_and_returns_false() {
        let gateway = FakeGateway::new();
        gateway.add_page(
            "http://site/",
            FakePage::new().element(".btn", "Go", &[]).fail_clicks(".btn", u32::MAX),
        );
        gateway.load_page("http://site/").await;

        let locator = Locator::css(".btn", "go button");
        let ok = click_with_retry(&gateway, &locator, &zero_delay(3)).await;

        assert!(!ok);
        assert_eq!(gateway.click_attempts(".btn"), 3);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let gateway = FakeGateway::new();
        gateway.add_page(
            "http://site/",
            FakePage::new().element(".btn", "Go", &[]).fail_clicks(".btn", 2),
        );
        gateway.load_page("http://site/").await;

        let locator = Locator::css(".btn", "go button");
        let ok = click_with_retry(&gateway, &locator, &zero_delay(3)).await;

        assert!(ok);
        assert_eq!(gateway.click_attempts(".btn"), 3);
    }

    #[tokio::test]
    async fn missing_element_is_failure_not_panic() {
        let gateway = FakeGateway::new();
        gateway.add_page("http://site/", FakePage::new());
        gateway.load_page("http://site/").await;

        let locator = Locator {
            by: By::Css,
            expr: ".absent".to_string(),
            description: "absent element".to_string(),
        };
        assert!(!click_with_retry(&gateway, &locator, &zero_delay(2)).await);
    }
}
