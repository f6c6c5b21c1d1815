// src/gateway/types.rs
use crate::errors::ScrapeResult;
use async_trait::async_trait;
use std::time::Duration;

/// Selector strategy understood by gateway implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum By {
    Css,
    XPath,
}

/// A re-resolvable element address: strategy + expression + a human-readable
/// description for logs and errors. Locators are cheap to clone and survive
/// navigations; handles do not.
#[derive(Debug, Clone)]
pub struct Locator {
    pub by: By,
    pub expr: String,
    pub description: String,
}

impl Locator {
    pub fn css(expr: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            by: By::Css,
            expr: expr.into(),
            description: description.into(),
        }
    }

    pub fn xpath(expr: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            by: By::XPath,
            expr: expr.into(),
            description: description.into(),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description)
    }
}

/// Opaque reference to an element on the currently loaded page. Invalid the
/// moment the page navigates; never store one across a navigation boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub id: String,
}

/// Argument passed into `run_script`.
#[derive(Debug, Clone)]
pub enum ScriptArg {
    Element(ElementHandle),
    Text(String),
}

/// The browser capability the crawl logic is written against: load a URL,
/// locate elements, read text/attributes, click, scroll, run a script, and
/// wait with a bounded timeout. Production uses the WebDriver wire client;
/// tests use the canned-page fake.
#[async_trait]
pub trait ElementGateway: Send + Sync {
    async fn load(&self, url: &str) -> ScrapeResult<()>;

    async fn current_url(&self) -> ScrapeResult<String>;

    async fn find_one(&self, locator: &Locator) -> ScrapeResult<Option<ElementHandle>>;

    async fn find_all(&self, locator: &Locator) -> ScrapeResult<Vec<ElementHandle>>;

    /// Scoped lookup under an already-resolved element.
    async fn find_within(
        &self,
        handle: &ElementHandle,
        locator: &Locator,
    ) -> ScrapeResult<Option<ElementHandle>>;

    async fn text(&self, handle: &ElementHandle) -> ScrapeResult<String>;

    async fn attribute(&self, handle: &ElementHandle, name: &str)
        -> ScrapeResult<Option<String>>;

    async fn click(&self, handle: &ElementHandle) -> ScrapeResult<()>;

    async fn scroll_into_view(&self, handle: &ElementHandle) -> ScrapeResult<()>;

    async fn run_script(&self, src: &str, args: &[ScriptArg]) -> ScrapeResult<()>;

    /// Poll for the locator until it resolves or the timeout elapses.
    /// Resolves to `ScrapeError::Timeout` on expiry, never hangs.
    async fn wait_until(&self, locator: &Locator, timeout: Duration)
        -> ScrapeResult<ElementHandle>;
}
