// src/gateway/fake.rs - canned-page ElementGateway double for tests
use crate::errors::{ScrapeError, ScrapeResult};
use crate::gateway::types::{ElementGateway, ElementHandle, Locator, ScriptArg};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
struct FakeElement {
    selector: String,
    text: String,
    attrs: HashMap<String, String>,
    children: Vec<FakeElement>,
}

/// One canned page. Elements match a locator when their selector string
/// equals the locator expression; the strategy is ignored, the fake does not
/// parse CSS or XPath.
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    elements: Vec<FakeElement>,
    fail_budget: HashMap<String, u32>,
    wait_delay: HashMap<String, u32>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level element. `attrs` are (name, value) pairs; the special
    /// attribute `data-navigate` makes a click load that URL.
    pub fn element(mut self, selector: &str, text: &str, attrs: &[(&str, &str)]) -> Self {
        self.elements.push(FakeElement {
            selector: selector.to_string(),
            text: text.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children: Vec::new(),
        });
        self
    }

    /// Attach a child to the most recently added element.
    pub fn child(mut self, selector: &str, text: &str, attrs: &[(&str, &str)]) -> Self {
        let parent = self
            .elements
            .last_mut()
            .expect("child() requires a preceding element()");
        parent.children.push(FakeElement {
            selector: selector.to_string(),
            text: text.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children: Vec::new(),
        });
        self
    }

    /// Make the next `n` clicks on elements matching `selector` fail.
    pub fn fail_clicks(mut self, selector: &str, n: u32) -> Self {
        self.fail_budget.insert(selector.to_string(), n);
        self
    }

    /// Make the next `n` `wait_until` calls for `selector` time out even if
    /// the element exists.
    pub fn delay_waits(mut self, selector: &str, n: u32) -> Self {
        self.wait_delay.insert(selector.to_string(), n);
        self
    }
}

#[derive(Debug, Clone)]
struct Resolved {
    generation: u64,
    selector: String,
    text: String,
    attrs: HashMap<String, String>,
    children: Vec<FakeElement>,
}

#[derive(Default)]
struct Inner {
    pages: HashMap<String, FakePage>,
    current: Option<String>,
    generation: u64,
    registry: HashMap<String, Resolved>,
    next_handle: u64,
    loads: HashMap<String, u32>,
    click_attempts: HashMap<String, u32>,
}

/// In-memory ElementGateway serving canned pages. Waits resolve instantly,
/// handles go stale on navigation exactly like the real thing.
#[derive(Default)]
pub struct FakeGateway {
    inner: Mutex<Inner>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&self, url: &str, page: FakePage) {
        self.inner
            .lock()
            .unwrap()
            .pages
            .insert(url.to_string(), page);
    }

    /// Test convenience: load and unwrap.
    pub async fn load_page(&self, url: &str) {
        self.load(url).await.expect("canned page should load");
    }

    pub fn click_attempts(&self, selector: &str) -> u32 {
        *self
            .inner
            .lock()
            .unwrap()
            .click_attempts
            .get(selector)
            .unwrap_or(&0)
    }

    pub fn load_count(&self, url: &str) -> u32 {
        *self.inner.lock().unwrap().loads.get(url).unwrap_or(&0)
    }

    fn register(inner: &mut Inner, element: &FakeElement) -> ElementHandle {
        inner.next_handle += 1;
        let id = format!("fake-{}", inner.next_handle);
        inner.registry.insert(
            id.clone(),
            Resolved {
                generation: inner.generation,
                selector: element.selector.clone(),
                text: element.text.clone(),
                attrs: element.attrs.clone(),
                children: element.children.clone(),
            },
        );
        ElementHandle { id }
    }

    fn resolve(inner: &Inner, handle: &ElementHandle) -> ScrapeResult<Resolved> {
        let entry = inner
            .registry
            .get(&handle.id)
            .ok_or_else(|| ScrapeError::NavigationFailure("unknown handle".to_string()))?;
        if entry.generation != inner.generation {
            return Err(ScrapeError::NavigationFailure(
                "stale element reference".to_string(),
            ));
        }
        Ok(entry.clone())
    }

    fn do_load(inner: &mut Inner, url: &str) -> ScrapeResult<()> {
        if !inner.pages.contains_key(url) {
            return Err(ScrapeError::NavigationFailure(format!(
                "no canned page for {url}"
            )));
        }
        inner.current = Some(url.to_string());
        inner.generation += 1;
        *inner.loads.entry(url.to_string()).or_insert(0) += 1;
        Ok(())
    }

    fn do_click(inner: &mut Inner, handle: &ElementHandle) -> ScrapeResult<()> {
        let entry = Self::resolve(inner, handle)?;
        *inner
            .click_attempts
            .entry(entry.selector.clone())
            .or_insert(0) += 1;

        let current = inner.current.clone().unwrap_or_default();
        if let Some(page) = inner.pages.get_mut(&current) {
            if let Some(budget) = page.fail_budget.get_mut(&entry.selector) {
                if *budget > 0 {
                    *budget = budget.saturating_sub(1);
                    return Err(ScrapeError::NavigationFailure(
                        "click intercepted".to_string(),
                    ));
                }
            }
        }

        if let Some(target) = entry.attrs.get("data-navigate") {
            let target = target.clone();
            return Self::do_load(inner, &target);
        }
        Ok(())
    }

    fn find_first(inner: &mut Inner, expr: &str) -> Option<ElementHandle> {
        let current = inner.current.clone()?;
        let element = inner
            .pages
            .get(&current)?
            .elements
            .iter()
            .find(|e| e.selector == expr)
            .cloned()?;
        Some(Self::register(inner, &element))
    }
}

#[async_trait]
impl ElementGateway for FakeGateway {
    async fn load(&self, url: &str) -> ScrapeResult<()> {
        Self::do_load(&mut self.inner.lock().unwrap(), url)
    }

    async fn current_url(&self) -> ScrapeResult<String> {
        self.inner
            .lock()
            .unwrap()
            .current
            .clone()
            .ok_or_else(|| ScrapeError::NavigationFailure("no page loaded".to_string()))
    }

    async fn find_one(&self, locator: &Locator) -> ScrapeResult<Option<ElementHandle>> {
        Ok(Self::find_first(
            &mut self.inner.lock().unwrap(),
            &locator.expr,
        ))
    }

    async fn find_all(&self, locator: &Locator) -> ScrapeResult<Vec<ElementHandle>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(current) = inner.current.clone() else {
            return Ok(Vec::new());
        };
        let matches: Vec<FakeElement> = inner
            .pages
            .get(&current)
            .map(|p| {
                p.elements
                    .iter()
                    .filter(|e| e.selector == locator.expr)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(matches
            .iter()
            .map(|e| Self::register(&mut inner, e))
            .collect())
    }

    async fn find_within(
        &self,
        handle: &ElementHandle,
        locator: &Locator,
    ) -> ScrapeResult<Option<ElementHandle>> {
        let mut inner = self.inner.lock().unwrap();
        let entry = Self::resolve(&inner, handle)?;
        let child = entry
            .children
            .iter()
            .find(|c| c.selector == locator.expr)
            .cloned();
        Ok(child.map(|c| Self::register(&mut inner, &c)))
    }

    async fn text(&self, handle: &ElementHandle) -> ScrapeResult<String> {
        let inner = self.inner.lock().unwrap();
        Ok(Self::resolve(&inner, handle)?.text)
    }

    async fn attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
    ) -> ScrapeResult<Option<String>> {
        let inner = self.inner.lock().unwrap();
        Ok(Self::resolve(&inner, handle)?.attrs.get(name).cloned())
    }

    async fn click(&self, handle: &ElementHandle) -> ScrapeResult<()> {
        Self::do_click(&mut self.inner.lock().unwrap(), handle)
    }

    async fn scroll_into_view(&self, _handle: &ElementHandle) -> ScrapeResult<()> {
        Ok(())
    }

    async fn run_script(&self, src: &str, args: &[ScriptArg]) -> ScrapeResult<()> {
        // The only script with observable behavior here is the forced click.
        if src.contains(".click()") {
            if let Some(ScriptArg::Element(handle)) = args.first() {
                return Self::do_click(&mut self.inner.lock().unwrap(), handle);
            }
        }
        Ok(())
    }

    async fn wait_until(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> ScrapeResult<ElementHandle> {
        let mut inner = self.inner.lock().unwrap();
        let current = inner.current.clone().unwrap_or_default();
        if let Some(page) = inner.pages.get_mut(&current) {
            if let Some(delay) = page.wait_delay.get_mut(&locator.expr) {
                if *delay > 0 {
                    *delay -= 1;
                    return Err(ScrapeError::Timeout {
                        what: locator.description.clone(),
                        waited: timeout,
                    });
                }
            }
        }
        Self::find_first(&mut inner, &locator.expr).ok_or_else(|| ScrapeError::Timeout {
            what: locator.description.clone(),
            waited: timeout,
        })
    }
}
