// src/gateway/webdriver.rs - W3C WebDriver wire client backing ElementGateway
use crate::errors::{ScrapeError, ScrapeResult};
use crate::gateway::types::{By, ElementGateway, ElementHandle, Locator, ScriptArg};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// JSON key the wire protocol uses to tag element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const POLL_INTERVAL: Duration = Duration::from_millis(250);

enum Wire {
    Value(Value),
    Fault { error: String, message: String },
}

/// Thin client for a WebDriver endpoint (chromedriver, selenium grid). One
/// instance owns one browsing context for the duration of a run.
pub struct WebDriverGateway {
    client: reqwest::Client,
    base_url: String,
    session_id: String,
}

impl WebDriverGateway {
    /// Open a headless session against the given WebDriver endpoint.
    pub async fn connect(base_url: &str) -> ScrapeResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; ServiceScraper/1.0)")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ScrapeError::NavigationFailure(e.to_string()))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": [
                            "--headless",
                            "--disable-gpu",
                            "--window-size=1920,1080"
                        ]
                    }
                }
            }
        });

        let resp = client
            .post(format!("{base_url}/session"))
            .json(&capabilities)
            .send()
            .await
            .map_err(|e| ScrapeError::NavigationFailure(format!("webdriver unreachable: {e}")))?;

        let body: Value = resp
            .json()
            .await
            .map_err(|e| ScrapeError::NavigationFailure(e.to_string()))?;

        let session_id = body["value"]["sessionId"]
            .as_str()
            .ok_or_else(|| {
                ScrapeError::NavigationFailure(format!("no session in response: {body}"))
            })?
            .to_string();

        debug!("WebDriver session {} opened at {}", session_id, base_url);

        Ok(Self {
            client,
            base_url,
            session_id,
        })
    }

    /// Tear down the browsing context. Failures are logged, not raised; the
    /// session dies with the driver process anyway.
    pub async fn quit(&self) {
        let url = format!("{}/session/{}", self.base_url, self.session_id);
        if let Err(e) = self.client.delete(&url).send().await {
            warn!("Failed to close WebDriver session: {}", e);
        }
    }

    fn session_url(&self, path: &str) -> String {
        format!("{}/session/{}/{}", self.base_url, self.session_id, path)
    }

    async fn decode(resp: reqwest::Response) -> ScrapeResult<Wire> {
        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(|e| ScrapeError::NavigationFailure(e.to_string()))?;

        if status.is_success() {
            return Ok(Wire::Value(body["value"].clone()));
        }

        Ok(Wire::Fault {
            error: body["value"]["error"].as_str().unwrap_or("").to_string(),
            message: body["value"]["message"]
                .as_str()
                .unwrap_or("unknown webdriver fault")
                .to_string(),
        })
    }

    async fn post(&self, path: &str, body: Value) -> ScrapeResult<Wire> {
        let resp = self
            .client
            .post(self.session_url(path))
            .json(&body)
            .send()
            .await
            .map_err(|e| ScrapeError::NavigationFailure(e.to_string()))?;
        Self::decode(resp).await
    }

    async fn get(&self, path: &str) -> ScrapeResult<Wire> {
        let resp = self
            .client
            .get(self.session_url(path))
            .send()
            .await
            .map_err(|e| ScrapeError::NavigationFailure(e.to_string()))?;
        Self::decode(resp).await
    }

    fn strategy(by: By) -> &'static str {
        match by {
            By::Css => "css selector",
            By::XPath => "xpath",
        }
    }

    fn decode_element(value: &Value) -> Option<ElementHandle> {
        value[ELEMENT_KEY].as_str().map(|id| ElementHandle {
            id: id.to_string(),
        })
    }

    /// Shared decode for the three find endpoints: an absent element is a
    /// normal `None`, any other fault is a navigation failure.
    fn decode_find(wire: Wire, locator: &Locator) -> ScrapeResult<Option<ElementHandle>> {
        match wire {
            Wire::Value(v) => Ok(Self::decode_element(&v)),
            Wire::Fault { error, .. } if error == "no such element" => Ok(None),
            Wire::Fault { error, message } => Err(ScrapeError::NavigationFailure(format!(
                "find {locator}: {error}: {message}"
            ))),
        }
    }

    fn encode_arg(arg: &ScriptArg) -> Value {
        match arg {
            ScriptArg::Element(handle) => json!({ ELEMENT_KEY: handle.id }),
            ScriptArg::Text(text) => json!(text),
        }
    }
}

#[async_trait]
impl ElementGateway for WebDriverGateway {
    async fn load(&self, url: &str) -> ScrapeResult<()> {
        match self.post("url", json!({ "url": url })).await? {
            Wire::Value(_) => Ok(()),
            Wire::Fault { error, message } => Err(ScrapeError::NavigationFailure(format!(
                "load {url}: {error}: {message}"
            ))),
        }
    }

    async fn current_url(&self) -> ScrapeResult<String> {
        match self.get("url").await? {
            Wire::Value(v) => Ok(v.as_str().unwrap_or_default().to_string()),
            Wire::Fault { error, message } => Err(ScrapeError::NavigationFailure(format!(
                "current url: {error}: {message}"
            ))),
        }
    }

    async fn find_one(&self, locator: &Locator) -> ScrapeResult<Option<ElementHandle>> {
        let wire = self
            .post(
                "element",
                json!({ "using": Self::strategy(locator.by), "value": locator.expr }),
            )
            .await?;
        Self::decode_find(wire, locator)
    }

    async fn find_all(&self, locator: &Locator) -> ScrapeResult<Vec<ElementHandle>> {
        let wire = self
            .post(
                "elements",
                json!({ "using": Self::strategy(locator.by), "value": locator.expr }),
            )
            .await?;
        match wire {
            Wire::Value(Value::Array(items)) => {
                Ok(items.iter().filter_map(Self::decode_element).collect())
            }
            Wire::Value(_) => Ok(Vec::new()),
            Wire::Fault { error, message } => Err(ScrapeError::NavigationFailure(format!(
                "find all {locator}: {error}: {message}"
            ))),
        }
    }

    async fn find_within(
        &self,
        handle: &ElementHandle,
        locator: &Locator,
    ) -> ScrapeResult<Option<ElementHandle>> {
        let wire = self
            .post(
                &format!("element/{}/element", handle.id),
                json!({ "using": Self::strategy(locator.by), "value": locator.expr }),
            )
            .await?;
        Self::decode_find(wire, locator)
    }

    async fn text(&self, handle: &ElementHandle) -> ScrapeResult<String> {
        match self.get(&format!("element/{}/text", handle.id)).await? {
            Wire::Value(v) => Ok(v.as_str().unwrap_or_default().to_string()),
            Wire::Fault { error, message } => Err(ScrapeError::NavigationFailure(format!(
                "element text: {error}: {message}"
            ))),
        }
    }

    async fn attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
    ) -> ScrapeResult<Option<String>> {
        match self
            .get(&format!("element/{}/attribute/{}", handle.id, name))
            .await?
        {
            Wire::Value(Value::Null) => Ok(None),
            Wire::Value(v) => Ok(v.as_str().map(String::from)),
            Wire::Fault { error, message } => Err(ScrapeError::NavigationFailure(format!(
                "attribute {name}: {error}: {message}"
            ))),
        }
    }

    async fn click(&self, handle: &ElementHandle) -> ScrapeResult<()> {
        match self
            .post(&format!("element/{}/click", handle.id), json!({}))
            .await?
        {
            Wire::Value(_) => Ok(()),
            Wire::Fault { error, message } => Err(ScrapeError::NavigationFailure(format!(
                "click: {error}: {message}"
            ))),
        }
    }

    async fn scroll_into_view(&self, handle: &ElementHandle) -> ScrapeResult<()> {
        self.run_script(
            "arguments[0].scrollIntoView(true);",
            &[ScriptArg::Element(handle.clone())],
        )
        .await
    }

    async fn run_script(&self, src: &str, args: &[ScriptArg]) -> ScrapeResult<()> {
        let encoded: Vec<Value> = args.iter().map(Self::encode_arg).collect();
        match self
            .post("execute/sync", json!({ "script": src, "args": encoded }))
            .await?
        {
            Wire::Value(_) => Ok(()),
            Wire::Fault { error, message } => Err(ScrapeError::NavigationFailure(format!(
                "script: {error}: {message}"
            ))),
        }
    }

    async fn wait_until(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> ScrapeResult<ElementHandle> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(handle) = self.find_one(locator).await? {
                return Ok(handle);
            }
            if Instant::now() >= deadline {
                return Err(ScrapeError::Timeout {
                    what: locator.description.clone(),
                    waited: timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}
