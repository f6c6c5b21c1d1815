use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub extraction: ExtractionConfig,
    pub enrichment: EnrichmentConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlConfig {
    /// Entry point of the whole crawl. Failure to load it is the one fatal
    /// error of a run.
    pub start_url: String,
    pub location: String,
    pub webdriver_url: String,
    /// Element ids removed from the DOM before any interaction so they
    /// cannot intercept clicks.
    pub overlay_ids: Vec<String>,
    pub stabilize_timeout_secs: u64,
    pub retry: RetryConfig,
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaginationConfig {
    pub next_page_timeout_secs: u64,
    /// Hard ceiling on pages per listing. There is no natural upper bound,
    /// but equal-URL redirects must not loop forever.
    pub max_pages: u32,
    /// How many consecutive next-page timeouts it takes to conclude
    /// end-of-results. 1 concludes on the first timeout; 2 shrugs off a
    /// single transient blip.
    pub timeouts_to_conclude: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractionConfig {
    /// Organizational domains an extracted email may belong to.
    pub email_domains: Vec<String>,
    /// Domains an initiative link may point at before it is followed.
    pub allowed_link_domains: Vec<String>,
    pub rules_path: String,
    pub default_service_areas: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnrichmentConfig {
    pub api_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub delay_between_requests_ms: u64,
    pub max_content_chars: usize,
    /// Interim results are written every this many records.
    pub backup_interval: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub progress_interval: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub directory: String,
    pub backup_directory: String,
    pub pretty_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawl: CrawlConfig {
                start_url: "https://211ontario.ca/search/".to_string(),
                location: "Toronto".to_string(),
                webdriver_url: "http://localhost:9515".to_string(),
                overlay_ids: vec![
                    "cookie-banner".to_string(),
                    "cookie-text".to_string(),
                    "cookie-info".to_string(),
                    "site-nav-lt".to_string(),
                ],
                stabilize_timeout_secs: 10,
                retry: RetryConfig {
                    max_attempts: 3,
                    delay_ms: 500,
                },
                pagination: PaginationConfig {
                    next_page_timeout_secs: 5,
                    max_pages: 50,
                    timeouts_to_conclude: 1,
                },
            },
            extraction: ExtractionConfig {
                email_domains: vec![
                    "protectchildren.ca".to_string(),
                    "cybertip.ca".to_string(),
                    "needhelpnow.ca".to_string(),
                    "missingkids.ca".to_string(),
                ],
                allowed_link_domains: vec![
                    "protectchildren.ca".to_string(),
                    "cybertip.ca".to_string(),
                    "needhelpnow.ca".to_string(),
                    "missingkids.ca".to_string(),
                ],
                rules_path: "categories.yml".to_string(),
                default_service_areas: vec!["Canada".to_string(), "Quebec".to_string()],
            },
            enrichment: EnrichmentConfig {
                api_url: "https://api.deepseek.com/v1/chat/completions".to_string(),
                model: "deepseek-chat".to_string(),
                timeout_secs: 60,
                max_retries: 3,
                delay_between_requests_ms: 2000,
                max_content_chars: 15000,
                backup_interval: 10,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                progress_interval: 10,
            },
            output: OutputConfig {
                directory: "out".to_string(),
                backup_directory: "backups".to_string(),
                pretty_json: true,
            },
        }
    }
}

pub async fn load_config(
    path: &str,
) -> std::result::Result<Config, Box<dyn std::error::Error + Send + Sync>> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&content)?;
    Ok(config)
}
