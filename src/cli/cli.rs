use tracing::{info, warn};

use crate::config::Config;
use crate::extractor::classifier::{load_rules_from_yaml, CategoryRules};
use crate::models::{CliApp, Result};

#[derive(Debug, Clone)]
pub enum MenuAction {
    CrawlDirectory,
    AnalyzeProvider,
    EnrichWithLlm,
    Exit,
}

impl std::fmt::Display for MenuAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MenuAction::CrawlDirectory => {
                write!(f, "🕷️  Crawl directory: all topics and subtopics to CSV")
            }
            MenuAction::AnalyzeProvider => {
                write!(f, "🔎 Analyze a provider site into a nested report")
            }
            MenuAction::EnrichWithLlm => {
                write!(f, "🤖 Enrich scraped records with LLM analysis")
            }
            MenuAction::Exit => write!(f, "🚪 Exit"),
        }
    }
}

impl CliApp {
    pub async fn new(config: Config) -> Result<Self> {
        // Classification rules are data; fall back to the compiled-in
        // deployment tables when the file is missing.
        let rules = match load_rules_from_yaml(&config.extraction.rules_path).await {
            Ok(rules) => {
                info!(
                    "Loaded {} category rules from {}",
                    rules.categories.len(),
                    config.extraction.rules_path
                );
                rules
            }
            Err(e) => {
                warn!(
                    "Failed to load {}: {}. Using built-in rules.",
                    config.extraction.rules_path, e
                );
                CategoryRules::default()
            }
        };

        Ok(Self { config, rules })
    }
}
