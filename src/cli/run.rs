use dialoguer::{theme::ColorfulTheme, Select};

use crate::{
    cli::cli::MenuAction,
    models::{CliApp, Result},
};
use tracing::error;

impl CliApp {
    pub async fn run(&self) -> Result<()> {
        println!("\n🚀 Welcome to Service Scraper!");
        println!("═══════════════════════════════════════");

        loop {
            let actions = vec![
                MenuAction::CrawlDirectory,
                MenuAction::AnalyzeProvider,
                MenuAction::EnrichWithLlm,
                MenuAction::Exit,
            ];

            let selection = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("\nSelect an action")
                .default(0)
                .items(&actions)
                .interact()?;

            match &actions[selection] {
                MenuAction::CrawlDirectory => {
                    if let Err(e) = self.run_directory_crawl().await {
                        error!("Directory crawl failed: {}", e);
                    }
                }
                MenuAction::AnalyzeProvider => {
                    if let Err(e) = self.run_provider_analysis().await {
                        error!("Provider analysis failed: {}", e);
                    }
                }
                MenuAction::EnrichWithLlm => {
                    if let Err(e) = self.run_llm_enrichment().await {
                        error!("LLM enrichment failed: {}", e);
                    }
                }
                MenuAction::Exit => {
                    println!("\n👋 Thanks for using Service Scraper!");
                    break;
                }
            }
        }

        Ok(())
    }
}
