// src/cli/run_directory_crawl.rs
use crate::crawler::TraversalController;
use crate::export;
use crate::gateway::WebDriverGateway;
use crate::models::{CliApp, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use std::collections::BTreeMap;

impl CliApp {
    pub async fn run_directory_crawl(&self) -> Result<()> {
        println!("\n🕷️  Directory Crawl");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        let location: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Search location")
            .default(self.config.crawl.location.clone())
            .interact_text()?;

        println!(
            "🎯 Crawling {} for '{}' via WebDriver at {}",
            self.config.crawl.start_url, location, self.config.crawl.webdriver_url
        );

        if !Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Start crawling?")
            .default(true)
            .interact()?
        {
            println!("❌ Crawl cancelled");
            return Ok(());
        }

        let mut crawl_config = self.config.crawl.clone();
        crawl_config.location = location;

        let gateway = WebDriverGateway::connect(&crawl_config.webdriver_url).await?;
        let controller = TraversalController::new(&gateway, &crawl_config);
        let crawl_result = controller.crawl().await;
        gateway.quit().await;

        let records = crawl_result?;

        let output_path = format!("{}/all_services_output.csv", self.config.output.directory);
        export::write_records_csv(&records, &output_path).await?;

        // Per-topic breakdown.
        let mut by_topic: BTreeMap<&str, usize> = BTreeMap::new();
        for record in &records {
            *by_topic.entry(record.topic.as_str()).or_insert(0) += 1;
        }

        println!("\n🎉 Crawl Summary");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("📊 Total records: {}", records.len());
        for (topic, count) in &by_topic {
            println!("   {}: {}", topic, count);
        }
        println!("📁 Saved to {}", output_path);

        Ok(())
    }
}
