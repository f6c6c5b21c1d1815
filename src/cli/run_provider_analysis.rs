// src/cli/run_provider_analysis.rs
use crate::export;
use crate::extractor::{ContactMiner, ProviderAnalyzer, ServiceClassifier};
use crate::gateway::WebDriverGateway;
use crate::models::{CliApp, Result};
use dialoguer::{theme::ColorfulTheme, Input};

impl CliApp {
    /// Deep-dive one record's provider site into the nested analysis
    /// document.
    pub async fn run_provider_analysis(&self) -> Result<()> {
        println!("\n🔎 Provider Analysis");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        let input_csv: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Input records CSV")
            .default(format!(
                "{}/all_services_output.csv",
                self.config.output.directory
            ))
            .interact_text()?;

        let records = export::read_records_csv(&input_csv).await?;
        let Some(record) = records.into_iter().find(|r| r.service_url.is_some()) else {
            println!("❌ No records with a service URL in {}", input_csv);
            return Ok(());
        };

        println!("📋 Analyzing: {}", record.service_name);

        let miner = ContactMiner::new(&self.config.extraction.email_domains);
        let classifier = ServiceClassifier::new(self.rules.clone());

        let gateway = WebDriverGateway::connect(&self.config.crawl.webdriver_url).await?;
        let analyzer = ProviderAnalyzer::new(&gateway, &miner, &classifier);
        let analysis_result = analyzer.analyze(&record, &self.config.extraction).await;
        gateway.quit().await;

        let analysis = analysis_result?;

        let output_path = format!(
            "{}/service_data/service_analysis.json",
            self.config.output.directory
        );
        export::write_analysis_json(&analysis, &output_path, self.config.output.pretty_json)
            .await?;

        println!("\n🎉 Analysis Summary");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("🏢 Provider: {}", analysis.main_service.provider_url);
        println!("🏷️  Categories: {}", analysis.main_service.service_categories.len());
        println!("🧩 Initiatives: {}", analysis.core_initiatives.len());
        println!("🔗 Key URLs: {}", analysis.key_urls.len());
        println!("📁 Saved to {}", output_path);

        Ok(())
    }
}
