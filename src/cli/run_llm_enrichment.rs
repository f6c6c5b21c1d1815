// src/cli/run_llm_enrichment.rs
use crate::enrichment::annotator::API_KEY_VAR;
use crate::enrichment::{EnrichedRecord, LlmAnnotator, PageFetcher};
use crate::export;
use crate::extractor::{ContactMiner, ProviderAnalyzer, ServiceClassifier};
use crate::gateway::WebDriverGateway;
use crate::models::{CliApp, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use std::time::Duration;
use tracing::{info, warn};

impl CliApp {
    /// Visit each record's provider site and annotate it with the LLM.
    /// Records are never dropped: a failed step leaves its field absent.
    pub async fn run_llm_enrichment(&self) -> Result<()> {
        println!("\n🤖 LLM Enrichment");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        let annotator = match LlmAnnotator::from_env(&self.config.enrichment) {
            Ok(annotator) => annotator,
            Err(e) => {
                println!("❌ {}", e);
                println!("💡 Set {} in the environment or .env file", API_KEY_VAR);
                return Ok(());
            }
        };

        let input_csv: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Input records CSV")
            .default(format!(
                "{}/all_services_output.csv",
                self.config.output.directory
            ))
            .interact_text()?;

        let records = export::read_records_csv(&input_csv).await?;
        if records.is_empty() {
            println!("❌ No records found in {}", input_csv);
            return Ok(());
        }

        println!("📊 {} records to enrich", records.len());
        if !Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Start enrichment?")
            .default(true)
            .interact()?
        {
            println!("❌ Enrichment cancelled");
            return Ok(());
        }

        let miner = ContactMiner::new(&self.config.extraction.email_domains);
        let classifier = ServiceClassifier::new(self.rules.clone());
        let fetcher = PageFetcher::new(&self.config.enrichment);
        let gateway = WebDriverGateway::connect(&self.config.crawl.webdriver_url).await?;
        let analyzer = ProviderAnalyzer::new(&gateway, &miner, &classifier);

        let delay = Duration::from_millis(self.config.enrichment.delay_between_requests_ms);
        let mut enriched = Vec::new();

        for (index, record) in records.iter().enumerate() {
            println!(
                "[{}/{}] 🔎 {}",
                index + 1,
                records.len(),
                record.service_name
            );

            let provider_url = match record.service_url.as_deref() {
                Some(service_url) => match analyzer.resolve_provider_url(service_url).await {
                    Ok(url) => Some(url),
                    Err(e) => {
                        warn!("No provider URL for '{}': {}", record.service_name, e);
                        None
                    }
                },
                None => None,
            };

            let annotation = match provider_url.as_deref() {
                Some(url) => match fetcher.fetch_clean_text(url).await {
                    Ok(text) => match annotator.annotate(&text, &record.service_name).await {
                        Ok(annotation) => Some(annotation),
                        Err(e) => {
                            warn!("Annotation failed for '{}': {}", record.service_name, e);
                            None
                        }
                    },
                    Err(e) => {
                        warn!("Could not fetch {}: {}", url, e);
                        None
                    }
                },
                None => None,
            };

            enriched.push(EnrichedRecord {
                id: uuid::Uuid::new_v4().to_string(),
                record: record.clone(),
                provider_url,
                annotation,
                scrape_timestamp: chrono::Utc::now().to_rfc3339(),
            });

            // Interim backup so a crash keeps the progress so far.
            if (index + 1) % self.config.enrichment.backup_interval == 0 {
                let backup_path = export::timestamped_path(
                    &self.config.output.backup_directory,
                    "interim_results",
                    "csv",
                );
                if let Err(e) = export::write_enriched_csv(&enriched, &backup_path).await {
                    warn!("Backup failed: {}", e);
                } else {
                    info!("Progress saved to {}", backup_path);
                }
            }

            if index + 1 < records.len() {
                tokio::time::sleep(delay).await;
            }
        }

        gateway.quit().await;

        let json_path = format!(
            "{}/services_with_ai_analysis.json",
            self.config.output.directory
        );
        export::write_enriched_json(&enriched, &json_path, self.config.output.pretty_json).await?;

        let annotated = enriched.iter().filter(|r| r.annotation.is_some()).count();
        println!("\n🎉 Enrichment Summary");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("📊 Records processed: {}", enriched.len());
        println!("🤖 Annotated: {}", annotated);
        println!("📁 Saved to {}", json_path);

        Ok(())
    }
}
