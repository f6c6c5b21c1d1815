pub mod cli;
pub mod run;
mod run_directory_crawl;
mod run_llm_enrichment;
mod run_provider_analysis;
