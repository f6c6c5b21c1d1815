pub mod analyzer;
pub mod classifier;
pub mod contact_miner;
pub mod merger;
pub mod types;

pub use analyzer::ProviderAnalyzer;
pub use classifier::{CategoryRules, ServiceClassifier};
pub use contact_miner::ContactMiner;
pub use merger::RecordMerger;
pub use types::{ContactInfo, InitiativeDetail, MainService, ProviderAnalysis, ServiceType};
