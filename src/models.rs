use crate::config::Config;
use crate::extractor::CategoryRules;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub struct CliApp {
    pub config: Config,
    pub rules: CategoryRules,
}
