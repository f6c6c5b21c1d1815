#[cfg(test)]
pub mod fake;
pub mod retry;
pub mod types;
pub mod webdriver;

pub use retry::click_with_retry;
pub use types::{By, ElementGateway, ElementHandle, Locator, ScriptArg};
pub use webdriver::WebDriverGateway;
