// src/crawler/locators.rs
//
// Every element the directory crawl touches, addressed by a stable
// selector + description pair. Locators are re-resolved after each
// navigation; nothing here yields a handle that outlives a page load.
use crate::gateway::Locator;

pub fn location_input() -> Locator {
    Locator::css("#searchLocation", "location search box")
}

pub fn topic_links() -> Locator {
    Locator::xpath("//a[contains(@class, 'topic')]", "topic links")
}

pub fn topic_by_name(name: &str) -> Locator {
    Locator::xpath(
        format!("//a[contains(text(), '{name}')]"),
        format!("topic link '{name}'"),
    )
}

pub fn subtopic_headings() -> Locator {
    Locator::xpath("//div[@class='subtopic-heading']", "subtopic headings")
}

pub fn view_resources_for(subtopic: &str) -> Locator {
    Locator::xpath(
        format!(
            "//div[@class='subtopic-heading' and contains(text(), '{subtopic}')]\
             /following-sibling::a[@class='red-button']"
        ),
        format!("view-resources button for '{subtopic}'"),
    )
}

pub fn listing_titles() -> Locator {
    Locator::css(".title", "service listing titles")
}

pub fn entry_link() -> Locator {
    Locator::css("a", "listing entry link")
}

pub fn next_page_link() -> Locator {
    Locator::xpath(
        "//span[@aria-label='Next Page']/parent::a",
        "next-page link",
    )
}

pub fn provider_website_link() -> Locator {
    Locator::css(
        ".record-detail-content a[target='_blank']",
        "provider website link",
    )
}
