pub mod locators;
pub mod pagination;
pub mod traversal;
pub mod types;

pub use pagination::PaginationWalker;
pub use traversal::TraversalController;
pub use types::{ListingPage, RawEntry, ServiceRecord, Subtopic, Topic};
