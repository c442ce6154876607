pub mod emails;
pub mod links;

pub use emails::EmailExtractor;
pub use links::LinkCollector;
