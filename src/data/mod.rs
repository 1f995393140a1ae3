//! Data module - source loading, cleaning and joining

mod loader;
mod processor;
pub mod record;

pub use loader::{DataLoader, LoaderError};
pub use processor::{canonical_prefecture, DataProcessor, ProcessorError};
pub use record::{DisasterCounts, JoinedPrefecture};
