//! Data module - CSV loading, cleaning passes and the cleaning report

mod cleaner;
mod loader;
mod processor;
mod report;

pub use cleaner::DatasetCleaner;
pub use processor::DataProcessor;
