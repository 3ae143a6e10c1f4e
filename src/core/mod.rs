mod engine;
mod target;

// Change-detection pipeline
mod fetcher;
mod detector;
pub mod backoff;

// Persistence boundary and scheduling
mod store;
mod scheduler;

pub use target::{MonitoredTarget, SourceType, TargetStatus, TargetUpdate};
pub use fetcher::{
    extract_html_text, fingerprint, normalize_text, ContentFetcher, FetchedContent, Fetcher,
    PdfTextExtractor, UnsupportedPdfExtractor,
};
pub use detector::has_changed;
pub use store::{DataStore, JsonFileStore, MemoryStore};
pub use scheduler::{run_daily, MonitoringScheduler, TargetOutcome, TickReport};

// Export the main engine
pub use engine::Engine;
