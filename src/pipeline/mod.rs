//! Pipeline entry points for the batch commands.
//!
//! - `run_scrape`: Fetch sources and store new postings
//! - `run_send`: Deliver unsent postings
//! - `run_normalize` / `run_merge`: Reconcile stored ids
//! - `run_report`: Post the daily summary
//! - `run_pipeline`: Scrape, then send

pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod scrape;
pub mod send;

pub use pipeline::{PipelineStats, run_pipeline};
pub use reconcile::{run_merge, run_normalize};
pub use report::run_report;
pub use scrape::{ScrapeStats, ingest_pages, run_scrape};
pub use send::{SendStats, run_send};
