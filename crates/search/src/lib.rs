//! PaperCompass Search Library
//!
//! Filtering and faceting over per-conference paper metadata:
//! - Semi-structured paper records
//! - Conference discovery, loading and in-process memoization
//! - Key-field and category catalogs
//! - Status exclusion and multi-field keyword matching
//! - Key-field and category faceting
//! - Counts, export documents and the request-scoped search pipeline
//! - Preprocessing helpers and the placeholder model

pub mod catalog;
pub mod facets;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod preprocess;
pub mod record;
pub mod report;

pub use catalog::CatalogStore;
pub use filter::{SearchMode, DEFAULT_FIELDS, EXCLUDED_STATUSES};
pub use loader::{ConferenceCache, DataLoader};
pub use pipeline::{DataSource, SearchContext, SearchEngine, SearchOutcome};
pub use record::Record;
pub use report::{ExportDocument, SearchCounts};
