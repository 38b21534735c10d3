//! PaperCompass key-field extraction
//!
//! Rebuilds the per-conference key-field catalogs from the raw dumps:
//! 1. Reads data and catalog directories from configuration
//! 2. Scans each known conference directory
//! 3. Writes sorted distinct values per key field
//!
//! Usage: `extract-key-fields [conference ...]`

mod errors;
mod extractor;

use errors::IngestionError;
use papercompass_common::{config::AppConfig, VERSION};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(|e| IngestionError::ConfigError(e.to_string()))?;

    // Initialize tracing
    let filter = EnvFilter::try_new(&config.observability.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }

    info!("Starting PaperCompass key-field extraction v{}", VERSION);

    let only: Vec<String> = std::env::args().skip(1).collect();
    for name in &only {
        if extractor::key_fields_for(name).is_none() {
            warn!(conference = %name, "Unknown conference, no key fields defined");
        }
    }

    let summary = extractor::process_conference_files(&config.data.data_dir, &config.data.key_infos_dir, &only)?;

    info!(
        written = summary.written.len(),
        skipped_conferences = summary.skipped_conferences.len(),
        failed_files = summary.failed_files.len(),
        "Key-field extraction finished"
    );

    Ok(())
}
