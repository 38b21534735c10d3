//! Process-level memo of parsed conference data

use super::DataLoader;
use crate::record::Record;
use papercompass_common::{errors::Result, metrics};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const CACHE_NAME: &str = "conference";

/// Parsed conference data keyed by conference name.
///
/// Entries live until the process exits. Failed loads are not cached.
pub struct ConferenceCache {
    loader: DataLoader,
    entries: RwLock<HashMap<String, Arc<Vec<Record>>>>,
}

impl ConferenceCache {
    pub fn new(loader: DataLoader) -> Self {
        Self {
            loader,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn loader(&self) -> &DataLoader {
        &self.loader
    }

    /// Cached records for a conference, loading them on first use
    pub async fn get(&self, conference: &str) -> Result<Arc<Vec<Record>>> {
        if let Some(records) = self.entries.read().await.get(conference) {
            metrics::record_cache(true, CACHE_NAME);
            return Ok(Arc::clone(records));
        }

        metrics::record_cache(false, CACHE_NAME);
        let records = Arc::new(self.loader.load_conference(conference).await?);

        let mut entries = self.entries.write().await;
        // Another request may have filled the slot while this one was reading
        let entry = entries
            .entry(conference.to_string())
            .or_insert_with(|| Arc::clone(&records));

        Ok(Arc::clone(entry))
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
