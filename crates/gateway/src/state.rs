//! Shared application state

use axum::extract::FromRef;
use papercompass_common::{
    auth::JwtManager,
    config::AppConfig,
    expansion::{KeywordExpander, TextGenerationClient},
    Repository, Result,
};
use papercompass_search::{model::PasaModel, CatalogStore, ConferenceCache, DataLoader, SearchEngine};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Where the classification model would be persisted
pub const MODEL_PATH: &str = "models/pasa_model.bin";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repo: Repository,
    pub jwt: Arc<JwtManager>,
    pub engine: Arc<SearchEngine>,
    pub expander: Option<Arc<dyn KeywordExpander>>,
    pub model: Arc<Mutex<PasaModel>>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, repo: Repository) -> Result<Self> {
        let jwt = JwtManager::from_config(config.auth.jwt_secret.as_deref(), config.auth.jwt_expiration_secs);

        let cache = ConferenceCache::new(DataLoader::new(config.data.data_dir.clone()));
        let engine = SearchEngine::new(Arc::new(cache), CatalogStore::new(config.data.key_infos_dir.clone()));

        let expander = TextGenerationClient::from_config(&config.expansion)?
            .map(|client| Arc::new(client) as Arc<dyn KeywordExpander>);
        if expander.is_none() {
            tracing::info!("Keyword expansion disabled, searches use local keywords");
        }

        Ok(Self {
            config,
            repo,
            jwt: Arc::new(jwt),
            engine: Arc::new(engine),
            expander,
            model: Arc::new(Mutex::new(PasaModel::new(MODEL_PATH))),
        })
    }

    pub fn expander(&self) -> Option<&dyn KeywordExpander> {
        self.expander.as_deref()
    }
}

impl FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}
