use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::repository::Store;
use crate::services::gemini_client::ItineraryModel;

/// Shared handles registered as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub model: Arc<dyn ItineraryModel>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>, model: Arc<dyn ItineraryModel>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            model,
        }
    }
}
