use std::sync::Arc;

use crate::{config::AppConfig, llm::SpendAnalyzer, taxonomy::TaxonomyStore};

/// Estado compartido por los handlers. Taxonomía y analizador se construyen
/// una vez en el arranque y son de sólo lectura a partir de ahí.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub taxonomy: Arc<TaxonomyStore>,
    pub analyzer: Arc<SpendAnalyzer>,
}
