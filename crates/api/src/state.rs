use std::sync::Arc;

use arbor_domain::categories::CategoryService;
use arbor_domain::in_memory::InMemoryCategoryRepository;
use arbor_domain::ports::categories::CategoryRepository;
use arbor_domain::ports::graph::GraphStore;
use arbor_infra::config::{AppConfig, DataBackend};
use arbor_infra::db::{DbConfig, SurrealGraphStore};
use arbor_infra::repositories::GraphCategoryRepository;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub categories: CategoryService,
    /// `None` for the in-memory backend.
    pub graph_store: Option<Arc<dyn GraphStore>>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        match config.data_backend()? {
            DataBackend::Memory => {
                tracing::warn!("using in-memory category store; data is lost on restart");
                let repository = Arc::new(InMemoryCategoryRepository::new());
                Ok(Self::with_repository(config, repository))
            }
            DataBackend::Surreal => {
                let store: Arc<dyn GraphStore> =
                    Arc::new(SurrealGraphStore::connect(DbConfig::from_app_config(&config)).await?);
                let repository = Arc::new(GraphCategoryRepository::new(store.clone()));
                let mut state = Self::with_repository(config, repository);
                state.graph_store = Some(store);
                Ok(state)
            }
        }
    }

    pub fn with_repository(config: AppConfig, repository: Arc<dyn CategoryRepository>) -> Self {
        let categories =
            CategoryService::new(repository).with_ownership_policy(config.ownership_policy());
        Self {
            config,
            categories,
            graph_store: None,
        }
    }
}
