use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::MockDatabase,
    local_storage::{LocalStore, StorageError},
    notify::WhatsAppNotifier,
    services::{
        api_service::ApiService, cart_service::CartService, language_service::LanguageService,
        order_service::OrderStore,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub api: ApiService,
    pub storage: LocalStore,
    pub orders: Arc<OrderStore>,
    pub carts: Arc<CartService>,
    pub language: LanguageService,
}

impl AppState {
    /// Wires every store over a freshly seeded mock database.
    pub async fn build(config: AppConfig) -> Result<Self, StorageError> {
        let storage = match &config.local_storage_path {
            Some(path) => LocalStore::open(path).await?,
            None => LocalStore::in_memory(),
        };
        Ok(Self::with_parts(config, Arc::new(MockDatabase::new()), storage))
    }

    pub fn with_parts(config: AppConfig, db: Arc<MockDatabase>, storage: LocalStore) -> Self {
        let api = ApiService::new(db, &config.db, config.is_development());
        let notifier = WhatsAppNotifier::new(&config.whatsapp);
        Self {
            orders: Arc::new(OrderStore::new(api.clone(), storage.clone(), notifier)),
            carts: Arc::new(CartService::new(api.clone(), storage.clone())),
            language: LanguageService::new(api.clone(), storage.clone()),
            config: Arc::new(config),
            api,
            storage,
        }
    }
}
