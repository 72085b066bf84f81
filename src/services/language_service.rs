//! Language preference: database first, local storage as the fallback.

use crate::{
    dto::preferences::{LanguageState, PreferenceSource, SavePreferences},
    error::AppResult,
    local_storage::{LocalStore, keys},
    models::Language,
    services::api_service::ApiService,
};

#[derive(Clone)]
pub struct LanguageService {
    api: ApiService,
    storage: LocalStore,
}

impl LanguageService {
    pub fn new(api: ApiService, storage: LocalStore) -> Self {
        Self { api, storage }
    }

    pub async fn load(&self, user_id: Option<&str>) -> LanguageState {
        match self.api.get_user_preferences(user_id).await {
            Ok(Some(preference)) => LanguageState {
                language: preference.language,
                has_visited: preference.has_visited,
                show_language_modal: !preference.has_visited,
                source: PreferenceSource::Database,
            },
            Ok(None) => self.load_from_local_storage().await,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load preferences from database, using local storage");
                self.load_from_local_storage().await
            }
        }
    }

    /// Reads the mirrored keys. The first read marks the visitor as seen so
    /// the picker is offered only once.
    async fn load_from_local_storage(&self) -> LanguageState {
        let stored = self
            .storage
            .get_item(keys::LANGUAGE)
            .await
            .and_then(|code| Language::from_code(&code));
        let has_visited = self.storage.get_item(keys::HAS_VISITED).await.is_some();

        if !has_visited {
            if let Err(err) = self.storage.set_item(keys::HAS_VISITED, "true").await {
                tracing::warn!(error = %err, "failed to mark visitor as seen");
            }
        }

        LanguageState {
            language: stored.unwrap_or_default(),
            has_visited,
            show_language_modal: !has_visited,
            source: if stored.is_some() || has_visited {
                PreferenceSource::Local
            } else {
                PreferenceSource::Default
            },
        }
    }

    /// Saves to the database and mirrors to local storage. A database failure
    /// degrades to local storage only; only a failure of both is an error.
    pub async fn set_language(&self, payload: SavePreferences) -> AppResult<LanguageState> {
        let language = payload.language;
        let saved = self.api.save_user_preferences(payload).await;

        self.storage.set_item(keys::LANGUAGE, language.code()).await?;
        self.storage.set_item(keys::HAS_VISITED, "true").await?;

        let source = match saved {
            Ok(_) => {
                tracing::debug!(language = language.code(), "language preference saved to database");
                PreferenceSource::Database
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to save preferences to database, kept locally");
                PreferenceSource::Local
            }
        };

        Ok(LanguageState {
            language,
            has_visited: true,
            show_language_modal: false,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{AppConfig, DbSettings},
        db::{DbError, MockDatabase},
    };
    use std::sync::Arc;

    fn service(db: Arc<MockDatabase>, storage: LocalStore) -> LanguageService {
        let settings = DbSettings {
            max_retries: 0,
            ..AppConfig::local().db
        };
        LanguageService::new(ApiService::new(db, &settings, true), storage)
    }

    fn nepali() -> SavePreferences {
        SavePreferences {
            user_id: None,
            language: Language::Nepali,
            has_visited: true,
        }
    }

    #[tokio::test]
    async fn first_visit_offers_the_picker_once() {
        let storage = LocalStore::in_memory();
        let languages = service(Arc::new(MockDatabase::new()), storage.clone());

        let first = languages.load(None).await;
        assert_eq!(first.language, Language::English);
        assert!(first.show_language_modal);
        assert_eq!(first.source, PreferenceSource::Default);

        let second = languages.load(None).await;
        assert!(!second.show_language_modal);
        assert_eq!(second.source, PreferenceSource::Local);
    }

    #[tokio::test]
    async fn saved_preference_comes_back_from_database() -> anyhow::Result<()> {
        let storage = LocalStore::in_memory();
        let languages = service(Arc::new(MockDatabase::new()), storage.clone());

        let saved = languages.set_language(nepali()).await?;
        assert_eq!(saved.source, PreferenceSource::Database);
        assert_eq!(storage.get_item(keys::LANGUAGE).await.as_deref(), Some("ne"));

        let loaded = languages.load(None).await;
        assert_eq!(loaded.language, Language::Nepali);
        assert_eq!(loaded.source, PreferenceSource::Database);
        assert!(!loaded.show_language_modal);
        Ok(())
    }

    #[tokio::test]
    async fn database_outage_falls_back_to_local_storage() -> anyhow::Result<()> {
        let db = Arc::new(MockDatabase::new());
        let storage = LocalStore::in_memory();
        let languages = service(Arc::clone(&db), storage.clone());

        db.fail_next([DbError::Connection("down".into())]);
        let saved = languages.set_language(nepali()).await?;
        assert_eq!(saved.source, PreferenceSource::Local);

        db.fail_next([DbError::Connection("down".into())]);
        let loaded = languages.load(None).await;
        assert_eq!(loaded.language, Language::Nepali);
        assert_eq!(loaded.source, PreferenceSource::Local);
        Ok(())
    }
}
