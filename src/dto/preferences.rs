use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Language;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PreferenceQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SavePreferences {
    #[serde(default)]
    pub user_id: Option<String>,
    pub language: Language,
    #[serde(default = "visited")]
    pub has_visited: bool,
}

fn visited() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceSource {
    Database,
    Local,
    Default,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct LanguageState {
    pub language: Language,
    pub has_visited: bool,
    /// True on a first visit, when the language picker should be offered.
    pub show_language_modal: bool,
    pub source: PreferenceSource,
}
