use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::preferences::{LanguageState, PreferenceQuery, SavePreferences},
    error::AppResult,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_preferences).put(save_preferences))
}

#[utoipa::path(
    get,
    path = "/api/preferences",
    params(("user_id" = Option<String>, Query, description = "Optional user id")),
    responses(
        (status = 200, description = "Current language and whether to offer the picker", body = ApiResponse<LanguageState>),
    ),
    tag = "Preferences"
)]
pub async fn get_preferences(
    State(state): State<AppState>,
    Query(query): Query<PreferenceQuery>,
) -> Json<ApiResponse<LanguageState>> {
    let language = state.language.load(query.user_id.as_deref()).await;
    Json(ApiResponse::success("Preferences", language, Some(Meta::empty())))
}

#[utoipa::path(
    put,
    path = "/api/preferences",
    request_body = SavePreferences,
    responses(
        (status = 200, description = "Language saved", body = ApiResponse<LanguageState>),
        (status = 503, description = "Neither the database nor local storage accepted the write"),
    ),
    tag = "Preferences"
)]
pub async fn save_preferences(
    State(state): State<AppState>,
    Json(payload): Json<SavePreferences>,
) -> AppResult<Json<ApiResponse<LanguageState>>> {
    let language = state.language.set_language(payload).await?;
    Ok(Json(ApiResponse::success("Preferences saved", language, Some(Meta::empty()))))
}
