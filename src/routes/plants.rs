use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::plants::{CareGuideList, CategoryList, PlantList},
    error::AppResult,
    models::Plant,
    response::ApiResponse,
    routes::params::PlantQuery,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plants", get(list_plants))
        .route("/plants/{id}", get(get_plant))
        .route("/categories", get(list_categories))
        .route("/care-guides", get(list_care_guides))
}

#[utoipa::path(
    get,
    path = "/api/plants",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("category" = Option<String>, Query, description = "Category id, `all` for every category"),
        ("q" = Option<String>, Query, description = "Search English and Nepali names and descriptions"),
        ("sort_by" = Option<crate::routes::params::PlantSortBy>, Query, description = "price-low | price-high | rating | name"),
        ("lang" = Option<crate::models::Language>, Query, description = "Name used by sort_by=name, default en")
    ),
    responses(
        (status = 200, description = "Plants in stock, newest first unless sorted", body = ApiResponse<PlantList>),
        (status = 503, description = "Database unavailable"),
    ),
    tag = "Plants"
)]
pub async fn list_plants(
    State(state): State<AppState>,
    Query(query): Query<PlantQuery>,
) -> AppResult<Json<ApiResponse<PlantList>>> {
    let resp = catalog_service::list_plants(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/plants/{id}",
    params(("id" = String, Path, description = "Plant ID")),
    responses(
        (status = 200, description = "Plant detail", body = ApiResponse<Plant>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Plants"
)]
pub async fn get_plant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Plant>>> {
    let resp = catalog_service::get_plant(&state, &id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "Plant categories", body = ApiResponse<CategoryList>)),
    tag = "Plants"
)]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = catalog_service::list_categories(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/care-guides",
    responses((status = 200, description = "Bilingual care guides", body = ApiResponse<CareGuideList>)),
    tag = "Plants"
)]
pub async fn list_care_guides(State(state): State<AppState>) -> AppResult<Json<ApiResponse<CareGuideList>>> {
    let resp = catalog_service::list_care_guides(&state).await?;
    Ok(Json(resp))
}
