use crate::{
    dto::{
        plant_requests::{NewPlantRequest, PlantRequestCreated},
        plants::{CareGuideList, CategoryList, PlantList},
    },
    error::{AppError, AppResult},
    models::{Language, Plant},
    response::{ApiResponse, Meta, paginate},
    routes::params::{PlantQuery, PlantSortBy},
    state::AppState,
    validation::sanitize_input,
};

pub async fn list_plants(state: &AppState, query: PlantQuery) -> AppResult<ApiResponse<PlantList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut plants = match query.category.as_deref().map(str::trim) {
        Some(category) if !category.is_empty() => state.api.get_plants_by_category(category).await?,
        _ => state.api.get_plants().await?,
    };

    let search = query.q.as_deref().map(sanitize_input).unwrap_or_default();
    if !search.is_empty() {
        let term = search.to_lowercase();
        plants.retain(|plant| matches_search(plant, &term));
    }
    if let Some(sort_by) = query.sort_by {
        sort_plants(&mut plants, sort_by, query.lang.unwrap_or_default());
    }

    let (items, meta) = paginate(plants, page, limit, offset);
    Ok(ApiResponse::success("Plants", PlantList { items }, Some(meta)))
}

fn matches_search(plant: &Plant, term: &str) -> bool {
    [&plant.name, &plant.name_ne, &plant.description, &plant.description_ne]
        .iter()
        .any(|field| field.to_lowercase().contains(term))
}

fn sort_plants(plants: &mut [Plant], sort_by: PlantSortBy, lang: Language) {
    match sort_by {
        PlantSortBy::PriceLow => plants.sort_by(|a, b| a.price.total_cmp(&b.price)),
        PlantSortBy::PriceHigh => plants.sort_by(|a, b| b.price.total_cmp(&a.price)),
        PlantSortBy::Rating => plants.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        PlantSortBy::Name => match lang {
            Language::English => plants.sort_by_cached_key(|plant| plant.name.to_lowercase()),
            Language::Nepali => plants.sort_by(|a, b| a.name_ne.cmp(&b.name_ne)),
        },
    }
}

pub async fn get_plant(state: &AppState, id: &str) -> AppResult<ApiResponse<Plant>> {
    let plant = state.api.get_plant_by_id(id).await?.ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Plant found", plant, Some(Meta::empty())))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = state.api.get_categories().await?;
    let meta = Meta::whole(items.len());
    Ok(ApiResponse::success("Categories", CategoryList { items }, Some(meta)))
}

pub async fn list_care_guides(state: &AppState) -> AppResult<ApiResponse<CareGuideList>> {
    let items = state.api.get_care_guides().await?;
    let meta = Meta::whole(items.len());
    Ok(ApiResponse::success("Care guides", CareGuideList { items }, Some(meta)))
}

pub async fn submit_plant_request(
    state: &AppState,
    payload: NewPlantRequest,
) -> AppResult<ApiResponse<PlantRequestCreated>> {
    let id = state.api.create_plant_request(payload).await?;
    tracing::info!(request_id = %id, "plant request received");
    Ok(ApiResponse::success(
        "Plant request submitted",
        PlantRequestCreated { id },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, db::MockDatabase, local_storage::LocalStore, routes::params::Pagination};
    use std::sync::Arc;

    fn state() -> AppState {
        AppState::with_parts(AppConfig::local(), Arc::new(MockDatabase::new()), LocalStore::in_memory())
    }

    #[tokio::test]
    async fn category_filter_narrows_the_list() -> anyhow::Result<()> {
        let state = state();
        let all = list_plants(&state, PlantQuery::default()).await?;
        let indoor = list_plants(
            &state,
            PlantQuery {
                category: Some("indoor".into()),
                ..PlantQuery::default()
            },
        )
        .await?;

        let all = all.data.unwrap().items;
        let indoor = indoor.data.unwrap().items;
        assert!(!indoor.is_empty());
        assert!(indoor.len() < all.len());
        assert!(indoor.iter().all(|plant| plant.category == "indoor"));
        Ok(())
    }

    #[tokio::test]
    async fn search_matches_either_language() -> anyhow::Result<()> {
        let state = state();
        let search = |q: &str| PlantQuery {
            q: Some(q.into()),
            ..PlantQuery::default()
        };

        let vine = list_plants(&state, search("VINE")).await?.data.unwrap().items;
        assert_eq!(vine.len(), 1);
        assert_eq!(vine[0].name, "Pothos");

        let snake = list_plants(&state, search("सर्प")).await?.data.unwrap().items;
        assert_eq!(snake.len(), 1);
        assert_eq!(snake[0].id, "1");

        let none = list_plants(&state, search("cactus-xyz")).await?.data.unwrap().items;
        assert!(none.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn sort_orders_by_price_rating_and_name() -> anyhow::Result<()> {
        let state = state();
        let sorted = |sort_by| PlantQuery {
            sort_by: Some(sort_by),
            ..PlantQuery::default()
        };

        let cheap = list_plants(&state, sorted(PlantSortBy::PriceLow)).await?.data.unwrap().items;
        assert!(cheap.windows(2).all(|w| w[0].price <= w[1].price));

        let dear = list_plants(&state, sorted(PlantSortBy::PriceHigh)).await?.data.unwrap().items;
        assert!(dear.windows(2).all(|w| w[0].price >= w[1].price));

        let rated = list_plants(&state, sorted(PlantSortBy::Rating)).await?.data.unwrap().items;
        assert!(rated.windows(2).all(|w| w[0].rating >= w[1].rating));

        let named = list_plants(&state, sorted(PlantSortBy::Name)).await?.data.unwrap().items;
        assert!(named.windows(2).all(|w| w[0].name.to_lowercase() <= w[1].name.to_lowercase()));
        Ok(())
    }

    #[tokio::test]
    async fn page_far_past_the_end_is_empty() -> anyhow::Result<()> {
        let query = PlantQuery {
            pagination: Pagination {
                page: Some(i64::MAX),
                per_page: Some(100),
            },
            ..PlantQuery::default()
        };
        let resp = list_plants(&state(), query).await?;
        assert!(resp.data.unwrap().items.is_empty());
        assert_eq!(resp.meta.and_then(|m| m.page), Some(i64::MAX));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_plant_is_not_found() {
        let err = get_plant(&state(), "999").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }
}
