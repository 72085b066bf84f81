use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    error::{AppError, AppResult},
    models::Order,
    response::{ApiResponse, Meta},
    services::order_service::OrderStore,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(get_order))
        .route("/number/{order_number}", get(get_order_by_number))
}

#[derive(Clone, Copy)]
enum Lookup<'a> {
    Id(&'a str),
    Number(&'a str),
}

/// Serves from the cached list, refreshing once on a miss.
async fn find_order(store: &OrderStore, lookup: Lookup<'_>) -> Option<Order> {
    if let Some(order) = cached(store, lookup).await {
        return Some(order);
    }
    store.refresh_orders().await;
    cached(store, lookup).await
}

async fn cached(store: &OrderStore, lookup: Lookup<'_>) -> Option<Order> {
    match lookup {
        Lookup::Id(id) => store.get_order_by_id(id).await,
        Lookup::Number(number) => store.get_order_by_number(number).await,
    }
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = String, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with its item snapshot", body = ApiResponse<Order>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = find_order(&state.orders, Lookup::Id(&id))
        .await
        .ok_or(AppError::NotFound)?;
    Ok(Json(ApiResponse::success("Order found", order, Some(Meta::empty()))))
}

#[utoipa::path(
    get,
    path = "/api/orders/number/{order_number}",
    params(("order_number" = String, Path, description = "Order number, e.g. MG123456789")),
    responses(
        (status = 200, description = "Order tracking lookup", body = ApiResponse<Order>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Orders"
)]
pub async fn get_order_by_number(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = find_order(&state.orders, Lookup::Number(&order_number))
        .await
        .ok_or(AppError::NotFound)?;
    Ok(Json(ApiResponse::success("Order found", order, Some(Meta::empty()))))
}
