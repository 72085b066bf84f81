use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};

use crate::{
    dto::{
        admin::{AdminLoginRequest, AdminSession, AuditLogList, Cleared},
        orders::{OrderList, UpdateOrderStatusRequest},
        plant_requests::{PlantRequestList, UpdatePlantRequestStatus},
        plants::{LowStockQuery, NewPlant, PlantList, PlantPatch},
    },
    error::AppResult,
    middleware::auth::AdminUser,
    models::{Order, Plant, PlantRequest},
    response::ApiResponse,
    routes::params::{OrderListQuery, Pagination},
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/orders", get(list_all_orders).delete(clear_orders))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/plants", post(create_plant))
        .route("/plants/{id}", patch(update_plant).delete(delete_plant))
        .route("/inventory/low-stock", get(list_low_stock))
        .route(
            "/plant-requests",
            get(list_plant_requests).delete(clear_plant_requests),
        )
        .route("/plant-requests/{id}/status", patch(update_plant_request_status))
        .route("/audit-logs", get(list_audit_logs))
}

#[utoipa::path(
    post,
    path = "/api/admin/login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Session token valid for two hours", body = ApiResponse<AdminSession>),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Attempts less than five seconds apart"),
    ),
    tag = "Admin"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> AppResult<Json<ApiResponse<AdminSession>>> {
    let resp = admin_service::login(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/logout",
    responses(
        (status = 200, description = "Session ended", body = ApiResponse<bool>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn logout(
    State(state): State<AppState>,
    user: AdminUser,
) -> AppResult<Json<ApiResponse<bool>>> {
    let resp = admin_service::logout(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "All orders", body = ApiResponse<OrderList>),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AdminUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = admin_service::list_all_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(("id" = String, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Update order status", body = ApiResponse<Order>),
        (status = 400, description = "Invalid status"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/orders",
    responses(
        (status = 200, description = "All orders removed", body = ApiResponse<Cleared>),
        (status = 403, description = "Only allowed in development mode"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn clear_orders(
    State(state): State<AppState>,
    user: AdminUser,
) -> AppResult<Json<ApiResponse<Cleared>>> {
    let resp = admin_service::clear_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/plants",
    request_body = NewPlant,
    responses(
        (status = 200, description = "Plant added to the catalogue", body = ApiResponse<Plant>),
        (status = 400, description = "Invalid plant"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_plant(
    State(state): State<AppState>,
    user: AdminUser,
    Json(payload): Json<NewPlant>,
) -> AppResult<Json<ApiResponse<Plant>>> {
    let resp = admin_service::create_plant(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/plants/{id}",
    params(("id" = String, Path, description = "Plant ID")),
    request_body = PlantPatch,
    responses(
        (status = 200, description = "Plant updated", body = ApiResponse<Plant>),
        (status = 400, description = "Invalid or empty patch"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_plant(
    State(state): State<AppState>,
    user: AdminUser,
    Path(id): Path<String>,
    Json(patch): Json<PlantPatch>,
) -> AppResult<Json<ApiResponse<Plant>>> {
    let resp = admin_service::update_plant(&state, &user, id, patch).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/plants/{id}",
    params(("id" = String, Path, description = "Plant ID")),
    responses(
        (status = 200, description = "Plant removed", body = ApiResponse<String>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_plant(
    State(state): State<AppState>,
    user: AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<String>>> {
    let resp = admin_service::delete_plant(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/inventory/low-stock",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("threshold" = Option<i64>, Query, description = "Stock at or below this is low, default 5")
    ),
    responses(
        (status = 200, description = "Plants running low, lowest stock first", body = ApiResponse<PlantList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    user: AdminUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<ApiResponse<PlantList>>> {
    let resp = admin_service::list_low_stock(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/plant-requests",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses((status = 200, description = "Customer plant requests", body = ApiResponse<PlantRequestList>)),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_plant_requests(
    State(state): State<AppState>,
    user: AdminUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<PlantRequestList>>> {
    let resp = admin_service::list_plant_requests(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/plant-requests/{id}/status",
    params(("id" = String, Path, description = "Plant request ID")),
    request_body = UpdatePlantRequestStatus,
    responses(
        (status = 200, description = "Request status updated", body = ApiResponse<PlantRequest>),
        (status = 400, description = "Invalid status"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_plant_request_status(
    State(state): State<AppState>,
    user: AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePlantRequestStatus>,
) -> AppResult<Json<ApiResponse<PlantRequest>>> {
    let resp = admin_service::update_plant_request_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/plant-requests",
    responses(
        (status = 200, description = "All plant requests removed", body = ApiResponse<Cleared>),
        (status = 403, description = "Only allowed in development mode"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn clear_plant_requests(
    State(state): State<AppState>,
    user: AdminUser,
) -> AppResult<Json<ApiResponse<Cleared>>> {
    let resp = admin_service::clear_plant_requests(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/audit-logs",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses((status = 200, description = "Admin actions, newest first", body = ApiResponse<AuditLogList>)),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    user: AdminUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<AuditLogList>>> {
    let resp = admin_service::list_audit_logs(&state, &user, pagination).await?;
    Ok(Json(resp))
}
