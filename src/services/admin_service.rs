use std::str::FromStr;

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use serde_json::json;

use crate::{
    audit,
    dto::{
        admin::{AdminLoginRequest, AdminSession, AuditLogList, Claims, Cleared},
        orders::{OrderList, UpdateOrderStatusRequest},
        plant_requests::{PlantRequestList, UpdatePlantRequestStatus},
        plants::{LowStockQuery, NewPlant, PlantList, PlantPatch},
    },
    error::{AppError, AppResult},
    local_storage::{LocalStore, keys},
    middleware::auth::{ADMIN_ROLE, AdminUser, ensure_admin},
    models::{Order, OrderStatus, Plant, PlantRequest, PlantRequestStatus},
    response::{ApiResponse, Meta, paginate},
    routes::params::{OrderListQuery, Pagination, SortOrder},
    state::AppState,
    validation::{is_valid_two_factor_code, sanitize_input},
};

const LOGIN_COOLDOWN_MS: i64 = 5_000;
const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;
const AUDIT_LOG_WINDOW: usize = 500;
const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub async fn login(
    state: &AppState,
    payload: AdminLoginRequest,
) -> AppResult<ApiResponse<AdminSession>> {
    let username = sanitize_input(&payload.username);
    let code = sanitize_input(&payload.two_factor_code);

    enforce_cooldown(&state.storage).await?;

    let admin = &state.config.admin;
    let Some(stored_hash) = admin.password_hash.as_deref() else {
        tracing::warn!("admin login attempted but ADMIN_PASSWORD_HASH is not configured");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid admin password hash")))?;
    let password_ok = Argon2::default()
        .verify_password(payload.password.trim().as_bytes(), &parsed_hash)
        .is_ok();

    if username != admin.username || !password_ok || !is_valid_two_factor_code(&code) {
        tracing::info!(%username, "admin login rejected");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let expires_at = Utc::now()
        .checked_add_signed(admin.session_ttl)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: username.clone(),
        role: ADMIN_ROLE.to_string(),
        exp: expires_at.timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(admin.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    let session = AdminSession {
        token,
        username,
        expires_at,
    };
    state.storage.set_json(keys::ADMIN_SESSION, &session).await?;
    state.storage.remove_item(keys::LAST_LOGIN_ATTEMPT).await?;

    audit::record(&state.api, Some(&session.username), "admin_login", Some("admin"), None).await;

    Ok(ApiResponse::success("Logged in", session, Some(Meta::empty())))
}

pub async fn logout(state: &AppState, user: &AdminUser) -> AppResult<ApiResponse<bool>> {
    state.storage.remove_item(keys::ADMIN_SESSION).await?;
    state.storage.remove_item(keys::LAST_LOGIN_ATTEMPT).await?;
    audit::record(&state.api, Some(&user.username), "admin_logout", Some("admin"), None).await;
    Ok(ApiResponse::success("Logged out", true, Some(Meta::empty())))
}

/// The stored admin session, if it has not expired. Expired or unreadable
/// sessions are removed.
pub async fn active_session(storage: &LocalStore) -> Option<AdminSession> {
    let stored = storage
        .get_json::<AdminSession>(keys::ADMIN_SESSION)
        .await
        .inspect_err(|err| tracing::warn!(error = %err, "failed to restore admin session"))
        .ok()
        .flatten();

    if let Some(session) = stored.filter(|session| session.expires_at > Utc::now()) {
        return Some(session);
    }
    if storage.get_item(keys::ADMIN_SESSION).await.is_some() {
        if let Err(err) = storage.remove_item(keys::ADMIN_SESSION).await {
            tracing::warn!(error = %err, "failed to remove stale admin session");
        }
    }
    None
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AdminUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(OrderStatus::from_str)
        .transpose()
        .map_err(AppError::BadRequest)?;

    state.orders.refresh_orders().await;
    let mut orders: Vec<Order> = state
        .orders
        .orders()
        .await
        .into_iter()
        .filter(|order| status.is_none_or(|status| order.status == status))
        .collect();

    match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => orders.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortOrder::Desc => orders.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }

    let (items, meta) = paginate(orders, page, limit, offset);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AdminUser,
    id: String,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let status = OrderStatus::from_str(payload.status.trim()).map_err(AppError::BadRequest)?;

    let order = state.orders.update_order_status(&id, status).await?;

    audit::record(
        &state.api,
        Some(&user.username),
        "order_status_update",
        Some("orders"),
        Some(json!({ "order_id": order.id, "status": order.status })),
    )
    .await;

    Ok(ApiResponse::success("Order updated", order, Some(Meta::empty())))
}

pub async fn clear_orders(state: &AppState, user: &AdminUser) -> AppResult<ApiResponse<Cleared>> {
    ensure_admin(user)?;
    let deleted = state.orders.clear_all_orders().await?;

    audit::record(
        &state.api,
        Some(&user.username),
        "orders_cleared",
        Some("orders"),
        Some(json!({ "deleted": deleted })),
    )
    .await;

    Ok(ApiResponse::success("Orders cleared", Cleared { deleted }, Some(Meta::empty())))
}

pub async fn create_plant(
    state: &AppState,
    user: &AdminUser,
    payload: NewPlant,
) -> AppResult<ApiResponse<Plant>> {
    ensure_admin(user)?;
    let plant = state.api.create_plant(payload).await?;

    audit::record(
        &state.api,
        Some(&user.username),
        "plant_create",
        Some("plants"),
        Some(json!({ "plant_id": plant.id, "name": plant.name })),
    )
    .await;

    Ok(ApiResponse::success("Plant created", plant, Some(Meta::empty())))
}

pub async fn update_plant(
    state: &AppState,
    user: &AdminUser,
    id: String,
    patch: PlantPatch,
) -> AppResult<ApiResponse<Plant>> {
    ensure_admin(user)?;
    let plant = state.api.update_plant(&id, patch).await?;

    audit::record(
        &state.api,
        Some(&user.username),
        "plant_update",
        Some("plants"),
        Some(json!({ "plant_id": plant.id })),
    )
    .await;

    Ok(ApiResponse::success("Plant updated", plant, Some(Meta::empty())))
}

pub async fn delete_plant(
    state: &AppState,
    user: &AdminUser,
    id: String,
) -> AppResult<ApiResponse<String>> {
    ensure_admin(user)?;
    state.api.delete_plant(&id).await?;

    audit::record(
        &state.api,
        Some(&user.username),
        "plant_delete",
        Some("plants"),
        Some(json!({ "plant_id": id })),
    )
    .await;

    Ok(ApiResponse::success("Plant deleted", id, Some(Meta::empty())))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AdminUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<PlantList>> {
    ensure_admin(user)?;
    let threshold = query.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    if threshold < 0 {
        return Err(AppError::bad_request("threshold must not be negative"));
    }
    let (page, limit, offset) = query.pagination.normalize();

    let plants = state.api.list_low_stock(threshold).await?;
    let (items, meta) = paginate(plants, page, limit, offset);
    Ok(ApiResponse::success("Low stock", PlantList { items }, Some(meta)))
}

pub async fn list_plant_requests(
    state: &AppState,
    user: &AdminUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<PlantRequestList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let requests = state.api.get_plant_requests().await?;
    let (items, meta) = paginate(requests, page, limit, offset);
    Ok(ApiResponse::success("Plant requests", PlantRequestList { items }, Some(meta)))
}

pub async fn update_plant_request_status(
    state: &AppState,
    user: &AdminUser,
    id: String,
    payload: UpdatePlantRequestStatus,
) -> AppResult<ApiResponse<PlantRequest>> {
    ensure_admin(user)?;
    let status =
        PlantRequestStatus::from_str(payload.status.trim()).map_err(AppError::BadRequest)?;

    state.api.update_plant_request_status(&id, status).await?;
    let request = state
        .api
        .get_plant_requests()
        .await?
        .into_iter()
        .find(|request| request.id == id)
        .ok_or(AppError::NotFound)?;

    audit::record(
        &state.api,
        Some(&user.username),
        "plant_request_status_update",
        Some("plant_requests"),
        Some(json!({ "request_id": request.id, "status": request.status })),
    )
    .await;

    Ok(ApiResponse::success("Plant request updated", request, Some(Meta::empty())))
}

pub async fn clear_plant_requests(
    state: &AppState,
    user: &AdminUser,
) -> AppResult<ApiResponse<Cleared>> {
    ensure_admin(user)?;
    let deleted = state.api.clear_all_plant_requests().await?;

    audit::record(
        &state.api,
        Some(&user.username),
        "plant_requests_cleared",
        Some("plant_requests"),
        Some(json!({ "deleted": deleted })),
    )
    .await;

    Ok(ApiResponse::success("Plant requests cleared", Cleared { deleted }, Some(Meta::empty())))
}

pub async fn list_audit_logs(
    state: &AppState,
    user: &AdminUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<AuditLogList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let logs = state.api.get_audit_logs(AUDIT_LOG_WINDOW).await?;
    let (items, meta) = paginate(logs, page, limit, offset);
    Ok(ApiResponse::success("Audit logs", AuditLogList { items }, Some(meta)))
}

/// Argon2 PHC string suitable for `ADMIN_PASSWORD_HASH`.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// Rejects attempts closer than five seconds to the previous one, then
/// records this attempt. Check and record happen under one storage lock.
async fn enforce_cooldown(storage: &LocalStore) -> AppResult<()> {
    let now = Utc::now().timestamp_millis();
    let recorded = storage
        .update_item(keys::LAST_LOGIN_ATTEMPT, |last| {
            let recent = last
                .and_then(|raw| raw.parse::<i64>().ok())
                .is_some_and(|last| now - last < LOGIN_COOLDOWN_MS);
            (!recent).then(|| now.to_string())
        })
        .await?;

    if !recorded {
        return Err(AppError::TooManyRequests(
            "Too many login attempts. Please wait before trying again.".into(),
        ));
    }
    Ok(())
}
