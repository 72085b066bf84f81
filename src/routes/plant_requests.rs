use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::plant_requests::{NewPlantRequest, PlantRequestCreated},
    error::AppResult,
    response::ApiResponse,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(submit_plant_request))
}

#[utoipa::path(
    post,
    path = "/api/plant-requests",
    request_body = NewPlantRequest,
    responses(
        (status = 200, description = "Request recorded for follow-up", body = ApiResponse<PlantRequestCreated>),
        (status = 400, description = "Missing fields or invalid email"),
    ),
    tag = "Plant Requests"
)]
pub async fn submit_plant_request(
    State(state): State<AppState>,
    Json(payload): Json<NewPlantRequest>,
) -> AppResult<Json<ApiResponse<PlantRequestCreated>>> {
    let resp = catalog_service::submit_plant_request(&state, payload).await?;
    Ok(Json(resp))
}
