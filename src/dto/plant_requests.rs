use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::PlantRequest;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewPlantRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub plant_type: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePlantRequestStatus {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlantRequestList {
    pub items: Vec<PlantRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlantRequestCreated {
    pub id: String,
}
