use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    models::{CareGuide, Category, Plant},
    routes::params::Pagination,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct PlantList {
    pub items: Vec<Plant>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<Category>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CareGuideList {
    pub items: Vec<CareGuide>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewPlant {
    pub name: String,
    #[serde(default)]
    pub name_ne: String,
    pub price: f64,
    pub image: String,
    pub category: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub description_ne: String,
    pub stock: i64,
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PlantPatch {
    pub name: Option<String>,
    pub name_ne: Option<String>,
    pub price: Option<f64>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub description_ne: Option<String>,
    pub stock: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LowStockQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub threshold: Option<i64>,
}
