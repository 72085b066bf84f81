use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{CartItem, CustomerDetails};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub plant_id: String,
    /// Percentage off the catalogue price, 0 to 100.
    #[serde(default)]
    pub discount_percentage: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total_items: u32,
    /// Discounted total converted to rupees.
    pub total_price_npr: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub customer: CustomerDetails,
    pub payment_method: String,
}
