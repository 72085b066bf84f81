use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{CustomerDetails, Order, OrderItem};

/// Order as handed to the API service, already validated by the caller.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateOrder {
    pub customer: CustomerDetails,
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub payment_method: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderPlaced {
    pub order_number: String,
    pub order: Option<Order>,
}
