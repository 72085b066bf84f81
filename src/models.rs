use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Plant {
    pub id: String,
    pub name: String,
    pub name_ne: String,
    /// Price in USD; shown to customers converted to NPR.
    pub price: f64,
    pub image: String,
    pub category: String,
    pub rating: f64,
    pub description: String,
    pub description_ne: String,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Category {
    pub id: String,
    pub name_en: String,
    pub name_ne: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CareGuide {
    pub id: String,
    pub title: String,
    pub title_ne: String,
    pub description: String,
    pub description_ne: String,
    pub icon: String,
    pub tips: Vec<String>,
    pub tips_ne: Vec<String>,
}

/// A line in a shopping cart. Quantity stays within `1..=99`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CartItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<f64>,
    pub image: String,
    pub quantity: u32,
}

impl CartItem {
    /// Unit price after discount, in USD.
    pub fn unit_price(&self) -> f64 {
        match self.discount_percentage {
            Some(discount) if discount > 0.0 => self.price * (1.0 - discount / 100.0),
            _ => self.price,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CustomerDetails {
    pub full_name: String,
    pub delivery_address: String,
    pub phone_number: String,
}

/// Snapshot of a plant at the time it was ordered.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct OrderItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "processing" => Ok(OrderStatus::Processing),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err("Invalid order status".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub customer: CustomerDetails,
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub payment_method: String,
    pub status: OrderStatus,
    pub whatsapp_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlantRequestStatus {
    Pending,
    Reviewed,
    Contacted,
    Completed,
}

impl PlantRequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PlantRequestStatus::Pending => "pending",
            PlantRequestStatus::Reviewed => "reviewed",
            PlantRequestStatus::Contacted => "contacted",
            PlantRequestStatus::Completed => "completed",
        }
    }
}

impl FromStr for PlantRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PlantRequestStatus::Pending),
            "reviewed" => Ok(PlantRequestStatus::Reviewed),
            "contacted" => Ok(PlantRequestStatus::Contacted),
            "completed" => Ok(PlantRequestStatus::Completed),
            _ => Err("Invalid plant request status".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PlantRequest {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub plant_type: String,
    #[serde(default)]
    pub message: String,
    pub status: PlantRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ne")]
    Nepali,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Nepali => "ne",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Language::English),
            "ne" => Some(Language::Nepali),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct UserPreference {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub language: Language,
    pub has_visited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditLog {
    pub id: String,
    pub actor: Option<String>,
    pub action: String,
    pub resource: Option<String>,
    #[schema(value_type = Object)]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
