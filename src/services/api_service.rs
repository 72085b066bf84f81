//! Boundary between the stores and the mock database.
//!
//! Every statement runs through [`ApiService::execute_with_timeout`], and every
//! row coming back is sanitized before it leaves this module.

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};

use crate::{
    config::DbSettings,
    db::{DbError, ExecResult, MockDatabase, Row},
    dto::{
        orders::CreateOrder,
        plant_requests::NewPlantRequest,
        plants::{NewPlant, PlantPatch},
        preferences::SavePreferences,
    },
    error::{AppError, AppResult},
    models::{
        AuditLog, CareGuide, Category, CustomerDetails, Order, OrderItem, OrderStatus, Plant,
        PlantRequest, PlantRequestStatus, UserPreference,
    },
    retry::{RetryPolicy, retry_with_predicate},
    validation::{
        MAX_MESSAGE_LENGTH, format_phone_number, is_valid_email, is_valid_mobile_number,
        order_total, price_or_zero, sanitize_input, sanitize_order_item, sanitize_with_limit,
        totals_match, validate_price,
    },
};

#[derive(Debug, Clone)]
pub struct ApiService {
    db: Arc<MockDatabase>,
    policy: RetryPolicy,
    request_timeout: Duration,
    dev_mode: bool,
}

impl ApiService {
    pub fn new(db: Arc<MockDatabase>, settings: &DbSettings, dev_mode: bool) -> Self {
        Self {
            db,
            policy: RetryPolicy::from(settings),
            request_timeout: settings.request_timeout,
            dev_mode,
        }
    }

    pub fn database(&self) -> &Arc<MockDatabase> {
        &self.db
    }

    pub fn is_development(&self) -> bool {
        self.dev_mode
    }

    /// Retries `operation` with backoff, bounded by the overall request timeout.
    pub async fn execute_with_timeout<T, F, Fut>(&self, operation: F) -> Result<T, DbError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DbError>>,
    {
        let retried = retry_with_predicate(&self.policy, operation, DbError::is_retryable);
        match tokio::time::timeout(self.request_timeout, retried).await {
            Ok(result) => result,
            Err(_) => Err(DbError::Timeout(self.request_timeout.as_millis() as u64)),
        }
    }

    pub(crate) async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>, DbError> {
        let db = self.db.as_ref();
        let params = params.as_slice();
        self.execute_with_timeout(move || db.query(sql, params)).await
    }

    pub(crate) async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<ExecResult, DbError> {
        let db = self.db.as_ref();
        let params = params.as_slice();
        self.execute_with_timeout(move || db.execute(sql, params)).await
    }

    fn ensure_development(&self) -> AppResult<()> {
        if self.dev_mode {
            Ok(())
        } else {
            Err(AppError::DevModeBlocked)
        }
    }

    // Plants

    pub async fn get_plants(&self) -> AppResult<Vec<Plant>> {
        let rows = self
            .query("SELECT * FROM plants WHERE stock > 0 ORDER BY created_at DESC", vec![])
            .await
            .inspect_err(|err| tracing::error!(error = %err, "failed to fetch plants"))?;
        let plants: Vec<Plant> = decode_all("plants", rows)?;
        Ok(plants.into_iter().map(sanitize_plant).collect())
    }

    pub async fn get_plants_by_category(&self, category: &str) -> AppResult<Vec<Plant>> {
        let category = required(category, "Category is required")?;
        if category == "all" {
            return self.get_plants().await;
        }

        let rows = self
            .query(
                "SELECT * FROM plants WHERE category = ? AND stock > 0 ORDER BY created_at DESC",
                vec![json!(category)],
            )
            .await
            .inspect_err(|err| tracing::error!(error = %err, %category, "failed to fetch plants by category"))?;
        let plants: Vec<Plant> = decode_all("plants", rows)?;
        Ok(plants.into_iter().map(sanitize_plant).collect())
    }

    pub async fn get_plant_by_id(&self, id: &str) -> AppResult<Option<Plant>> {
        let id = required(id, "Plant ID is required")?;
        let rows = self
            .query("SELECT * FROM plants WHERE id = ?", vec![json!(id)])
            .await?;
        rows.into_iter()
            .next()
            .map(|row| decode::<Plant>("plants", row).map(sanitize_plant))
            .transpose()
            .map_err(AppError::from)
    }

    /// Takes `quantity` units out of stock. The database clamps at zero.
    pub async fn update_plant_stock(&self, id: &str, quantity: i64) -> AppResult<()> {
        let id = required(id, "Plant ID is required")?;
        if quantity < 0 {
            return Err(AppError::bad_request("Quantity must be a non-negative integer"));
        }

        let result = self
            .execute(
                "UPDATE plants SET stock = stock - ?, updated_at = ? WHERE id = ?",
                vec![json!(quantity), json!(now()), json!(id)],
            )
            .await?;
        if result.affected_rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn get_categories(&self) -> AppResult<Vec<Category>> {
        let rows = self.query("SELECT * FROM categories", vec![]).await?;
        let categories: Vec<Category> = decode_all("categories", rows)?;
        Ok(categories
            .into_iter()
            .map(|category| Category {
                id: sanitize_input(&category.id),
                name_en: sanitize_input(&category.name_en),
                name_ne: sanitize_input(&category.name_ne),
            })
            .collect())
    }

    pub async fn create_plant(&self, payload: NewPlant) -> AppResult<Plant> {
        let name = required(&payload.name, "Plant name is required")?;
        validate_plant_price(payload.price)?;
        validate_stock(payload.stock)?;
        validate_rating(payload.rating)?;
        let image = validate_image(&payload.image)?;
        let category = required(&payload.category, "Category is required")?;

        let now = now();
        let record = json!({
            "name": name,
            "name_ne": sanitize_input(&payload.name_ne),
            "price": payload.price,
            "image": image,
            "category": category,
            "rating": payload.rating,
            "description": sanitize_input(&payload.description),
            "description_ne": sanitize_input(&payload.description_ne),
            "stock": payload.stock,
            "created_at": now,
            "updated_at": now,
        });
        let result = self.execute("INSERT INTO plants", vec![record]).await?;
        let id = result
            .insert_id
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("insert returned no id")))?;

        self.get_plant_by_id(&id).await?.ok_or(AppError::NotFound)
    }

    pub async fn update_plant(&self, id: &str, patch: PlantPatch) -> AppResult<Plant> {
        let id = required(id, "Plant ID is required")?;

        let mut columns: Vec<&str> = Vec::new();
        let mut params: Vec<Value> = Vec::new();
        if let Some(name) = &patch.name {
            columns.push("name");
            params.push(json!(required(name, "Plant name is required")?));
        }
        if let Some(name_ne) = &patch.name_ne {
            columns.push("name_ne");
            params.push(json!(sanitize_input(name_ne)));
        }
        if let Some(price) = patch.price {
            validate_plant_price(price)?;
            columns.push("price");
            params.push(json!(price));
        }
        if let Some(image) = &patch.image {
            columns.push("image");
            params.push(json!(validate_image(image)?));
        }
        if let Some(category) = &patch.category {
            columns.push("category");
            params.push(json!(required(category, "Category is required")?));
        }
        if let Some(rating) = patch.rating {
            validate_rating(rating)?;
            columns.push("rating");
            params.push(json!(rating));
        }
        if let Some(description) = &patch.description {
            columns.push("description");
            params.push(json!(sanitize_input(description)));
        }
        if let Some(description_ne) = &patch.description_ne {
            columns.push("description_ne");
            params.push(json!(sanitize_input(description_ne)));
        }
        if let Some(stock) = patch.stock {
            validate_stock(stock)?;
            columns.push("stock");
            params.push(json!(stock));
        }
        if columns.is_empty() {
            return Err(AppError::bad_request("No fields to update"));
        }

        columns.push("updated_at");
        params.push(json!(now()));
        params.push(json!(id));

        let assignments = columns
            .iter()
            .map(|column| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE plants SET {assignments} WHERE id = ?");

        let result = self.execute(&sql, params).await?;
        if result.affected_rows == 0 {
            return Err(AppError::NotFound);
        }
        self.get_plant_by_id(&id).await?.ok_or(AppError::NotFound)
    }

    pub async fn delete_plant(&self, id: &str) -> AppResult<()> {
        let id = required(id, "Plant ID is required")?;
        let result = self
            .execute("DELETE FROM plants WHERE id = ?", vec![json!(id)])
            .await?;
        if result.affected_rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    /// Plants at or below `threshold`, emptiest first. Sold-out plants included.
    pub async fn list_low_stock(&self, threshold: i64) -> AppResult<Vec<Plant>> {
        let rows = self
            .query(
                "SELECT * FROM plants WHERE stock <= ? ORDER BY stock ASC",
                vec![json!(threshold)],
            )
            .await?;
        let plants: Vec<Plant> = decode_all("plants", rows)?;
        Ok(plants.into_iter().map(sanitize_plant).collect())
    }

    // Orders

    /// Inserts the order and takes its items out of stock. Returns the order number.
    pub async fn create_order(&self, payload: CreateOrder) -> AppResult<String> {
        let customer_name = required(&payload.customer.full_name, "Customer name is required")?;
        let customer_phone = required(&payload.customer.phone_number, "Customer phone is required")?;
        let customer_address =
            required(&payload.customer.delivery_address, "Customer address is required")?;
        if payload.items.is_empty() {
            return Err(AppError::bad_request("Order items are required"));
        }
        let payment_method = required(&payload.payment_method, "Payment method is required")?;
        if !totals_match(order_total(&payload.items), payload.total) {
            return Err(AppError::bad_request("Order total does not match item prices"));
        }

        self.ensure_stock(&payload.items).await?;

        let order_number = generate_order_number();
        let items: Vec<OrderItem> = payload.items.iter().map(sanitize_order_item).collect();
        let items_json = serde_json::to_string(&items).map_err(anyhow::Error::from)?;
        let now = now();
        let record = json!({
            "order_number": order_number,
            "customer_name": customer_name,
            "customer_phone": customer_phone,
            "customer_address": customer_address,
            "items": items_json,
            "total": price_or_zero(payload.total),
            "payment_method": payment_method,
            "status": OrderStatus::Pending.as_str(),
            "whatsapp_sent": false,
            "created_at": now,
            "updated_at": now,
        });
        self.execute("INSERT INTO orders", vec![record])
            .await
            .inspect_err(|err| tracing::error!(error = %err, "failed to insert order"))?;

        // No transactions: each decrement stands on its own.
        for item in &payload.items {
            self.update_plant_stock(&item.id, i64::from(item.quantity)).await?;
        }

        tracing::info!(%order_number, items = items.len(), "order created");
        Ok(order_number)
    }

    async fn ensure_stock(&self, items: &[OrderItem]) -> AppResult<()> {
        let mut wanted: HashMap<&str, u64> = HashMap::new();
        for item in items {
            *wanted.entry(item.id.as_str()).or_default() += u64::from(item.quantity);
        }
        for (id, quantity) in wanted {
            let plant = self
                .get_plant_by_id(id)
                .await?
                .ok_or_else(|| AppError::bad_request(format!("Plant {id} not found")))?;
            if plant.stock.max(0) as u64 >= quantity {
                continue;
            }
            return Err(AppError::bad_request(format!(
                "Insufficient stock for {}",
                plant.name
            )));
        }
        Ok(())
    }

    pub async fn get_orders(&self) -> AppResult<Vec<Order>> {
        let rows = self
            .query("SELECT * FROM orders ORDER BY created_at DESC", vec![])
            .await
            .inspect_err(|err| tracing::error!(error = %err, "failed to fetch orders"))?;
        Ok(rows.into_iter().filter_map(order_from_row).collect())
    }

    pub async fn get_order_by_id(&self, id: &str) -> AppResult<Option<Order>> {
        let id = required(id, "Order ID is required")?;
        let rows = self
            .query("SELECT * FROM orders WHERE id = ?", vec![json!(id)])
            .await?;
        Ok(rows.into_iter().next().and_then(order_from_row))
    }

    pub async fn get_order_by_number(&self, order_number: &str) -> AppResult<Option<Order>> {
        let order_number = required(order_number, "Order number is required")?;
        let rows = self
            .query(
                "SELECT * FROM orders WHERE order_number = ?",
                vec![json!(order_number)],
            )
            .await?;
        Ok(rows.into_iter().next().and_then(order_from_row))
    }

    pub async fn update_order_status(&self, id: &str, status: OrderStatus) -> AppResult<()> {
        let id = required(id, "Order ID is required")?;
        let result = self
            .execute(
                "UPDATE orders SET status = ?, updated_at = ? WHERE id = ?",
                vec![json!(status.as_str()), json!(now()), json!(id)],
            )
            .await?;
        if result.affected_rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn update_order_whatsapp_status(&self, id: &str, sent: bool) -> AppResult<()> {
        let id = required(id, "Order ID is required")?;
        let result = self
            .execute(
                "UPDATE orders SET whatsapp_sent = ?, updated_at = ? WHERE id = ?",
                vec![json!(sent), json!(now()), json!(id)],
            )
            .await?;
        if result.affected_rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn clear_all_orders(&self) -> AppResult<u64> {
        self.ensure_development()?;
        let result = self.execute("DELETE FROM orders", vec![]).await?;
        tracing::warn!(deleted = result.affected_rows, "all orders cleared");
        Ok(result.affected_rows)
    }

    // Plant requests

    pub async fn create_plant_request(&self, payload: NewPlantRequest) -> AppResult<String> {
        let customer_name = required(&payload.customer_name, "Customer name is required")?;
        let customer_email = required(&payload.customer_email, "Customer email is required")?;
        let customer_phone = required(&payload.customer_phone, "Customer phone is required")?;
        let plant_type = required(&payload.plant_type, "Plant type is required")?;
        if !is_valid_email(payload.customer_email.trim()) {
            return Err(AppError::bad_request("Invalid email format"));
        }
        if !is_valid_mobile_number(&customer_phone) {
            return Err(AppError::bad_request(
                "Please enter a valid Nepali mobile number (e.g., +977-9841234567)",
            ));
        }
        let customer_phone = format_phone_number(&customer_phone);

        let now = now();
        let record = json!({
            "customer_name": customer_name,
            "customer_email": customer_email,
            "customer_phone": customer_phone,
            "plant_type": plant_type,
            "message": sanitize_with_limit(&payload.message, MAX_MESSAGE_LENGTH),
            "status": PlantRequestStatus::Pending.as_str(),
            "created_at": now,
            "updated_at": now,
        });
        let result = self.execute("INSERT INTO plant_requests", vec![record]).await?;
        result
            .insert_id
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("insert returned no id")))
    }

    pub async fn get_plant_requests(&self) -> AppResult<Vec<PlantRequest>> {
        let rows = self
            .query("SELECT * FROM plant_requests ORDER BY created_at DESC", vec![])
            .await?;
        let requests: Vec<PlantRequest> = decode_all("plant_requests", rows)?;
        Ok(requests
            .into_iter()
            .map(|request| PlantRequest {
                id: sanitize_input(&request.id),
                customer_name: sanitize_input(&request.customer_name),
                customer_email: sanitize_input(&request.customer_email),
                customer_phone: sanitize_input(&request.customer_phone),
                plant_type: sanitize_input(&request.plant_type),
                message: sanitize_input(&request.message),
                ..request
            })
            .collect())
    }

    pub async fn update_plant_request_status(
        &self,
        id: &str,
        status: PlantRequestStatus,
    ) -> AppResult<()> {
        let id = required(id, "Plant request ID is required")?;
        let result = self
            .execute(
                "UPDATE plant_requests SET status = ?, updated_at = ? WHERE id = ?",
                vec![json!(status.as_str()), json!(now()), json!(id)],
            )
            .await?;
        if result.affected_rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn clear_all_plant_requests(&self) -> AppResult<u64> {
        self.ensure_development()?;
        let result = self.execute("DELETE FROM plant_requests", vec![]).await?;
        tracing::warn!(deleted = result.affected_rows, "all plant requests cleared");
        Ok(result.affected_rows)
    }

    // Care guides and preferences

    pub async fn get_care_guides(&self) -> AppResult<Vec<CareGuide>> {
        let rows = self.query("SELECT * FROM care_guides", vec![]).await?;
        let guides: Vec<CareGuideRecord> = decode_all("care_guides", rows)?;
        Ok(guides.into_iter().map(CareGuideRecord::into_guide).collect())
    }

    pub async fn get_user_preferences(&self, user_id: Option<&str>) -> AppResult<Option<UserPreference>> {
        let user_id = user_id.map(sanitize_input).filter(|id| !id.is_empty());
        let rows = self
            .query(
                "SELECT * FROM user_preferences WHERE user_id = ? OR user_id IS NULL LIMIT 1",
                vec![json!(user_id)],
            )
            .await?;
        rows.into_iter()
            .next()
            .map(|row| decode::<UserPreference>("user_preferences", row))
            .transpose()
            .map_err(AppError::from)
    }

    pub async fn save_user_preferences(&self, payload: SavePreferences) -> AppResult<UserPreference> {
        let user_id = payload
            .user_id
            .as_deref()
            .map(sanitize_input)
            .filter(|id| !id.is_empty());
        let now = now();

        match self.get_user_preferences(user_id.as_deref()).await? {
            Some(existing) => {
                self.execute(
                    "UPDATE user_preferences SET language = ?, has_visited = ?, updated_at = ? WHERE id = ?",
                    vec![
                        json!(payload.language),
                        json!(payload.has_visited),
                        json!(now),
                        json!(existing.id),
                    ],
                )
                .await?;
            }
            None => {
                let record = json!({
                    "user_id": user_id,
                    "language": payload.language,
                    "has_visited": payload.has_visited,
                    "created_at": now,
                    "updated_at": now,
                });
                self.execute("INSERT INTO user_preferences", vec![record]).await?;
            }
        }

        self.get_user_preferences(user_id.as_deref())
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("saved preference not found")))
    }

    // Audit

    pub async fn get_audit_logs(&self, limit: usize) -> AppResult<Vec<AuditLog>> {
        let sql = format!("SELECT * FROM audit_logs ORDER BY created_at DESC LIMIT {limit}");
        let rows = self.query(&sql, vec![]).await?;
        decode_all("audit_logs", rows).map_err(AppError::from)
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

/// Sanitized, non-empty form of a required text field.
fn required(value: &str, message: &str) -> AppResult<String> {
    let sanitized = sanitize_input(value);
    if sanitized.is_empty() {
        return Err(AppError::bad_request(message));
    }
    Ok(sanitized)
}

fn validate_plant_price(price: f64) -> AppResult<()> {
    match validate_price(price) {
        Ok(price) if price > 0.0 => Ok(()),
        Ok(_) => Err(AppError::bad_request("Valid plant price is required")),
        Err(err) => Err(AppError::bad_request(err.to_string())),
    }
}

fn validate_stock(stock: i64) -> AppResult<()> {
    if stock < 0 {
        return Err(AppError::bad_request("Stock must be a non-negative integer"));
    }
    Ok(())
}

fn validate_rating(rating: f64) -> AppResult<()> {
    if !(0.0..=5.0).contains(&rating) {
        return Err(AppError::bad_request("Rating must be between 0 and 5"));
    }
    Ok(())
}

fn validate_image(image: &str) -> AppResult<String> {
    let image = image.trim();
    url::Url::parse(image).map_err(|_| AppError::bad_request("Invalid image URL"))?;
    Ok(image.to_string())
}

/// `MG` + last six digits of the millisecond clock + three random digits.
fn generate_order_number() -> String {
    let millis = Utc::now().timestamp_millis().unsigned_abs() % 1_000_000;
    let suffix: u16 = rand::thread_rng().gen_range(0..1000);
    format!("MG{millis:06}{suffix:03}")
}

fn decode<T: DeserializeOwned>(table: &str, row: Row) -> Result<T, DbError> {
    serde_json::from_value(row).map_err(|err| DbError::MalformedRow {
        table: table.to_string(),
        reason: err.to_string(),
    })
}

fn decode_all<T: DeserializeOwned>(table: &str, rows: Vec<Row>) -> Result<Vec<T>, DbError> {
    rows.into_iter().map(|row| decode(table, row)).collect()
}

fn sanitize_plant(plant: Plant) -> Plant {
    Plant {
        id: sanitize_input(&plant.id),
        name: sanitize_input(&plant.name),
        name_ne: sanitize_input(&plant.name_ne),
        description: sanitize_input(&plant.description),
        description_ne: sanitize_input(&plant.description_ne),
        category: sanitize_input(&plant.category),
        price: price_or_zero(plant.price),
        stock: plant.stock.max(0),
        rating: if plant.rating.is_finite() {
            plant.rating.clamp(0.0, 5.0)
        } else {
            0.0
        },
        ..plant
    }
}

/// Order as it sits in the `orders` table: flat customer columns and the
/// items encoded as a JSON string.
#[derive(Debug, Deserialize)]
struct OrderRecord {
    id: String,
    order_number: String,
    customer_name: String,
    customer_phone: String,
    customer_address: String,
    #[serde(default)]
    items: Value,
    #[serde(default)]
    total: f64,
    payment_method: String,
    status: OrderStatus,
    #[serde(default)]
    whatsapp_sent: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRecord {
    fn into_order(self) -> Order {
        Order {
            id: sanitize_input(&self.id),
            order_number: sanitize_input(&self.order_number),
            customer: CustomerDetails {
                full_name: sanitize_input(&self.customer_name),
                delivery_address: sanitize_input(&self.customer_address),
                phone_number: sanitize_input(&self.customer_phone),
            },
            items: parse_items(&self.order_number, self.items),
            total: price_or_zero(self.total),
            payment_method: sanitize_input(&self.payment_method),
            status: self.status,
            whatsapp_sent: self.whatsapp_sent,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn order_from_row(row: Row) -> Option<Order> {
    match decode::<OrderRecord>("orders", row) {
        Ok(record) => Some(record.into_order()),
        Err(err) => {
            tracing::warn!(error = %err, "skipping malformed order row");
            None
        }
    }
}

fn parse_items(order_number: &str, items: Value) -> Vec<OrderItem> {
    let parsed = match items {
        Value::String(raw) => serde_json::from_str::<Vec<OrderItem>>(&raw),
        Value::Null => Ok(Vec::new()),
        other => serde_json::from_value::<Vec<OrderItem>>(other),
    };
    parsed.unwrap_or_else(|err| {
        tracing::warn!(%order_number, error = %err, "order items unreadable, using empty list");
        Vec::new()
    })
}

#[derive(Debug, Deserialize)]
struct CareGuideRecord {
    id: String,
    title: String,
    title_ne: String,
    description: String,
    description_ne: String,
    icon: String,
    #[serde(default)]
    tips: Value,
    #[serde(default)]
    tips_ne: Value,
}

impl CareGuideRecord {
    fn into_guide(self) -> CareGuide {
        CareGuide {
            id: sanitize_input(&self.id),
            title: sanitize_input(&self.title),
            title_ne: sanitize_input(&self.title_ne),
            description: sanitize_input(&self.description),
            description_ne: sanitize_input(&self.description_ne),
            icon: sanitize_input(&self.icon),
            tips: parse_tips(self.tips),
            tips_ne: parse_tips(self.tips_ne),
        }
    }
}

fn parse_tips(tips: Value) -> Vec<String> {
    match tips {
        Value::String(raw) => serde_json::from_str(&raw).unwrap_or_default(),
        other => serde_json::from_value(other).unwrap_or_default(),
    }
}
