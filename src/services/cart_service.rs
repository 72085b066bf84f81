use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    dto::cart::CartView,
    error::{AppError, AppResult},
    local_storage::{LocalStore, keys},
    models::{CartItem, CustomerDetails, OrderItem},
    services::{api_service::ApiService, order_service::OrderStore},
    validation::{
        MAX_NAME_LENGTH, PriceError, USD_TO_NPR_RATE, sanitize_input, sanitize_with_limit,
        validate_price,
    },
};

pub const MAX_QUANTITY: u32 = 99;
pub const MAX_LINES: usize = 50;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CartError {
    #[error("Valid item ID is required")]
    MissingId,
    #[error("Item name is required")]
    MissingName,
    #[error("Item name cannot exceed 100 characters")]
    NameTooLong,
    #[error(transparent)]
    Price(#[from] PriceError),
    #[error("Discount percentage must be between 0 and 100")]
    InvalidDiscount,
    #[error("Invalid image URL format")]
    InvalidImage,
    #[error("Cannot add more than 99 of the same item")]
    QuantityLimit,
    #[error("Cart is full. Cannot add more items.")]
    Full,
    #[error("Item not found in cart")]
    NotFound,
    #[error("Quantity must be a non-negative integer")]
    NegativeQuantity,
    #[error("Quantity cannot exceed 99")]
    QuantityTooLarge,
    #[error("Your cart is empty")]
    Empty,
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::NotFound => AppError::NotFound,
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

/// A catalogue entry about to go into a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub discount_percentage: Option<f64>,
    pub image: String,
}

impl NewCartItem {
    fn validate(&self) -> Result<(), CartError> {
        if self.id.trim().is_empty() {
            return Err(CartError::MissingId);
        }
        if self.name.trim().is_empty() {
            return Err(CartError::MissingName);
        }
        if self.name.chars().count() > MAX_NAME_LENGTH {
            return Err(CartError::NameTooLong);
        }
        validate_price(self.price)?;
        if let Some(discount) = self.discount_percentage {
            if !(0.0..=100.0).contains(&discount) {
                return Err(CartError::InvalidDiscount);
            }
        }
        url::Url::parse(self.image.trim()).map_err(|_| CartError::InvalidImage)?;
        Ok(())
    }

    fn sanitized(self) -> CartItem {
        CartItem {
            id: sanitize_input(&self.id),
            name: sanitize_with_limit(&self.name, MAX_NAME_LENGTH),
            price: self.price,
            discount_percentage: self
                .discount_percentage
                .filter(|discount| *discount > 0.0)
                .map(|discount| discount.clamp(0.0, 100.0)),
            image: self.image.trim().to_string(),
            quantity: 1,
        }
    }
}

impl From<&CartItem> for NewCartItem {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            price: item.price,
            discount_percentage: item.discount_percentage,
            image: item.image.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds one unit, merging with an existing line of the same id.
    pub fn add(&mut self, item: NewCartItem) -> Result<&CartItem, CartError> {
        item.validate()?;
        let item = item.sanitized();

        if let Some(index) = self.items.iter().position(|line| line.id == item.id) {
            let line = &mut self.items[index];
            if line.quantity >= MAX_QUANTITY {
                return Err(CartError::QuantityLimit);
            }
            line.quantity += 1;
            return Ok(&self.items[index]);
        }

        if self.items.len() >= MAX_LINES {
            return Err(CartError::Full);
        }
        self.items.push(item);
        Ok(&self.items[self.items.len() - 1])
    }

    pub fn remove(&mut self, id: &str) -> Result<(), CartError> {
        let id = sanitize_input(id);
        if id.is_empty() {
            return Err(CartError::MissingId);
        }
        let before = self.items.len();
        self.items.retain(|line| line.id != id);
        if self.items.len() == before {
            return Err(CartError::NotFound);
        }
        Ok(())
    }

    /// Sets a line's quantity; zero removes the line.
    pub fn update_quantity(&mut self, id: &str, quantity: i64) -> Result<(), CartError> {
        if id.trim().is_empty() {
            return Err(CartError::MissingId);
        }
        if quantity < 0 {
            return Err(CartError::NegativeQuantity);
        }
        if quantity > i64::from(MAX_QUANTITY) {
            return Err(CartError::QuantityTooLarge);
        }
        if quantity == 0 {
            return self.remove(id);
        }

        let id = sanitize_input(id);
        let line = self
            .items
            .iter_mut()
            .find(|line| line.id == id)
            .ok_or(CartError::NotFound)?;
        line.quantity = quantity as u32;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    /// Discounted total in rupees.
    pub fn total_price(&self) -> f64 {
        self.items
            .iter()
            .map(|line| line.unit_price() * f64::from(line.quantity) * USD_TO_NPR_RATE)
            .sum()
    }

    /// Lines as order items, at catalogue price.
    pub fn order_items(&self) -> Vec<OrderItem> {
        self.items
            .iter()
            .map(|line| OrderItem {
                id: line.id.clone(),
                name: line.name.clone(),
                price: line.price,
                quantity: line.quantity,
                image: line.image.clone(),
            })
            .collect()
    }

    /// Drops lines that would not pass validation today.
    fn retain_valid(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|line| {
            (1..=MAX_QUANTITY).contains(&line.quantity) && NewCartItem::from(line).validate().is_ok()
        });
        self.items.truncate(MAX_LINES);
        before - self.items.len()
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items.clone(),
            total_items: cart.total_items(),
            total_price_npr: cart.total_price(),
        }
    }
}

/// Carts keyed by client session, mirrored to local storage.
pub struct CartService {
    api: ApiService,
    storage: LocalStore,
    carts: RwLock<HashMap<Uuid, Cart>>,
}

impl CartService {
    pub fn new(api: ApiService, storage: LocalStore) -> Self {
        Self {
            api,
            storage,
            carts: RwLock::new(HashMap::new()),
        }
    }

    pub async fn cart(&self, session: Uuid) -> Cart {
        if let Some(cart) = self.carts.read().await.get(&session) {
            return cart.clone();
        }
        let mut carts = self.carts.write().await;
        if !carts.contains_key(&session) {
            let restored = self.restore(session).await;
            carts.insert(session, restored);
        }
        carts.entry(session).or_default().clone()
    }

    /// Looks the plant up in the catalogue and adds one unit of it.
    pub async fn add_plant(
        &self,
        session: Uuid,
        plant_id: &str,
        discount_percentage: Option<f64>,
    ) -> AppResult<Cart> {
        let plant = self
            .api
            .get_plant_by_id(plant_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if plant.stock <= 0 {
            return Err(AppError::bad_request(format!("{} is out of stock", plant.name)));
        }

        let item = NewCartItem {
            id: plant.id,
            name: plant.name,
            price: plant.price,
            discount_percentage,
            image: plant.image,
        };
        self.mutate(session, |cart| cart.add(item).map(|_| ())).await
    }

    pub async fn remove_item(&self, session: Uuid, id: &str) -> AppResult<Cart> {
        self.mutate(session, |cart| cart.remove(id)).await
    }

    pub async fn update_quantity(&self, session: Uuid, id: &str, quantity: i64) -> AppResult<Cart> {
        self.mutate(session, |cart| cart.update_quantity(id, quantity)).await
    }

    pub async fn clear(&self, session: Uuid) -> AppResult<Cart> {
        self.mutate(session, |cart| {
            cart.clear();
            Ok(())
        })
        .await
    }

    /// Places the cart as an order and empties it. Returns the order number.
    pub async fn checkout(
        &self,
        session: Uuid,
        orders: &OrderStore,
        customer: CustomerDetails,
        payment_method: &str,
    ) -> AppResult<String> {
        let cart = self.cart(session).await;
        if cart.is_empty() {
            return Err(CartError::Empty.into());
        }

        let order_number = orders
            .add_order(session, customer, cart.order_items(), payment_method)
            .await?;
        self.clear(session).await?;
        tracing::info!(%session, %order_number, "cart checked out");
        Ok(order_number)
    }

    async fn mutate<F>(&self, session: Uuid, apply: F) -> AppResult<Cart>
    where
        F: FnOnce(&mut Cart) -> Result<(), CartError>,
    {
        let snapshot = {
            let mut carts = self.carts.write().await;
            if !carts.contains_key(&session) {
                let restored = self.restore(session).await;
                carts.insert(session, restored);
            }
            let cart = carts.entry(session).or_default();
            apply(cart)?;
            cart.clone()
        };

        if let Err(err) = self.storage.set_json(&keys::cart(&session), &snapshot).await {
            tracing::warn!(error = %err, %session, "failed to backup cart");
        }
        Ok(snapshot)
    }

    async fn restore(&self, session: Uuid) -> Cart {
        let key = keys::cart(&session);
        match self.storage.get_json::<Cart>(&key).await {
            Ok(Some(mut cart)) => {
                let dropped = cart.retain_valid();
                if dropped > 0 {
                    tracing::warn!(%session, dropped, "invalid items dropped from restored cart");
                }
                cart
            }
            Ok(None) => Cart::default(),
            Err(err) => {
                tracing::warn!(error = %err, %session, "stored cart is corrupted, starting empty");
                if let Err(err) = self.storage.remove_item(&key).await {
                    tracing::warn!(error = %err, "failed to remove corrupted cart");
                }
                Cart::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, db::MockDatabase};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn plant(id: &str) -> NewCartItem {
        NewCartItem {
            id: id.to_string(),
            name: format!("Plant {id}"),
            price: 10.0,
            discount_percentage: None,
            image: "https://images.example.com/plant.jpg".to_string(),
        }
    }

    #[test]
    fn adding_the_same_plant_twice_increments() {
        let mut cart = Cart::default();
        cart.add(plant("1")).unwrap();
        let line = cart.add(plant("1")).unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total_items(), 2);
    }

    #[test]
    fn quantity_is_capped_at_99() {
        let mut cart = Cart::default();
        cart.add(plant("1")).unwrap();
        cart.update_quantity("1", 99).unwrap();
        assert_eq!(cart.add(plant("1")), Err(CartError::QuantityLimit));
        assert_eq!(cart.update_quantity("1", 100), Err(CartError::QuantityTooLarge));
        assert_eq!(cart.update_quantity("1", -1), Err(CartError::NegativeQuantity));
    }

    #[test]
    fn zero_quantity_removes_the_line() {
        let mut cart = Cart::default();
        cart.add(plant("1")).unwrap();
        cart.update_quantity("1", 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.update_quantity("1", 3), Err(CartError::NotFound));
        assert_eq!(cart.remove("1"), Err(CartError::NotFound));
    }

    #[test]
    fn cart_holds_at_most_fifty_lines() {
        let mut cart = Cart::default();
        for id in 0..MAX_LINES {
            cart.add(plant(&id.to_string())).unwrap();
        }
        assert_eq!(cart.add(plant("overflow")), Err(CartError::Full));
        // Existing lines can still grow.
        assert!(cart.add(plant("0")).is_ok());
    }

    #[test]
    fn invalid_items_are_rejected() {
        let mut cart = Cart::default();
        let mut item = plant("1");
        item.image = "not a url".into();
        assert_eq!(cart.add(item), Err(CartError::InvalidImage));

        let mut item = plant("1");
        item.discount_percentage = Some(120.0);
        assert_eq!(cart.add(item), Err(CartError::InvalidDiscount));

        let mut item = plant("1");
        item.name = "x".repeat(MAX_NAME_LENGTH + 1);
        assert_eq!(cart.add(item), Err(CartError::NameTooLong));

        let mut item = plant("1");
        item.price = -3.0;
        assert_eq!(cart.add(item), Err(CartError::Price(PriceError::Negative)));
    }

    #[test]
    fn total_price_applies_discount_and_converts_to_rupees() {
        let mut cart = Cart::default();
        let mut discounted = plant("1");
        discounted.discount_percentage = Some(50.0);
        cart.add(discounted).unwrap();
        cart.add(plant("2")).unwrap();
        cart.update_quantity("2", 2).unwrap();
        // (5 + 2 * 10) * 133
        assert!((cart.total_price() - 3325.0).abs() < 1e-9);
        assert_eq!(cart.order_items()[0].price, 10.0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(u8),
        Remove(u8),
        Set(u8, i64),
        Clear,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..5).prop_map(Op::Add),
            (0u8..5).prop_map(Op::Remove),
            ((0u8..5), -5i64..120).prop_map(|(id, qty)| Op::Set(id, qty)),
            Just(Op::Clear),
        ]
    }

    proptest! {
        #[test]
        fn quantities_stay_within_bounds(ops in prop::collection::vec(op(), 0..200)) {
            let mut cart = Cart::default();
            for op in ops {
                let _ = match op {
                    Op::Add(id) => cart.add(plant(&id.to_string())).map(|_| ()),
                    Op::Remove(id) => cart.remove(&id.to_string()),
                    Op::Set(id, qty) => cart.update_quantity(&id.to_string(), qty),
                    Op::Clear => {
                        cart.clear();
                        Ok(())
                    }
                };
                prop_assert!(cart.items().len() <= MAX_LINES);
                for line in cart.items() {
                    prop_assert!((1..=MAX_QUANTITY).contains(&line.quantity));
                }
            }
        }
    }

    fn service() -> (CartService, LocalStore) {
        let config = AppConfig::local();
        let api = ApiService::new(Arc::new(MockDatabase::new()), &config.db, true);
        let storage = LocalStore::in_memory();
        (CartService::new(api, storage.clone()), storage)
    }

    #[tokio::test]
    async fn carts_are_restored_from_local_storage() {
        let (carts, storage) = service();
        let session = Uuid::new_v4();
        carts.add_plant(session, "2", None).await.unwrap();
        carts.add_plant(session, "2", None).await.unwrap();

        let restored = CartService::new(carts.api.clone(), storage);
        let cart = restored.cart(session).await;
        assert_eq!(cart.total_items(), 2);
        assert_eq!(cart.items()[0].name, "Monstera Deliciosa");
    }

    #[tokio::test]
    async fn corrupted_backup_starts_an_empty_cart() {
        let (carts, storage) = service();
        let session = Uuid::new_v4();
        storage.set_item(&keys::cart(&session), "{oops").await.unwrap();
        assert!(carts.cart(session).await.is_empty());
        assert!(storage.get_item(&keys::cart(&session)).await.is_none());
    }

    #[tokio::test]
    async fn unknown_plants_cannot_be_added() {
        let (carts, _) = service();
        let err = carts.add_plant(Uuid::new_v4(), "404", None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn invalid_discount_is_rejected_before_touching_the_cart() {
        let (carts, storage) = service();
        let session = Uuid::new_v4();

        let err = carts.add_plant(session, "2", Some(150.0)).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(storage.get_item(&keys::cart(&session)).await.is_none());

        let cart = carts.add_plant(session, "2", Some(15.0)).await.unwrap();
        assert_eq!(cart.total_items(), 1);
    }
}
