//! Order store: the cached order list, order placement and the local
//! storage backup the list falls back to when the database is unavailable.

use std::{
    collections::HashSet,
    sync::{Mutex as SyncMutex, PoisonError},
};

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    dto::orders::CreateOrder,
    error::{AppError, AppResult},
    local_storage::{LocalStore, keys},
    models::{CustomerDetails, Order, OrderItem, OrderStatus},
    notify::WhatsAppNotifier,
    services::api_service::ApiService,
    validation::{
        order_total, sanitize_customer_details, sanitize_input, sanitize_order_item,
        validate_customer_details, validate_order_items,
    },
};

const ORDER_IN_PROGRESS: &str = "Another order is being processed. Please wait.";

/// Where a refresh got its orders from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Database(usize),
    Fallback(usize),
    /// A newer refresh started before this one finished; nothing was changed.
    Superseded,
}

pub struct OrderStore {
    api: ApiService,
    storage: LocalStore,
    notifier: WhatsAppNotifier,
    orders: RwLock<Vec<Order>>,
    /// Cart sessions with an order submission in flight.
    creating: SyncMutex<HashSet<Uuid>>,
    refresh: Mutex<CancellationToken>,
}

impl OrderStore {
    pub fn new(api: ApiService, storage: LocalStore, notifier: WhatsAppNotifier) -> Self {
        Self {
            api,
            storage,
            notifier,
            orders: RwLock::new(Vec::new()),
            creating: SyncMutex::new(HashSet::new()),
            refresh: Mutex::new(CancellationToken::new()),
        }
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.orders.read().await.clone()
    }

    /// Validates, sanitizes and places an order, then sends the WhatsApp
    /// confirmation. Returns the order number. Overlapping submissions from
    /// the same session are rejected; other sessions are unaffected.
    pub async fn add_order(
        &self,
        session: Uuid,
        customer: CustomerDetails,
        items: Vec<OrderItem>,
        payment_method: &str,
    ) -> AppResult<String> {
        let _guard = CreationGuard::acquire(&self.creating, session)?;

        validate_customer_details(&customer)?;
        validate_order_items(&items)?;
        if payment_method.trim().is_empty() {
            return Err(AppError::bad_request("Payment method is required"));
        }

        let customer = sanitize_customer_details(&customer);
        let items: Vec<OrderItem> = items.iter().map(sanitize_order_item).collect();
        let payload = CreateOrder {
            total: order_total(&items),
            customer,
            items,
            payment_method: sanitize_input(payment_method),
        };

        let order_number = self
            .api
            .create_order(payload)
            .await
            .inspect_err(|err| tracing::error!(error = %err, "error creating order"))?;

        self.refresh_orders().await;
        match self.find_created(&order_number).await {
            Some(order) => self.confirm(&order).await,
            None => tracing::warn!(%order_number, "new order not visible after refresh"),
        }

        Ok(order_number)
    }

    async fn find_created(&self, order_number: &str) -> Option<Order> {
        if let Some(order) = self.get_order_by_number(order_number).await {
            return Some(order);
        }
        self.api
            .get_order_by_number(order_number)
            .await
            .ok()
            .flatten()
    }

    /// Sends the confirmation and records it. Failures are logged only.
    async fn confirm(&self, order: &Order) {
        match self.notifier.send_order_confirmation(order).await {
            Ok(_) => {
                if let Err(err) = self.api.update_order_whatsapp_status(&order.id, true).await {
                    tracing::warn!(error = %err, order_id = %order.id, "failed to record whatsapp status");
                    return;
                }
                self.refresh_orders().await;
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    order_number = %order.order_number,
                    "failed to send whatsapp confirmation"
                );
            }
        }
    }

    /// Reloads the order list, cancelling any refresh still in flight.
    pub async fn refresh_orders(&self) -> RefreshOutcome {
        let token = {
            let mut current = self.refresh.lock().await;
            current.cancel();
            let fresh = CancellationToken::new();
            *current = fresh.clone();
            fresh
        };

        let result = tokio::select! {
            _ = token.cancelled() => return RefreshOutcome::Superseded,
            result = self.api.get_orders() => result,
        };
        if token.is_cancelled() {
            return RefreshOutcome::Superseded;
        }

        match result {
            Ok(orders) => {
                let count = orders.len();
                {
                    let mut cached = self.orders.write().await;
                    if token.is_cancelled() {
                        return RefreshOutcome::Superseded;
                    }
                    *cached = orders;
                }
                self.backup().await;
                tracing::debug!(count, "orders loaded from database");
                RefreshOutcome::Database(count)
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to load orders, using local backup");
                match self.load_from_local_storage(&token).await {
                    Some(count) => RefreshOutcome::Fallback(count),
                    None => RefreshOutcome::Superseded,
                }
            }
        }
    }

    /// Replaces the cache with the local backup. A backup that fails the
    /// shape check is deleted and the cache emptied. `None` when `token`
    /// was cancelled before the cache could be written.
    async fn load_from_local_storage(&self, token: &CancellationToken) -> Option<usize> {
        let Some(raw) = self.storage.get_item(keys::ORDERS).await else {
            return Some(self.orders.read().await.len());
        };

        match parse_backup(&raw) {
            Ok(orders) => {
                let count = orders.len();
                let mut cached = self.orders.write().await;
                if token.is_cancelled() {
                    return None;
                }
                *cached = orders;
                tracing::info!(count, "orders loaded from local storage");
                Some(count)
            }
            Err(reason) => {
                tracing::error!(%reason, "stored orders are corrupted, discarding");
                if let Err(err) = self.storage.remove_item(keys::ORDERS).await {
                    tracing::warn!(error = %err, "failed to remove corrupted orders");
                }
                self.orders.write().await.clear();
                Some(0)
            }
        }
    }

    async fn backup(&self) {
        let orders = self.orders.read().await;
        if orders.is_empty() {
            return;
        }
        if let Err(err) = self.storage.set_json(keys::ORDERS, &*orders).await {
            tracing::warn!(error = %err, "failed to backup orders to local storage");
        }
    }

    pub async fn get_order_by_id(&self, id: &str) -> Option<Order> {
        let id = sanitize_input(id);
        if id.is_empty() {
            return None;
        }
        self.orders.read().await.iter().find(|o| o.id == id).cloned()
    }

    pub async fn get_order_by_number(&self, order_number: &str) -> Option<Order> {
        let order_number = sanitize_input(order_number);
        self.orders
            .read()
            .await
            .iter()
            .find(|o| o.order_number == order_number)
            .cloned()
    }

    pub async fn update_order_status(&self, id: &str, status: OrderStatus) -> AppResult<Order> {
        let id = sanitize_input(id);
        if id.is_empty() {
            return Err(AppError::bad_request("Order ID is required"));
        }

        self.api.update_order_status(&id, status).await?;

        let updated = {
            let mut orders = self.orders.write().await;
            match orders.iter_mut().find(|o| o.id == id) {
                Some(order) => {
                    order.status = status;
                    order.updated_at = Utc::now();
                    Some(order.clone())
                }
                None => None,
            }
        };
        self.backup().await;
        tracing::info!(order_id = %id, %status, "order status updated");

        match updated {
            Some(order) => Ok(order),
            // Cache was stale; read the row back.
            None => self.api.get_order_by_id(&id).await?.ok_or(AppError::NotFound),
        }
    }

    /// Development only: empties the table, the cache and the backup.
    pub async fn clear_all_orders(&self) -> AppResult<u64> {
        let deleted = self.api.clear_all_orders().await?;
        self.orders.write().await.clear();
        self.storage.remove_item(keys::ORDERS).await?;
        Ok(deleted)
    }
}

fn parse_backup(raw: &str) -> Result<Vec<Order>, String> {
    let value: Value = serde_json::from_str(raw).map_err(|err| err.to_string())?;
    let Value::Array(entries) = value else {
        return Err("Invalid stored orders format".to_string());
    };

    entries
        .into_iter()
        .map(|entry| {
            let has = |field: &str| {
                entry
                    .get(field)
                    .and_then(Value::as_str)
                    .is_some_and(|s| !s.is_empty())
            };
            if !(has("id") && has("order_number") && has("created_at")) {
                return Err("Invalid order structure in local storage".to_string());
            }
            serde_json::from_value::<Order>(entry).map_err(|err| err.to_string())
        })
        .collect()
}

/// Holds a session's order-creation slot until dropped.
struct CreationGuard<'a> {
    sessions: &'a SyncMutex<HashSet<Uuid>>,
    session: Uuid,
}

impl<'a> CreationGuard<'a> {
    fn acquire(sessions: &'a SyncMutex<HashSet<Uuid>>, session: Uuid) -> AppResult<Self> {
        let inserted = sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session);
        if !inserted {
            return Err(AppError::Conflict(ORDER_IN_PROGRESS.to_string()));
        }
        Ok(Self { sessions, session })
    }
}

impl Drop for CreationGuard<'_> {
    fn drop(&mut self) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.session);
    }
}
