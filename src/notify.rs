//! Simulated WhatsApp order confirmations.

use std::time::Duration;

use thiserror::Error;

use crate::{
    config::WhatsAppSettings,
    models::Order,
    validation::{USD_TO_NPR_RATE, format_phone_number, is_valid_order_phone},
};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum NotifyError {
    #[error("Invalid order data for WhatsApp confirmation")]
    InvalidOrder,
    #[error("Invalid phone number format for WhatsApp")]
    InvalidPhone,
    #[error("WhatsApp API timeout")]
    Timeout,
    #[error("WhatsApp notifications are disabled")]
    Disabled,
}

#[derive(Debug, Clone)]
pub struct WhatsAppNotifier {
    enabled: bool,
    delay: Duration,
    timeout: Duration,
}

impl WhatsAppNotifier {
    pub fn new(settings: &WhatsAppSettings) -> Self {
        Self {
            enabled: settings.enabled,
            delay: settings.delay,
            timeout: settings.timeout,
        }
    }

    pub async fn send_order_confirmation(&self, order: &Order) -> Result<bool, NotifyError> {
        if !self.enabled {
            return Err(NotifyError::Disabled);
        }
        if order.order_number.trim().is_empty() || order.customer.phone_number.trim().is_empty() {
            return Err(NotifyError::InvalidOrder);
        }
        if !is_valid_order_phone(&order.customer.phone_number) {
            return Err(NotifyError::InvalidPhone);
        }

        let message = confirmation_message(order);
        tracing::info!(
            to = %format_phone_number(&order.customer.phone_number),
            order_number = %order.order_number,
            "sending whatsapp confirmation"
        );
        tracing::debug!(%message, "whatsapp message body");

        tokio::time::timeout(self.timeout, tokio::time::sleep(self.delay))
            .await
            .map_err(|_| NotifyError::Timeout)?;
        Ok(true)
    }
}

pub fn confirmation_message(order: &Order) -> String {
    let total_npr = (order.total * USD_TO_NPR_RATE).round();
    format!(
        "Dear Customer your order has been received successfully. We will confirm the delivery soon. \
         Thank you for shopping with us! 🌿 MERO GAMALAA\n\n\
         Order Details:\n\
         Order Number: {}\n\
         Total Amount: Rs. {total_npr:.0}\n\
         Delivery Address: {}",
        order.order_number, order.customer.delivery_address
    )
}
