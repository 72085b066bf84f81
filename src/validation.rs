//! Input sanitization and the validation rules shared by the cart, the order
//! store and the API service.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    error::AppError,
    models::{CustomerDetails, OrderItem},
};

pub const USD_TO_NPR_RATE: f64 = 133.0;
pub const MAX_PRICE: f64 = 1_000_000.0;
pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_ADDRESS_LENGTH: usize = 500;
pub const MAX_MESSAGE_LENGTH: usize = 1000;
/// Allowed drift between a submitted total and the sum of its items.
pub const TOTAL_TOLERANCE: f64 = 0.01;

static XSS_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>"'&]"#).expect("valid xss regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
// Loose form accepted at order time: optional country/trunk prefix, then 9 + 8..9 digits.
static ORDER_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+977|977|0)?9[0-9]{8,9}$").expect("valid phone regex"));
// Strict mobile form used after normalisation with `format_phone_number`.
static MOBILE_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+977|977)?9[6-9][0-9]{8}$").expect("valid mobile regex"));
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});
static TWO_FACTOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{6}$").expect("valid 2fa regex"));

/// Trims, strips `< > " ' &` and collapses runs of whitespace.
pub fn sanitize_input(input: &str) -> String {
    let stripped = XSS_CHARS.replace_all(input.trim(), "");
    WHITESPACE.replace_all(&stripped, " ").into_owned()
}

/// Like [`sanitize_input`] but truncated to `max_chars` characters.
pub fn sanitize_with_limit(input: &str, max_chars: usize) -> String {
    let sanitized = sanitize_input(input);
    if sanitized.chars().count() > max_chars {
        sanitized.chars().take(max_chars).collect()
    } else {
        sanitized
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PriceError {
    #[error("Price must be a valid number")]
    NotANumber,
    #[error("Price cannot be negative")]
    Negative,
    #[error("Price cannot exceed Rs. 10,00,000")]
    TooLarge,
}

pub fn validate_price(price: f64) -> Result<f64, PriceError> {
    if !price.is_finite() {
        return Err(PriceError::NotANumber);
    }
    if price < 0.0 {
        return Err(PriceError::Negative);
    }
    if price > MAX_PRICE {
        return Err(PriceError::TooLarge);
    }
    Ok(price)
}

/// The validated price, or zero when it is out of range.
pub fn price_or_zero(price: f64) -> f64 {
    validate_price(price).unwrap_or(0.0)
}

pub fn is_valid_order_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    ORDER_PHONE.is_match(&compact)
}

/// Normalises a Nepali number to `+977XXXXXXXXXX` where the input allows it.
pub fn format_phone_number(phone: &str) -> String {
    let cleaned: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    if cleaned.starts_with("+977") {
        cleaned
    } else if cleaned.starts_with("977") {
        format!("+{cleaned}")
    } else if cleaned.starts_with('0') && cleaned.len() == 10 {
        format!("+977{}", &cleaned[1..])
    } else if cleaned.starts_with('9') && cleaned.len() == 10 {
        format!("+977{cleaned}")
    } else {
        cleaned
    }
}

pub fn is_valid_mobile_number(phone: &str) -> bool {
    let formatted = format_phone_number(phone);
    !formatted.is_empty() && MOBILE_PHONE.is_match(&formatted.replace('+', ""))
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

pub fn is_valid_two_factor_code(code: &str) -> bool {
    TWO_FACTOR.is_match(&sanitize_input(code))
}

pub fn validate_customer_details(details: &CustomerDetails) -> Result<(), AppError> {
    if details.full_name.trim().is_empty() {
        return Err(AppError::bad_request("Customer name is required"));
    }
    if details.delivery_address.trim().is_empty() {
        return Err(AppError::bad_request("Delivery address is required"));
    }
    if details.phone_number.trim().is_empty() {
        return Err(AppError::bad_request("Phone number is required"));
    }
    if !is_valid_order_phone(&details.phone_number) {
        return Err(AppError::bad_request("Invalid phone number format"));
    }
    Ok(())
}

pub fn validate_order_items(items: &[OrderItem]) -> Result<(), AppError> {
    if items.is_empty() {
        return Err(AppError::bad_request("Order must contain at least one item"));
    }
    for (index, item) in items.iter().enumerate() {
        if item.id.trim().is_empty()
            || item.name.trim().is_empty()
            || !item.price.is_finite()
            || item.price <= 0.0
        {
            return Err(AppError::bad_request(format!(
                "Invalid item at position {}",
                index + 1
            )));
        }
        if item.quantity == 0 {
            return Err(AppError::bad_request(format!(
                "Invalid quantity for item {}",
                item.name
            )));
        }
    }
    Ok(())
}

pub fn sanitize_customer_details(details: &CustomerDetails) -> CustomerDetails {
    CustomerDetails {
        full_name: sanitize_with_limit(&details.full_name, MAX_NAME_LENGTH),
        delivery_address: sanitize_with_limit(&details.delivery_address, MAX_ADDRESS_LENGTH),
        phone_number: sanitize_input(&details.phone_number),
    }
}

pub fn sanitize_order_item(item: &OrderItem) -> OrderItem {
    OrderItem {
        id: sanitize_input(&item.id),
        name: sanitize_with_limit(&item.name, MAX_NAME_LENGTH),
        price: price_or_zero(item.price),
        quantity: item.quantity.max(1),
        image: sanitize_input(&item.image),
    }
}

pub fn order_total(items: &[OrderItem]) -> f64 {
    items
        .iter()
        .map(|item| item.price * f64::from(item.quantity))
        .sum()
}

pub fn totals_match(expected: f64, actual: f64) -> bool {
    (expected - actual).abs() <= TOTAL_TOLERANCE
}
