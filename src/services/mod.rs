pub mod admin_service;
pub mod api_service;
pub mod cart_service;
pub mod catalog_service;
pub mod language_service;
pub mod order_service;
