pub mod admin;
pub mod cart;
pub mod orders;
pub mod plant_requests;
pub mod plants;
pub mod preferences;
