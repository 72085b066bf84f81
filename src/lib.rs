pub mod audit;
pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod local_storage;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod response;
pub mod retry;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;
