pub mod app;
pub mod config;
pub mod console;
pub mod error;
pub mod handlers;
pub mod models;
pub mod store;
