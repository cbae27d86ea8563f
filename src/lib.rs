pub mod api;
pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod expenses;
pub mod google;
pub mod session;
pub mod settings;
pub mod sheets;
pub mod state;
