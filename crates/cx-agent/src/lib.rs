pub mod auth;
pub mod chat;
pub mod errors;
pub mod models;
pub mod providers;
pub mod settings;
