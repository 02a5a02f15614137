// src/handlers.rs

pub mod activity;
pub mod auth;
pub mod health;
pub mod inventory;
pub mod reports;
pub mod sales;
pub mod settings;
pub mod subsidiaries;
pub mod users;
