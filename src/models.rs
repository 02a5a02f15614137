pub mod activity;
pub mod auth;
pub mod inventory;
pub mod report;
pub mod sales;
pub mod settings;
pub mod subsidiary;
