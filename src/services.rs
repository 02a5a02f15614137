pub mod activity_service;
pub mod auth;
pub mod inventory_service;
pub mod password;
pub mod report_service;
pub mod sales_service;
pub mod subsidiary_service;
pub mod user_service;
