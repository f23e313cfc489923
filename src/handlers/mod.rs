pub mod auth;
pub mod charts;
pub mod csrf;
