// src/db/mod.rs
pub mod connect;
pub mod service_data;
