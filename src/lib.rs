// src/lib.rs
pub mod db;
pub mod models;
pub mod scoring;
pub mod utils;
