// src/scoring/mod.rs
pub mod baseline;
pub mod clustering;
pub mod efficiency;
pub mod financial;
pub mod pipeline;
pub mod repeat_visits;
pub mod risk;
pub mod similarity;

pub use pipeline::{score_batch, ScoredBatch};
