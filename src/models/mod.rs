// src/models/mod.rs
pub mod records;
pub mod stats;

pub use records::{ConfidenceLevel, ScoredServiceRecord, ServiceRecord};
pub use stats::{BatchSummary, SavingsAnalysis};
