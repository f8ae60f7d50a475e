// src/scoring/pipeline.rs
//! The scoring pipeline: a pure synchronous transform from an input batch
//! to a fully annotated output batch.
//!
//! Stage order follows the data dependencies: baselines, repeat detection
//! and similarity are independent; efficiency consumes baselines; risk
//! consumes efficiency + repeat + similarity; the financial model consumes
//! everything. No stage mutates the source records and no stage failure
//! aborts the run — optional stages degrade to documented defaults.

use log::info;

use crate::models::{BatchSummary, SavingsAnalysis, ScoredServiceRecord, ServiceRecord};
use crate::scoring::baseline::ComplaintBaselines;
use crate::scoring::clustering::cluster_records;
use crate::scoring::efficiency::score_efficiency;
use crate::scoring::financial::{score_financials, ShopFinancials};
use crate::scoring::repeat_visits::detect_repeat_visits;
use crate::scoring::risk::score_risk;
use crate::scoring::similarity::complaint_similarity;
use crate::utils::config::ScoringConfig;

/// Everything one pipeline run produces: the annotated records plus the
/// batch-level derived facts.
#[derive(Debug, Clone)]
pub struct ScoredBatch {
    pub records: Vec<ScoredServiceRecord>,
    pub shop: ShopFinancials,
    pub summary: BatchSummary,
    pub savings: SavingsAnalysis,
}

impl ScoredBatch {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Scores a full batch. Deterministic for a fixed config (including the
/// random seed); running twice on the same input produces identical output.
pub fn score_batch(records: Vec<ServiceRecord>, config: &ScoringConfig) -> ScoredBatch {
    info!("Scoring batch of {} service records", records.len());

    let baselines = ComplaintBaselines::compute(&records);
    info!(
        "Computed baselines for {} distinct complaint types (batch mean {:.2}h)",
        baselines.distinct_complaints(),
        baselines.batch_mean()
    );

    let repeat_flags = detect_repeat_visits(&records, config.repeat_window_days);
    let similarity = complaint_similarity(&records);
    let efficiency = score_efficiency(&records, &baselines, config);

    let efficiency_losses: Vec<f64> = efficiency.iter().map(|e| e.efficiency_loss).collect();
    let cluster_ids = cluster_records(&efficiency_losses, &similarity, config);

    let risk = score_risk(&records, &efficiency, &repeat_flags, &similarity, config);
    let (financial, shop) =
        score_financials(&records, &efficiency, &repeat_flags, &baselines, config);

    let mut efficiency = efficiency.into_iter();
    let mut risk = risk.into_iter();
    let mut financial = financial.into_iter();
    let scored: Vec<ScoredServiceRecord> = records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| {
            Some(ScoredServiceRecord {
                record,
                efficiency: efficiency.next()?,
                repeat_45d: repeat_flags[i],
                complaint_similarity: similarity[i],
                cluster_id: cluster_ids[i],
                risk: risk.next()?,
                financial: financial.next()?,
            })
        })
        .collect();

    let summary = BatchSummary::from_scored(&scored);
    let savings = SavingsAnalysis::from_scored(&scored, &shop);

    ScoredBatch {
        records: scored,
        shop,
        summary,
        savings,
    }
}
