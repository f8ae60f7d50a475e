// src/models/stats.rs
//! Run-level aggregates logged at the end of a pipeline invocation and
//! exposed to callers for reporting.

use log::info;
use serde::Serialize;

use crate::models::records::ScoredServiceRecord;
use crate::scoring::financial::ShopFinancials;
use crate::utils::constants::{
    INDUSTRY_BENCHMARK_COMEBACK_RATE, SAVINGS_CONFIDENCE_FLOOR, SAVINGS_IMPROVEMENT_RATE,
};

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub total_records: usize,
    pub repeat_count: usize,
    pub suspected_misdiagnosis_count: usize,
    pub total_efficiency_loss_hours: f64,
    pub total_estimated_loss: f64,
    pub labor_inefficiency_total: f64,
    pub lost_profit_total: f64,
    pub parts_waste_total: f64,
    pub rework_total: f64,
    pub customer_retention_total: f64,
    /// Job counts by data-confidence bucket: (>0.8, 0.5..=0.8, <=0.5).
    pub high_confidence_jobs: usize,
    pub medium_confidence_jobs: usize,
    pub low_confidence_jobs: usize,
}

impl BatchSummary {
    pub fn from_scored(records: &[ScoredServiceRecord]) -> Self {
        let mut summary = Self {
            total_records: records.len(),
            ..Default::default()
        };
        for scored in records {
            summary.repeat_count += scored.repeat_45d as usize;
            summary.suspected_misdiagnosis_count += scored.risk.suspected_misdiagnosis as usize;
            summary.total_efficiency_loss_hours += scored.efficiency.efficiency_loss;
            summary.total_estimated_loss += scored.financial.estimated_loss;
            summary.labor_inefficiency_total += scored.financial.labor_inefficiency_loss;
            summary.lost_profit_total += scored.financial.lost_profit_inefficiency;
            summary.parts_waste_total += scored.financial.parts_waste_loss;
            summary.rework_total += scored.financial.rework_loss;
            summary.customer_retention_total += scored.financial.customer_retention_loss;

            let confidence = scored.financial.data_confidence;
            if confidence > 0.8 {
                summary.high_confidence_jobs += 1;
            } else if confidence > 0.5 {
                summary.medium_confidence_jobs += 1;
            } else {
                summary.low_confidence_jobs += 1;
            }
        }
        summary
    }

    pub fn log_summary(&self) {
        info!("📊 Batch summary:");
        info!("   Records scored: {}", self.total_records);
        info!("   Repeat visits: {}", self.repeat_count);
        info!(
            "   Suspected misdiagnoses: {}",
            self.suspected_misdiagnosis_count
        );
        info!(
            "   Total efficiency-loss hours: {:.2}",
            self.total_efficiency_loss_hours
        );
        info!("   Total estimated loss: ${:.2}", self.total_estimated_loss);
        info!(
            "   Loss components: labor ${:.0}, profit ${:.0}, parts ${:.0}, rework ${:.0}, retention ${:.0}",
            self.labor_inefficiency_total,
            self.lost_profit_total,
            self.parts_waste_total,
            self.rework_total,
            self.customer_retention_total
        );
        info!(
            "   Confidence distribution: {} high / {} medium / {} low",
            self.high_confidence_jobs, self.medium_confidence_jobs, self.low_confidence_jobs
        );
    }
}

/// Process-improvement potential derived from the scored batch. Purely
/// informational; logged after scoring.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SavingsAnalysis {
    /// Recoverable loss over high-confidence jobs at the assumed
    /// improvement rate.
    pub conservative_savings: f64,
    /// How far the batch comeback rate sits above the industry benchmark.
    pub comeback_improvement_potential: f64,
    /// Complaint types ranked by total estimated loss, highest first.
    pub top_loss_complaints: Vec<(String, f64)>,
}

impl SavingsAnalysis {
    pub fn from_scored(records: &[ScoredServiceRecord], shop: &ShopFinancials) -> Self {
        let conservative_savings = records
            .iter()
            .filter(|r| r.financial.data_confidence > SAVINGS_CONFIDENCE_FLOOR)
            .map(|r| r.financial.estimated_loss)
            .sum::<f64>()
            * SAVINGS_IMPROVEMENT_RATE;

        let comeback_improvement_potential =
            (shop.overall_comeback_rate - INDUSTRY_BENCHMARK_COMEBACK_RATE).max(0.0);

        let mut by_complaint: std::collections::HashMap<&str, f64> =
            std::collections::HashMap::new();
        for scored in records.iter().filter(|r| r.record.has_complaint()) {
            *by_complaint.entry(scored.record.complaint.as_str()).or_insert(0.0) +=
                scored.financial.estimated_loss;
        }
        let mut top_loss_complaints: Vec<(String, f64)> = by_complaint
            .into_iter()
            .map(|(complaint, loss)| (complaint.to_string(), loss))
            .collect();
        top_loss_complaints
            .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        top_loss_complaints.truncate(3);

        Self {
            conservative_savings,
            comeback_improvement_potential,
            top_loss_complaints,
        }
    }

    pub fn log_summary(&self) {
        info!("💡 Savings analysis:");
        info!(
            "   Conservative savings potential: ${:.0}",
            self.conservative_savings
        );
        info!(
            "   Comeback improvement potential: {:.1}%",
            self.comeback_improvement_potential * 100.0
        );
        for (complaint, loss) in &self.top_loss_complaints {
            info!("   Top loss complaint '{}': ${:.0}", complaint, loss);
        }
    }
}
