// src/scoring/financial.rs
//! Data-driven financial loss model.
//!
//! Every rate and ratio is derived from the current batch; there are no
//! external priors. Five loss components are computed per job and each is
//! scaled by a data-sufficiency confidence before summing, so estimates
//! backed by thin history contribute conservatively instead of being
//! discarded or fully trusted.

use std::collections::HashMap;

use log::warn;
use serde::Serialize;

use crate::models::ServiceRecord;
use crate::scoring::baseline::ComplaintBaselines;
use crate::scoring::efficiency::EfficiencyFeatures;
use crate::utils::config::ScoringConfig;
use crate::utils::constants::{
    COMPLAINT_FULL_CONFIDENCE_SAMPLES, INDUSTRY_CUSTOMER_LIFESPAN_YEARS,
    INDUSTRY_VISITS_PER_YEAR, MAX_PARTS_TO_LABOR_RATIO, PARTS_WASTE_FACTOR,
    RETENTION_RISK_FACTOR, REWORK_COST_RATIO, TECH_FULL_CONFIDENCE_JOBS,
};
use crate::utils::stats::{mean, median};

/// Batch-level financial facts derived once per run and exposed for
/// downstream reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ShopFinancials {
    pub revenue_per_hour: f64,
    pub profit_per_hour: f64,
    /// Median parts:labor cost ratio across jobs with nonzero labor cost.
    pub parts_to_labor_ratio: f64,
    pub overall_comeback_rate: f64,
    pub average_invoice: f64,
}

/// Confidence-scaled loss components for one job. Each component field is
/// already multiplied by `data_confidence`; `estimated_loss` is their sum.
#[derive(Debug, Clone, Serialize)]
pub struct FinancialLoss {
    /// This job's own invoice divided by its billed hours; 0 when no hours
    /// were billed. Unscaled, exposed as a derived reporting feature.
    pub revenue_per_hour: f64,
    pub labor_inefficiency_loss: f64,
    pub lost_profit_inefficiency: f64,
    pub parts_waste_loss: f64,
    pub rework_loss: f64,
    pub customer_retention_loss: f64,
    /// Product of complaint-sample and technician-sample adequacy, in [0,1].
    pub data_confidence: f64,
    pub estimated_loss: f64,
}

/// Computes per-job losses plus the shop-level facts they are based on.
/// `efficiency` and `repeat_flags` are parallel to `records`.
pub fn score_financials(
    records: &[ServiceRecord],
    efficiency: &[EfficiencyFeatures],
    repeat_flags: &[i32],
    baselines: &ComplaintBaselines,
    config: &ScoringConfig,
) -> (Vec<FinancialLoss>, ShopFinancials) {
    let rate = config.hourly_labor_rate;

    let labor_costs: Vec<f64> = records
        .iter()
        .map(|r| r.labor_hours_billed * rate)
        .collect();

    // Parts cost = invoice minus labor, clipped to [0, 5x labor] to
    // suppress outliers. Zero labor cost clips everything to 0.
    let parts_costs: Vec<f64> = records
        .iter()
        .zip(labor_costs.iter())
        .map(|(r, &labor_cost)| {
            (r.invoice_total - labor_cost).clamp(0.0, MAX_PARTS_TO_LABOR_RATIO * labor_cost)
        })
        .collect();

    let ratios: Vec<f64> = labor_costs
        .iter()
        .zip(parts_costs.iter())
        .filter(|(&labor, _)| labor > 0.0)
        .map(|(&labor, &parts)| (parts / labor).clamp(0.0, MAX_PARTS_TO_LABOR_RATIO))
        .collect();
    let parts_to_labor_ratio = median(&ratios);

    let total_hours: f64 = records.iter().map(|r| r.labor_hours_billed).sum();
    let total_invoice: f64 = records.iter().map(|r| r.invoice_total).sum();
    let revenue_per_hour = if total_hours > 0.0 {
        total_invoice / total_hours
    } else {
        if !records.is_empty() {
            warn!("Batch has zero total labor hours; revenue per hour defaults to 0");
        }
        0.0
    };
    let profit_per_hour = revenue_per_hour - rate;

    // Comeback rates per (complaint, technician), with the batch-wide rate
    // as the sparse/unseen fallback.
    let repeat_values: Vec<f64> = repeat_flags.iter().map(|&f| f as f64).collect();
    let overall_comeback_rate = mean(&repeat_values);
    let mut pair_totals: HashMap<(&str, &str), (f64, f64)> = HashMap::new();
    for (record, &flag) in records.iter().zip(repeat_flags.iter()) {
        let entry = pair_totals
            .entry((record.complaint.as_str(), record.technician.as_str()))
            .or_insert((0.0, 0.0));
        entry.0 += flag as f64;
        entry.1 += 1.0;
    }
    let comeback_rate = |record: &ServiceRecord| -> f64 {
        match pair_totals.get(&(record.complaint.as_str(), record.technician.as_str())) {
            Some(&(flagged, count)) if count > 0.0 => flagged / count,
            _ => overall_comeback_rate,
        }
    };

    let mut tech_job_counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *tech_job_counts.entry(record.technician.as_str()).or_insert(0) += 1;
    }

    let average_invoice = mean(&records.iter().map(|r| r.invoice_total).collect::<Vec<_>>());
    // Remaining lifetime value: industry-standard visit count minus the
    // current visit, valued at the batch-average invoice.
    let industry_total_visits = INDUSTRY_VISITS_PER_YEAR * INDUSTRY_CUSTOMER_LIFESPAN_YEARS;
    let remaining_customer_value = (industry_total_visits - 1.0) * average_invoice;

    let losses = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let significant = efficiency[i].significant_inefficiency;
            let is_repeat = repeat_flags[i] == 1;

            let record_revenue_per_hour = if record.labor_hours_billed > 0.0 {
                record.invoice_total / record.labor_hours_billed
            } else {
                0.0
            };

            let labor_inefficiency_loss = significant * rate;
            let lost_profit_inefficiency = significant * profit_per_hour;
            let parts_waste_loss = if is_repeat || significant > 0.0 {
                parts_costs[i] * PARTS_WASTE_FACTOR
            } else {
                0.0
            };
            let rework_loss = comeback_rate(record) * labor_costs[i] * REWORK_COST_RATIO;
            let customer_retention_loss = if is_repeat {
                RETENTION_RISK_FACTOR * remaining_customer_value
            } else {
                0.0
            };

            let complaint_confidence = (baselines.sample_count(&record.complaint) as f64
                / COMPLAINT_FULL_CONFIDENCE_SAMPLES)
                .min(1.0);
            let tech_confidence = (tech_job_counts[record.technician.as_str()] as f64
                / TECH_FULL_CONFIDENCE_JOBS)
                .min(1.0);
            let data_confidence = complaint_confidence * tech_confidence;

            let scaled = |component: f64| component * data_confidence;
            let labor_inefficiency_loss = scaled(labor_inefficiency_loss);
            let lost_profit_inefficiency = scaled(lost_profit_inefficiency);
            let parts_waste_loss = scaled(parts_waste_loss);
            let rework_loss = scaled(rework_loss);
            let customer_retention_loss = scaled(customer_retention_loss);

            FinancialLoss {
                revenue_per_hour: record_revenue_per_hour,
                labor_inefficiency_loss,
                lost_profit_inefficiency,
                parts_waste_loss,
                rework_loss,
                customer_retention_loss,
                data_confidence,
                estimated_loss: labor_inefficiency_loss
                    + lost_profit_inefficiency
                    + parts_waste_loss
                    + rework_loss
                    + customer_retention_loss,
            }
        })
        .collect();

    let shop = ShopFinancials {
        revenue_per_hour,
        profit_per_hour,
        parts_to_labor_ratio,
        overall_comeback_rate,
        average_invoice,
    };

    (losses, shop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::records::ServiceRecord;
    use crate::scoring::efficiency::score_efficiency;

    fn record(complaint: &str, technician: &str, hours: f64, invoice: f64) -> ServiceRecord {
        ServiceRecord {
            vin: "VIN1".to_string(),
            service_date: None,
            invoice_total: invoice,
            labor_hours_billed: hours,
            odometer_reading: 0.0,
            make: "Make".to_string(),
            model: "Model".to_string(),
            year: Some(2020),
            complaint: complaint.to_string(),
            customer_name: None,
            customer_contact: None,
            diagnosis: None,
            recommended: None,
            parts_used: None,
            technician: technician.to_string(),
            shop_id: "shop-1".to_string(),
        }
    }

    fn run(
        records: &[ServiceRecord],
        repeat_flags: &[i32],
    ) -> (Vec<FinancialLoss>, ShopFinancials) {
        let config = ScoringConfig::default();
        let baselines = ComplaintBaselines::compute(records);
        let efficiency = score_efficiency(records, &baselines, &config);
        score_financials(records, &efficiency, repeat_flags, &baselines, &config)
    }

    #[test]
    fn test_zero_parts_cost_when_invoice_is_pure_labor() {
        // invoice_total = hours x rate, so parts cost and parts waste are 0.
        let records = vec![
            record("noise", "T1", 2.0, 160.0),
            record("noise", "T1", 3.0, 240.0),
        ];
        let (losses, shop) = run(&records, &[1, 1]);
        assert_eq!(shop.parts_to_labor_ratio, 0.0);
        for loss in &losses {
            assert_eq!(loss.parts_waste_loss, 0.0);
        }
    }

    #[test]
    fn test_single_complaint_confidence_is_one_tenth() {
        let mut records: Vec<ServiceRecord> = (0..20)
            .map(|_| record("common complaint", "T1", 2.0, 200.0))
            .collect();
        records.push(record("rare complaint", "T1", 2.0, 200.0));
        let (losses, _) = run(&records, &vec![0; 21]);

        // 21 jobs for T1 caps the technician side at 1.0; the rare
        // complaint contributes 1/10 on the complaint side.
        assert!((losses[20].data_confidence - 0.1).abs() < 1e-12);
        // The common complaint has 20 samples, capped at 1.0 both sides.
        assert!((losses[0].data_confidence - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_scales_all_components() {
        let records = vec![
            record("a", "T1", 8.0, 900.0),
            record("a", "T1", 2.0, 200.0),
            record("b", "T2", 2.0, 200.0),
        ];
        let (losses, _) = run(&records, &[1, 0, 0]);
        let first = &losses[0];
        assert!(first.data_confidence < 1.0);
        assert!(
            (first.estimated_loss
                - (first.labor_inefficiency_loss
                    + first.lost_profit_inefficiency
                    + first.parts_waste_loss
                    + first.rework_loss
                    + first.customer_retention_loss))
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn test_retention_loss_only_on_repeat_jobs() {
        let records = vec![
            record("a", "T1", 2.0, 300.0),
            record("a", "T1", 2.0, 300.0),
        ];
        let (losses, _) = run(&records, &[0, 1]);
        assert_eq!(losses[0].customer_retention_loss, 0.0);
        assert!(losses[1].customer_retention_loss > 0.0);
    }

    #[test]
    fn test_comeback_rate_per_pair() {
        // T1's "a" jobs come back half the time; T2's never do. Rework loss
        // reflects the pair rate, not the batch rate.
        let records = vec![
            record("a", "T1", 2.0, 300.0),
            record("a", "T1", 2.0, 300.0),
            record("a", "T2", 2.0, 300.0),
            record("a", "T2", 2.0, 300.0),
        ];
        let (losses, shop) = run(&records, &[1, 0, 0, 0]);
        assert!((shop.overall_comeback_rate - 0.25).abs() < 1e-12);
        assert!(losses[0].rework_loss > losses[2].rework_loss);
    }

    #[test]
    fn test_zero_hours_batch_guards_division() {
        let records = vec![record("a", "T1", 0.0, 100.0)];
        let (losses, shop) = run(&records, &[0]);
        assert_eq!(shop.revenue_per_hour, 0.0);
        assert!(losses[0].estimated_loss.is_finite());
    }

    #[test]
    fn test_per_record_revenue_per_hour() {
        let records = vec![
            record("a", "T1", 2.0, 300.0),
            record("a", "T1", 0.0, 100.0),
        ];
        let (losses, _) = run(&records, &[0, 0]);
        assert!((losses[0].revenue_per_hour - 150.0).abs() < 1e-12);
        // Zero billed hours guards the division to 0.
        assert_eq!(losses[1].revenue_per_hour, 0.0);
    }

    #[test]
    fn test_empty_batch() {
        let (losses, shop) = run(&[], &[]);
        assert!(losses.is_empty());
        assert_eq!(shop.average_invoice, 0.0);
        assert_eq!(shop.overall_comeback_rate, 0.0);
    }
}
