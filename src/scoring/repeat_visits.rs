// src/scoring/repeat_visits.rs
//! Repeat-visit (comeback) detection: a proxy for unresolved or misdiagnosed
//! issues. A visit is flagged when the same VIN was last seen within the
//! configured window.

use std::collections::HashMap;

use log::debug;

use crate::models::ServiceRecord;

/// Returns one 0/1 flag per record, in input order.
///
/// Dated records are flagged from the gap to the immediately preceding dated
/// visit for the same VIN; a vehicle's first visit is never flagged from its
/// own history. Records without a usable date are excluded from gap math and
/// fall back to the duplicate-VIN heuristic: flagged only when the VIN
/// appears more than once in the batch.
pub fn detect_repeat_visits(records: &[ServiceRecord], window_days: i64) -> Vec<i32> {
    let mut flags = vec![0i32; records.len()];
    if records.is_empty() {
        return flags;
    }

    let mut vin_counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *vin_counts.entry(record.vin.as_str()).or_insert(0) += 1;
    }

    // Index dated visits per VIN, sorted by date (stable on ties, so two
    // same-day visits count as a zero-day gap).
    let mut dated_visits: HashMap<&str, Vec<(usize, chrono::NaiveDate)>> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        if let Some(date) = record.service_date {
            dated_visits
                .entry(record.vin.as_str())
                .or_default()
                .push((idx, date));
        }
    }

    for visits in dated_visits.values_mut() {
        visits.sort_by_key(|&(_, date)| date);
        for pair in visits.windows(2) {
            let (_, previous_date) = pair[0];
            let (current_idx, current_date) = pair[1];
            let gap_days = (current_date - previous_date).num_days();
            if gap_days <= window_days {
                flags[current_idx] = 1;
            }
        }
    }

    // Fallback for undated records only.
    let mut undated_flagged = 0usize;
    for (idx, record) in records.iter().enumerate() {
        if record.service_date.is_none() && vin_counts[record.vin.as_str()] > 1 {
            flags[idx] = 1;
            undated_flagged += 1;
        }
    }
    if undated_flagged > 0 {
        debug!(
            "Flagged {} undated records via the duplicate-VIN heuristic",
            undated_flagged
        );
    }

    flags
}
