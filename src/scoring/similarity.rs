// src/scoring/similarity.rs
//! TF-IDF vectorization of complaint text and mean pairwise cosine
//! similarity. High similarity across a batch points at recurring,
//! possibly systemic, complaint patterns.

use std::collections::{HashMap, HashSet};

use log::debug;
use ndarray::Array2;
use once_cell::sync::Lazy;

use crate::models::ServiceRecord;
use crate::utils::constants::{MIN_TOKEN_LENGTH, STOPWORDS};

static STOPWORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| STOPWORDS.iter().copied().collect());

/// Lowercased alphanumeric tokens with stopwords and short tokens removed.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= MIN_TOKEN_LENGTH && !STOPWORD_SET.contains(t))
        .map(|t| t.to_string())
        .collect()
}

/// Per-record mean pairwise cosine similarity over TF-IDF complaint vectors.
///
/// The mean is taken over the record's full similarity-matrix row, including
/// its self-similarity of 1.0 (standard mean-of-row semantics; this matches
/// the upstream dashboard's historical numbers). Records with empty or
/// stopword-only complaints vectorize to zero and score 0.0. A batch with no
/// usable complaint text yields all zeros.
pub fn complaint_similarity(records: &[ServiceRecord]) -> Vec<f64> {
    let n = records.len();
    if n == 0 {
        return Vec::new();
    }

    let documents: Vec<Vec<String>> = records.iter().map(|r| tokenize(&r.complaint)).collect();

    // Vocabulary and document frequencies.
    let mut vocabulary: HashMap<&str, usize> = HashMap::new();
    let mut document_frequency: HashMap<usize, usize> = HashMap::new();
    for tokens in &documents {
        let mut seen: HashSet<&str> = HashSet::new();
        for token in tokens {
            let next_id = vocabulary.len();
            let term_id = *vocabulary.entry(token.as_str()).or_insert(next_id);
            if seen.insert(token.as_str()) {
                *document_frequency.entry(term_id).or_insert(0) += 1;
            }
        }
    }

    if vocabulary.is_empty() {
        debug!("No usable complaint text in batch; similarity defaults to 0.0");
        return vec![0.0; n];
    }

    // Smoothed IDF with L2-normalized rows.
    let vocab_size = vocabulary.len();
    let mut tfidf = Array2::<f64>::zeros((n, vocab_size));
    for (row, tokens) in documents.iter().enumerate() {
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for token in tokens {
            if let Some(&term_id) = vocabulary.get(token.as_str()) {
                *counts.entry(term_id).or_insert(0) += 1;
            }
        }
        for (term_id, count) in counts {
            let df = document_frequency[&term_id] as f64;
            let idf = ((1.0 + n as f64) / (1.0 + df)).ln() + 1.0;
            tfidf[[row, term_id]] = count as f64 * idf;
        }
        let norm = tfidf.row(row).mapv(|v| v * v).sum().sqrt();
        if norm > 0.0 {
            let mut r = tfidf.row_mut(row);
            r.mapv_inplace(|v| v / norm);
        }
    }

    // Rows are unit-length (or zero), so the Gram matrix is the cosine
    // similarity matrix.
    let similarity_matrix = tfidf.dot(&tfidf.t());
    similarity_matrix
        .rows()
        .into_iter()
        .map(|row| row.sum() / n as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::records::ServiceRecord;

    fn record(complaint: &str) -> ServiceRecord {
        ServiceRecord {
            vin: "VIN1".to_string(),
            service_date: None,
            invoice_total: 0.0,
            labor_hours_billed: 1.0,
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
            technician: "T1".to_string(),
            shop_id: "shop-1".to_string(),
        }
    }

    #[test]
    fn test_tokenize_strips_stopwords_and_short_tokens() {
        let tokens = tokenize("The brake is making a loud noise");
        assert_eq!(tokens, vec!["brake", "making", "loud", "noise"]);
    }

    #[test]
    fn test_identical_complaints_score_one() {
        let records = vec![record("brake noise"), record("brake noise")];
        let scores = complaint_similarity(&records);
        assert!((scores[0] - 1.0).abs() < 1e-9);
        assert!((scores[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_complaints_include_self_similarity() {
        let records = vec![record("brake noise"), record("oil leak")];
        let scores = complaint_similarity(&records);
        // Row mean includes self-similarity of 1.0: (1 + 0) / 2.
        assert!((scores[0] - 0.5).abs() < 1e-9);
        assert!((scores[1] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_complaint_scores_zero() {
        let records = vec![record(""), record("brake noise"), record("brake noise")];
        let scores = complaint_similarity(&records);
        assert_eq!(scores[0], 0.0);
        assert!(scores[1] > 0.0);
    }

    #[test]
    fn test_all_empty_batch_scores_zero() {
        let records = vec![record(""), record("")];
        assert_eq!(complaint_similarity(&records), vec![0.0, 0.0]);
    }

    #[test]
    fn test_overlapping_complaints_score_between() {
        let records = vec![
            record("engine overheating badly"),
            record("engine stalling"),
            record("windshield wiper broken"),
        ];
        let scores = complaint_similarity(&records);
        // The two engine complaints share a term, so they sit above the
        // unrelated complaint.
        assert!(scores[0] > scores[2]);
        assert!(scores[1] > scores[2]);
    }

    #[test]
    fn test_empty_batch_returns_empty() {
        assert!(complaint_similarity(&[]).is_empty());
    }
}
