// src/db/service_data.rs
//! Storage collaborator for the scoring core: fetch-all from
//! `public.service_data` and replace-write into
//! `public.transformed_service_data` keyed by shop_id.
//!
//! Raw numeric columns may be NULL and are coerced to 0; `service_date` is
//! stored as ISO text upstream and parsed here, with unparseable values
//! carried as `None` rather than dropped.

use anyhow::{Context, Result};
use log::{info, warn};
use std::collections::BTreeMap;
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;

use crate::db::connect::PgPool;
use crate::models::{ScoredServiceRecord, ServiceRecord};
use crate::utils::constants::DB_INSERT_BATCH_SIZE;

const FETCH_SQL: &str = "
    SELECT vin, service_date, invoice_total, labor_hours_billed, odometer_reading,
           make, model, year, complaint, customer_name, customer_contact,
           diagnosis, recommended, parts_used, technician, shop_id
    FROM public.service_data";

const INSERT_COLUMNS: [&str; 26] = [
    "vin",
    "service_date",
    "invoice_total",
    "labor_hours_billed",
    "odometer_reading",
    "make",
    "model",
    "year",
    "complaint",
    "customer_name",
    "customer_contact",
    "diagnosis",
    "recommended",
    "parts_used",
    "technician",
    "efficiency_deviation",
    "efficiency_loss",
    "estimated_loss",
    "repeat_45d",
    "complaint_similarity",
    "cluster_id",
    "suspected_misdiagnosis",
    "misdiagnosis_probability",
    "confidence_level",
    "data_confidence",
    "shop_id",
];

/// Fetches the full current dataset, optionally filtered to one shop,
/// ordered by service date.
pub async fn fetch_service_records(
    pool: &PgPool,
    shop_id: Option<&str>,
) -> Result<Vec<ServiceRecord>> {
    let conn = pool
        .get()
        .await
        .context("Failed to get DB connection for fetching service data")?;

    let rows = match shop_id {
        Some(shop) => {
            let sql = format!("{} WHERE shop_id = $1 ORDER BY service_date, vin", FETCH_SQL);
            conn.query(&sql, &[&shop])
                .await
                .context("Failed to query service_data for shop")?
        }
        None => {
            let sql = format!("{} ORDER BY service_date, vin", FETCH_SQL);
            conn.query(&sql, &[])
                .await
                .context("Failed to query service_data")?
        }
    };

    let mut records = Vec::with_capacity(rows.len());
    let mut unparseable_dates = 0usize;
    for row in &rows {
        let record = parse_row(row)?;
        if record.service_date.is_none() {
            unparseable_dates += 1;
        }
        records.push(record);
    }
    if unparseable_dates > 0 {
        warn!(
            "{} of {} records have missing or unparseable service dates",
            unparseable_dates,
            records.len()
        );
    }
    info!("Fetched {} service records", records.len());
    Ok(records)
}

fn parse_row(row: &Row) -> Result<ServiceRecord> {
    let raw_date: Option<String> = row.try_get("service_date")?;
    Ok(ServiceRecord {
        vin: text_or_empty(row, "vin")?,
        service_date: ServiceRecord::parse_service_date(raw_date.as_deref()),
        invoice_total: number_or_zero(row, "invoice_total")?,
        labor_hours_billed: number_or_zero(row, "labor_hours_billed")?,
        odometer_reading: number_or_zero(row, "odometer_reading")?,
        make: text_or_empty(row, "make")?,
        model: text_or_empty(row, "model")?,
        year: row.try_get("year")?,
        complaint: text_or_empty(row, "complaint")?,
        customer_name: row.try_get("customer_name")?,
        customer_contact: row.try_get("customer_contact")?,
        diagnosis: row.try_get("diagnosis")?,
        recommended: row.try_get("recommended")?,
        parts_used: row.try_get("parts_used")?,
        technician: text_or_empty(row, "technician")?,
        shop_id: text_or_empty(row, "shop_id")?,
    })
}

fn text_or_empty(row: &Row, column: &str) -> Result<String> {
    let value: Option<String> = row
        .try_get(column)
        .with_context(|| format!("Failed to read column '{}'", column))?;
    Ok(value.unwrap_or_default())
}

fn number_or_zero(row: &Row, column: &str) -> Result<f64> {
    let value: Option<f64> = row
        .try_get(column)
        .with_context(|| format!("Failed to read column '{}'", column))?;
    Ok(value.unwrap_or(0.0))
}

/// Replaces the transformed set for every shop present in the batch:
/// within a transaction per shop, delete the shop's rows and insert the
/// fresh ones in batches.
pub async fn replace_transformed_records(
    pool: &PgPool,
    records: &[ScoredServiceRecord],
) -> Result<usize> {
    let mut by_shop: BTreeMap<&str, Vec<&ScoredServiceRecord>> = BTreeMap::new();
    for scored in records {
        by_shop
            .entry(scored.record.shop_id.as_str())
            .or_default()
            .push(scored);
    }

    let mut total_inserted = 0usize;
    for (shop_id, shop_records) in by_shop {
        let mut conn = pool
            .get()
            .await
            .context("Failed to get DB connection for replace-write")?;
        let tx = conn
            .transaction()
            .await
            .context("Failed to open replace-write transaction")?;

        let deleted = tx
            .execute(
                "DELETE FROM public.transformed_service_data WHERE shop_id = $1",
                &[&shop_id],
            )
            .await
            .context("Failed to clear existing transformed data")?;
        info!(
            "Cleared {} existing transformed rows for shop {}",
            deleted, shop_id
        );

        for chunk in shop_records.chunks(DB_INSERT_BATCH_SIZE) {
            total_inserted += insert_chunk(&tx, chunk).await?;
        }

        tx.commit()
            .await
            .with_context(|| format!("Failed to commit transformed data for shop {}", shop_id))?;
        info!(
            "Saved {} transformed rows for shop {}",
            shop_records.len(),
            shop_id
        );
    }

    Ok(total_inserted)
}

async fn insert_chunk(
    tx: &tokio_postgres::Transaction<'_>,
    chunk: &[&ScoredServiceRecord],
) -> Result<usize> {
    // Owned values that only exist in the output representation.
    let dates: Vec<Option<String>> = chunk
        .iter()
        .map(|s| s.record.service_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .collect();
    let confidence_levels: Vec<&str> = chunk
        .iter()
        .map(|s| s.risk.confidence_level.as_str())
        .collect();

    let mut placeholders = Vec::with_capacity(chunk.len());
    let mut params: Vec<&(dyn ToSql + Sync)> =
        Vec::with_capacity(chunk.len() * INSERT_COLUMNS.len());
    for (i, scored) in chunk.iter().enumerate() {
        let base = i * INSERT_COLUMNS.len();
        let row_placeholders: Vec<String> = (1..=INSERT_COLUMNS.len())
            .map(|c| format!("${}", base + c))
            .collect();
        placeholders.push(format!("({})", row_placeholders.join(", ")));

        params.push(&scored.record.vin);
        params.push(&dates[i]);
        params.push(&scored.record.invoice_total);
        params.push(&scored.record.labor_hours_billed);
        params.push(&scored.record.odometer_reading);
        params.push(&scored.record.make);
        params.push(&scored.record.model);
        params.push(&scored.record.year);
        params.push(&scored.record.complaint);
        params.push(&scored.record.customer_name);
        params.push(&scored.record.customer_contact);
        params.push(&scored.record.diagnosis);
        params.push(&scored.record.recommended);
        params.push(&scored.record.parts_used);
        params.push(&scored.record.technician);
        params.push(&scored.efficiency.efficiency_deviation);
        params.push(&scored.efficiency.efficiency_loss);
        params.push(&scored.financial.estimated_loss);
        params.push(&scored.repeat_45d);
        params.push(&scored.complaint_similarity);
        params.push(&scored.cluster_id);
        params.push(&scored.risk.suspected_misdiagnosis);
        params.push(&scored.risk.misdiagnosis_probability);
        params.push(&confidence_levels[i]);
        params.push(&scored.financial.data_confidence);
        params.push(&scored.record.shop_id);
    }

    let sql = format!(
        "INSERT INTO public.transformed_service_data ({}) VALUES {}",
        INSERT_COLUMNS.join(", "),
        placeholders.join(", ")
    );
    let inserted = tx
        .execute(&sql, &params)
        .await
        .context("Failed to insert transformed data batch")?;
    Ok(inserted as usize)
}
