// src/main.rs
use std::{collections::HashMap, time::Instant};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use uuid::Uuid;

use scoring_lib::db::connect::connect;
use scoring_lib::db::service_data::{fetch_service_records, replace_transformed_records};
use scoring_lib::scoring::score_batch;
use scoring_lib::utils::config::ScoringConfig;
use scoring_lib::utils::env::load_env;
use scoring_lib::utils::get_memory_usage;

/// Batch scoring pipeline: reads raw service records, derives loss and
/// misdiagnosis-risk signals, and replaces the transformed set.
#[derive(Parser, Debug)]
#[command(name = "score_pipeline")]
struct Cli {
    /// Score only this shop; defaults to the SHOP_ID environment variable,
    /// or the whole dataset when neither is set.
    #[arg(long)]
    shop_id: Option<String>,

    /// Override the hourly labor rate for this run.
    #[arg(long)]
    labor_rate: Option<f64>,

    /// Compute and log everything but skip the write-back.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    info!("Starting service-record scoring pipeline");
    load_env();

    let cli = Cli::parse();
    let mut config = ScoringConfig::from_env();
    if let Some(rate) = cli.labor_rate {
        config.hourly_labor_rate = rate;
    }
    config.log_config();

    let shop_id = cli.shop_id.or_else(|| std::env::var("SHOP_ID").ok());
    match &shop_id {
        Some(shop) => info!("Scoring records for shop {}", shop),
        None => info!("No shop filter configured; scoring the full dataset"),
    }

    let run_id = Uuid::new_v4().to_string();
    info!("Pipeline run ID: {}", run_id);
    let run_start = Instant::now();
    let mut phase_times: HashMap<&'static str, f64> = HashMap::new();

    let pb = ProgressBar::new(4);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("█▉▊▋▌▍▎▏  "),
    );

    // Phase 1: connect and fetch.
    pb.set_message("Fetching service records...");
    let phase_start = Instant::now();
    let pool = connect().await.context("Failed to connect to database")?;
    let records = fetch_service_records(&pool, shop_id.as_deref())
        .await
        .context("Failed to fetch service records")?;
    phase_times.insert("fetch", phase_start.elapsed().as_secs_f64());
    pb.inc(1);

    if records.is_empty() {
        // Explicit terminal condition: nothing to score, nothing written.
        pb.finish_with_message("No data");
        warn!("No service records found; skipping scoring and write-back");
        return Ok(());
    }

    // Phase 2: score. The scoring core is a pure synchronous transform.
    pb.set_message(format!("Scoring {} records...", records.len()));
    let phase_start = Instant::now();
    let batch = score_batch(records, &config);
    phase_times.insert("score", phase_start.elapsed().as_secs_f64());
    pb.inc(1);

    info!(
        "Shop financials: revenue/hour ${:.2}, profit/hour ${:.2}, parts:labor {:.2}, comeback rate {:.1}%",
        batch.shop.revenue_per_hour,
        batch.shop.profit_per_hour,
        batch.shop.parts_to_labor_ratio,
        batch.shop.overall_comeback_rate * 100.0
    );

    // Phase 3: replace-write.
    let phase_start = Instant::now();
    if cli.dry_run {
        pb.set_message("Dry run; skipping write-back");
        info!("Dry run: {} scored records not written", batch.records.len());
        debug!(
            "Dry-run summary: {}",
            serde_json::to_string_pretty(&batch.summary).unwrap_or_default()
        );
    } else {
        pb.set_message("Saving transformed records...");
        let inserted = replace_transformed_records(&pool, &batch.records)
            .await
            .context("Failed to save transformed records")?;
        info!("Saved {} transformed records", inserted);
    }
    phase_times.insert("save", phase_start.elapsed().as_secs_f64());
    pb.inc(1);

    // Phase 4: report.
    pb.set_message("Summarizing...");
    let phase_start = Instant::now();
    batch.summary.log_summary();
    batch.savings.log_summary();
    phase_times.insert("report", phase_start.elapsed().as_secs_f64());
    pb.inc(1);
    pb.finish_with_message("Pipeline complete");

    let memory_mb = get_memory_usage().await;
    info!(
        "Run {} finished in {:.2}s (fetch {:.2}s, score {:.2}s, save {:.2}s, report {:.2}s), memory {} MB",
        run_id,
        run_start.elapsed().as_secs_f64(),
        phase_times.get("fetch").copied().unwrap_or_default(),
        phase_times.get("score").copied().unwrap_or_default(),
        phase_times.get("save").copied().unwrap_or_default(),
        phase_times.get("report").copied().unwrap_or_default(),
        memory_mb
    );

    Ok(())
}
