// src/utils/config.rs
//! Explicit scoring configuration threaded through every component call.
//! Nothing in the scoring core reads ambient/global state.

use log::{info, warn};
use std::env;

#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Hourly labor rate in dollars used for all cost derivations.
    pub hourly_labor_rate: f64,
    /// Maximum day gap between visits for the same VIN to count as a repeat.
    pub repeat_window_days: i64,
    /// Quantile of the deviation distribution above which inefficiency is
    /// charged in the financial model.
    pub inefficiency_quantile: f64,
    /// Fixed probability cutoff for the suspected-misdiagnosis flag.
    pub misdiagnosis_cutoff: f64,
    /// Number of k-means clusters.
    pub cluster_count: usize,
    /// Seed for cluster initialization; fixed for reproducible assignments.
    pub random_seed: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            hourly_labor_rate: 80.0,
            repeat_window_days: 45,
            inefficiency_quantile: 0.60,
            misdiagnosis_cutoff: 0.3,
            cluster_count: 3,
            random_seed: 42,
        }
    }
}

impl ScoringConfig {
    /// Create configuration from environment variables, falling back to the
    /// documented defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let hourly_labor_rate = parse_var("HOURLY_LABOR_RATE", defaults.hourly_labor_rate);
        let repeat_window_days = parse_var("REPEAT_WINDOW_DAYS", defaults.repeat_window_days);
        let mut inefficiency_quantile =
            parse_var("INEFFICIENCY_QUANTILE", defaults.inefficiency_quantile);
        let misdiagnosis_cutoff = parse_var("MISDIAGNOSIS_CUTOFF", defaults.misdiagnosis_cutoff);
        let cluster_count = parse_var("CLUSTER_COUNT", defaults.cluster_count);
        let random_seed = parse_var("RANDOM_SEED", defaults.random_seed);

        if !(0.0..=1.0).contains(&inefficiency_quantile) {
            warn!(
                "INEFFICIENCY_QUANTILE {} outside [0,1], using default {}",
                inefficiency_quantile, defaults.inefficiency_quantile
            );
            inefficiency_quantile = defaults.inefficiency_quantile;
        }

        Self {
            hourly_labor_rate,
            repeat_window_days,
            inefficiency_quantile,
            misdiagnosis_cutoff,
            cluster_count,
            random_seed,
        }
    }

    pub fn log_config(&self) {
        info!("⚙️ Scoring configuration:");
        info!("   Hourly labor rate: ${:.2}", self.hourly_labor_rate);
        info!("   Repeat-visit window: {} days", self.repeat_window_days);
        info!(
            "   Inefficiency quantile threshold: {:.2}",
            self.inefficiency_quantile
        );
        info!("   Misdiagnosis cutoff: {:.2}", self.misdiagnosis_cutoff);
        info!(
            "   Clusters: {} (seed {})",
            self.cluster_count, self.random_seed
        );
    }
}

fn parse_var<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!("Could not parse {}='{}', using default", name, raw);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScoringConfig::default();
        assert_eq!(config.hourly_labor_rate, 80.0);
        assert_eq!(config.repeat_window_days, 45);
        assert_eq!(config.inefficiency_quantile, 0.60);
        assert_eq!(config.misdiagnosis_cutoff, 0.3);
        assert_eq!(config.cluster_count, 3);
        assert_eq!(config.random_seed, 42);
    }

    #[test]
    fn test_from_env_overrides() {
        env::set_var("HOURLY_LABOR_RATE", "95.5");
        env::set_var("REPEAT_WINDOW_DAYS", "30");

        let config = ScoringConfig::from_env();
        assert_eq!(config.hourly_labor_rate, 95.5);
        assert_eq!(config.repeat_window_days, 30);

        // Cleanup
        env::remove_var("HOURLY_LABOR_RATE");
        env::remove_var("REPEAT_WINDOW_DAYS");
    }

    #[test]
    fn test_from_env_rejects_bad_quantile() {
        env::set_var("INEFFICIENCY_QUANTILE", "1.7");
        let config = ScoringConfig::from_env();
        assert_eq!(config.inefficiency_quantile, 0.60);
        env::remove_var("INEFFICIENCY_QUANTILE");
    }
}
