//! Analysis thresholds and limits.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default minimum distinct-value threshold.
pub const MIN_DISTINCT: u64 = 10;

/// Default number of rows read per sampled column.
pub const ROW_LIMIT: u64 = 1000;

/// How many inferred relationships to report per column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceMode {
    /// Stop at the first matching table
    #[default]
    FirstMatch,
    /// Report every matching table in snapshot order
    AllMatches,
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("min_distinct must be at least 1")]
    ZeroMinDistinct,

    #[error("row_limit ({row_limit}) must be at least min_distinct ({min_distinct})")]
    RowLimitBelowMinDistinct { row_limit: u64, min_distinct: u64 },

    #[error("max_concurrency must be at least 1")]
    ZeroConcurrency,
}

impl From<ConfigValidationError> for crate::error::DbAnnotateError {
    fn from(error: ConfigValidationError) -> Self {
        Self::configuration(error.to_string())
    }
}

/// Settings for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Row threshold for sampling and distinct-value threshold for low cardinality
    pub min_distinct: u64,
    /// Rows read per sampled column
    pub row_limit: u64,
    /// Concurrent provider queries, further capped by the provider
    pub max_concurrency: usize,
    pub inference_mode: InferenceMode,
    /// Run the column statistics pass at all
    pub sample_values: bool,
    /// Delay before each sampling query
    pub throttle_ms: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_distinct: MIN_DISTINCT,
            row_limit: ROW_LIMIT,
            max_concurrency: 4,
            inference_mode: InferenceMode::FirstMatch,
            sample_values: true,
            throttle_ms: None,
        }
    }
}

impl AnalysisConfig {
    /// Creates a configuration with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates thresholds.
    ///
    /// # Errors
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.min_distinct == 0 {
            return Err(ConfigValidationError::ZeroMinDistinct);
        }
        if self.row_limit < self.min_distinct {
            return Err(ConfigValidationError::RowLimitBelowMinDistinct {
                row_limit: self.row_limit,
                min_distinct: self.min_distinct,
            });
        }
        if self.max_concurrency == 0 {
            return Err(ConfigValidationError::ZeroConcurrency);
        }
        Ok(())
    }

    /// Groups fetched per column: one more than needed to tell "fewer than
    /// `min_distinct`" apart from "at least".
    pub fn distinct_cap(&self) -> u64 {
        self.min_distinct.saturating_add(1)
    }

    /// Row count from which the low-cardinality rule applies.
    pub fn low_cardinality_rows(&self) -> u64 {
        self.min_distinct.saturating_mul(2)
    }

    /// Effective fan-out for a provider with `max_connections` slots.
    pub fn concurrency_for(&self, max_connections: u32) -> usize {
        let provider = usize::try_from(max_connections).unwrap_or(usize::MAX).max(1);
        self.max_concurrency.clamp(1, provider)
    }

    /// Sets the distinct-value threshold.
    pub fn with_min_distinct(mut self, min_distinct: u64) -> Self {
        self.min_distinct = min_distinct;
        self
    }

    /// Sets how many rows each sample reads.
    pub fn with_row_limit(mut self, row_limit: u64) -> Self {
        self.row_limit = row_limit;
        self
    }

    /// Caps the number of samples in flight.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Chooses first-match or all-matches constraint inference.
    pub fn with_inference_mode(mut self, inference_mode: InferenceMode) -> Self {
        self.inference_mode = inference_mode;
        self
    }

    /// Turns value sampling on or off.
    pub fn with_sampling(mut self, sample_values: bool) -> Self {
        self.sample_values = sample_values;
        self
    }

    /// Delay in milliseconds before each sample query.
    pub fn with_throttle_ms(mut self, throttle_ms: u64) -> Self {
        self.throttle_ms = Some(throttle_ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.min_distinct, 10);
        assert_eq!(config.row_limit, 1000);
        assert_eq!(config.distinct_cap(), 11);
        assert_eq!(config.low_cardinality_rows(), 20);
        assert_eq!(config.inference_mode, InferenceMode::FirstMatch);
        assert!(config.sample_values);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(
            AnalysisConfig::new().with_min_distinct(0).validate(),
            Err(ConfigValidationError::ZeroMinDistinct)
        );
        assert_eq!(
            AnalysisConfig::new().with_row_limit(5).validate(),
            Err(ConfigValidationError::RowLimitBelowMinDistinct {
                row_limit: 5,
                min_distinct: 10
            })
        );
        assert_eq!(
            AnalysisConfig::new().with_max_concurrency(0).validate(),
            Err(ConfigValidationError::ZeroConcurrency)
        );
    }

    #[test]
    fn test_concurrency_clamped_to_provider() {
        let config = AnalysisConfig::new().with_max_concurrency(8);
        assert_eq!(config.concurrency_for(1), 1);
        assert_eq!(config.concurrency_for(5), 5);
        assert_eq!(config.concurrency_for(50), 8);
        assert_eq!(config.concurrency_for(0), 1);
    }

    #[test]
    fn test_config_serde_uses_snake_case_mode() {
        let config = AnalysisConfig::new().with_inference_mode(InferenceMode::AllMatches);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"all_matches\""));

        let back: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
