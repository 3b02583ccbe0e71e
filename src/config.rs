//! Analysis run configuration

use crate::error::{Result, TerritoryError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Thresholds and weights for the rule-based churn score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChurnConfig {
    /// Current gap / average gap above which a client counts as silent
    pub silence_ratio: f64,
    /// Ratio above which silence is considered extreme
    pub extreme_silence_ratio: f64,
    pub silence_points: f64,
    pub extreme_silence_points: f64,
    /// Last-order volume drop (percent) for the severe bucket
    pub severe_drop_pct: f64,
    pub severe_drop_points: f64,
    /// Last-order volume drop (percent) for the moderate bucket
    pub moderate_drop_pct: f64,
    pub moderate_drop_points: f64,
    pub category_a_points: f64,
    pub category_b_points: f64,
    pub monitor_threshold: f64,
    pub high_threshold: f64,
    pub critical_threshold: f64,
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self {
            silence_ratio: 1.5,
            extreme_silence_ratio: 3.0,
            silence_points: 40.0,
            extreme_silence_points: 20.0,
            severe_drop_pct: 50.0,
            severe_drop_points: 20.0,
            moderate_drop_pct: 25.0,
            moderate_drop_points: 10.0,
            category_a_points: 20.0,
            category_b_points: 10.0,
            monitor_threshold: 30.0,
            high_threshold: 60.0,
            critical_threshold: 80.0,
        }
    }
}

/// Cumulative fact-share cut-offs for ABC classification (percent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbcConfig {
    pub a_share: f64,
    pub b_share: f64,
}

impl Default for AbcConfig {
    fn default() -> Self {
        Self {
            a_share: 80.0,
            b_share: 95.0,
        }
    }
}

/// Configuration for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Potential = fact * multiplier when no external potential is known
    pub potential_multiplier: f64,
    /// Decimal places kept in coordinate grouping keys (4 is roughly 11 m)
    pub coordinate_precision: usize,
    /// Reference date for churn; defaults to the latest order date in the data
    pub as_of: Option<NaiveDate>,
    pub churn: ChurnConfig,
    pub abc: AbcConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            potential_multiplier: 1.2,
            coordinate_precision: 4,
            as_of: None,
            churn: ChurnConfig::default(),
            abc: AbcConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load a JSON config file; keys that are absent keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.potential_multiplier = multiplier;
        self
    }

    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.potential_multiplier.is_finite() && self.potential_multiplier > 0.0) {
            return Err(TerritoryError::Config(format!(
                "potential_multiplier must be positive, got {}",
                self.potential_multiplier
            )));
        }
        if self.coordinate_precision > 8 {
            return Err(TerritoryError::Config(format!(
                "coordinate_precision must be at most 8, got {}",
                self.coordinate_precision
            )));
        }
        if self.abc.a_share > self.abc.b_share {
            return Err(TerritoryError::Config(
                "abc.a_share must not exceed abc.b_share".to_string(),
            ));
        }
        let c = &self.churn;
        if c.silence_ratio <= 0.0 || c.extreme_silence_ratio < c.silence_ratio {
            return Err(TerritoryError::Config(
                "churn silence ratios must be positive and ordered".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"potential_multiplier": 1.5, "churn": {"silence_points": 35}}"#)
                .unwrap();
        assert_eq!(config.potential_multiplier, 1.5);
        assert_eq!(config.coordinate_precision, 4);
        assert_eq!(config.churn.silence_points, 35.0);
        assert_eq!(config.churn.extreme_silence_ratio, 3.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_multiplier() {
        let config = AnalysisConfig::default().with_multiplier(0.0);
        assert!(config.validate().is_err());
    }
}
