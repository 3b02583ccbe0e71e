use super::client::ClientCategory;
use serde::Serialize;
use std::fmt;

/// Where the potential of an [`AggregatedRow`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PotentialSource {
    External,
    Estimated,
    /// External cells plus estimates for the rows without one
    Mixed,
}

/// Fact and potential for one (manager, brand, region) combination
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedRow {
    pub manager: String,
    pub brand: String,
    pub region: String,
    pub fact: f64,
    pub potential: f64,
    pub growth_potential: f64,
    pub growth_rate: f64,
    pub client_count: usize,
    /// Trade points of the region's potential-client base
    pub potential_tt_count: usize,
    pub potential_source: PotentialSource,
}

impl AggregatedRow {
    pub fn new(manager: &str, brand: &str, region: &str) -> Self {
        AggregatedRow {
            manager: manager.to_string(),
            brand: brand.to_string(),
            region: region.to_string(),
            fact: 0.0,
            potential: 0.0,
            growth_potential: 0.0,
            growth_rate: 0.0,
            client_count: 0,
            potential_tt_count: 0,
            potential_source: PotentialSource::Estimated,
        }
    }

    /// Set potential and recompute growth from it
    pub fn apply_potential(&mut self, potential: f64, source: PotentialSource) {
        self.potential = potential;
        self.potential_source = source;
        self.growth_potential = growth_potential(self.fact, potential);
        self.growth_rate = growth_rate(self.fact, self.growth_potential);
    }
}

/// Untapped volume; never negative
pub fn growth_potential(fact: f64, potential: f64) -> f64 {
    if potential > fact {
        potential - fact
    } else {
        0.0
    }
}

/// Growth potential as a percentage of fact; 0 when there is no fact
pub fn growth_rate(fact: f64, growth_potential: f64) -> f64 {
    if fact > 0.0 {
        growth_potential / fact * 100.0
    } else {
        0.0
    }
}

/// Active clients versus the potential-client base of one region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionCoverage {
    pub region: String,
    pub active_count: usize,
    pub potential_count: usize,
    /// Potential clients whose address matches an active client
    pub covered_count: usize,
    pub coverage_pct: f64,
    pub gap: usize,
}

impl RegionCoverage {
    pub fn new(region: &str, active_count: usize, potential_count: usize, covered_count: usize) -> Self {
        let coverage_pct = if potential_count == 0 {
            0.0
        } else {
            (active_count as f64 / potential_count as f64 * 100.0).min(100.0)
        };
        RegionCoverage {
            region: region.to_string(),
            active_count,
            potential_count,
            covered_count,
            coverage_pct,
            gap: potential_count.saturating_sub(active_count),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskLevel {
    Monitor,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Monitor => write!(f, "Monitor"),
            RiskLevel::High => write!(f, "High"),
            RiskLevel::Critical => write!(f, "Critical"),
        }
    }
}

/// Churn score of a client with a dated order history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChurnRisk {
    pub client_key: String,
    pub client_name: String,
    pub manager: String,
    pub region: String,
    pub category: ClientCategory,
    pub days_since_last_order: i64,
    pub avg_gap_days: f64,
    pub silence_ratio: f64,
    pub volume_drop_pct: f64,
    pub score: f64,
    pub level: RiskLevel,
    pub factors: Vec<String>,
}

/// Distinct values for the dashboard filters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub managers: Vec<String>,
    pub brands: Vec<String>,
    pub regions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryTotals {
    pub fact: f64,
    pub potential: f64,
    pub growth_potential: f64,
    pub client_count: usize,
    pub unidentified_count: usize,
    pub dropped_rows: usize,
    pub potential_count: usize,
    pub covered_count: usize,
    pub coverage_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_never_negative() {
        assert_eq!(growth_potential(120.0, 100.0), 0.0);
        assert_eq!(growth_potential(100.0, 120.0), 20.0);
        assert_eq!(growth_rate(0.0, 50.0), 0.0);
        assert!((growth_rate(100.0, 20.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_coverage_is_clamped() {
        let over = RegionCoverage::new("Москва", 12, 10, 8);
        assert_eq!(over.coverage_pct, 100.0);
        assert_eq!(over.gap, 0);

        let empty = RegionCoverage::new("Москва", 5, 0, 0);
        assert_eq!(empty.coverage_pct, 0.0);
        assert_eq!(empty.gap, 0);

        let half = RegionCoverage::new("Москва", 5, 10, 5);
        assert_eq!(half.coverage_pct, 50.0);
        assert_eq!(half.gap, 5);
    }
}
