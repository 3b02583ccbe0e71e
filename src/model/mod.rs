pub mod address;
pub mod client;
pub mod metrics;
pub mod row;

pub use address::{MatchSource, ParsedAddress, RegionMatch, UNRESOLVED_REGION};
pub use client::{Client, ClientCategory, PotentialClient};
pub use metrics::{
    growth_potential, growth_rate, AggregatedRow, ChurnRisk, FilterOptions, PotentialSource,
    RegionCoverage, RiskLevel, SummaryTotals,
};
pub use row::RawRow;
