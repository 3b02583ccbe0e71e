pub mod address;
pub mod config;
pub mod error;
pub mod grouping;
pub mod metrics;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod potential;
pub mod sheets;
pub mod xlsx;

pub use config::AnalysisConfig;
pub use error::{Result, TerritoryError};
pub use model::*;
pub use pipeline::{run_analysis, spawn_analysis, AnalysisInput, AnalysisResult};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
