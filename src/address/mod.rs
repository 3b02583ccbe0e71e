//! Address normalization: free text to canonical region, city, street and house

pub mod lookup;
pub mod normalizer;
pub mod tables;

pub use lookup::{fold_text, CityHit, FuzzyCity, RegionLookup};
pub use normalizer::{address_key, normalize_address};
