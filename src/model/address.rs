use serde::Serialize;
use std::fmt;

/// Region value used when nothing in an address could be resolved
pub const UNRESOLVED_REGION: &str = "Регион не определен";

/// Which lookup produced the region of a [`ParsedAddress`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    ExplicitRegion,
    PostalCode,
    MarkedCity,
    City,
    FuzzyCity,
    Ambiguous,
    Unresolved,
}

impl MatchSource {
    pub fn confidence(&self) -> f64 {
        match self {
            MatchSource::ExplicitRegion => 1.0,
            MatchSource::PostalCode => 0.9,
            MatchSource::MarkedCity => 0.85,
            MatchSource::City => 0.8,
            MatchSource::FuzzyCity => 0.6,
            MatchSource::Ambiguous | MatchSource::Unresolved => 0.0,
        }
    }
}

impl fmt::Display for MatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchSource::ExplicitRegion => "region",
            MatchSource::PostalCode => "postal",
            MatchSource::MarkedCity => "city-marked",
            MatchSource::City => "city",
            MatchSource::FuzzyCity => "city-fuzzy",
            MatchSource::Ambiguous => "ambiguous",
            MatchSource::Unresolved => "unresolved",
        };
        write!(f, "{}", s)
    }
}

/// Result of resolving a region candidate against the lookup tables
#[derive(Debug, Clone, PartialEq)]
pub enum RegionMatch {
    Resolved {
        region: String,
        city: Option<String>,
        source: MatchSource,
    },
    /// Several equally close candidates; never guessed
    Ambiguous(Vec<String>),
    Unresolved,
}

impl RegionMatch {
    pub fn region(&self) -> Option<&str> {
        match self {
            RegionMatch::Resolved { region, .. } => Some(region),
            _ => None,
        }
    }
}

/// A free-text address broken into its administrative parts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedAddress {
    pub region: String,
    pub city: Option<String>,
    pub street: Option<String>,
    pub house: Option<String>,
    pub postal_code: Option<String>,
    pub source: MatchSource,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ambiguous_candidates: Vec<String>,
}

impl ParsedAddress {
    pub fn unresolved() -> Self {
        Self {
            region: UNRESOLVED_REGION.to_string(),
            city: None,
            street: None,
            house: None,
            postal_code: None,
            source: MatchSource::Unresolved,
            confidence: 0.0,
            ambiguous_candidates: Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.region != UNRESOLVED_REGION
    }

    pub fn is_ambiguous(&self) -> bool {
        !self.ambiguous_candidates.is_empty()
    }
}

impl Default for ParsedAddress {
    fn default() -> Self {
        Self::unresolved()
    }
}
