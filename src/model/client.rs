use super::address::ParsedAddress;
use super::row::RawRow;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// ABC class of a client by its share of total fact volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub enum ClientCategory {
    A,
    B,
    #[default]
    C,
}

impl fmt::Display for ClientCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientCategory::A => write!(f, "A"),
            ClientCategory::B => write!(f, "B"),
            ClientCategory::C => write!(f, "C"),
        }
    }
}

/// A trade point built from one or more sales rows that share an address
/// (or, without an address, rounded coordinates)
#[derive(Debug, Clone, Serialize)]
pub struct Client {
    pub key: String,
    pub name: Option<String>,
    pub manager: String,
    pub brand: Option<String>,
    pub address: Option<String>,
    pub parsed: ParsedAddress,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub fact: f64,
    pub category: ClientCategory,
    /// Set when the address also appears in the potential-client base
    pub in_potential_base: bool,
    #[serde(skip)]
    pub rows: Vec<RawRow>,
    #[serde(skip)]
    representative_date: Option<NaiveDate>,
}

impl Client {
    /// Start a client from its first row
    pub fn from_row(key: String, row: RawRow, parsed: ParsedAddress) -> Self {
        Client {
            key,
            name: row.client_name.clone(),
            manager: row.manager.clone(),
            brand: row.brand.clone(),
            address: row.address.clone(),
            parsed,
            lat: row.lat,
            lon: row.lon,
            fact: row.volume,
            category: ClientCategory::default(),
            in_potential_base: false,
            representative_date: row.date,
            rows: vec![row],
        }
    }

    /// Merge another row with the same key.
    ///
    /// Display fields follow the most recent row; the first row keeps them on
    /// equal or missing dates.
    pub fn merge(&mut self, row: RawRow) {
        self.fact += row.volume;

        let newer = match (row.date, self.representative_date) {
            (Some(new), Some(current)) => new > current,
            (Some(_), None) => true,
            _ => false,
        };
        if newer {
            self.representative_date = row.date;
            if row.client_name.is_some() {
                self.name = row.client_name.clone();
            }
            if row.brand.is_some() {
                self.brand = row.brand.clone();
            }
            self.manager = row.manager.clone();
        }

        if self.lat.is_none() || self.lon.is_none() {
            if let Some((lat, lon)) = row.coordinates() {
                self.lat = Some(lat);
                self.lon = Some(lon);
            }
        }

        self.rows.push(row);
    }

    pub fn region(&self) -> &str {
        &self.parsed.region
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.address.as_deref())
            .unwrap_or(&self.key)
    }

    /// Order volumes summed per distinct date, oldest first
    pub fn order_history(&self) -> Vec<(NaiveDate, f64)> {
        let mut orders: Vec<(NaiveDate, f64)> = Vec::new();
        let mut dated: Vec<(NaiveDate, f64)> = self
            .rows
            .iter()
            .filter_map(|r| r.date.map(|d| (d, r.volume)))
            .collect();
        dated.sort_by_key(|(d, _)| *d);

        for (date, volume) in dated {
            match orders.last_mut() {
                Some((last, total)) if *last == date => *total += volume,
                _ => orders.push((date, volume)),
            }
        }
        orders
    }
}

/// A trade point from the reference potential-client base
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PotentialClient {
    pub name: String,
    pub address: String,
    pub region: Option<String>,
    pub city: Option<String>,
    pub activity_type: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl PotentialClient {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        PotentialClient {
            name: name.into(),
            address: address.into(),
            region: None,
            city: None,
            activity_type: None,
            lat: None,
            lon: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}
