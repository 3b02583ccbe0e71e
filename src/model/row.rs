use chrono::NaiveDate;
use serde::Serialize;

/// One sales line from the uploaded spreadsheet
///
/// Required fields are plain values; everything the column mapping may
/// fail to find is an `Option`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRow {
    /// 1-based line number in the source sheet (header is line 1)
    pub line_number: usize,
    pub manager: String,
    pub address: Option<String>,
    pub volume: f64,
    pub brand: Option<String>,
    pub client_name: Option<String>,
    pub region: Option<String>,
    pub date: Option<NaiveDate>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Externally supplied potential for this line
    pub potential: Option<f64>,
}

impl RawRow {
    pub fn new(line_number: usize, manager: String, volume: f64) -> Self {
        RawRow {
            line_number,
            manager,
            address: None,
            volume,
            brand: None,
            client_name: None,
            region: None,
            date: None,
            lat: None,
            lon: None,
            potential: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_coordinates(mut self, lat: f64, lon: f64) -> Self {
        self.lat = Some(lat);
        self.lon = Some(lon);
        self
    }

    pub fn with_potential(mut self, potential: f64) -> Self {
        self.potential = Some(potential);
        self
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    /// Text handed to the normalizer: a separate region column is put in front
    /// so an explicit region always takes precedence over what the address implies.
    pub fn address_for_normalization(&self) -> Option<String> {
        let address = self.address.as_deref().map(str::trim).filter(|a| !a.is_empty());
        let region = self.region.as_deref().map(str::trim).filter(|r| !r.is_empty());
        match (region, address) {
            (Some(r), Some(a)) => Some(format!("{}, {}", r, a)),
            (None, Some(a)) => Some(a.to_string()),
            (Some(r), None) => Some(r.to_string()),
            (None, None) => None,
        }
    }
}
