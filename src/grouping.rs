//! Grouping sales rows into clients

use crate::address::{address_key, RegionLookup};
use crate::config::AnalysisConfig;
use crate::model::{Client, RawRow};
use crate::sheets::CoordinateCache;
use serde::Serialize;
use std::collections::HashMap;

/// A row that could not be attached to any client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnidentifiedRow {
    pub row: RawRow,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct Grouping {
    /// In order of first appearance
    pub clients: Vec<Client>,
    pub unidentified: Vec<UnidentifiedRow>,
}

/// Key for rows without an address: coordinates rounded to `precision` decimals
pub fn coordinate_key(lat: f64, lon: f64, precision: usize) -> String {
    format!("geo:{:.*},{:.*}", precision, lat, precision, lon)
}

/// Merge rows that share an address key (or rounded coordinates) into clients.
///
/// Coordinates missing from the rows are filled from `cache` when one is given.
pub fn group_clients(
    rows: Vec<RawRow>,
    config: &AnalysisConfig,
    cache: Option<&CoordinateCache>,
) -> Grouping {
    let lookup = RegionLookup::global();
    let mut grouping = Grouping::default();
    let mut index: HashMap<String, usize> = HashMap::new();

    for mut row in rows {
        if row.coordinates().is_none() {
            if let Some((lat, lon)) = row
                .address
                .as_deref()
                .and_then(|a| cache.and_then(|c| c.lookup(a)))
            {
                row.lat = Some(lat);
                row.lon = Some(lon);
            }
        }

        let key = match row.address.as_deref().map(address_key).filter(|k| !k.is_empty()) {
            Some(key) => key,
            None => match row.coordinates() {
                Some((lat, lon)) => coordinate_key(lat, lon, config.coordinate_precision),
                None => {
                    log::warn!("Row {}: no address or coordinates", row.line_number);
                    grouping.unidentified.push(UnidentifiedRow {
                        row,
                        reason: "no address or coordinates".to_string(),
                    });
                    continue;
                }
            },
        };

        match index.get(&key) {
            Some(&i) => {
                let client = &mut grouping.clients[i];
                if !client.parsed.is_resolved() {
                    if let Some(text) = row.address_for_normalization() {
                        let parsed = lookup.normalize(&text);
                        if parsed.is_resolved() {
                            client.parsed = parsed;
                        }
                    }
                }
                client.merge(row);
            }
            None => {
                let parsed = row
                    .address_for_normalization()
                    .map(|text| lookup.normalize(&text))
                    .unwrap_or_default();
                index.insert(key.clone(), grouping.clients.len());
                grouping.clients.push(Client::from_row(key, row, parsed));
            }
        }
    }

    log::info!(
        "Grouped into {} clients, {} unidentified rows",
        grouping.clients.len(),
        grouping.unidentified.len()
    );
    grouping
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchSource, UNRESOLVED_REGION};
    use chrono::NaiveDate;

    fn row(line: usize, manager: &str, volume: f64) -> RawRow {
        RawRow::new(line, manager.to_string(), volume)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_same_address_different_spelling_is_one_client() {
        let rows = vec![
            row(2, "Иванов", 100.0).with_address("г. Москва, ул. Ленина 1"),
            row(3, "Иванов", 50.0).with_address("Москва Ленина 1"),
        ];
        let grouping = group_clients(rows, &AnalysisConfig::default(), None);
        assert_eq!(grouping.clients.len(), 1);
        let client = &grouping.clients[0];
        assert_eq!(client.fact, 150.0);
        assert_eq!(client.rows.len(), 2);
        assert_eq!(client.region(), "Москва");
    }

    #[test]
    fn test_latest_row_names_the_client() {
        let rows = vec![
            row(2, "Иванов", 10.0)
                .with_address("г. Казань, ул. Баумана 3")
                .with_client_name("Старое имя")
                .with_date(date(1)),
            row(3, "Петров", 20.0)
                .with_address("г. Казань, ул. Баумана 3")
                .with_client_name("Новое имя")
                .with_date(date(20)),
            row(4, "Сидоров", 5.0)
                .with_address("г. Казань, ул. Баумана 3")
                .with_client_name("Тоже новое")
                .with_date(date(20)),
        ];
        let grouping = group_clients(rows, &AnalysisConfig::default(), None);
        let client = &grouping.clients[0];
        assert_eq!(client.name.as_deref(), Some("Новое имя"));
        assert_eq!(client.manager, "Петров");
        assert_eq!(client.fact, 35.0);
    }

    #[test]
    fn test_coordinates_group_rows_without_address() {
        let rows = vec![
            row(2, "Иванов", 10.0).with_coordinates(55.755_81, 37.617_31),
            row(3, "Иванов", 15.0).with_coordinates(55.755_84, 37.617_29),
            row(4, "Иванов", 1.0),
        ];
        let grouping = group_clients(rows, &AnalysisConfig::default(), None);
        assert_eq!(grouping.clients.len(), 1);
        assert_eq!(grouping.clients[0].key, "geo:55.7558,37.6173");
        assert_eq!(grouping.clients[0].fact, 25.0);
        assert_eq!(grouping.clients[0].region(), UNRESOLVED_REGION);
        assert_eq!(grouping.unidentified.len(), 1);
        assert_eq!(grouping.unidentified[0].row.line_number, 4);
    }

    #[test]
    fn test_first_seen_order_and_region_column() {
        let rows = vec![
            row(2, "Иванов", 1.0).with_address("ул. Ленина 1").with_region("Тульская обл."),
            row(3, "Иванов", 1.0).with_address("г. Казань, ул. Баумана 3"),
            row(4, "Иванов", 1.0).with_address("ул. Ленина 1").with_region("Тульская обл."),
        ];
        let grouping = group_clients(rows, &AnalysisConfig::default(), None);
        assert_eq!(grouping.clients.len(), 2);
        assert_eq!(grouping.clients[0].region(), "Тульская область");
        assert_eq!(grouping.clients[0].parsed.source, MatchSource::ExplicitRegion);
        assert_eq!(grouping.clients[1].region(), "Республика Татарстан");
    }

    #[test]
    fn test_cache_fills_coordinates() {
        let mut cache = CoordinateCache::new();
        let now = date(1).and_hms_opt(0, 0, 0).unwrap();
        cache.upsert("Иванов", "г. Тула, ул. Ленина 5", 54.19, 37.61, now);

        let rows = vec![row(2, "Иванов", 3.0).with_address("Тула, Ленина 5")];
        let grouping = group_clients(rows, &AnalysisConfig::default(), Some(&cache));
        assert_eq!(grouping.clients[0].lat, Some(54.19));
        assert_eq!(grouping.clients[0].lon, Some(37.61));
    }
}
