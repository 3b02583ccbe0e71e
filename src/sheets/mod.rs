//! External reference data: the potential-client base and the coordinate cache

pub mod cache;
pub mod client;

pub use cache::{CacheEntry, CoordinateCache, HistoryRecord, RenameOutcome, DELETED_MARKER};
pub use client::{parse_value_range, RetryPolicy, SheetsClient, DEFAULT_MAX_CONCURRENCY};

use crate::error::{Result, TerritoryError};
use crate::model::PotentialClient;
use crate::parser::columns::{find_by_aliases, fold_header};
use crate::parser::parse_number;

const NAME_ALIASES: &[&str] = &["наименование", "название", "клиент", "name"];
const ADDRESS_ALIASES: &[&str] = &["адрес", "address"];
const REGION_ALIASES: &[&str] = &["регион", "region", "область", "субъект"];
const CITY_ALIASES: &[&str] = &["город", "населенный пункт", "city"];
const TYPE_ALIASES: &[&str] = &["вид деятельности", "тип", "категория", "type", "activity"];
const LAT_ALIASES: &[&str] = &["широта", "latitude", "lat"];
const LON_ALIASES: &[&str] = &["долгота", "longitude", "lon", "lng"];

/// Map a potential-client grid (header row first) to records.
///
/// Only the address column is required; a missing name falls back to the address.
pub fn parse_potential_clients(cells: &[Vec<String>]) -> Result<Vec<PotentialClient>> {
    let Some((header, data)) = cells.split_first() else {
        return Ok(Vec::new());
    };
    let folded: Vec<String> = header.iter().map(|h| fold_header(h)).collect();
    let mut claimed = Vec::new();

    let address = find_by_aliases(&folded, ADDRESS_ALIASES, &mut claimed).ok_or_else(|| {
        TerritoryError::MissingColumns {
            fields: vec!["address".to_string()],
        }
    })?;
    let name = find_by_aliases(&folded, NAME_ALIASES, &mut claimed);
    let region = find_by_aliases(&folded, REGION_ALIASES, &mut claimed);
    let city = find_by_aliases(&folded, CITY_ALIASES, &mut claimed);
    let activity = find_by_aliases(&folded, TYPE_ALIASES, &mut claimed);
    let lat = find_by_aliases(&folded, LAT_ALIASES, &mut claimed);
    let lon = find_by_aliases(&folded, LON_ALIASES, &mut claimed);

    let mut clients = Vec::new();
    for record in data {
        let text = |col: Option<usize>| {
            col.and_then(|c| record.get(c))
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        let Some(addr) = text(Some(address)) else {
            continue;
        };
        clients.push(PotentialClient {
            name: text(name).unwrap_or_else(|| addr.clone()),
            address: addr,
            region: text(region),
            city: text(city),
            activity_type: text(activity),
            lat: text(lat).and_then(|s| parse_number(&s)),
            lon: text(lon).and_then(|s| parse_number(&s)),
        });
    }
    Ok(clients)
}

impl SheetsClient {
    /// Download the potential-client base from one range
    pub fn fetch_potential_clients(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<PotentialClient>> {
        let cells = self.fetch_values(spreadsheet_id, range)?;
        parse_potential_clients(&cells)
    }

    /// Download the per-manager cache sheets in parallel. The first failed
    /// sheet fails the whole load.
    pub fn fetch_coordinate_cache(
        &self,
        spreadsheet_id: &str,
        managers: &[String],
        max_concurrency: usize,
    ) -> Result<CoordinateCache> {
        let ranges: Vec<String> = managers.iter().map(|m| format!("'{}'!A:E", m)).collect();
        let results = self.fetch_ranges(spreadsheet_id, &ranges, max_concurrency)?;

        let mut cache = CoordinateCache::new();
        for (manager, result) in managers.iter().zip(results) {
            match result {
                Ok(rows) => cache.load_sheet_rows(manager, &rows),
                Err(e) => {
                    log::error!("Failed to load cache sheet for {}: {}", manager, e);
                    return Err(e);
                }
            }
        }
        Ok(cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_parse_potential_clients() {
        let cells = grid(&[
            &["Наименование", "Юридический адрес", "Регион", "Вид деятельности", "Широта", "Долгота"],
            &["ООО Ромашка", "г. Казань, ул. Баумана 3", "Татарстан", "Розница", "55,79", "49,12"],
            &["", "г. Тула, ул. Ленина 5", "", "", "", ""],
            &["Без адреса", "", "", "", "", ""],
        ]);
        let clients = parse_potential_clients(&cells).unwrap();
        assert_eq!(clients.len(), 2);
        assert_eq!(clients[0].name, "ООО Ромашка");
        assert_eq!(clients[0].region.as_deref(), Some("Татарстан"));
        assert_eq!(clients[0].activity_type.as_deref(), Some("Розница"));
        assert_eq!(clients[0].lat, Some(55.79));
        assert_eq!(clients[1].name, "г. Тула, ул. Ленина 5");
        assert_eq!(clients[1].region, None);
    }

    #[test]
    fn test_potential_without_address_column() {
        let cells = grid(&[&["Наименование", "Регион"], &["ООО Ромашка", "Татарстан"]]);
        assert!(matches!(
            parse_potential_clients(&cells),
            Err(TerritoryError::MissingColumns { .. })
        ));
        assert!(parse_potential_clients(&[]).unwrap().is_empty());
    }
}
