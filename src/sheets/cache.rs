//! Address to coordinate cache, one table per manager

use crate::address::address_key;
use crate::error::Result;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Written into the coordinate cells of a soft-deleted entry
pub const DELETED_MARKER: &str = "DELETED";

pub const CACHE_HEADER: [&str; 5] = ["Адрес", "Широта", "Долгота", "История", "Обновлено"];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A previous address of a cache entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub address: String,
    pub changed_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    pub address: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub deleted: bool,
    pub history: Vec<HistoryRecord>,
    pub updated_at: Option<NaiveDateTime>,
}

impl CacheEntry {
    fn coordinates(&self) -> Option<(f64, f64)> {
        if self.deleted {
            return None;
        }
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    fn to_row(&self) -> Vec<String> {
        let coordinate = |value: Option<f64>| {
            if self.deleted {
                DELETED_MARKER.to_string()
            } else {
                value.map(|v| v.to_string()).unwrap_or_default()
            }
        };
        let history = self
            .history
            .iter()
            .map(|h| format!("{} [{}]", h.address, h.changed_at.format(TIMESTAMP_FORMAT)))
            .collect::<Vec<_>>()
            .join("; ");
        vec![
            self.address.clone(),
            coordinate(self.lat),
            coordinate(self.lon),
            history,
            self.updated_at
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
        ]
    }

    fn from_row(row: &[String]) -> Option<CacheEntry> {
        let cell = |i: usize| row.get(i).map(|s| s.trim()).unwrap_or("");
        let address = cell(0);
        if address.is_empty() {
            return None;
        }
        let deleted = cell(1) == DELETED_MARKER || cell(2) == DELETED_MARKER;
        let number = |s: &str| s.replace(',', ".").parse::<f64>().ok();

        Some(CacheEntry {
            address: address.to_string(),
            lat: number(cell(1)),
            lon: number(cell(2)),
            deleted,
            history: parse_history(cell(3)),
            updated_at: NaiveDateTime::parse_from_str(cell(4), TIMESTAMP_FORMAT).ok(),
        })
    }
}

fn parse_history(text: &str) -> Vec<HistoryRecord> {
    text.split("; ")
        .filter_map(|item| {
            let (address, stamp) = item.trim().rsplit_once(" [")?;
            let changed_at =
                NaiveDateTime::parse_from_str(stamp.trim_end_matches(']'), TIMESTAMP_FORMAT).ok()?;
            Some(HistoryRecord {
                address: address.to_string(),
                changed_at,
            })
        })
        .collect()
}

/// Coordinates keyed by manager, then by address key.
///
/// Mutations are plain read-modify-write on the in-memory tables; whoever
/// persists them last wins.
/// Result of [`CoordinateCache::rename_address`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed,
    /// The manager has no entry for the old address
    NotFound,
    /// Another entry already holds the new address; both are left as they were
    TargetExists,
}

#[derive(Debug, Clone, Default)]
pub struct CoordinateCache {
    managers: BTreeMap<String, BTreeMap<String, CacheEntry>>,
}

impl CoordinateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.managers.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn managers(&self) -> impl Iterator<Item = &str> {
        self.managers.keys().map(String::as_str)
    }

    pub fn entry(&self, manager: &str, address: &str) -> Option<&CacheEntry> {
        self.managers.get(manager)?.get(&address_key(address))
    }

    /// Coordinates of an address from any manager's table; deleted entries are skipped
    pub fn lookup(&self, address: &str) -> Option<(f64, f64)> {
        let key = address_key(address);
        if key.is_empty() {
            return None;
        }
        self.managers
            .values()
            .find_map(|entries| entries.get(&key).and_then(CacheEntry::coordinates))
    }

    /// Insert or overwrite coordinates; revives a deleted entry
    pub fn upsert(&mut self, manager: &str, address: &str, lat: f64, lon: f64, now: NaiveDateTime) {
        let entries = self.managers.entry(manager.to_string()).or_default();
        let entry = entries
            .entry(address_key(address))
            .or_insert_with(|| CacheEntry {
                address: address.to_string(),
                lat: None,
                lon: None,
                deleted: false,
                history: Vec::new(),
                updated_at: None,
            });
        entry.lat = Some(lat);
        entry.lon = Some(lon);
        entry.deleted = false;
        entry.updated_at = Some(now);
    }

    /// Change the address of an entry, keeping the old one in its history.
    /// An entry already stored under the new address is never overwritten.
    pub fn rename_address(
        &mut self,
        manager: &str,
        old_address: &str,
        new_address: &str,
        now: NaiveDateTime,
    ) -> RenameOutcome {
        let Some(entries) = self.managers.get_mut(manager) else {
            return RenameOutcome::NotFound;
        };
        let old_key = address_key(old_address);
        let new_key = address_key(new_address);
        if !entries.contains_key(&old_key) {
            return RenameOutcome::NotFound;
        }
        if new_key != old_key && entries.contains_key(&new_key) {
            return RenameOutcome::TargetExists;
        }
        let Some(mut entry) = entries.remove(&old_key) else {
            return RenameOutcome::NotFound;
        };
        entry.history.push(HistoryRecord {
            address: entry.address.clone(),
            changed_at: now,
        });
        entry.address = new_address.to_string();
        entry.updated_at = Some(now);
        entries.insert(new_key, entry);
        RenameOutcome::Renamed
    }

    /// Mark an entry deleted; it stays in the table with the sentinel written out
    pub fn soft_delete(&mut self, manager: &str, address: &str, now: NaiveDateTime) -> bool {
        match self
            .managers
            .get_mut(manager)
            .and_then(|entries| entries.get_mut(&address_key(address)))
        {
            Some(entry) => {
                entry.deleted = true;
                entry.updated_at = Some(now);
                true
            }
            None => false,
        }
    }

    /// Load one manager's sheet; a header row is recognised and skipped
    pub fn load_sheet_rows(&mut self, manager: &str, rows: &[Vec<String>]) {
        let entries = self.managers.entry(manager.to_string()).or_default();
        for row in rows {
            let first = row.first().map(|s| s.trim().to_lowercase()).unwrap_or_default();
            if first == "адрес" || first == "address" {
                continue;
            }
            if let Some(entry) = CacheEntry::from_row(row) {
                let key = address_key(&entry.address);
                if !key.is_empty() {
                    entries.insert(key, entry);
                }
            }
        }
    }

    pub fn from_sheet_rows(manager: &str, rows: &[Vec<String>]) -> Self {
        let mut cache = Self::new();
        cache.load_sheet_rows(manager, rows);
        cache
    }

    /// One manager's table in sheet layout, header first
    pub fn to_sheet_rows(&self, manager: &str) -> Vec<Vec<String>> {
        let mut rows = vec![CACHE_HEADER.iter().map(|h| h.to_string()).collect()];
        if let Some(entries) = self.managers.get(manager) {
            rows.extend(entries.values().map(CacheEntry::to_row));
        }
        rows
    }

    /// Read every `*.csv` in `dir`; the file stem is the manager name
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut cache = Self::new();
        if !dir.exists() {
            return Ok(cache);
        }
        for item in fs::read_dir(dir)? {
            let path = item?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let Some(manager) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(&path)?;
            let mut rows = Vec::new();
            for record in reader.records() {
                rows.push(record?.iter().map(String::from).collect::<Vec<_>>());
            }
            cache.load_sheet_rows(manager, &rows);
        }
        log::debug!("Loaded {} cached coordinates from {}", cache.len(), dir.display());
        Ok(cache)
    }

    /// Write one CSV per manager into `dir`
    pub fn save_dir(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        for manager in self.managers.keys() {
            let path = dir.join(format!("{}.csv", file_safe_name(manager)));
            let mut writer = csv::Writer::from_path(&path)?;
            for row in self.to_sheet_rows(manager) {
                writer.write_record(&row)?;
            }
            writer.flush()?;
        }
        Ok(())
    }
}

fn file_safe_name(manager: &str) -> String {
    manager
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}
