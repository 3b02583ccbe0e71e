//! Header alias tables and column resolution

use crate::error::{Result, TerritoryError};
use std::fmt;

/// A column meaning the analysis understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticField {
    Manager,
    Address,
    Volume,
    Brand,
    ClientName,
    Region,
    Date,
    Lat,
    Lon,
    Potential,
}

impl SemanticField {
    /// Fields every sales file must map, in reporting order
    pub const REQUIRED: [SemanticField; 3] = [
        SemanticField::Manager,
        SemanticField::Address,
        SemanticField::Volume,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SemanticField::Manager => "manager",
            SemanticField::Address => "address/region",
            SemanticField::Volume => "volume",
            SemanticField::Brand => "brand",
            SemanticField::ClientName => "client name",
            SemanticField::Region => "region",
            SemanticField::Date => "date",
            SemanticField::Lat => "latitude",
            SemanticField::Lon => "longitude",
            SemanticField::Potential => "potential",
        }
    }

    /// Aliases matched as substrings of the lowercased header
    fn contains_aliases(&self) -> &'static [&'static str] {
        match self {
            SemanticField::Manager => &[
                "менеджер",
                "manager",
                "ответственный",
                "торговый представитель",
                "сотрудник",
            ],
            SemanticField::Address => &["адрес", "address", "местоположение", "location"],
            SemanticField::Volume => &[
                "объем",
                "volume",
                "количество",
                "кол-во",
                "qty",
                "quantity",
                "вес",
                "продажи",
                "sales",
                "факт",
                "fact",
            ],
            SemanticField::Brand => &["бренд", "brand", "торговая марка", "марка"],
            SemanticField::ClientName => &[
                "наименование",
                "название",
                "клиент",
                "контрагент",
                "торговая точка",
                "client",
                "customer",
                "name",
            ],
            SemanticField::Region => &["регион", "region", "область", "субъект", "город", "city"],
            SemanticField::Date => &["дата", "date"],
            SemanticField::Lat => &["широта", "latitude", "lat"],
            SemanticField::Lon => &["долгота", "longitude", "lon", "lng"],
            SemanticField::Potential => &["потенциал", "potential"],
        }
    }

    /// Short aliases that only count as a whole header
    fn exact_aliases(&self) -> &'static [&'static str] {
        match self {
            SemanticField::Manager => &["рм", "тп", "мп"],
            SemanticField::Brand => &["тм"],
            SemanticField::ClientName => &["тт"],
            _ => &[],
        }
    }

    fn matches(&self, header: &str) -> bool {
        self.exact_aliases().contains(&header)
            || self.contains_aliases().iter().any(|alias| header.contains(alias))
    }
}

impl fmt::Display for SemanticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which column index holds each semantic field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMap {
    pub manager: usize,
    pub address: usize,
    pub volume: usize,
    pub brand: Option<usize>,
    pub client_name: Option<usize>,
    pub region: Option<usize>,
    pub date: Option<usize>,
    pub lat: Option<usize>,
    pub lon: Option<usize>,
    pub potential: Option<usize>,
    pub headers: Vec<String>,
}

pub(crate) fn fold_header(header: &str) -> String {
    header.trim().to_lowercase().replace('ё', "е")
}

/// First unclaimed header containing any of the aliases; claims it
pub(crate) fn find_by_aliases(
    folded_headers: &[String],
    aliases: &[&str],
    claimed: &mut Vec<usize>,
) -> Option<usize> {
    let idx = folded_headers
        .iter()
        .enumerate()
        .filter(|(i, _)| !claimed.contains(i))
        .find(|(_, h)| aliases.iter().any(|alias| h.contains(alias)))
        .map(|(i, _)| i)?;
    claimed.push(idx);
    Some(idx)
}

/// First header, left to right, that matches the field and is not claimed yet
fn find_column(field: SemanticField, headers: &[String], claimed: &mut Vec<usize>) -> Option<usize> {
    let idx = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| !claimed.contains(i))
        .find(|(_, h)| field.matches(h))
        .map(|(i, _)| i)?;
    claimed.push(idx);
    Some(idx)
}

impl ColumnMap {
    /// Map arbitrary spreadsheet headers to semantic fields.
    ///
    /// Fails with [`TerritoryError::MissingColumns`] naming every required
    /// field that no header matched.
    pub fn resolve(headers: &[String]) -> Result<ColumnMap> {
        let folded: Vec<String> = headers.iter().map(|h| fold_header(h)).collect();
        let mut claimed = Vec::new();

        let manager = find_column(SemanticField::Manager, &folded, &mut claimed);
        // Without an address column a region/city column stands in for it
        let address = find_column(SemanticField::Address, &folded, &mut claimed)
            .or_else(|| find_column(SemanticField::Region, &folded, &mut claimed));
        let volume = find_column(SemanticField::Volume, &folded, &mut claimed);

        let (manager, address, volume) = match (manager, address, volume) {
            (Some(m), Some(a), Some(v)) => (m, a, v),
            _ => {
                let found = [manager, address, volume];
                let fields = SemanticField::REQUIRED
                    .iter()
                    .zip(found)
                    .filter(|(_, idx)| idx.is_none())
                    .map(|(field, _)| field.name().to_string())
                    .collect();
                return Err(TerritoryError::MissingColumns { fields });
            }
        };

        Ok(ColumnMap {
            manager,
            address,
            volume,
            brand: find_column(SemanticField::Brand, &folded, &mut claimed),
            region: find_column(SemanticField::Region, &folded, &mut claimed),
            date: find_column(SemanticField::Date, &folded, &mut claimed),
            lat: find_column(SemanticField::Lat, &folded, &mut claimed),
            lon: find_column(SemanticField::Lon, &folded, &mut claimed),
            potential: find_column(SemanticField::Potential, &folded, &mut claimed),
            client_name: find_column(SemanticField::ClientName, &folded, &mut claimed),
            headers: headers.to_vec(),
        })
    }

    /// (field, header) pairs for display
    pub fn describe(&self) -> Vec<(SemanticField, Option<&str>)> {
        let header = |idx: Option<usize>| idx.and_then(|i| self.headers.get(i)).map(String::as_str);
        vec![
            (SemanticField::Manager, header(Some(self.manager))),
            (SemanticField::Address, header(Some(self.address))),
            (SemanticField::Volume, header(Some(self.volume))),
            (SemanticField::Brand, header(self.brand)),
            (SemanticField::ClientName, header(self.client_name)),
            (SemanticField::Region, header(self.region)),
            (SemanticField::Date, header(self.date)),
            (SemanticField::Lat, header(self.lat)),
            (SemanticField::Lon, header(self.lon)),
            (SemanticField::Potential, header(self.potential)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_russian_headers() {
        let map = ColumnMap::resolve(&headers(&[
            "Дата отгрузки",
            "Региональный менеджер",
            "Бренд",
            "Наименование ТТ",
            "Адрес доставки",
            "Объём, кг",
        ]))
        .unwrap();
        assert_eq!(map.manager, 1);
        assert_eq!(map.address, 4);
        assert_eq!(map.volume, 5);
        assert_eq!(map.brand, Some(2));
        assert_eq!(map.client_name, Some(3));
        assert_eq!(map.date, Some(0));
        assert_eq!(map.region, None);
    }

    #[test]
    fn test_region_column_stands_in_for_address() {
        let map = ColumnMap::resolve(&headers(&["Manager", "Region", "Sales volume"])).unwrap();
        assert_eq!(map.address, 1);
        assert_eq!(map.region, None);
    }

    #[test]
    fn test_exact_short_alias() {
        let map = ColumnMap::resolve(&headers(&["РМ", "Адрес", "Факт"])).unwrap();
        assert_eq!(map.manager, 0);
        // "рм" must not match inside longer words
        let err = ColumnMap::resolve(&headers(&["Форма", "Адрес", "Факт"])).unwrap_err();
        assert!(matches!(err, TerritoryError::MissingColumns { .. }));
    }

    #[test]
    fn test_missing_columns_named() {
        let err = ColumnMap::resolve(&headers(&["Клиент", "Бренд"])).unwrap_err();
        match err {
            TerritoryError::MissingColumns { fields } => {
                assert_eq!(fields, vec!["manager", "address/region", "volume"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_claimed_column_not_reused() {
        let map = ColumnMap::resolve(&headers(&["Менеджер", "Адрес", "Кол-во", "Регион"])).unwrap();
        assert_eq!(map.address, 1);
        assert_eq!(map.region, Some(3));
    }
}
