//! Matching clients against the potential-client base

use crate::address::{address_key, RegionLookup};
use crate::model::{Client, PotentialClient, RegionCoverage, RegionMatch};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// A potential client no active client covers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreePotential {
    pub region: String,
    #[serde(flatten)]
    pub client: PotentialClient,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PotentialMatch {
    /// Sorted by region name
    pub coverage: Vec<RegionCoverage>,
    pub free: Vec<FreePotential>,
    /// Distinct potential clients after deduplication
    pub potential_count: usize,
    pub covered_count: usize,
}

impl PotentialMatch {
    pub fn coverage_for(&self, region: &str) -> Option<&RegionCoverage> {
        self.coverage.iter().find(|c| c.region == region)
    }
}

fn potential_region(lookup: &RegionLookup, client: &PotentialClient) -> String {
    let from_column = |text: Option<&str>| match text.map(|t| lookup.resolve_region(t)) {
        Some(RegionMatch::Resolved { region, .. }) => Some(region),
        _ => None,
    };
    from_column(client.region.as_deref())
        .or_else(|| from_column(client.city.as_deref()))
        .unwrap_or_else(|| lookup.normalize(&client.address).region)
}

/// Classify each potential client as covered or free and count coverage per
/// region. Only exact address-key equality counts as a match.
///
/// Clients whose address is in the base get `in_potential_base` set.
pub fn match_potential(clients: &mut [Client], universe: &[PotentialClient]) -> PotentialMatch {
    let lookup = RegionLookup::global();

    let active: HashMap<String, usize> = clients
        .iter()
        .enumerate()
        .filter(|(_, c)| c.address.is_some())
        .map(|(i, c)| (c.key.clone(), i))
        .collect();

    // region -> (active, potential, covered)
    let mut counts: BTreeMap<String, (usize, usize, usize)> = BTreeMap::new();
    for client in clients.iter() {
        counts.entry(client.region().to_string()).or_default().0 += 1;
    }

    let mut result = PotentialMatch::default();
    let mut seen = HashSet::new();

    for candidate in universe {
        let key = address_key(&candidate.address);
        if key.is_empty() || !seen.insert(key.clone()) {
            continue;
        }
        let region = potential_region(lookup, candidate);
        let entry = counts.entry(region.clone()).or_default();
        entry.1 += 1;
        result.potential_count += 1;

        match active.get(&key) {
            Some(&i) => {
                clients[i].in_potential_base = true;
                entry.2 += 1;
                result.covered_count += 1;
            }
            None => result.free.push(FreePotential {
                region,
                client: candidate.clone(),
            }),
        }
    }

    let duplicates = universe.len() - seen.len();
    if duplicates > 0 {
        log::debug!("Skipped {} duplicate or blank potential addresses", duplicates);
    }

    result.coverage = counts
        .into_iter()
        .map(|(region, (active, potential, covered))| {
            RegionCoverage::new(&region, active, potential, covered)
        })
        .collect();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::grouping::group_clients;
    use crate::model::RawRow;

    fn clients(addresses: &[&str]) -> Vec<Client> {
        let rows = addresses
            .iter()
            .enumerate()
            .map(|(i, a)| RawRow::new(i + 2, "Иванов".to_string(), 10.0).with_address(*a))
            .collect();
        group_clients(rows, &AnalysisConfig::default(), None).clients
    }

    #[test]
    fn test_exact_key_match_only() {
        let mut active = clients(&["г. Казань, ул. Баумана 3", "г. Казань, ул. Пушкина 10"]);
        let universe = vec![
            PotentialClient::new("Ромашка", "Казань, Баумана 3").with_region("Татарстан"),
            PotentialClient::new("Лютик", "Казань, Баумана 30"),
            PotentialClient::new("Ромашка дубль", "г. Казань ул. Баумана 3"),
        ];
        let matched = match_potential(&mut active, &universe);

        assert_eq!(matched.potential_count, 2);
        assert_eq!(matched.covered_count, 1);
        assert_eq!(matched.free.len(), 1);
        assert_eq!(matched.free[0].client.name, "Лютик");
        assert_eq!(matched.free[0].region, "Республика Татарстан");
        assert!(active[0].in_potential_base);
        assert!(!active[1].in_potential_base);

        let tatarstan = matched.coverage_for("Республика Татарстан").unwrap();
        assert_eq!(tatarstan.active_count, 2);
        assert_eq!(tatarstan.potential_count, 2);
        assert_eq!(tatarstan.covered_count, 1);
        assert_eq!(tatarstan.coverage_pct, 100.0);
        assert_eq!(tatarstan.gap, 0);
    }

    #[test]
    fn test_region_without_potential_has_zero_coverage() {
        let mut active = clients(&["г. Тула, ул. Ленина 5"]);
        let universe = vec![
            PotentialClient::new("А", "г. Орел, ул. Мира 1"),
            PotentialClient::new("Б", "г. Орел, ул. Мира 2"),
        ];
        let matched = match_potential(&mut active, &universe);

        let tula = matched.coverage_for("Тульская область").unwrap();
        assert_eq!(tula.potential_count, 0);
        assert_eq!(tula.coverage_pct, 0.0);

        let orel = matched.coverage_for("Орловская область").unwrap();
        assert_eq!(orel.active_count, 0);
        assert_eq!(orel.gap, 2);
    }
}
