//! Fact and potential per (manager, brand, region)

use crate::config::{AbcConfig, AnalysisConfig};
use crate::model::{
    AggregatedRow, Client, ClientCategory, FilterOptions, PotentialSource, SummaryTotals,
};
use crate::potential::PotentialMatch;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Brand value for rows without a brand cell
pub const NO_BRAND: &str = "Без бренда";

#[derive(Default)]
struct Bucket<'a> {
    fact: f64,
    external: Option<f64>,
    estimated: Option<f64>,
    clients: HashSet<&'a str>,
}

/// One row per (manager, brand, region) that occurs in the sales rows,
/// sorted by manager, brand, region.
///
/// Each row contributes its external potential cell when it has one and
/// its volume times the configured multiplier otherwise.
pub fn aggregate(
    clients: &[Client],
    matched: &PotentialMatch,
    config: &AnalysisConfig,
) -> Vec<AggregatedRow> {
    let mut buckets: BTreeMap<(&str, &str, &str), Bucket<'_>> = BTreeMap::new();

    for client in clients {
        for row in &client.rows {
            let brand = row.brand.as_deref().unwrap_or(NO_BRAND);
            let bucket = buckets
                .entry((row.manager.as_str(), brand, client.region()))
                .or_default();
            bucket.fact += row.volume;
            match row.potential {
                Some(p) => *bucket.external.get_or_insert(0.0) += p,
                None => {
                    *bucket.estimated.get_or_insert(0.0) += row.volume * config.potential_multiplier
                }
            }
            bucket.clients.insert(client.key.as_str());
        }
    }

    buckets
        .into_iter()
        .map(|((manager, brand, region), bucket)| {
            let mut row = AggregatedRow::new(manager, brand, region);
            row.fact = bucket.fact;
            row.client_count = bucket.clients.len();
            row.potential_tt_count = matched
                .coverage_for(region)
                .map(|c| c.potential_count)
                .unwrap_or(0);
            let (potential, source) = match (bucket.external, bucket.estimated) {
                (Some(external), None) => (external, PotentialSource::External),
                (Some(external), Some(estimated)) => (external + estimated, PotentialSource::Mixed),
                (None, estimated) => (estimated.unwrap_or(0.0), PotentialSource::Estimated),
            };
            row.apply_potential(potential, source);
            row
        })
        .collect()
}

/// Assign A/B/C by cumulative share of total fact, largest clients first.
///
/// A client is A while the share accumulated before it is below `a_share`,
/// so the largest client is always A. Ties in fact keep input order.
pub fn classify_abc(clients: &mut [Client], config: &AbcConfig) {
    let total: f64 = clients.iter().map(|c| c.fact).sum();
    if total <= 0.0 {
        clients.iter_mut().for_each(|c| c.category = ClientCategory::C);
        return;
    }

    let mut order: Vec<usize> = (0..clients.len()).collect();
    order.sort_by(|&a, &b| clients[b].fact.total_cmp(&clients[a].fact));

    let mut cumulative = 0.0;
    for i in order {
        let share_before = cumulative / total * 100.0;
        clients[i].category = if share_before < config.a_share {
            ClientCategory::A
        } else if share_before < config.b_share {
            ClientCategory::B
        } else {
            ClientCategory::C
        };
        cumulative += clients[i].fact;
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .map(String::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct managers, brands and regions of the aggregated rows
pub fn filter_options(rows: &[AggregatedRow]) -> FilterOptions {
    FilterOptions {
        managers: distinct(rows.iter().map(|r| r.manager.as_str())),
        brands: distinct(rows.iter().map(|r| r.brand.as_str())),
        regions: distinct(rows.iter().map(|r| r.region.as_str())),
    }
}

pub fn summarize(
    rows: &[AggregatedRow],
    client_count: usize,
    unidentified_count: usize,
    dropped_rows: usize,
    matched: &PotentialMatch,
) -> SummaryTotals {
    let coverage_pct = if matched.potential_count == 0 {
        0.0
    } else {
        (client_count as f64 / matched.potential_count as f64 * 100.0).min(100.0)
    };
    SummaryTotals {
        fact: rows.iter().map(|r| r.fact).sum(),
        potential: rows.iter().map(|r| r.potential).sum(),
        growth_potential: rows.iter().map(|r| r.growth_potential).sum(),
        client_count,
        unidentified_count,
        dropped_rows,
        potential_count: matched.potential_count,
        covered_count: matched.covered_count,
        coverage_pct,
    }
}
