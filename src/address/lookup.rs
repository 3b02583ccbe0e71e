//! The canonical region lookup service
//!
//! Every region, city and postal-code table the crate knows about is compiled
//! once into a [`RegionLookup`]. Callers go through [`RegionLookup::resolve_region`]
//! (or the address normalizer built on top of it) instead of consulting tables directly.

use super::tables::{
    CITIES, CITY_MARKERS, KEY_NOISE_TOKENS, POSTAL_PREFIXES, REGIONS, STREET_MARKERS,
};
use crate::model::{MatchSource, RegionMatch};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};

lazy_static! {
    static ref GLOBAL_LOOKUP: RegionLookup = RegionLookup::build();
    static ref COMPOUND_ABBREVIATIONS: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"пр-кт|пр-т").unwrap(), " проспект "),
        (Regex::new(r"б-р").unwrap(), " бульвар "),
        (Regex::new(r"мкр-н").unwrap(), " микрорайон "),
        (Regex::new(r"р-н").unwrap(), " район "),
    ];
}

/// Lowercase, fold `ё` into `е`, expand hyphenated abbreviations and turn all
/// punctuation into single spaces
pub fn fold_text(text: &str) -> String {
    let mut lower = text.to_lowercase().replace('ё', "е");
    for (re, replacement) in COMPOUND_ABBREVIATIONS.iter() {
        lower = re.replace_all(&lower, *replacement).into_owned();
    }

    let mut out = String::with_capacity(lower.len());
    let mut pending_space = false;
    for c in lower.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Postal-code-like token: 5 or 6 digits
pub fn is_postal_token(token: &str) -> bool {
    (5..=6).contains(&token.len()) && token.chars().all(|c| c.is_ascii_digit())
}

struct RegionEntry {
    name: &'static str,
    markers: &'static [&'static str],
    stems: Vec<Vec<String>>,
    aliases: Vec<Vec<String>>,
}

struct CityEntry {
    tokens: Vec<String>,
    folded: String,
    display: &'static str,
    region: &'static str,
}

/// A city found in an address
#[derive(Debug, Clone, PartialEq)]
pub struct CityHit {
    pub city: &'static str,
    pub region: &'static str,
    /// Preceded by "г", "город", ...
    pub marked: bool,
}

/// Outcome of edit-distance city matching
#[derive(Debug, Clone, PartialEq)]
pub enum FuzzyCity {
    NoMatch,
    Found { city: Option<&'static str>, region: &'static str, distance: usize },
    Ambiguous(Vec<String>),
}

pub struct RegionLookup {
    regions: Vec<RegionEntry>,
    /// Longest token sequences first so "нижний новгород" wins over shorter names
    cities: Vec<CityEntry>,
    canonical: HashMap<String, &'static str>,
}

impl RegionLookup {
    /// Shared instance built from the static tables on first use
    pub fn global() -> &'static RegionLookup {
        &GLOBAL_LOOKUP
    }

    pub fn build() -> Self {
        let split = |s: &str| -> Vec<String> { s.split_whitespace().map(String::from).collect() };

        let regions: Vec<RegionEntry> = REGIONS
            .iter()
            .map(|def| RegionEntry {
                name: def.name,
                markers: def.kind.markers(),
                stems: def.stems.iter().map(|s| split(s)).collect(),
                aliases: def.aliases.iter().map(|s| split(s)).collect(),
            })
            .collect();

        let mut cities: Vec<CityEntry> = CITIES
            .iter()
            .map(|&(folded, display, region)| CityEntry {
                tokens: split(folded),
                folded: folded.to_string(),
                display,
                region,
            })
            .collect();
        cities.sort_by(|a, b| b.tokens.len().cmp(&a.tokens.len()));

        let canonical = REGIONS
            .iter()
            .map(|def| (fold_text(def.name), def.name))
            .collect();

        RegionLookup {
            regions,
            cities,
            canonical,
        }
    }

    /// Resolve free text (a region cell, a full address, ...) to a canonical region.
    ///
    /// Order: canonical region name, explicit region keyword, postal code,
    /// known city, fuzzy city.
    pub fn resolve_region(&self, candidate: &str) -> RegionMatch {
        let folded = fold_text(candidate);
        if folded.is_empty() {
            return RegionMatch::Unresolved;
        }
        let tokens: Vec<&str> = folded.split(' ').collect();
        let city = self.find_city(&tokens);

        if let Some(region) = self.canonical.get(&folded) {
            return RegionMatch::Resolved {
                region: region.to_string(),
                city: city.map(|c| c.city.to_string()),
                source: MatchSource::ExplicitRegion,
            };
        }

        if let Some(region) = self.explicit_region(&tokens) {
            return RegionMatch::Resolved {
                region: region.to_string(),
                city: city.map(|c| c.city.to_string()),
                source: MatchSource::ExplicitRegion,
            };
        }

        if let Some(region) = tokens.iter().find_map(|t| self.postal_region(t)) {
            return RegionMatch::Resolved {
                region: region.to_string(),
                city: city.map(|c| c.city.to_string()),
                source: MatchSource::PostalCode,
            };
        }

        if let Some(hit) = city {
            return RegionMatch::Resolved {
                region: hit.region.to_string(),
                city: Some(hit.city.to_string()),
                source: if hit.marked {
                    MatchSource::MarkedCity
                } else {
                    MatchSource::City
                },
            };
        }

        match self.fuzzy_city(&tokens) {
            FuzzyCity::Found { city, region, .. } => RegionMatch::Resolved {
                region: region.to_string(),
                city: city.map(String::from),
                source: MatchSource::FuzzyCity,
            },
            FuzzyCity::Ambiguous(candidates) => RegionMatch::Ambiguous(candidates),
            FuzzyCity::NoMatch => RegionMatch::Unresolved,
        }
    }

    /// Region named explicitly: a stem next to a marker of its kind
    /// ("краснодарского края", "обл. московская") or a standalone alias.
    /// The longest match wins, then the earliest.
    pub fn explicit_region(&self, tokens: &[&str]) -> Option<&'static str> {
        let mut best: Option<(usize, usize, &'static str)> = None;
        let mut consider = |len: usize, start: usize, name: &'static str| {
            let better = match best {
                None => true,
                Some((best_len, best_start, _)) => {
                    len > best_len || (len == best_len && start < best_start)
                }
            };
            if better {
                best = Some((len, start, name));
            }
        };

        for entry in &self.regions {
            for stem in &entry.stems {
                for start in 0..tokens.len() {
                    if !sequence_matches(tokens, start, stem, |t, s| t.starts_with(s)) {
                        continue;
                    }
                    let end = start + stem.len();
                    let after = tokens.get(end).map_or(false, |t| entry.markers.contains(t));
                    let before = start > 0 && entry.markers.contains(&tokens[start - 1]);
                    if after || before {
                        consider(stem.len(), start, entry.name);
                    }
                }
            }
            for alias in &entry.aliases {
                for start in 0..tokens.len() {
                    if sequence_matches(tokens, start, alias, |t, s| t == s) {
                        consider(alias.len(), start, entry.name);
                    }
                }
            }
        }

        best.map(|(_, _, name)| name)
    }

    /// Region for a 6-digit postal code by its 3-digit prefix
    pub fn postal_region(&self, code: &str) -> Option<&'static str> {
        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let prefix: u16 = code[..3].parse().ok()?;
        POSTAL_PREFIXES
            .iter()
            .find(|(start, end, _)| (*start..=*end).contains(&prefix))
            .map(|(_, _, region)| *region)
    }

    /// Known city by exact token match; a city preceded by a city marker is
    /// preferred, otherwise the first one in the text
    pub fn find_city(&self, tokens: &[&str]) -> Option<CityHit> {
        let mut first: Option<(usize, CityHit)> = None;

        for start in 0..tokens.len() {
            for city in &self.cities {
                if !sequence_matches(tokens, start, &city.tokens, |t, s| t == s) {
                    continue;
                }
                let marked = start > 0 && CITY_MARKERS.contains(&tokens[start - 1]);
                let hit = CityHit {
                    city: city.display,
                    region: city.region,
                    marked,
                };
                if marked {
                    return Some(hit);
                }
                if first.as_ref().map_or(true, |(pos, _)| start < *pos) {
                    first = Some((start, hit));
                }
                break;
            }
        }

        first.map(|(_, hit)| hit)
    }

    /// Edit-distance match against known city names.
    ///
    /// The threshold grows with the word length (`max(1, len / 4)`). When the
    /// closest cities belong to different regions the candidates are returned
    /// instead of a guess.
    pub fn fuzzy_city(&self, tokens: &[&str]) -> FuzzyCity {
        let candidates = fuzzy_candidates(tokens);
        let mut best_distance = usize::MAX;
        let mut best: Vec<&CityEntry> = Vec::new();

        for candidate in &candidates {
            let len = candidate.chars().count();
            let threshold = (len / 4).max(1);
            for city in &self.cities {
                let city_len = city.folded.chars().count();
                if city_len.abs_diff(len) > threshold {
                    continue;
                }
                let distance = strsim::levenshtein(candidate, &city.folded);
                if distance == 0 || distance > threshold {
                    continue;
                }
                if distance < best_distance {
                    best_distance = distance;
                    best.clear();
                }
                if distance == best_distance && !best.iter().any(|c| c.folded == city.folded) {
                    best.push(city);
                }
            }
        }

        if best.is_empty() {
            return FuzzyCity::NoMatch;
        }

        let regions: BTreeSet<&'static str> = best.iter().map(|c| c.region).collect();
        if regions.len() > 1 {
            let mut names: Vec<String> = best
                .iter()
                .map(|c| format!("{} ({})", c.display, c.region))
                .collect();
            names.sort();
            return FuzzyCity::Ambiguous(names);
        }

        let city = if best.len() == 1 { Some(best[0].display) } else { None };
        FuzzyCity::Found {
            city,
            region: best[0].region,
            distance: best_distance,
        }
    }

    /// Whether the folded token is a known city or region marker; used when
    /// stripping locality words from a street fallback
    pub fn is_locality_token(&self, token: &str) -> bool {
        CITY_MARKERS.contains(&token)
            || self.cities.iter().any(|c| c.tokens.iter().any(|t| t == token))
    }
}

fn sequence_matches<F>(tokens: &[&str], start: usize, pattern: &[String], eq: F) -> bool
where
    F: Fn(&str, &str) -> bool,
{
    if pattern.is_empty() || start + pattern.len() > tokens.len() {
        return false;
    }
    pattern
        .iter()
        .enumerate()
        .all(|(i, p)| eq(tokens[start + i], p.as_str()))
}

/// Words worth comparing against city names: the words after a city marker
/// when there is one, otherwise every non-numeric word that is not an
/// abbreviation and does not follow a street marker
fn fuzzy_candidates(tokens: &[&str]) -> Vec<String> {
    let mut out = Vec::new();

    let marked: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| CITY_MARKERS.contains(*t))
        .map(|(i, _)| i + 1)
        .filter(|i| *i < tokens.len())
        .collect();

    if !marked.is_empty() {
        for i in marked {
            out.push(tokens[i].to_string());
            if let Some(next) = tokens.get(i + 1) {
                out.push(format!("{} {}", tokens[i], next));
            }
        }
        return out;
    }

    for (i, token) in tokens.iter().enumerate() {
        let usable = |t: &str| {
            t.chars().count() >= 4
                && !t.chars().any(|c| c.is_ascii_digit())
                && !KEY_NOISE_TOKENS.contains(&t)
        };
        if !usable(*token) {
            continue;
        }
        if i > 0 && STREET_MARKERS.contains(&tokens[i - 1]) {
            continue;
        }
        out.push(token.to_string());
        if let Some(next) = tokens.get(i + 1).filter(|t| usable(**t)) {
            out.push(format!("{} {}", token, next));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(text: &str) -> RegionMatch {
        RegionLookup::global().resolve_region(text)
    }

    #[test]
    fn test_fold_text() {
        assert_eq!(fold_text("г.Москва, ул. Ленина,  1"), "г москва ул ленина 1");
        assert_eq!(fold_text("Орёл"), "орел");
        assert_eq!(fold_text("Ленинский пр-т, 5"), "ленинский проспект 5");
    }

    #[test]
    fn test_explicit_region_genitive() {
        assert_eq!(
            resolve("пос. Южный, Краснодарского края").region(),
            Some("Краснодарский край")
        );
        assert_eq!(resolve("обл. Московская, Химки").region(), Some("Московская область"));
        assert_eq!(resolve("Респ. Татарстан").region(), Some("Республика Татарстан"));
    }

    #[test]
    fn test_longest_stem_wins() {
        assert_eq!(
            resolve("Ямало-Ненецкий автономный округ, г. Салехард").region(),
            Some("Ямало-Ненецкий автономный округ")
        );
        assert_eq!(
            resolve("Ненецкий АО, Нарьян-Мар").region(),
            Some("Ненецкий автономный округ")
        );
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(resolve("Краснодарский край").region(), Some("Краснодарский край"));
        assert_eq!(resolve("Москва").region(), Some("Москва"));
    }

    #[test]
    fn test_postal_region() {
        let lookup = RegionLookup::global();
        assert_eq!(lookup.postal_region("350000"), Some("Краснодарский край"));
        assert_eq!(lookup.postal_region("190000"), Some("Санкт-Петербург"));
        assert_eq!(lookup.postal_region("35000"), None);
        assert_eq!(lookup.postal_region("000123"), None);
    }

    #[test]
    fn test_marked_city_preferred() {
        let folded = fold_text("ул. Тула, г. Калуга");
        let tokens: Vec<&str> = folded.split(' ').collect();
        let hit = RegionLookup::global().find_city(&tokens).unwrap();
        assert_eq!(hit.city, "Калуга");
        assert!(hit.marked);
    }

    #[test]
    fn test_multiword_city() {
        match resolve("Нижний Новгород, ул. Минина 3") {
            RegionMatch::Resolved { region, city, source } => {
                assert_eq!(region, "Нижегородская область");
                assert_eq!(city.as_deref(), Some("Нижний Новгород"));
                assert_eq!(source, MatchSource::City);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fuzzy_city() {
        match resolve("г. Краснадар, ул. Северная 10") {
            RegionMatch::Resolved { region, source, .. } => {
                assert_eq!(region, "Краснодарский край");
                assert_eq!(source, MatchSource::FuzzyCity);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fuzzy_tie_is_ambiguous() {
        let lookup = RegionLookup::global();
        assert!(matches!(
            lookup.fuzzy_city(&["г", "омскк"]),
            FuzzyCity::Found { region: "Омская область", distance: 1, .. }
        ));

        // one edit from both Омск and Орск
        match lookup.fuzzy_city(&["г", "оск"]) {
            FuzzyCity::Ambiguous(candidates) => {
                assert_eq!(
                    candidates,
                    vec![
                        "Омск (Омская область)".to_string(),
                        "Орск (Оренбургская область)".to_string()
                    ]
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unresolved() {
        assert_eq!(resolve(""), RegionMatch::Unresolved);
        assert_eq!(resolve("абвгд еёжз"), RegionMatch::Unresolved);
    }
}
