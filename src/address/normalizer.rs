//! Free-text address normalization

use super::lookup::{fold_text, is_postal_token, RegionLookup};
use super::tables::{KEY_NOISE_TOKENS, STREET_MARKERS};
use crate::model::{MatchSource, ParsedAddress, RegionMatch};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref POSTAL_CODE: Regex = Regex::new(r"(?:^|\D)(\d{5,6})(?:\D|$)").unwrap();
    static ref HOUSE: Regex =
        Regex::new(r"(?i)(?:^|[\s,.])(?:д|дом)\.?\s*(\d+[а-яa-z]?(?:\s*/\s*\d+[а-яa-z]?)?)").unwrap();
    static ref HOUSE_NUMBER: Regex =
        Regex::new(r"(?i)^\d+[а-яa-z]?(?:/\d+[а-яa-z]?)?$").unwrap();
    static ref BUILDING: Regex =
        Regex::new(r"(?i)(?:^|[\s,.])(корп|корпус|к|стр|строение)\.?\s*(\d+[а-яa-z]?)").unwrap();
    static ref TRAILING_NUMBER: Regex =
        Regex::new(r"(?i)^(.*?)[\s,]+(\d+[а-яa-z]?(?:/\d+[а-яa-z]?)?)$").unwrap();
}

/// Words that end a street name and start the house part
const HOUSE_STOP_WORDS: &[&str] = &[
    "д", "дом", "корп", "корпус", "к", "стр", "строение", "лит", "литера", "вл", "владение",
];

/// Normalize an address with the shared lookup tables
pub fn normalize_address(raw: &str) -> ParsedAddress {
    RegionLookup::global().normalize(raw)
}

/// Grouping key of an address: folded text without postal codes and without
/// abbreviation or marker words. "г. Москва, ул. Ленина 1" and
/// "Москва Ленина 1" share the key "москва ленина 1".
pub fn address_key(raw: &str) -> String {
    fold_text(raw)
        .split(' ')
        .filter(|t| !t.is_empty() && !is_postal_token(t) && !KEY_NOISE_TOKENS.contains(t))
        .collect::<Vec<_>>()
        .join(" ")
}

impl RegionLookup {
    /// Break a raw address into region, city, street and house.
    ///
    /// Never fails: text that resolves to nothing yields the unresolved
    /// sentinel with zero confidence.
    pub fn normalize(&self, raw: &str) -> ParsedAddress {
        let raw = raw.trim();
        if raw.is_empty() {
            return ParsedAddress::unresolved();
        }

        let mut parsed = ParsedAddress::unresolved();
        parsed.postal_code = extract_postal_code(raw);

        match self.resolve_region(raw) {
            RegionMatch::Resolved {
                region,
                city,
                source,
            } => {
                parsed.region = region;
                parsed.city = city;
                parsed.source = source;
                parsed.confidence = source.confidence();
            }
            RegionMatch::Ambiguous(candidates) => {
                log::debug!("Ambiguous city in '{}': {:?}", raw, candidates);
                parsed.source = MatchSource::Ambiguous;
                parsed.ambiguous_candidates = candidates;
            }
            RegionMatch::Unresolved => {}
        }

        let (street, house) = self.extract_street_house(raw);
        parsed.street = street;
        parsed.house = house;
        parsed
    }

    fn extract_street_house(&self, raw: &str) -> (Option<String>, Option<String>) {
        let mut house = HOUSE
            .captures(raw)
            .map(|c| c[1].split_whitespace().collect::<String>());

        let segments: Vec<&str> = raw.split(',').map(str::trim).collect();
        let marked = segments.iter().enumerate().find_map(|(i, segment)| {
            self.marked_street(segment).map(|found| (i, found))
        });

        let street = match marked {
            Some((i, (street, segment_house))) => {
                if house.is_none() {
                    // "ул. Республики, 10": the number sits in the next segment
                    house = segment_house.or_else(|| {
                        segments
                            .get(i + 1)
                            .and_then(|next| house_token(next))
                            .map(str::to_string)
                    });
                }
                street
            }
            None => {
                let (fallback_street, fallback_house) = self.street_fallback(raw);
                if house.is_none() {
                    house = fallback_house;
                }
                fallback_street
            }
        };

        if let (Some(h), Some(caps)) = (house.as_mut(), BUILDING.captures(raw)) {
            let kind = caps[1].to_lowercase();
            let short = if kind.starts_with('к') { "к" } else { "стр" };
            h.push_str(&format!(" {}{}", short, &caps[2]));
        }

        (street.filter(|s| s.chars().any(char::is_alphabetic)), house)
    }

    /// Street and house from one comma segment holding a street type word,
    /// either before the name ("ул. Ленина 5") or after it
    /// ("Ленинградское шоссе 16"). `None` when the segment has no such word.
    fn marked_street(&self, segment: &str) -> Option<(Option<String>, Option<String>)> {
        let words: Vec<&str> = segment.split_whitespace().collect();
        let marker = words
            .iter()
            .position(|w| STREET_MARKERS.contains(&fold_text(w).as_str()))?;

        let before: Vec<&str> = words[..marker]
            .iter()
            .copied()
            .filter(|w| {
                let folded = fold_text(w);
                !folded.is_empty() && !self.is_locality_token(&folded) && house_token(w).is_none()
            })
            .collect();
        let after = &words[marker + 1..];

        let postfix = !before.is_empty()
            && after
                .first()
                .map_or(true, |w| house_token(w).is_some() || is_stop_word(w));

        if postfix {
            let house = after.first().and_then(|w| house_token(w)).map(str::to_string);
            return Some((Some(before.join(" ")), house));
        }

        let end = after.iter().position(|w| is_stop_word(w)).unwrap_or(after.len());
        let mut name = after[..end].to_vec();
        let mut house = None;
        if let Some(number) = name.last().and_then(|w| house_token(w)) {
            house = Some(number.to_string());
            name.pop();
        }
        let street = Some(name.join(" ")).filter(|s| !s.is_empty());
        Some((street, house))
    }

    /// Without street markers: the last comma segment ending in a number is
    /// read as "<street words> <house>", minus locality words
    fn street_fallback(&self, raw: &str) -> (Option<String>, Option<String>) {
        for segment in raw.rsplit(',') {
            let segment = segment.trim();
            let Some(caps) = TRAILING_NUMBER.captures(segment) else {
                continue;
            };
            let number = &caps[2];
            if is_postal_token(number) {
                continue;
            }
            let words: Vec<&str> = caps[1]
                .split_whitespace()
                .filter(|w| {
                    let folded = fold_text(w);
                    !folded.is_empty()
                        && !self.is_locality_token(&folded)
                        && !is_postal_token(&folded)
                })
                .collect();
            let street = if words.is_empty() {
                None
            } else {
                Some(words.join(" "))
            };
            return (street, Some(number.to_string()));
        }
        (None, None)
    }
}

/// A house number word such as "16", "4а" or "4/1"; postal codes excluded
fn house_token(word: &str) -> Option<&str> {
    let word = word.trim_matches(|c: char| c == '.' || c == ',');
    (HOUSE_NUMBER.is_match(word) && !is_postal_token(word)).then_some(word)
}

fn is_stop_word(word: &str) -> bool {
    fold_text(word)
        .split(' ')
        .next()
        .map_or(false, |t| HOUSE_STOP_WORDS.contains(&t))
}

fn extract_postal_code(raw: &str) -> Option<String> {
    POSTAL_CODE.captures(raw).map(|c| c[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UNRESOLVED_REGION;

    #[test]
    fn test_explicit_region_beats_postal_code() {
        let parsed = normalize_address("350000, Краснодарский край, г. Краснодар");
        assert_eq!(parsed.region, "Краснодарский край");
        assert_eq!(parsed.source, MatchSource::ExplicitRegion);
        assert_eq!(parsed.postal_code.as_deref(), Some("350000"));
        assert_eq!(parsed.city.as_deref(), Some("Краснодар"));
    }

    #[test]
    fn test_explicit_region_beats_city() {
        let parsed = normalize_address("Московская область, г. Краснодар, ул. Мира 2");
        assert_eq!(parsed.region, "Московская область");
        assert_eq!(parsed.city.as_deref(), Some("Краснодар"));
    }

    #[test]
    fn test_postal_code_without_region() {
        let parsed = normalize_address("620014, ул. Малышева, д. 5");
        assert_eq!(parsed.region, "Свердловская область");
        assert_eq!(parsed.source, MatchSource::PostalCode);
        assert_eq!(parsed.street.as_deref(), Some("Малышева"));
        assert_eq!(parsed.house.as_deref(), Some("5"));
    }

    #[test]
    fn test_postal_code_beats_city() {
        let parsed = normalize_address("141400, г. Москва, ул. Ленина 1");
        assert_eq!(parsed.region, "Московская область");
        assert_eq!(parsed.source, MatchSource::PostalCode);
    }

    #[test]
    fn test_city_and_street() {
        let parsed = normalize_address("г. Москва, ул. Ленина 1");
        assert_eq!(parsed.region, "Москва");
        assert_eq!(parsed.city.as_deref(), Some("Москва"));
        assert_eq!(parsed.source, MatchSource::MarkedCity);
        assert_eq!(parsed.street.as_deref(), Some("Ленина"));
        assert_eq!(parsed.house.as_deref(), Some("1"));
    }

    #[test]
    fn test_street_fallback_without_markers() {
        let parsed = normalize_address("Москва Ленина 1");
        assert_eq!(parsed.region, "Москва");
        assert_eq!(parsed.street.as_deref(), Some("Ленина"));
        assert_eq!(parsed.house.as_deref(), Some("1"));
    }

    #[test]
    fn test_house_with_building() {
        let parsed = normalize_address("г. Казань, ул. Баумана, д. 12, корп. 2");
        assert_eq!(parsed.region, "Республика Татарстан");
        assert_eq!(parsed.street.as_deref(), Some("Баумана"));
        assert_eq!(parsed.house.as_deref(), Some("12 к2"));
    }

    #[test]
    fn test_house_in_next_segment() {
        let parsed = normalize_address("г. Тюмень, ул. Республики, 10");
        assert_eq!(parsed.street.as_deref(), Some("Республики"));
        assert_eq!(parsed.house.as_deref(), Some("10"));
    }

    #[test]
    fn test_street_type_after_name() {
        let parsed = normalize_address("г. Москва, Ленинградское шоссе 16");
        assert_eq!(parsed.street.as_deref(), Some("Ленинградское"));
        assert_eq!(parsed.house.as_deref(), Some("16"));

        let parsed = normalize_address("Самара, Московское ш., 4");
        assert_eq!(parsed.street.as_deref(), Some("Московское"));
        assert_eq!(parsed.house.as_deref(), Some("4"));

        let parsed = normalize_address("Казань, Победы пр-т, д. 7");
        assert_eq!(parsed.street.as_deref(), Some("Победы"));
        assert_eq!(parsed.house.as_deref(), Some("7"));
    }

    #[test]
    fn test_street_is_never_a_bare_number() {
        let parsed = normalize_address("г. Москва, ул. 10");
        assert_eq!(parsed.street, None);
        assert_eq!(parsed.house.as_deref(), Some("10"));

        let parsed = normalize_address("г. Пермь, ул. 8 Марта 5");
        assert_eq!(parsed.street.as_deref(), Some("8 Марта"));
        assert_eq!(parsed.house.as_deref(), Some("5"));
    }

    #[test]
    fn test_ambiguous_is_not_guessed() {
        let parsed = normalize_address("г. Оск, ул. Мира 3");
        assert_eq!(parsed.region, UNRESOLVED_REGION);
        assert_eq!(parsed.source, MatchSource::Ambiguous);
        assert_eq!(parsed.ambiguous_candidates.len(), 2);
        assert_eq!(parsed.confidence, 0.0);
    }

    #[test]
    fn test_total_failure() {
        let parsed = normalize_address("   ");
        assert_eq!(parsed.region, UNRESOLVED_REGION);
        assert_eq!(parsed.confidence, 0.0);
        assert!(!parsed.is_resolved());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = "Респ. Башкортостан, г. Уфа, пр-т Октября, д. 4/1";
        assert_eq!(normalize_address(raw), normalize_address(raw));
    }

    #[test]
    fn test_address_key() {
        assert_eq!(address_key("г. Москва, ул. Ленина 1"), "москва ленина 1");
        assert_eq!(address_key("Москва Ленина 1"), "москва ленина 1");
        assert_eq!(address_key("101000, Москва, улица Ленина, дом 1"), "москва ленина 1");
        assert_eq!(address_key("Орёл, ул. Мира 2"), address_key("г. Орел, ул Мира, 2"));
        assert_eq!(address_key(""), "");
    }
}
