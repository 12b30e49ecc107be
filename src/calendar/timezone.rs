//! UTC offsets for TZID-qualified times, resolved from the VTIMEZONE
//! definitions embedded in the uploaded file. No tz database is consulted:
//! a TZID without a matching VTIMEZONE stays unresolved.

use super::properties::PropertyMap;
use chrono::{Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};
use icalendar::parser::Component;
use rrule::RRuleSet;
use std::collections::HashMap;

const TIMEZONE_COMPONENT: &str = "VTIMEZONE";

/// One STANDARD or DAYLIGHT block of a VTIMEZONE.
struct Observance {
    onset: NaiveDateTime,
    offset_from: FixedOffset,
    offset_to: FixedOffset,
    rule: Option<RRuleSet>,
}

impl Observance {
    fn from_component(component: &Component<'_>) -> Option<Self> {
        let props = PropertyMap::of(component);
        let onset = parse_local_datetime(props.raw("DTSTART")?)?;
        let offset_to = parse_utc_offset(props.raw("TZOFFSETTO")?)?;
        let offset_from = props
            .raw("TZOFFSETFROM")
            .and_then(parse_utc_offset)
            .unwrap_or(offset_to);

        // Wall-clock onsets are expanded as if they were UTC, so the
        // occurrences come back as the same wall-clock values.
        let rule = props.raw("RRULE").and_then(|rule| {
            let rule_set = format!("DTSTART:{}Z\nRRULE:{}", onset.format("%Y%m%dT%H%M%S"), rule.trim());
            match rule_set.parse::<RRuleSet>() {
                Ok(set) => Some(set),
                Err(e) => {
                    log::debug!("Ignoring unusable VTIMEZONE RRULE {:?}: {}", rule, e);
                    None
                }
            }
        });

        Some(Self {
            onset,
            offset_from,
            offset_to,
            rule,
        })
    }

    /// Latest onset of this observance at or before `local`.
    fn last_onset_until(&self, local: NaiveDateTime) -> Option<NaiveDateTime> {
        if local < self.onset {
            return None;
        }

        let rule = match &self.rule {
            Some(rule) => rule,
            None => return Some(self.onset),
        };

        let tz: rrule::Tz = Utc.into();
        let bound = Utc
            .from_utc_datetime(&(local + Duration::seconds(1)))
            .with_timezone(&tz);
        let result = rule.clone().before(bound).all(u16::MAX);

        result
            .dates
            .last()
            .map(|dt| dt.naive_utc())
            .or(Some(self.onset))
    }
}

/// Every VTIMEZONE in a calendar, keyed by TZID.
#[derive(Default)]
pub struct TimezoneTable {
    zones: HashMap<String, Vec<Observance>>,
}

impl TimezoneTable {
    pub fn from_root(root: &Component<'_>) -> Self {
        let mut table = Self::default();
        table.collect(root);
        table
    }

    fn collect(&mut self, component: &Component<'_>) {
        let name: &str = component.name.as_ref();
        if name.eq_ignore_ascii_case(TIMEZONE_COMPONENT) {
            if let Some(tzid) = PropertyMap::of(component).raw("TZID") {
                let observances: Vec<Observance> = component
                    .components
                    .iter()
                    .filter_map(Observance::from_component)
                    .collect();
                if !observances.is_empty() {
                    self.zones.insert(tzid.trim().to_string(), observances);
                }
            }
        }

        for child in &component.components {
            self.collect(child);
        }
    }

    /// Offset in force at wall-clock time `local` in zone `tzid`.
    pub fn resolve(&self, tzid: &str, local: NaiveDateTime) -> Option<FixedOffset> {
        let observances = self.zones.get(tzid.trim())?;

        let latest = observances
            .iter()
            .filter_map(|obs| obs.last_onset_until(local).map(|onset| (onset, obs.offset_to)))
            .max_by_key(|(onset, _)| *onset);

        match latest {
            Some((_, offset)) => Some(offset),
            // Before the first recorded onset.
            None => observances
                .iter()
                .min_by_key(|obs| obs.onset)
                .map(|obs| obs.offset_from),
        }
    }
}

fn parse_local_datetime(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y%m%dT%H%M%S").ok()
}

/// `+HHMM`, `-HHMM` or `+HHMMSS`.
fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    let sign = match raw.chars().next()? {
        '+' => 1,
        '-' => -1,
        _ => return None,
    };
    let digits = &raw[1..];
    if !(digits.len() == 4 || digits.len() == 6) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hours: i32 = digits[0..2].parse().ok()?;
    let minutes: i32 = digits[2..4].parse().ok()?;
    let seconds: i32 = if digits.len() == 6 { digits[4..6].parse().ok()? } else { 0 };

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60 + seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use icalendar::parser::{read_components, unfold};

    const NEW_YORK: &str = "BEGIN:VCALENDAR\n\
BEGIN:VTIMEZONE\n\
TZID:America/New_York\n\
BEGIN:DAYLIGHT\n\
TZOFFSETFROM:-0500\n\
TZOFFSETTO:-0400\n\
DTSTART:20070311T020000\n\
RRULE:FREQ=YEARLY;BYMONTH=3;BYDAY=2SU\n\
END:DAYLIGHT\n\
BEGIN:STANDARD\n\
TZOFFSETFROM:-0400\n\
TZOFFSETTO:-0500\n\
DTSTART:20071104T020000\n\
RRULE:FREQ=YEARLY;BYMONTH=11;BYDAY=1SU\n\
END:STANDARD\n\
END:VTIMEZONE\n\
BEGIN:VTIMEZONE\n\
TZID:Asia/Kolkata\n\
BEGIN:STANDARD\n\
TZOFFSETFROM:+0530\n\
TZOFFSETTO:+0530\n\
DTSTART:19700101T000000\n\
END:STANDARD\n\
END:VTIMEZONE\n\
END:VCALENDAR\n";

    fn with_table<F: FnOnce(&TimezoneTable)>(check: F) {
        let unfolded = unfold(NEW_YORK);
        let roots = read_components(&unfolded).unwrap();
        check(&TimezoneTable::from_root(&roots[0]));
    }

    fn at(text: &str) -> NaiveDateTime {
        parse_local_datetime(text).unwrap()
    }

    fn hours(h: i32) -> FixedOffset {
        FixedOffset::east_opt(h * 3600).unwrap()
    }

    #[test]
    fn test_recurring_observances_pick_the_season() {
        with_table(|table| {
            assert_eq!(table.resolve("America/New_York", at("20250106T090000")), Some(hours(-5)));
            assert_eq!(table.resolve("America/New_York", at("20250701T090000")), Some(hours(-4)));
            assert_eq!(table.resolve("America/New_York", at("20251215T090000")), Some(hours(-5)));
        });
    }

    #[test]
    fn test_before_first_onset_uses_offset_from() {
        with_table(|table| {
            assert_eq!(table.resolve("America/New_York", at("20000101T000000")), Some(hours(-5)));
        });
    }

    #[test]
    fn test_fixed_zone_and_unknown_zone() {
        with_table(|table| {
            assert_eq!(
                table.resolve("Asia/Kolkata", at("20250101T120000")),
                FixedOffset::east_opt(5 * 3600 + 1800)
            );
            assert_eq!(table.resolve("Europe/Berlin", at("20250101T120000")), None);
        });
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("-0500"), Some(hours(-5)));
        assert_eq!(parse_utc_offset("+053000"), FixedOffset::east_opt(5 * 3600 + 1800));
        assert_eq!(parse_utc_offset("0500"), None);
        assert_eq!(parse_utc_offset("+5"), None);
        assert_eq!(parse_utc_offset(""), None);
    }
}
