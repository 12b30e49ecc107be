//! Decomposition of free-form DESCRIPTION text and RRULE values into
//! key/value maps.

use crate::models::FieldMap;

const DESCRIPTION_DELIMITER: &str = ": ";

/// One `key: value` pair per line. Lines without `": "` are skipped.
pub fn parse_description(text: &str) -> FieldMap {
    text.lines()
        .filter_map(|line| line.split_once(DESCRIPTION_DELIMITER))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// `KEY=VALUE` parts separated by `;`. Parts without `=` are skipped and a
/// blank rule gives an empty map.
pub fn parse_recurrence(rule: &str) -> FieldMap {
    if rule.trim().is_empty() {
        return FieldMap::new();
    }

    rule.split(';')
        .filter_map(|part| part.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Canonical textual form of an RRULE value: trimmed, rule part names
/// upper-cased, values untouched.
pub fn canonical_rule(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    raw.split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) => format!("{}={}", key.trim().to_ascii_uppercase(), value.trim()),
            None => part.trim().to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}
