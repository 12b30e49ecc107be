//! Typed, presence-explicit access to the properties of one component.

use super::common;
use super::timezone::TimezoneTable;
use icalendar::parser::{Component, Property};

/// Read-only view over a component's properties.
///
/// Names are matched case-insensitively; when a property repeats, the
/// first occurrence wins. Every accessor returns `None` for an absent
/// property so callers pick their own defaults.
pub struct PropertyMap<'c, 'a> {
    properties: &'c [Property<'a>],
}

impl<'c, 'a> PropertyMap<'c, 'a> {
    pub fn of(component: &'c Component<'a>) -> Self {
        Self {
            properties: &component.properties,
        }
    }

    pub fn get(&self, name: &str) -> Option<&'c Property<'a>> {
        self.properties.iter().find(|p| {
            let prop_name: &str = p.name.as_ref();
            prop_name.eq_ignore_ascii_case(name)
        })
    }

    /// Value exactly as it appears in the file.
    pub fn raw(&self, name: &str) -> Option<&'c str> {
        self.get(name).map(|p| p.val.as_ref())
    }

    /// TEXT value with RFC 5545 escapes resolved.
    pub fn text(&self, name: &str) -> Option<String> {
        self.raw(name).map(common::unescape_text)
    }

    /// Date or date-time value rendered as ISO-8601 text, with TZID offsets
    /// taken from `zones`.
    pub fn timestamp(&self, name: &str, zones: &TimezoneTable) -> Option<String> {
        self.get(name).map(|p| common::render_timestamp(p, zones))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icalendar::parser::{read_components, unfold};

    const EVENT: &str = "BEGIN:VCALENDAR\n\
BEGIN:VEVENT\n\
summary:lower case name\n\
SUMMARY:second summary\n\
LOCATION:Room 1\\, east wing\n\
DTSTART;VALUE=DATE:20250401\n\
END:VEVENT\n\
END:VCALENDAR\n";

    fn with_event<F: FnOnce(PropertyMap<'_, '_>)>(check: F) {
        let unfolded = unfold(EVENT);
        let roots = read_components(&unfolded).unwrap();
        let mut stack: Vec<&Component<'_>> = roots.iter().collect();
        while let Some(component) = stack.pop() {
            let name: &str = component.name.as_ref();
            if name == "VEVENT" {
                return check(PropertyMap::of(component));
            }
            stack.extend(component.components.iter());
        }
        panic!("fixture has no VEVENT");
    }

    #[test]
    fn test_lookup_is_case_insensitive_and_first_wins() {
        with_event(|props| {
            assert_eq!(props.raw("SUMMARY"), Some("lower case name"));
            assert_eq!(props.raw("location"), Some("Room 1\\, east wing"));
        });
    }

    #[test]
    fn test_absent_property_is_none() {
        with_event(|props| {
            assert!(props.get("RRULE").is_none());
            assert!(props.text("DESCRIPTION").is_none());
            assert!(props.timestamp("DTEND", &TimezoneTable::default()).is_none());
        });
    }

    #[test]
    fn test_text_and_timestamp_accessors() {
        with_event(|props| {
            assert_eq!(props.text("LOCATION").as_deref(), Some("Room 1, east wing"));
            let zones = TimezoneTable::default();
            assert_eq!(props.timestamp("DTSTART", &zones).as_deref(), Some("2025-04-01"));
        });
    }
}
