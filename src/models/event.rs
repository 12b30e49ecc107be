// file: src/models/event.rs
use super::FieldMap;
use serde::{Deserialize, Serialize};

/// Summary used when a VEVENT carries no SUMMARY property.
pub const NO_TITLE: &str = "No Title";

/// Placeholder for a missing DTSTART or DTEND.
pub const NOT_AVAILABLE: &str = "N/A";

/// One VEVENT, flattened into the shape handed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub summary: String,
    pub description: FieldMap,
    pub start: String,
    pub end: String,
    pub location: String,
    /// `None` only when the event has no RRULE at all.
    pub recurrence: Option<FieldMap>,
}

impl Default for EventRecord {
    fn default() -> Self {
        Self {
            summary: NO_TITLE.to_string(),
            description: FieldMap::new(),
            start: NOT_AVAILABLE.to_string(),
            end: NOT_AVAILABLE.to_string(),
            location: String::new(),
            recurrence: None,
        }
    }
}
