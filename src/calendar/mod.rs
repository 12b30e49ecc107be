// Calendar parsing module
// Turns uploaded ICS bytes into flattened event records

use crate::error::ParseError;
use crate::models::{EventRecord, NOT_AVAILABLE, NO_TITLE};
use crate::utils::logging;
use icalendar::parser::{read_components, Component};
use std::time::Instant;

pub mod common;
pub mod fields;
pub mod properties;
pub mod timezone;

use properties::PropertyMap;
use timezone::TimezoneTable;

/// Events in document order, or the reason there are none.
pub type ParseResult = Result<Vec<EventRecord>, ParseError>;

const CALENDAR_COMPONENT: &str = "VCALENDAR";
const EVENT_COMPONENT: &str = "VEVENT";

/// Parse raw upload bytes.
///
/// Never panics on bad input: anything that does not decode as a calendar
/// comes back as `MalformedInput`, and a calendar without a single VEVENT
/// as `NoEventsFound`.
pub fn parse_ics(raw: &[u8]) -> ParseResult {
    let started = Instant::now();
    let result = common::decode_bytes(raw).and_then(parse_ics_str);
    logging::log_parse_result(raw.len(), &result, started.elapsed().as_millis() as u64);
    result
}

/// Parse calendar text that is already known to be UTF-8.
pub fn parse_ics_str(ics_data: &str) -> ParseResult {
    let prepared = common::prepare_input(ics_data)?;
    let components = read_components(&prepared).map_err(|e| ParseError::malformed(e.to_string()))?;
    let root = single_calendar_root(&components)?;

    let zones = TimezoneTable::from_root(root);
    let mut events = Vec::new();
    collect_events(root, &zones, &mut events);

    if events.is_empty() {
        return Err(ParseError::no_events());
    }

    Ok(events)
}

/// The document must be exactly one VCALENDAR; the component parser
/// silently drops or splits anything else.
fn single_calendar_root<'c, 'a>(
    components: &'c [Component<'a>],
) -> Result<&'c Component<'a>, ParseError> {
    match components {
        [root] => {
            let name: &str = root.name.as_ref();
            if name.eq_ignore_ascii_case(CALENDAR_COMPONENT) {
                Ok(root)
            } else {
                Err(ParseError::malformed(format!(
                    "expected a VCALENDAR root, found {}",
                    name
                )))
            }
        }
        _ => Err(ParseError::malformed(format!(
            "expected a single VCALENDAR root, found {} components",
            components.len()
        ))),
    }
}

/// Depth-first, pre-order: a component is visited before its children.
fn collect_events(component: &Component<'_>, zones: &TimezoneTable, events: &mut Vec<EventRecord>) {
    let name: &str = component.name.as_ref();
    if name.eq_ignore_ascii_case(EVENT_COMPONENT) {
        let event = convert_event(component, zones);
        log::debug!("Parsed event: {} ({})", event.summary, event.start);
        events.push(event);
    }

    for child in &component.components {
        collect_events(child, zones, events);
    }
}

fn convert_event(component: &Component<'_>, zones: &TimezoneTable) -> EventRecord {
    let props = PropertyMap::of(component);

    let summary = props.text("SUMMARY").unwrap_or_else(|| NO_TITLE.to_string());

    let description = props
        .text("DESCRIPTION")
        .map(|text| fields::parse_description(text.trim()))
        .unwrap_or_default();

    let start = props
        .timestamp("DTSTART", zones)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let end = props
        .timestamp("DTEND", zones)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let location = props
        .text("LOCATION")
        .map(|text| text.trim().to_string())
        .unwrap_or_default();

    let recurrence = props
        .raw("RRULE")
        .map(|rule| fields::parse_recurrence(&fields::canonical_rule(rule)));

    EventRecord {
        summary,
        description,
        start,
        end,
        location,
        recurrence,
    }
}
