use super::timezone::TimezoneTable;
use crate::error::ParseError;
use icalendar::parser::{unfold, Property};
use icalendar::{CalendarDateTime, DatePerhapsTime};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decode raw upload bytes as UTF-8, dropping a leading byte-order mark.
pub fn decode_bytes(raw: &[u8]) -> Result<&str, ParseError> {
    let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    std::str::from_utf8(raw)
        .map_err(|e| ParseError::malformed(format!("input is not valid UTF-8: {}", e)))
}

/// Unfold continuation lines and check the root markers before handing the
/// text to the component parser.
pub fn prepare_input(ics_data: &str) -> Result<String, ParseError> {
    let unfolded = unfold(ics_data);
    let content = unfolded.trim();

    let first_line = match content.lines().next() {
        Some(line) => line.trim(),
        None => return Err(ParseError::malformed("input is empty, expected BEGIN:VCALENDAR")),
    };

    if !first_line.eq_ignore_ascii_case("BEGIN:VCALENDAR") {
        let preview: String = first_line.chars().take(40).collect();
        return Err(ParseError::malformed(format!(
            "expected BEGIN:VCALENDAR, found {:?}",
            preview
        )));
    }

    let last_line = content.lines().last().map(str::trim).unwrap_or_default();
    if !last_line.eq_ignore_ascii_case("END:VCALENDAR") {
        let preview: String = last_line.chars().take(40).collect();
        return Err(ParseError::malformed(format!(
            "expected END:VCALENDAR as the last line, found {:?}",
            preview
        )));
    }

    // The component parser wants every content line terminated.
    let mut prepared = content.to_string();
    prepared.push('\n');
    Ok(prepared)
}

/// Undo RFC 5545 TEXT escaping.
pub fn unescape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(escaped @ (',' | ';' | '\\')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

/// Render a DTSTART/DTEND-style property as extended ISO-8601 text.
///
/// Values that are neither a date nor a date-time fall back to the raw
/// property text.
pub fn render_timestamp(property: &Property<'_>, zones: &TimezoneTable) -> String {
    match DatePerhapsTime::try_from(property) {
        Ok(value) => render_date_perhaps_time(&value, zones),
        Err(_) => {
            let raw: &str = property.val.as_ref();
            raw.trim().to_string()
        }
    }
}

/// UTC values carry `+00:00` and floating values carry no offset. Zoned
/// values get the offset of their embedded VTIMEZONE, or keep the TZID as a
/// bracketed suffix when the file does not define that zone.
pub fn render_date_perhaps_time(value: &DatePerhapsTime, zones: &TimezoneTable) -> String {
    match value {
        DatePerhapsTime::Date(date) => date.format("%Y-%m-%d").to_string(),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => dt.to_rfc3339(),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => {
            naive.format("%Y-%m-%dT%H:%M:%S").to_string()
        }
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            match zones
                .resolve(tzid, *date_time)
                .and_then(|offset| date_time.and_local_timezone(offset).single())
            {
                Some(zoned) => zoned.to_rfc3339(),
                None => format!("{}[{}]", date_time.format("%Y-%m-%dT%H:%M:%S"), tzid),
            }
        }
    }
}
