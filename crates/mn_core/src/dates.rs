use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Wire format used by the reporting endpoints.
pub const WIRE_FORMAT: &str = "%d/%m/%Y %H:%M";

pub fn parse_wire(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), WIRE_FORMAT).ok()
}

pub fn format_wire(value: DateTime<Utc>) -> String {
    value.format(WIRE_FORMAT).to_string()
}

/// Expands a range endpoint to the first instant of its day.
pub fn start_of_day(value: NaiveDateTime) -> DateTime<Utc> {
    let floored = value.date().and_hms_opt(0, 0, 0).unwrap_or(value);
    Utc.from_utc_datetime(&floored)
}

/// Expands a range endpoint to the last whole second of its day.
pub fn end_of_day(value: NaiveDateTime) -> DateTime<Utc> {
    let ceiled = value.date().and_hms_opt(23, 59, 59).unwrap_or(value);
    Utc.from_utc_datetime(&ceiled)
}

/// Parses an ISO-8601 offset timestamp (the `datetime` attribute of the
/// article `<time>` element). Unparsable input yields `None`.
pub fn parse_publish_datetime(value: &str) -> Option<DateTime<Utc>> {
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_wire_accepts_fixed_pattern() {
        let parsed = parse_wire("14/11/2025 09:30").unwrap();
        assert_eq!(parsed.date().to_string(), "2025-11-14");
        assert_eq!(parsed.hour(), 9);
        assert_eq!(parsed.minute(), 30);
    }

    #[test]
    fn test_parse_wire_rejects_other_patterns() {
        assert!(parse_wire("2025-11-14 09:30").is_none());
        assert!(parse_wire("14/11/2025").is_none());
        assert!(parse_wire("").is_none());
    }

    #[test]
    fn test_day_bounds() {
        let parsed = parse_wire("14/11/2025 09:30").unwrap();
        assert_eq!(start_of_day(parsed).to_rfc3339(), "2025-11-14T00:00:00+00:00");
        assert_eq!(end_of_day(parsed).to_rfc3339(), "2025-11-14T23:59:59+00:00");
    }

    #[test]
    fn test_parse_publish_datetime_converts_offset_to_utc() {
        let parsed = parse_publish_datetime("2024-01-15T10:00:00-03:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-01-15T13:00:00+00:00");
    }

    #[test]
    fn test_parse_publish_datetime_swallows_garbage() {
        assert!(parse_publish_datetime("").is_none());
        assert!(parse_publish_datetime("ontem").is_none());
        assert!(parse_publish_datetime("2024-01-15").is_none());
    }
}
