//! Small helpers shared by both pages: timestamp formatting, query-string
//! lookup, and HTML escaping.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use regex::Regex;

/// Display format for dates: `dd.mm.yyyy HH:MM:SS`.
pub const DATE_TIME_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Formats a backend timestamp for display.
///
/// Returns `""` for a missing or empty value. Input that cannot be parsed as a
/// timestamp is returned unchanged, so a bad value from the server still shows
/// up instead of breaking the page.
pub fn format_date(input: Option<&str>) -> String {
    let raw = match input {
        Some(s) if !s.is_empty() => s,
        _ => return String::new(),
    };

    match parse_timestamp(raw) {
        Some(dt) => dt.format(DATE_TIME_FORMAT).to_string(),
        None => raw.to_string(),
    }
}

/// Parses the timestamp shapes the backend produces into local wall-clock time.
///
/// Accepts RFC 3339 (converted to the local zone), naive ISO 8601 with or
/// without fractional seconds (taken as local), and bare `YYYY-MM-DD` dates.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Extracts and decodes a single query-string parameter.
///
/// `location` may be a full URL, a `?`-prefixed search string, or a bare query
/// string as handed over by the HTTP layer. `+` decodes to a space and
/// percent-escapes are decoded afterwards. Returns `""` if the parameter is
/// absent.
pub fn get_url_parameter(location: &str, name: &str) -> String {
    let search = match location.find('?') {
        Some(idx) => location[idx..].to_string(),
        None => format!("?{}", location),
    };

    let pattern = format!(r"[?&]{}=([^&#]*)", regex::escape(name));
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(_) => return String::new(),
    };

    match re.captures(&search).and_then(|c| c.get(1)) {
        Some(m) => decode_component(&m.as_str().replace('+', " ")),
        None => String::new(),
    }
}

fn decode_component(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned(),
    }
}

/// Escapes text for safe insertion into HTML element content or attributes.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date_empty() {
        assert_eq!(format_date(None), "");
        assert_eq!(format_date(Some("")), "");
    }

    #[test]
    fn test_format_date_malformed_returns_input() {
        assert_eq!(format_date(Some("not-a-date")), "not-a-date");
        assert_eq!(format_date(Some("2025-13-45T99:00:00")), "2025-13-45T99:00:00");
    }

    #[test]
    fn test_format_date_naive_iso() {
        assert_eq!(
            format_date(Some("2025-03-22T10:00:00")),
            "22.03.2025 10:00:00"
        );
        assert_eq!(
            format_date(Some("2025-03-22T10:05:09.123456")),
            "22.03.2025 10:05:09"
        );
        assert_eq!(format_date(Some("2025-03-22")), "22.03.2025 00:00:00");
    }

    #[test]
    fn test_format_date_with_offset_is_converted() {
        let out = format_date(Some("2025-03-22T10:00:00Z"));
        assert_ne!(out, "2025-03-22T10:00:00Z");
        assert_eq!(out.len(), "22.03.2025 10:00:00".len());
    }

    #[test]
    fn test_parse_timestamp_orders() {
        let a = parse_timestamp("2025-03-22T10:00:00").unwrap();
        let b = parse_timestamp("2025-03-23T09:00:00.5").unwrap();
        assert!(b > a);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_get_url_parameter_basic() {
        let search = "?q=printer&page=2";
        assert_eq!(get_url_parameter(search, "q"), "printer");
        assert_eq!(get_url_parameter(search, "page"), "2");
        assert_eq!(get_url_parameter(search, "missing"), "");
    }

    #[test]
    fn test_get_url_parameter_accepts_full_url_and_bare_query() {
        assert_eq!(
            get_url_parameter("http://desk.local/search?ticket=12#top", "ticket"),
            "12"
        );
        assert_eq!(get_url_parameter("ticket=12&x=1", "x"), "1");
    }

    #[test]
    fn test_get_url_parameter_plus_is_space() {
        assert_eq!(get_url_parameter("?q=printer+jam", "q"), "printer jam");
    }

    #[test]
    fn test_get_url_parameter_round_trip() {
        for value in ["a+b", "tom & jerry", "100% sure", "%20 literal", "Принтер"] {
            let search = format!("?x=1&q={}&y=2", urlencoding::encode(value));
            assert_eq!(get_url_parameter(&search, "q"), value, "value: {}", value);
        }
    }

    #[test]
    fn test_get_url_parameter_escapes_metacharacters() {
        let search = "?filter[source]=mock&filterXsourceY=wrong";
        assert_eq!(get_url_parameter(search, "filter[source]"), "mock");
        assert_eq!(get_url_parameter("?a.b=1&axb=2", "a.b"), "1");
        assert_eq!(get_url_parameter("?axb=2", "a.b"), "");
    }

    #[test]
    fn test_get_url_parameter_does_not_match_suffix() {
        assert_eq!(get_url_parameter("?subq=1&q=2", "q"), "2");
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }
}
