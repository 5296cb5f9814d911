use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

/// Convert an RFC 3339 value into UTC and strip the offset, so every
/// persisted timestamp compares timezone-naive.
pub fn to_naive_utc(value: &Value) -> Option<NaiveDateTime> {
    let text = value.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|parsed| parsed.naive_utc())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn converts_offset_timestamps_to_naive_utc() {
        let converted = to_naive_utc(&json!("2023-06-01T12:00:00+02:00")).unwrap();
        assert_eq!(converted.to_string(), "2023-06-01 10:00:00");
    }

    #[test]
    fn zulu_timestamps_pass_through() {
        let converted = to_naive_utc(&json!("2023-06-01T12:00:00Z")).unwrap();
        assert_eq!(converted.to_string(), "2023-06-01 12:00:00");
    }

    #[test]
    fn non_string_values_are_none() {
        assert_eq!(to_naive_utc(&json!(null)), None);
        assert_eq!(to_naive_utc(&json!(42)), None);
    }
}
