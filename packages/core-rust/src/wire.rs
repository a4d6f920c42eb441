//! Text codecs for field types whose wire form differs from serde's defaults.
//!
//! UUIDs need no adapter: `uuid`'s deserializer already accepts the dashed
//! and the undashed forms the service emits.
//!
//! Timestamps come from the service as zoned date-times, e.g.
//! `2024-05-01T10:00:00+02:00[Europe/Paris]`. The bracketed region id is
//! informational only; the offset is authoritative. Seconds may be omitted
//! when they are zero (`2024-05-01T10:00+02:00`).

use chrono::{DateTime, FixedOffset};

/// Parse a zoned date-time as emitted by the service.
///
/// # Errors
///
/// Returns the underlying `chrono` parse error when the text, stripped of
/// its region id, is neither RFC 3339 nor RFC 3339 without seconds.
pub fn parse_zoned(text: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    let instant = match text.find('[') {
        Some(idx) if text.ends_with(']') => &text[..idx],
        _ => text,
    };

    DateTime::parse_from_rfc3339(instant).or_else(|err| {
        let normalized = instant
            .strip_suffix('Z')
            .map_or_else(|| instant.to_string(), |head| format!("{head}+00:00"));
        DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M%:z").map_err(|_| err)
    })
}

/// `deserialize_with` helper decoding `null` as the field's default, the same
/// as an absent field.
///
/// # Errors
///
/// Returns the inner deserializer's error for a value of the wrong type.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de> + Default,
{
    let value: Option<T> = serde::Deserialize::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// `#[serde(with = "...")]` adapter for `Option<DateTime<FixedOffset>>`.
///
/// Absent and `null` both decode to `None`; values serialize as RFC 3339.
pub mod zoned_opt {
    use chrono::{DateTime, FixedOffset};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(value: &Option<DateTime<FixedOffset>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|text| {
            super::parse_zoned(&text)
                .map_err(|e| D::Error::custom(format!("invalid date-time {text:?}: {e}")))
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct Stamped {
        #[serde(with = "zoned_opt")]
        at: Option<DateTime<FixedOffset>>,
    }

    #[test]
    fn parses_region_suffixed_timestamp() {
        let dt = parse_zoned("2024-05-01T10:15:30+02:00[Europe/Paris]").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 7200);
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (10, 15, 30));
    }

    #[test]
    fn parses_plain_rfc3339() {
        let dt = parse_zoned("2023-12-31T23:59:59Z").unwrap();
        assert_eq!(dt.year(), 2023);
        assert_eq!(dt.offset().local_minus_utc(), 0);
    }

    #[test]
    fn parses_timestamp_without_seconds() {
        let dt = parse_zoned("2024-05-01T10:00+02:00[Europe/Paris]").unwrap();
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (10, 0, 0));

        let utc = parse_zoned("2024-05-01T10:00Z[UTC]").unwrap();
        assert_eq!(utc.offset().local_minus_utc(), 0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_zoned("yesterday").is_err());
        assert!(parse_zoned("").is_err());
    }

    #[test]
    fn adapter_handles_absent_null_and_value() {
        let absent: Stamped = serde_json::from_str("{}").unwrap();
        assert!(absent.at.is_none());

        let null: Stamped = serde_json::from_str(r#"{"at":null}"#).unwrap();
        assert!(null.at.is_none());

        let set: Stamped =
            serde_json::from_str(r#"{"at":"2024-01-02T03:04:05+00:00[UTC]"}"#).unwrap();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"at":"2024-01-02T03:04:05+00:00"}"#);
    }

    #[test]
    fn adapter_reports_bad_timestamp() {
        let err = serde_json::from_str::<Stamped>(r#"{"at":"not a date"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid date-time"));
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Flags {
        #[serde(deserialize_with = "null_as_default")]
        on: bool,
        #[serde(deserialize_with = "null_as_default")]
        ids: Vec<u32>,
    }

    #[test]
    fn null_as_default_treats_null_like_absent() {
        let flags: Flags = serde_json::from_str(r#"{"on":null,"ids":null}"#).unwrap();
        assert!(!flags.on);
        assert!(flags.ids.is_empty());

        let flags: Flags = serde_json::from_str(r#"{"on":true,"ids":[1,2]}"#).unwrap();
        assert!(flags.on);
        assert_eq!(flags.ids, vec![1, 2]);

        assert!(serde_json::from_str::<Flags>(r#"{"on":"yes"}"#).is_err());
    }

    #[test]
    fn uuid_accepts_dashed_and_undashed() {
        let dashed: Uuid = serde_json::from_str(r#""123e4567-e89b-12d3-a456-426614174000""#).unwrap();
        let undashed: Uuid = serde_json::from_str(r#""123e4567e89b12d3a456426614174000""#).unwrap();
        assert_eq!(dashed, undashed);
    }
}
