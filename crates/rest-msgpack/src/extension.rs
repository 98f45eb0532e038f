//! Extension types for values MessagePack has no native encoding for.
//!
//! Each recognized type travels as a MessagePack `ext` whose type code is
//! taken from [`ExtensionTag`] and whose body is the UTF-8 canonical string
//! of the value:
//!
//! | type            | code | payload                                   |
//! |-----------------|------|-------------------------------------------|
//! | datetime        | `1`  | `2024-05-01T12:30:00.250+02:00` (offset optional) |
//! | date            | `2`  | `2024-05-01`                              |
//! | time            | `3`  | `12:30:00.250`                            |
//! | decimal         | `4`  | `-12.3400`                                |
//!
//! Fractional seconds are written only when non-zero, using 3, 6 or 9 digits
//! so nothing is lost. Offsets are `+HH:MM`, or `+HH:MM:SS` when they carry
//! seconds; `Z` is accepted on input. Years outside `0000..=9999` carry an
//! explicit sign. Negative codes are reserved by MessagePack itself.

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

use crate::Value;

const NAIVE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const AWARE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";
const AWARE_DATETIME_SECONDS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%::z";
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// MessagePack `ext` type codes for the recognized types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum ExtensionTag {
    DateTime = 1,
    Date = 2,
    Time = 3,
    Decimal = 4,
}

impl ExtensionTag {
    pub const ALL: [ExtensionTag; 4] = [
        ExtensionTag::DateTime,
        ExtensionTag::Date,
        ExtensionTag::Time,
        ExtensionTag::Decimal,
    ];

    pub const fn code(self) -> i8 {
        self as i8
    }

    pub fn from_code(code: i8) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.code() == code)
    }

    pub const fn name(self) -> &'static str {
        match self {
            ExtensionTag::DateTime => "datetime",
            ExtensionTag::Date => "date",
            ExtensionTag::Time => "time",
            ExtensionTag::Decimal => "decimal",
        }
    }
}

impl fmt::Display for ExtensionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<i8> for ExtensionTag {
    type Error = DecodeError;

    fn try_from(code: i8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(DecodeError::UnknownTag(code))
    }
}

/// A tagged `(type, canonical string)` pair, alive for one render/parse cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionValue {
    pub tag: ExtensionTag,
    pub payload: String,
}

impl ExtensionValue {
    pub fn new(tag: ExtensionTag, payload: impl Into<String>) -> Self {
        Self {
            tag,
            payload: payload.into(),
        }
    }

    /// The MessagePack `ext` carrying this value.
    pub fn into_wire(self) -> rmpv::Value {
        rmpv::Value::Ext(self.tag.code(), self.payload.into_bytes())
    }
}

/// Output of [`ExtensionEncoder::encode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Encoded<'a> {
    /// The value is a recognized type and was turned into an extension.
    Extension(ExtensionValue),
    /// Anything else, returned untouched for the generic codec to handle or reject.
    Passthrough(&'a Value),
}

/// Maps recognized types to [`ExtensionValue`]s. Stateless.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionEncoder;

impl ExtensionEncoder {
    pub fn encode<'a>(&self, value: &'a Value) -> Encoded<'a> {
        let ext = match value {
            Value::DateTime(dt) => ExtensionValue::new(ExtensionTag::DateTime, format_aware(dt)),
            Value::NaiveDateTime(dt) => ExtensionValue::new(
                ExtensionTag::DateTime,
                dt.format(NAIVE_DATETIME_FORMAT).to_string(),
            ),
            Value::Date(date) => {
                ExtensionValue::new(ExtensionTag::Date, date.format(DATE_FORMAT).to_string())
            }
            Value::Time(time) => {
                ExtensionValue::new(ExtensionTag::Time, time.format(TIME_FORMAT).to_string())
            }
            Value::Decimal(decimal) => ExtensionValue::new(ExtensionTag::Decimal, decimal.to_string()),
            other => return Encoded::Passthrough(other),
        };
        Encoded::Extension(ext)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unrecognized extension type code {0}")]
    UnknownTag(i8),
    #[error("{tag} extension payload is not valid UTF-8")]
    InvalidUtf8 { tag: ExtensionTag },
    #[error("invalid {tag} extension payload {payload:?}: {reason}")]
    InvalidPayload {
        tag: ExtensionTag,
        payload: String,
        reason: String,
    },
}

fn format_aware(dt: &DateTime<FixedOffset>) -> String {
    let format = if dt.offset().local_minus_utc() % 60 == 0 {
        AWARE_DATETIME_FORMAT
    } else {
        AWARE_DATETIME_SECONDS_FORMAT
    };
    dt.format(format).to_string()
}

/// Splits `2024-05-01T12:00:00+05:30` into its local part and offset suffix.
/// Only the time part is searched, so a signed year is never mistaken for an offset.
fn split_offset(payload: &str) -> Option<(&str, &str)> {
    let time_start = payload.find('T')?;
    let at = payload[time_start..].rfind(|c: char| matches!(c, '+' | '-' | 'Z' | 'z'))?;
    Some(payload.split_at(time_start + at))
}

/// Parses `Z`, `+HH:MM` or `+HH:MM:SS`.
fn parse_offset(s: &str) -> Option<FixedOffset> {
    if s.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }
    let sign = match s.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let mut fields = s[1..].split(':').map(two_digits);
    let hours = fields.next()??;
    let minutes = fields.next()??;
    let seconds = fields.next().unwrap_or(Some(0))?;
    if fields.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60 + seconds))
}

fn two_digits(s: &str) -> Option<i32> {
    if s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

/// Rebuilds typed values from extension payloads. Stateless.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionDecoder;

impl ExtensionDecoder {
    /// Decode a raw `ext` as read off the wire.
    pub fn decode_raw(&self, code: i8, payload: &[u8]) -> Result<Value, DecodeError> {
        let tag = ExtensionTag::try_from(code)?;
        let text = std::str::from_utf8(payload).map_err(|_| DecodeError::InvalidUtf8 { tag })?;
        self.decode(tag, text)
    }

    pub fn decode(&self, tag: ExtensionTag, payload: &str) -> Result<Value, DecodeError> {
        let invalid = |reason: String| DecodeError::InvalidPayload {
            tag,
            payload: payload.to_owned(),
            reason,
        };
        match tag {
            ExtensionTag::DateTime => match split_offset(payload) {
                Some((local, offset)) => {
                    let offset = parse_offset(offset)
                        .ok_or_else(|| invalid(format!("invalid UTC offset {offset:?}")))?;
                    NaiveDateTime::parse_from_str(local, NAIVE_DATETIME_FORMAT)
                        .map_err(|e| invalid(e.to_string()))?
                        .and_local_timezone(offset)
                        .single()
                        .map(Value::DateTime)
                        .ok_or_else(|| invalid("datetime out of range".to_owned()))
                }
                None => NaiveDateTime::parse_from_str(payload, NAIVE_DATETIME_FORMAT)
                    .map(Value::NaiveDateTime)
                    .map_err(|e| invalid(e.to_string())),
            },
            ExtensionTag::Date => NaiveDate::parse_from_str(payload, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|e| invalid(e.to_string())),
            ExtensionTag::Time => NaiveTime::parse_from_str(payload, TIME_FORMAT)
                .map(Value::Time)
                .map_err(|e| invalid(e.to_string())),
            ExtensionTag::Decimal => BigDecimal::from_str(payload)
                .map(Value::Decimal)
                .map_err(|e| invalid(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload_of(value: &Value) -> ExtensionValue {
        match ExtensionEncoder.encode(value) {
            Encoded::Extension(ext) => ext,
            Encoded::Passthrough(v) => panic!("{v:?} was not encoded as an extension"),
        }
    }

    #[test]
    fn tag_codes_are_stable() {
        let codes: Vec<i8> = ExtensionTag::ALL.iter().map(|t| t.code()).collect();
        assert_eq!(codes, vec![1, 2, 3, 4]);
        assert_eq!(ExtensionTag::from_code(3), Some(ExtensionTag::Time));
        assert_eq!(ExtensionTag::try_from(-1), Err(DecodeError::UnknownTag(-1)));
    }

    #[test]
    fn naive_datetime_omits_zero_fraction() {
        let dt = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(
            payload_of(&Value::NaiveDateTime(dt)),
            ExtensionValue::new(ExtensionTag::DateTime, "2024-05-01T12:30:00")
        );
    }

    #[test]
    fn datetime_keeps_micros_and_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let dt = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_micro_opt(12, 30, 0, 250_001)
            .unwrap()
            .and_local_timezone(offset)
            .unwrap();
        let ext = payload_of(&Value::DateTime(dt));
        assert_eq!(ext.payload, "2024-05-01T12:30:00.250001+02:00");
        assert_eq!(
            ExtensionDecoder.decode(ext.tag, &ext.payload),
            Ok(Value::DateTime(dt))
        );
    }

    fn aware(y: i32, offset_secs: i32) -> DateTime<FixedOffset> {
        NaiveDate::from_ymd_opt(y, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_local_timezone(FixedOffset::east_opt(offset_secs).unwrap())
            .unwrap()
    }

    fn round_trip_aware(dt: DateTime<FixedOffset>) -> String {
        let ext = payload_of(&Value::DateTime(dt));
        match ExtensionDecoder.decode(ext.tag, &ext.payload) {
            // DateTime equality ignores the offset, so compare it separately.
            Ok(Value::DateTime(back)) => {
                assert_eq!(back, dt);
                assert_eq!(back.offset(), dt.offset());
            }
            other => panic!("{:?} decoded to {other:?}", ext.payload),
        }
        ext.payload
    }

    #[test]
    fn offset_seconds_survive() {
        let payload = round_trip_aware(aware(2024, 5 * 3600 + 30 * 60 + 15));
        assert_eq!(payload, "2024-05-01T12:00:00+05:30:15");
        let payload = round_trip_aware(aware(2024, -(3600 + 1)));
        assert_eq!(payload, "2024-05-01T12:00:00-01:00:01");
    }

    #[test]
    fn aware_datetimes_outside_four_digit_years() {
        assert_eq!(round_trip_aware(aware(10000, 0)), "+10000-05-01T12:00:00+00:00");
        let payload = round_trip_aware(aware(-44, -3 * 3600));
        assert!(payload.starts_with("-0044-05-01T12:00:00"));
        assert!(payload.ends_with("-03:00"));
    }

    #[test]
    fn malformed_offsets_are_rejected() {
        for payload in [
            "2024-05-01T12:00:00+5:30",
            "2024-05-01T12:00:00+05:60",
            "2024-05-01T12:00:00+05:30:15:00",
            "2024-05-01T12:00:00+",
        ] {
            let err = ExtensionDecoder.decode(ExtensionTag::DateTime, payload).unwrap_err();
            assert!(
                matches!(err, DecodeError::InvalidPayload { tag: ExtensionTag::DateTime, .. }),
                "{payload}"
            );
        }
    }

    #[test]
    fn datetime_without_offset_decodes_naive() {
        let value = ExtensionDecoder
            .decode(ExtensionTag::DateTime, "2001-02-03T04:05:06.7")
            .unwrap();
        let expected = NaiveDate::from_ymd_opt(2001, 2, 3)
            .unwrap()
            .and_hms_milli_opt(4, 5, 6, 700)
            .unwrap();
        assert_eq!(value, Value::NaiveDateTime(expected));
    }

    #[test]
    fn utc_designator_is_accepted() {
        let value = ExtensionDecoder
            .decode(ExtensionTag::DateTime, "2001-02-03T04:05:06Z")
            .unwrap();
        assert!(matches!(value, Value::DateTime(dt) if dt.offset().local_minus_utc() == 0));
    }

    #[test]
    fn date_and_time_payloads() {
        let date = NaiveDate::from_ymd_opt(987, 1, 9).unwrap();
        assert_eq!(payload_of(&Value::Date(date)).payload, "0987-01-09");

        let time = NaiveTime::from_hms_nano_opt(23, 59, 59, 123_456_789).unwrap();
        let ext = payload_of(&Value::Time(time));
        assert_eq!(ext.payload, "23:59:59.123456789");
        assert_eq!(ExtensionDecoder.decode_raw(3, ext.payload.as_bytes()), Ok(Value::Time(time)));
    }

    #[test]
    fn decimal_keeps_sign_and_trailing_zeros() {
        let decimal = BigDecimal::from_str("-12.3400").unwrap();
        let ext = payload_of(&Value::Decimal(decimal));
        assert_eq!(ext.payload, "-12.3400");
        match ExtensionDecoder.decode(ext.tag, &ext.payload).unwrap() {
            Value::Decimal(back) => assert_eq!(back.to_string(), "-12.3400"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn primitives_pass_through() {
        let value = Value::Array(vec![Value::Integer(1)]);
        match ExtensionEncoder.encode(&value) {
            Encoded::Passthrough(v) => assert!(std::ptr::eq(v, &value)),
            Encoded::Extension(ext) => panic!("unexpected extension {ext:?}"),
        }
    }

    #[test]
    fn unknown_code_and_bad_payloads_fail() {
        assert_eq!(ExtensionDecoder.decode_raw(42, b"x"), Err(DecodeError::UnknownTag(42)));
        assert_eq!(
            ExtensionDecoder.decode_raw(4, &[0xff, 0xfe]),
            Err(DecodeError::InvalidUtf8 {
                tag: ExtensionTag::Decimal
            })
        );
        let err = ExtensionDecoder.decode(ExtensionTag::Date, "2024-13-01").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidPayload { tag: ExtensionTag::Date, .. }));
        let err = ExtensionDecoder.decode(ExtensionTag::Decimal, "1.2.3").unwrap_err();
        assert!(err.to_string().starts_with("invalid decimal extension payload \"1.2.3\""));
    }
}
