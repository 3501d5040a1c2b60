//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every helper turns a malformed field into an `invalid_request` error whose
//! details name the field, the offending value and a machine-readable code.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::availability::{SlotTimeError, parse_slot_date, parse_wall_time};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    InvalidTimestamp,
    InvalidDate,
    InvalidTime,
    InvalidValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidTimestamp => "invalid_timestamp",
            ErrorCode::InvalidDate => "invalid_date",
            ErrorCode::InvalidTime => "invalid_time",
            ErrorCode::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

fn field_error(field: FieldName, message: String, code: ErrorCode, value: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| {
        field_error(
            field,
            format!("{} must be a valid UUID", field.as_str()),
            ErrorCode::InvalidUuid,
            value,
        )
    })
}

pub(crate) fn parse_rfc3339_timestamp(
    value: &str,
    field: FieldName,
) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| {
            field_error(
                field,
                format!("{} must be an RFC 3339 timestamp", field.as_str()),
                ErrorCode::InvalidTimestamp,
                value,
            )
        })
}

pub(crate) fn parse_date(value: &str, field: FieldName) -> Result<NaiveDate, Error> {
    parse_slot_date(value).map_err(|err| slot_error(field, &err, value))
}

pub(crate) fn parse_time(value: &str, field: FieldName) -> Result<NaiveTime, Error> {
    parse_wall_time(value).map_err(|err| slot_error(field, &err, value))
}

fn slot_error(field: FieldName, err: &SlotTimeError, value: &str) -> Error {
    let code = match err {
        SlotTimeError::InvalidDate { .. } => ErrorCode::InvalidDate,
        SlotTimeError::InvalidTime { .. } => ErrorCode::InvalidTime,
        SlotTimeError::InvertedRange => ErrorCode::InvalidValue,
    };
    field_error(field, format!("{}: {err}", field.as_str()), code, value)
}

/// Parse an optional enumerated query value such as a role or status.
pub(crate) fn parse_optional_enum<T>(
    value: Option<&str>,
    field: FieldName,
    allowed: &str,
) -> Result<Option<T>, Error>
where
    T: FromStr,
{
    value
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| {
            T::from_str(raw.trim()).map_err(|_| {
                field_error(
                    field,
                    format!("{} must be one of: {allowed}", field.as_str()),
                    ErrorCode::InvalidValue,
                    raw,
                )
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode as DomainCode;
    use crate::domain::booking::ParticipantRole;

    #[rstest]
    fn invalid_uuid_names_the_field() {
        let err = parse_uuid("nope", FieldName::new("tutorId")).expect_err("invalid");
        assert_eq!(err.code(), DomainCode::InvalidRequest);
        let details = err.details().expect("details");
        assert_eq!(details["field"], "tutorId");
        assert_eq!(details["code"], "invalid_uuid");
    }

    #[rstest]
    #[case("2025-01-10T09:00:00Z", true)]
    #[case("2025-01-10T09:00:00+02:00", true)]
    #[case("2025-01-10 09:00", false)]
    fn timestamps_require_rfc3339(#[case] raw: &str, #[case] ok: bool) {
        assert_eq!(
            parse_rfc3339_timestamp(raw, FieldName::new("startAt")).is_ok(),
            ok
        );
    }

    #[rstest]
    fn offsets_normalise_to_utc() {
        let parsed = parse_rfc3339_timestamp("2025-01-10T11:00:00+02:00", FieldName::new("startAt"))
            .expect("valid");
        assert_eq!(parsed.to_rfc3339(), "2025-01-10T09:00:00+00:00");
    }

    #[rstest]
    #[case("31-01-2025", "invalid_date")]
    fn bad_dates_are_reported(#[case] raw: &str, #[case] code: &str) {
        let err = parse_date(raw, FieldName::new("date")).expect_err("invalid");
        assert_eq!(err.details().expect("details")["code"], code);
    }

    #[rstest]
    fn bad_times_are_reported() {
        let err = parse_time("25:00", FieldName::new("startTime")).expect_err("invalid");
        assert_eq!(err.details().expect("details")["code"], "invalid_time");
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), None)]
    #[case(Some("tutor"), Some(ParticipantRole::Tutor))]
    fn optional_enums_accept_absent_or_known(
        #[case] raw: Option<&str>,
        #[case] expected: Option<ParticipantRole>,
    ) {
        let parsed: Option<ParticipantRole> =
            parse_optional_enum(raw, FieldName::new("role"), "tutor, learner").expect("valid");
        assert_eq!(parsed, expected);
    }

    #[rstest]
    fn unknown_enum_values_are_rejected() {
        let err = parse_optional_enum::<ParticipantRole>(
            Some("admin"),
            FieldName::new("role"),
            "tutor, learner",
        )
        .expect_err("invalid");
        assert_eq!(err.message(), "role must be one of: tutor, learner");
    }
}
