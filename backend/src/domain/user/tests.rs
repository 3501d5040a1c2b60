//! Tests for user identifiers, display names and participants.

use super::*;
use rstest::rstest;

const VALID_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

#[rstest]
#[case("", UserValidationError::EmptyId)]
#[case("not-a-uuid", UserValidationError::InvalidId)]
#[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", UserValidationError::InvalidId)]
fn user_id_rejects_bad_input(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(UserId::new(raw), Err(expected));
}

#[rstest]
fn user_id_from_uuid_matches_parsed_form() {
    let parsed = UserId::new(VALID_ID).expect("valid id");
    let wrapped = UserId::from_uuid(*parsed.as_uuid());
    assert_eq!(parsed, wrapped);
    assert_eq!(wrapped.as_ref(), VALID_ID);
}

#[rstest]
#[case("   ", UserValidationError::EmptyDisplayName)]
fn display_name_rejects_blank(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(DisplayName::new(raw), Err(expected));
}

#[rstest]
fn display_name_rejects_overlong_values() {
    let raw = "a".repeat(DISPLAY_NAME_MAX + 1);
    assert_eq!(
        DisplayName::new(raw),
        Err(UserValidationError::DisplayNameTooLong {
            max: DISPLAY_NAME_MAX
        })
    );
}

#[rstest]
fn display_name_is_trimmed() {
    let name = DisplayName::new("  Ada Lovelace ").expect("valid name");
    assert_eq!(name.as_ref(), "Ada Lovelace");
}

#[rstest]
fn participant_exposes_components() {
    let participant =
        Participant::try_from_strings(VALID_ID, "Ada", true).expect("valid participant");
    assert_eq!(participant.id().as_ref(), VALID_ID);
    assert_eq!(participant.display_name().as_ref(), "Ada");
    assert!(participant.is_tutor());
    assert_eq!(participant.email(), None);
}

#[rstest]
#[case(" ada@example.org ", Some("ada@example.org"))]
#[case("   ", None)]
fn participant_email_is_trimmed(#[case] raw: &str, #[case] expected: Option<&str>) {
    let participant = Participant::try_from_strings(VALID_ID, "Ada", false)
        .expect("valid participant")
        .with_email(raw);
    assert_eq!(participant.email(), expected);
}

#[rstest]
fn user_id_serialises_as_plain_string() {
    let id = UserId::new(VALID_ID).expect("valid id");
    let encoded = serde_json::to_value(&id).expect("serialise id");
    assert_eq!(encoded, serde_json::Value::String(VALID_ID.to_owned()));
}
