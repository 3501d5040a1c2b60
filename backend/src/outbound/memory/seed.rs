//! Participant roster loaded into the in-memory user directory at startup.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::{Participant, UserValidationError};

/// Errors raised while reading a participant roster.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to read participant roster at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("participant roster is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("participant {id} is invalid: {source}")]
    Invalid {
        id: String,
        #[source]
        source: UserValidationError,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RosterEntry {
    id: String,
    display_name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    is_tutor: bool,
}

/// Parse a JSON array of `{id, displayName, email?, isTutor}` entries.
pub fn parse_roster(json: &str) -> Result<Vec<Participant>, RosterError> {
    let entries: Vec<RosterEntry> = serde_json::from_str(json)?;
    entries
        .into_iter()
        .map(|entry| {
            let participant =
                Participant::try_from_strings(&entry.id, entry.display_name, entry.is_tutor)
                    .map_err(|source| RosterError::Invalid {
                        id: entry.id.clone(),
                        source,
                    })?;
            Ok(match entry.email {
                Some(email) => participant.with_email(email),
                None => participant,
            })
        })
        .collect()
}

/// Read and parse the roster file at `path`.
pub fn load_roster(path: &Path) -> Result<Vec<Participant>, RosterError> {
    let json = std::fs::read_to_string(path).map_err(|source| RosterError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_roster(&json)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn roster_entries_become_participants() {
        let roster = parse_roster(
            r#"[
                {"id": "3fa85f64-5717-4562-b3fc-2c963f66afa6", "displayName": "Ada", "isTutor": true,
                 "email": "ada@example.test"},
                {"id": "6fa459ea-ee8a-3ca4-894e-db77e160355e", "displayName": "Grace"}
            ]"#,
        )
        .expect("valid roster");

        assert_eq!(roster.len(), 2);
        assert!(roster[0].is_tutor());
        assert_eq!(roster[0].email(), Some("ada@example.test"));
        assert!(!roster[1].is_tutor());
    }

    #[rstest]
    fn malformed_id_names_the_entry() {
        let err = parse_roster(r#"[{"id": "not-a-uuid", "displayName": "Ada"}]"#)
            .expect_err("invalid id");

        assert!(matches!(err, RosterError::Invalid { ref id, .. } if id == "not-a-uuid"));
    }
}
