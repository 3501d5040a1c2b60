//! Application settings and the HTTP server configuration object.
//!
//! [`AppSettings`] is layered by OrthoConfig from CLI flags, `TUTORING_*`
//! environment variables and an optional config file. [`ServerConfig`] holds
//! the resolved values the server and state builders need.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use actix_web::cookie::Key;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use tracing::warn;
use zeroize::Zeroize;

use tutor_booking::domain::Participant;
use tutor_booking::domain::ports::{CalendarProvider, FixtureCalendarProvider, NotificationSink};
use tutor_booking::outbound::persistence::DbPool;

const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8080);
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
const DEFAULT_EXTERNAL_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
const SESSION_KEY_MIN_LEN: usize = 64;

/// Settings for the booking service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "TUTORING")]
pub struct AppSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<SocketAddr>,
    /// PostgreSQL URL. Absent means the in-memory document store.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Seconds between expiry sweeps.
    pub sweep_interval_secs: Option<u64>,
    /// Calendar collection URL used to create meetings.
    pub calendar_endpoint: Option<String>,
    /// Bearer token sent to the calendar provider.
    pub calendar_token: Option<String>,
    /// Timeout applied to every calendar and notification call.
    pub external_timeout_ms: Option<u64>,
    /// File holding the cookie signing key material.
    pub session_key_file: Option<PathBuf>,
    /// Mark session cookies `Secure`.
    #[ortho_config(default = true)]
    pub cookie_secure: bool,
    /// JSON participant roster for the in-memory user directory.
    pub users_file: Option<PathBuf>,
}

impl AppSettings {
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
            .unwrap_or_else(|| SocketAddr::from(DEFAULT_BIND_ADDR))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(
            self.sweep_interval_secs
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS)
                .max(1),
        )
    }

    pub fn external_timeout(&self) -> Duration {
        Duration::from_millis(
            self.external_timeout_ms
                .unwrap_or(DEFAULT_EXTERNAL_TIMEOUT_MS)
                .max(1),
        )
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .max(1)
    }

    pub fn session_key_file(&self) -> &Path {
        self.session_key_file
            .as_deref()
            .unwrap_or_else(|| Path::new(SESSION_KEY_DEFAULT_PATH))
    }
}

/// Build mode for session key validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds fall back to an ephemeral key.
    Debug,
    /// Release builds require a readable key of at least 64 bytes.
    Release,
}

impl BuildMode {
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

/// Errors raised while loading the cookie signing key.
#[derive(Debug, thiserror::Error)]
pub enum SessionKeyError {
    #[error("failed to read session key at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    TooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
}

/// Derive the cookie key from `path`, wiping the raw bytes afterwards.
pub fn load_session_key(path: &Path, mode: BuildMode) -> Result<Key, SessionKeyError> {
    match std::fs::read(path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if mode == BuildMode::Release && length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(SessionKeyError::TooShort {
                    path: path.to_path_buf(),
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) if mode == BuildMode::Debug => {
            warn!(
                path = %path.display(),
                error = %error,
                "using temporary session key (dev only)"
            );
            Ok(Key::generate())
        }
        Err(source) => Err(SessionKeyError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) calendar: Arc<dyn CalendarProvider>,
    pub(crate) notifications: Option<Arc<dyn NotificationSink>>,
    pub(crate) external_timeout: Duration,
    pub(crate) roster: Vec<Participant>,
}

impl ServerConfig {
    /// Configuration with no database, no calendar and an empty roster.
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            bind_addr,
            db_pool: None,
            calendar: Arc::new(FixtureCalendarProvider),
            notifications: None,
            external_timeout: tutor_booking::domain::DEFAULT_EXTERNAL_TIMEOUT,
            roster: Vec::new(),
        }
    }

    /// Use Diesel-backed repositories over `pool`.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[must_use]
    pub fn with_calendar(mut self, calendar: Arc<dyn CalendarProvider>) -> Self {
        self.calendar = calendar;
        self
    }

    /// Override the notification sink chosen from the storage backend.
    #[must_use]
    pub fn with_notifications(mut self, notifications: Arc<dyn NotificationSink>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    #[must_use]
    pub fn with_external_timeout(mut self, timeout: Duration) -> Self {
        self.external_timeout = timeout;
        self
    }

    /// Participants preloaded into the in-memory directory.
    #[must_use]
    pub fn with_roster(mut self, roster: Vec<Participant>) -> Self {
        self.roster = roster;
        self
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

#[cfg(test)]
mod tests {
    //! Settings layering and session key loading.

    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    use super::*;

    const SETTINGS_ENV: [&str; 6] = [
        "TUTORING_BIND_ADDR",
        "TUTORING_DATABASE_URL",
        "TUTORING_SWEEP_INTERVAL_SECS",
        "TUTORING_EXTERNAL_TIMEOUT_MS",
        "TUTORING_COOKIE_SECURE",
        "TUTORING_DB_MAX_CONNECTIONS",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("tutor-booking")])
            .expect("settings should load")
    }

    fn temp_key_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tutor-booking-{name}-{}", std::process::id()))
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(SETTINGS_ENV.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();

        assert_eq!(settings.bind_addr(), SocketAddr::from(DEFAULT_BIND_ADDR));
        assert!(settings.database_url.is_none());
        assert_eq!(settings.sweep_interval(), Duration::from_secs(60));
        assert_eq!(settings.external_timeout(), Duration::from_millis(5_000));
        assert_eq!(settings.db_max_connections(), 10);
        assert!(settings.cookie_secure);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("TUTORING_BIND_ADDR", Some("127.0.0.1:9090".to_owned())),
            (
                "TUTORING_DATABASE_URL",
                Some("postgres://localhost/tutoring".to_owned()),
            ),
            ("TUTORING_SWEEP_INTERVAL_SECS", Some("15".to_owned())),
            ("TUTORING_EXTERNAL_TIMEOUT_MS", Some("250".to_owned())),
            ("TUTORING_COOKIE_SECURE", Some("false".to_owned())),
            ("TUTORING_DB_MAX_CONNECTIONS", Some("3".to_owned())),
        ]);

        let settings = load_from_empty_args();

        assert_eq!(
            settings.bind_addr(),
            "127.0.0.1:9090".parse::<SocketAddr>().expect("addr")
        );
        assert_eq!(
            settings.database_url.as_deref(),
            Some("postgres://localhost/tutoring")
        );
        assert_eq!(settings.sweep_interval(), Duration::from_secs(15));
        assert_eq!(settings.external_timeout(), Duration::from_millis(250));
        assert_eq!(settings.db_max_connections(), 3);
        assert!(!settings.cookie_secure);
    }

    #[rstest]
    fn missing_key_is_ephemeral_in_debug() {
        let path = temp_key_path("missing");

        assert!(load_session_key(&path, BuildMode::Debug).is_ok());
    }

    #[rstest]
    fn missing_key_fails_in_release() {
        let path = temp_key_path("missing-release");

        let err = load_session_key(&path, BuildMode::Release).err().expect("no key file");
        assert!(matches!(err, SessionKeyError::Read { .. }));
    }

    #[rstest]
    fn short_key_fails_in_release() {
        let path = temp_key_path("short");
        std::fs::write(&path, [7_u8; 16]).expect("write key");

        let result = load_session_key(&path, BuildMode::Release);
        std::fs::remove_file(&path).expect("remove key");

        assert!(matches!(
            result,
            Err(SessionKeyError::TooShort { length: 16, .. })
        ));
    }

    #[rstest]
    fn key_file_is_derived_deterministically() {
        let path = temp_key_path("derived");
        std::fs::write(&path, [42_u8; 64]).expect("write key");

        let first = load_session_key(&path, BuildMode::Release).expect("key");
        let second = load_session_key(&path, BuildMode::Release).expect("key");
        std::fs::remove_file(&path).expect("remove key");

        assert_eq!(first.master(), second.master());
    }
}
