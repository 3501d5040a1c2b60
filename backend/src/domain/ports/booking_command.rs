//! Driving port for booking mutations.
//!
//! Each operation either commits one session write or fails without writing.
//! External effects run after the write and never change the outcome.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::booking::Session;
use crate::domain::{Error, UserId};

/// Request to book a session with a tutor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSessionRequest {
    pub requester: UserId,
    pub tutor_id: UserId,
    pub subject: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Request to confirm or complete a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionActionRequest {
    pub session_id: Uuid,
    pub actor: UserId,
}

/// Request to cancel a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelSessionRequest {
    pub session_id: Uuid,
    pub actor: UserId,
    pub reason: Option<String>,
}

/// Driving port for session lifecycle writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingCommand: Send + Sync {
    /// Create a pending session after validating the tutor, the window and
    /// the tutor's calendar.
    async fn book(&self, request: BookSessionRequest) -> Result<Session, Error>;

    /// Tutor accepts a pending session.
    async fn confirm(&self, request: SessionActionRequest) -> Result<Session, Error>;

    /// Either participant marks a live session as held.
    async fn complete(&self, request: SessionActionRequest) -> Result<Session, Error>;

    /// Either participant cancels a live session.
    async fn cancel(&self, request: CancelSessionRequest) -> Result<Session, Error>;
}
