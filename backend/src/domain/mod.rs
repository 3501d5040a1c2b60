//! Domain primitives, aggregates and services.
//!
//! Purpose: Define strongly typed booking entities and the services that
//! enforce their consistency rules. Nothing here knows about HTTP or SQL;
//! adapters reach the domain through the traits in [`ports`].
//!
//! Public surface:
//! - `Error` and `ErrorCode`: the error payload every operation returns.
//! - `Participant`: user identity plus the tutor flag.
//! - `BookingService`, `AvailabilityService`, `ExpirySweeper`: driving port
//!   implementations.

pub mod availability;
pub mod availability_service;
pub mod booking;
pub mod booking_service;
pub mod effects;
pub mod error;
pub mod expiry_sweeper;
pub mod notification;
pub mod ports;
mod session_lifecycle;
pub mod trace_id;
pub mod user;

pub use self::availability::{AvailabilitySlot, SlotAvailability, SlotTimeError};
pub use self::availability_service::AvailabilityService;
pub use self::booking::{Session, SessionStatus, TimeWindow};
pub use self::booking_service::BookingService;
pub use self::effects::{DEFAULT_EXTERNAL_TIMEOUT, EffectDispatcher};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::expiry_sweeper::{
    AUTO_CANCEL_REASON, ExpirySweeper, SweeperHandle, spawn_expiry_sweeper,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{DisplayName, Participant, UserId, UserValidationError};
