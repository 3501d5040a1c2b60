//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod availability_command;
mod availability_repository;
mod booking_command;
mod booking_query;
mod calendar_provider;
mod expiry_sweep;
mod notification_sink;
mod session_repository;
mod user_directory;

#[cfg(test)]
pub use availability_command::{MockAvailabilityCommand, MockAvailabilityQuery};
pub use availability_command::{
    AddSlotRequest, AvailabilityCommand, AvailabilityQuery, RemoveSlotRequest,
};
#[cfg(test)]
pub use availability_repository::MockAvailabilityRepository;
pub use availability_repository::{AvailabilityRepository, AvailabilityRepositoryError};
#[cfg(test)]
pub use booking_command::MockBookingCommand;
pub use booking_command::{
    BookSessionRequest, BookingCommand, CancelSessionRequest, SessionActionRequest,
};
#[cfg(test)]
pub use booking_query::MockBookingQuery;
pub use booking_query::{BookingQuery, GetSessionRequest, ListSessionsRequest};
#[cfg(test)]
pub use calendar_provider::MockCalendarProvider;
pub use calendar_provider::{
    CalendarError, CalendarEvent, CalendarProvider, FixtureCalendarProvider, MeetingRequest,
};
#[cfg(test)]
pub use expiry_sweep::MockExpirySweep;
pub use expiry_sweep::{ExpirySweep, SweepReport};
#[cfg(test)]
pub use notification_sink::MockNotificationSink;
pub use notification_sink::{NotificationSink, NotificationSinkError};
#[cfg(test)]
pub use session_repository::MockSessionRepository;
pub use session_repository::{SessionRepository, SessionRepositoryError};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::{UserDirectory, UserDirectoryError};
