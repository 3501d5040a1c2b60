//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AvailabilityCommand, AvailabilityQuery, BookingCommand, BookingQuery, ExpirySweep,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub bookings: Arc<dyn BookingCommand>,
    pub bookings_query: Arc<dyn BookingQuery>,
    pub availability: Arc<dyn AvailabilityCommand>,
    pub availability_query: Arc<dyn AvailabilityQuery>,
    pub sweeper: Arc<dyn ExpirySweep>,
}

impl HttpState {
    /// Bundle the driving ports.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use tutor_booking::domain::ports::{
    ///     AvailabilityCommand, AvailabilityQuery, BookingCommand, BookingQuery, ExpirySweep,
    /// };
    /// use tutor_booking::inbound::http::state::HttpState;
    ///
    /// fn wire(
    ///     bookings: Arc<dyn BookingCommand>,
    ///     bookings_query: Arc<dyn BookingQuery>,
    ///     availability: Arc<dyn AvailabilityCommand>,
    ///     availability_query: Arc<dyn AvailabilityQuery>,
    ///     sweeper: Arc<dyn ExpirySweep>,
    /// ) -> HttpState {
    ///     HttpState::new(bookings, bookings_query, availability, availability_query, sweeper)
    /// }
    /// ```
    pub fn new(
        bookings: Arc<dyn BookingCommand>,
        bookings_query: Arc<dyn BookingQuery>,
        availability: Arc<dyn AvailabilityCommand>,
        availability_query: Arc<dyn AvailabilityQuery>,
        sweeper: Arc<dyn ExpirySweep>,
    ) -> Self {
        Self {
            bookings,
            bookings_query,
            availability,
            availability_query,
            sweeper,
        }
    }
}
