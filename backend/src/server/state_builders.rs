//! Wiring of domain services onto the configured storage backend.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use tutor_booking::domain::ports::{
    AvailabilityRepository, NotificationSink, SessionRepository, UserDirectory,
};
use tutor_booking::domain::{AvailabilityService, BookingService, EffectDispatcher, ExpirySweeper};
use tutor_booking::inbound::http::state::HttpState;
use tutor_booking::outbound::memory::{InMemoryBookingStore, InMemoryUserDirectory};
use tutor_booking::outbound::notifications::TracingNotificationSink;
use tutor_booking::outbound::persistence::{
    DieselAvailabilityRepository, DieselNotificationSink, DieselSessionRepository,
    DieselUserDirectory,
};

use super::ServerConfig;

/// Build every driving port over one set of repositories.
fn wire_services<S, A, U>(
    sessions: Arc<S>,
    slots: Arc<A>,
    users: Arc<U>,
    effects: EffectDispatcher,
    clock: Arc<dyn Clock>,
) -> HttpState
where
    S: SessionRepository + 'static,
    A: AvailabilityRepository + 'static,
    U: UserDirectory + 'static,
{
    let booking = Arc::new(BookingService::new(
        Arc::clone(&sessions),
        Arc::clone(&users),
        effects.clone(),
        Arc::clone(&clock),
    ));
    let availability = Arc::new(AvailabilityService::new(
        slots,
        Arc::clone(&sessions),
        users,
        Arc::clone(&clock),
    ));
    let sweeper = Arc::new(ExpirySweeper::new(sessions, effects, clock));

    HttpState::new(
        booking.clone(),
        booking,
        availability.clone(),
        availability,
        sweeper,
    )
}

/// Build the HTTP state from the configured backend.
///
/// Uses Diesel repositories when a pool is configured, otherwise the
/// in-memory document store seeded with the configured roster.
pub fn build_http_state(config: &ServerConfig) -> HttpState {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    match &config.db_pool {
        Some(pool) => {
            let notifications = config
                .notifications
                .clone()
                .unwrap_or_else(|| Arc::new(DieselNotificationSink::new(pool.clone())));
            let effects = EffectDispatcher::new(
                Arc::clone(&config.calendar),
                notifications,
                config.external_timeout,
            );
            wire_services(
                Arc::new(DieselSessionRepository::new(pool.clone())),
                Arc::new(DieselAvailabilityRepository::new(pool.clone())),
                Arc::new(DieselUserDirectory::new(pool.clone())),
                effects,
                clock,
            )
        }
        None => {
            let notifications: Arc<dyn NotificationSink> = config
                .notifications
                .clone()
                .unwrap_or_else(|| Arc::new(TracingNotificationSink));
            let effects = EffectDispatcher::new(
                Arc::clone(&config.calendar),
                notifications,
                config.external_timeout,
            );
            let store = Arc::new(InMemoryBookingStore::new());
            let users = InMemoryUserDirectory::new();
            for participant in &config.roster {
                users.upsert(participant.clone());
            }
            wire_services(Arc::clone(&store), store, Arc::new(users), effects, clock)
        }
    }
}
