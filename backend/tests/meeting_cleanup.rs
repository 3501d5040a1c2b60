//! Meetings created for sessions that end while the calendar call is still
//! in flight must not outlive the session.
//!
//! The calendar double parks `create_event` until the test releases it, so
//! the cancellation deterministically lands between the booking commit and
//! the meeting being recorded.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use rstest::rstest;
use tokio::sync::Notify;
use uuid::Uuid;

use tutor_booking::domain::ports::{
    BookSessionRequest, BookingCommand, CalendarError, CalendarEvent, CalendarProvider,
    CancelSessionRequest, ExpirySweep, MeetingRequest, NotificationSink, SessionRepository,
};
use tutor_booking::domain::{
    BookingService, EffectDispatcher, Error, ExpirySweeper, Participant, Session, SessionStatus,
    UserId,
};
use tutor_booking::outbound::memory::{InMemoryBookingStore, InMemoryUserDirectory};
use tutor_booking::test_support::{MutableClock, RecordingNotificationSink};

const TUTOR: &str = "11111111-1111-1111-1111-111111111111";
const LEARNER: &str = "22222222-2222-2222-2222-222222222222";

fn at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

fn user(raw: &str) -> UserId {
    UserId::new(raw).expect("valid user id")
}

/// Calendar whose meeting creation waits for [`StalledCalendar::release`].
#[derive(Default)]
struct StalledCalendar {
    entered: Notify,
    release: Notify,
    deleted: Mutex<Vec<String>>,
}

impl StalledCalendar {
    fn release(&self) {
        self.release.notify_one();
    }

    fn deleted(&self) -> Vec<String> {
        self.deleted.lock().expect("calendar mutex").clone()
    }
}

#[async_trait]
impl CalendarProvider for StalledCalendar {
    async fn create_event(&self, request: &MeetingRequest) -> Result<CalendarEvent, CalendarError> {
        self.entered.notify_one();
        self.release.notified().await;
        let event_id = format!("evt-{}", request.session_id);
        Ok(CalendarEvent {
            html_link: None,
            join_link: Some(format!("https://meet.test/{event_id}")),
            event_id,
        })
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), CalendarError> {
        self.deleted
            .lock()
            .expect("calendar mutex")
            .push(event_id.to_owned());
        Ok(())
    }
}

type Bookings = BookingService<InMemoryBookingStore, InMemoryUserDirectory>;
type PendingBooking = tokio::task::JoinHandle<Result<Session, Error>>;

struct World {
    clock: Arc<MutableClock>,
    calendar: Arc<StalledCalendar>,
    store: Arc<InMemoryBookingStore>,
    bookings: Arc<Bookings>,
    sweeper: ExpirySweeper<InMemoryBookingStore>,
}

impl World {
    fn new() -> Self {
        let clock = Arc::new(MutableClock::new(at("2026-03-02T08:00:00Z")));
        let calendar = Arc::new(StalledCalendar::default());
        let users = InMemoryUserDirectory::new();
        users.upsert(
            Participant::try_from_strings(TUTOR, "Ada Lovelace", true)
                .expect("tutor")
                .with_email("ada@example.test"),
        );
        users.upsert(
            Participant::try_from_strings(LEARNER, "Grace Hopper", false).expect("learner"),
        );
        let store = Arc::new(InMemoryBookingStore::new());

        let shared_clock: Arc<dyn Clock> = clock.clone();
        let calendar_port: Arc<dyn CalendarProvider> = calendar.clone();
        let sink: Arc<dyn NotificationSink> = Arc::new(RecordingNotificationSink::default());
        let effects = EffectDispatcher::new(calendar_port, sink, Duration::from_secs(5));
        let bookings = Arc::new(BookingService::new(
            Arc::clone(&store),
            Arc::new(users),
            effects.clone(),
            Arc::clone(&shared_clock),
        ));
        let sweeper = ExpirySweeper::new(Arc::clone(&store), effects, shared_clock);
        Self {
            clock,
            calendar,
            store,
            bookings,
            sweeper,
        }
    }

    /// Start a booking and return once its meeting creation is parked.
    async fn book_until_meeting_requested(&self) -> (Uuid, PendingBooking) {
        let bookings = Arc::clone(&self.bookings);
        let handle = tokio::spawn(async move {
            bookings
                .book(BookSessionRequest {
                    requester: user(LEARNER),
                    tutor_id: user(TUTOR),
                    subject: "Number theory".to_owned(),
                    start_at: at("2026-03-02T09:00:00Z"),
                    end_at: at("2026-03-02T10:00:00Z"),
                    notes: None,
                })
                .await
        });
        self.calendar.entered.notified().await;

        let stored = self
            .store
            .list_for_participant(&user(LEARNER), None, None)
            .await
            .expect("list sessions");
        assert_eq!(stored.len(), 1, "booking is committed before the meeting call");
        (stored[0].id(), handle)
    }

    async fn assert_meeting_withdrawn(&self, session_id: Uuid) {
        let stored = self
            .store
            .find_by_id(&session_id)
            .await
            .expect("read session")
            .expect("session exists");
        assert_eq!(stored.status(), SessionStatus::Cancelled);
        assert_eq!(stored.conference().event_id, None);
        assert_eq!(stored.conference().join_link, None);
        assert_eq!(self.calendar.deleted(), vec![format!("evt-{session_id}")]);
    }
}

#[rstest]
#[tokio::test]
async fn cancelling_during_meeting_creation_deletes_the_meeting() {
    let world = World::new();
    let (session_id, booking) = world.book_until_meeting_requested().await;

    world
        .bookings
        .cancel(CancelSessionRequest {
            session_id,
            actor: user(LEARNER),
            reason: Some("clash with exams".to_owned()),
        })
        .await
        .expect("learner cancels");
    world.calendar.release();
    booking
        .await
        .expect("booking task")
        .expect("booking succeeds");

    world.assert_meeting_withdrawn(session_id).await;
}

#[rstest]
#[tokio::test]
async fn sweeping_during_meeting_creation_deletes_the_meeting() {
    let world = World::new();
    let (session_id, booking) = world.book_until_meeting_requested().await;

    world.clock.set(at("2026-03-02T10:05:00Z"));
    let report = world.sweeper.sweep_expired().await.expect("sweep succeeds");
    assert_eq!(report.cancelled, 1);
    world.calendar.release();
    booking
        .await
        .expect("booking task")
        .expect("booking succeeds");

    world.assert_meeting_withdrawn(session_id).await;
}
