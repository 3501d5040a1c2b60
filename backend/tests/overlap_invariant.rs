//! Concurrent bookings never leave two live sessions of one tutor
//! overlapping.

mod support;

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;

use support::{LEARNER, SECOND_LEARNER, TUTOR, at};
use tutor_booking::domain::ports::{
    BookSessionRequest, BookingCommand, CalendarProvider, CancelSessionRequest,
    FixtureCalendarProvider, NotificationSink, SessionRepository,
};
use tutor_booking::domain::{
    BookingService, EffectDispatcher, ErrorCode, Participant, Session, UserId,
};
use tutor_booking::outbound::memory::{InMemoryBookingStore, InMemoryUserDirectory};
use tutor_booking::test_support::{MutableClock, RecordingNotificationSink};

type Service = BookingService<InMemoryBookingStore, InMemoryUserDirectory>;

fn service(store: Arc<InMemoryBookingStore>) -> Arc<Service> {
    let users = InMemoryUserDirectory::new();
    users.upsert(Participant::try_from_strings(TUTOR, "Ada", true).expect("tutor"));
    users.upsert(Participant::try_from_strings(LEARNER, "Grace", false).expect("learner"));
    users.upsert(Participant::try_from_strings(SECOND_LEARNER, "Alan", false).expect("learner"));
    let calendar: Arc<dyn CalendarProvider> = Arc::new(FixtureCalendarProvider);
    let notifications: Arc<dyn NotificationSink> = Arc::new(RecordingNotificationSink::default());
    let clock: Arc<dyn Clock> = Arc::new(MutableClock::new(at("2025-01-09T00:00:00Z")));
    Arc::new(BookingService::new(
        store,
        Arc::new(users),
        EffectDispatcher::new(calendar, notifications, std::time::Duration::from_secs(1)),
        clock,
    ))
}

fn random_request(rng: &mut SmallRng, origin: DateTime<Utc>) -> BookSessionRequest {
    let start = origin + TimeDelta::minutes(15 * rng.gen_range(0..40));
    let length = TimeDelta::minutes(15 * rng.gen_range(1..=8));
    let learner = if rng.gen_bool(0.5) { LEARNER } else { SECOND_LEARNER };
    BookSessionRequest {
        requester: UserId::new(learner).expect("learner id"),
        tutor_id: UserId::new(TUTOR).expect("tutor id"),
        subject: "Statistics".to_owned(),
        start_at: start,
        end_at: start + length,
        notes: None,
    }
}

async fn book_concurrently(
    bookings: &Arc<Service>,
    requests: Vec<BookSessionRequest>,
) -> Vec<Session> {
    let tasks: Vec<_> = requests
        .into_iter()
        .map(|request| {
            let bookings = Arc::clone(bookings);
            tokio::spawn(async move { bookings.book(request).await })
        })
        .collect();

    let mut booked = Vec::new();
    for task in tasks {
        match task.await.expect("booking task") {
            Ok(session) => booked.push(session),
            Err(error) => assert_eq!(error.code(), ErrorCode::Conflict, "{error:?}"),
        }
    }
    booked
}

async fn assert_no_live_overlap(store: &InMemoryBookingStore) -> Vec<Session> {
    let tutor = UserId::new(TUTOR).expect("tutor id");
    let live = store
        .list_live_for_tutor(
            &tutor,
            at("2025-01-01T00:00:00Z"),
            at("2025-02-01T00:00:00Z"),
        )
        .await
        .expect("list live sessions");
    for (index, first) in live.iter().enumerate() {
        for second in &live[index + 1..] {
            assert!(
                !first.window().overlaps(second.window()),
                "{} overlaps {}",
                first.id(),
                second.id()
            );
        }
    }
    live
}

#[rstest]
#[case(7)]
#[case(42)]
#[case(1_337)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bookings_keep_tutor_calendar_disjoint(#[case] seed: u64) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let origin = at("2025-01-10T08:00:00Z");
    let store = Arc::new(InMemoryBookingStore::new());
    let bookings = service(Arc::clone(&store));

    let first_wave = (0..64).map(|_| random_request(&mut rng, origin)).collect();
    let booked = book_concurrently(&bookings, first_wave).await;
    assert!(!booked.is_empty());
    let live = assert_no_live_overlap(&store).await;
    assert_eq!(live.len(), booked.len());

    for session in booked.iter().filter(|_| rng.gen_bool(0.5)) {
        bookings
            .cancel(CancelSessionRequest {
                session_id: session.id(),
                actor: session.learner_id().clone(),
                reason: None,
            })
            .await
            .expect("learner cancels");
    }

    let second_wave = (0..64).map(|_| random_request(&mut rng, origin)).collect();
    book_concurrently(&bookings, second_wave).await;
    assert_no_live_overlap(&store).await;
}
