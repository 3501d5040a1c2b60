//! Sweep pass and scheduling behaviour.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rstest::rstest;
use uuid::Uuid;

use super::*;
use crate::domain::UserId;
use crate::domain::booking::{Conference, ConferenceStatus, Session, SessionDraft};
use crate::domain::notification::NotificationKind;
use crate::domain::ports::{
    MockCalendarProvider, MockNotificationSink, MockSessionRepository, NotificationSink,
    NotificationSinkError,
};
use crate::test_support::{MutableClock, RecordingNotificationSink};

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-01-09T12:00:00Z")
        .expect("fixture timestamp")
        .with_timezone(&Utc)
}

fn pending_ending(end_offset_minutes: i64) -> Session {
    let end = now() + ChronoDuration::minutes(end_offset_minutes);
    Session::new(SessionDraft {
        id: Uuid::new_v4(),
        tutor_id: UserId::random(),
        learner_id: UserId::random(),
        subject: "History".to_owned(),
        notes: None,
        start_at: end - ChronoDuration::hours(1),
        end_at: end,
        created_at: end - ChronoDuration::days(2),
    })
    .expect("valid session")
}

fn sweeper(
    sessions: MockSessionRepository,
    calendar: MockCalendarProvider,
    sink: Arc<dyn NotificationSink>,
) -> ExpirySweeper<MockSessionRepository> {
    let effects = EffectDispatcher::new(Arc::new(calendar), sink, Duration::from_millis(100));
    ExpirySweeper::new(
        Arc::new(sessions),
        effects,
        Arc::new(MutableClock::new(now())),
    )
}

#[rstest]
#[tokio::test]
async fn cancels_lapsed_pending_sessions() {
    let lapsed = pending_ending(-5).with_conference(Conference {
        status: ConferenceStatus::Success,
        event_id: Some("evt-1".to_owned()),
        html_link: None,
        join_link: Some("https://meet.example/1".to_owned()),
    });
    let mut sessions = MockSessionRepository::new();
    sessions
        .expect_list_pending_ended_before()
        .withf(|cutoff| *cutoff == now())
        .return_once(move |_| Ok(vec![lapsed]));
    sessions
        .expect_apply_transition()
        .times(1)
        .withf(|next, expected| {
            *expected == SessionStatus::Pending
                && next.status() == SessionStatus::Cancelled
                && next
                    .cancellation()
                    .is_some_and(|c| c.cancelled_by.is_none() && c.reason == AUTO_CANCEL_REASON)
        })
        .returning(|next, _| Ok(next.clone()));
    let mut calendar = MockCalendarProvider::new();
    calendar
        .expect_delete_event()
        .times(1)
        .returning(|_| Ok(()));
    let sink = Arc::new(RecordingNotificationSink::default());

    let report = sweeper(sessions, calendar, Arc::clone(&sink) as Arc<dyn NotificationSink>)
        .sweep_expired()
        .await
        .expect("sweep succeeds");

    assert_eq!(
        report,
        SweepReport {
            cancelled: 1,
            errors: 0
        }
    );
    let sent = sink.sent();
    assert_eq!(sent.len(), 2);
    assert!(
        sent.iter()
            .all(|n| n.kind == NotificationKind::SessionAutoCancelled)
    );
}

#[rstest]
#[tokio::test]
async fn notification_failures_do_not_undo_the_cancellation() {
    let lapsed = pending_ending(-5).with_conference(Conference {
        status: ConferenceStatus::Success,
        event_id: Some("evt-2".to_owned()),
        html_link: None,
        join_link: None,
    });
    let mut sessions = MockSessionRepository::new();
    sessions
        .expect_list_pending_ended_before()
        .return_once(move |_| Ok(vec![lapsed]));
    sessions
        .expect_apply_transition()
        .times(1)
        .returning(|next, _| Ok(next.clone()));
    let mut calendar = MockCalendarProvider::new();
    calendar
        .expect_delete_event()
        .times(1)
        .withf(|event_id| event_id == "evt-2")
        .returning(|_| Ok(()));
    let mut sink = MockNotificationSink::new();
    sink.expect_notify()
        .times(2)
        .returning(|_| Err(NotificationSinkError::delivery("mail relay down")));

    let report = sweeper(sessions, calendar, Arc::new(sink))
        .sweep_expired()
        .await
        .expect("sweep succeeds");

    assert_eq!(
        report,
        SweepReport {
            cancelled: 1,
            errors: 0
        }
    );
}

#[rstest]
#[tokio::test]
async fn sessions_confirmed_concurrently_are_skipped() {
    let lapsed = pending_ending(-5);
    let mut sessions = MockSessionRepository::new();
    sessions
        .expect_list_pending_ended_before()
        .return_once(move |_| Ok(vec![lapsed]));
    sessions
        .expect_apply_transition()
        .return_once(|_, _| Err(SessionRepositoryError::stale_status(SessionStatus::Confirmed)));
    let sink = Arc::new(RecordingNotificationSink::default());

    let report = sweeper(sessions, MockCalendarProvider::new(), Arc::clone(&sink) as Arc<dyn NotificationSink>)
        .sweep_expired()
        .await
        .expect("sweep succeeds");

    assert_eq!(report, SweepReport::default());
    assert!(sink.sent().is_empty());
}

#[rstest]
#[tokio::test]
async fn stray_candidates_are_ignored() {
    let still_running = pending_ending(30);
    let lapsed = pending_ending(-30);
    let confirmed = lapsed
        .confirm(lapsed.tutor_id(), now())
        .expect("tutor confirms");
    let mut sessions = MockSessionRepository::new();
    sessions
        .expect_list_pending_ended_before()
        .return_once(move |_| Ok(vec![still_running, confirmed]));
    sessions.expect_apply_transition().times(0);

    let report = sweeper(
        sessions,
        MockCalendarProvider::new(),
        Arc::new(RecordingNotificationSink::default()),
    )
    .sweep_expired()
    .await
    .expect("sweep succeeds");

    assert_eq!(report, SweepReport::default());
}

#[rstest]
#[tokio::test]
async fn write_failures_are_counted_and_the_pass_continues() {
    let first = pending_ending(-10);
    let second = pending_ending(-20);
    let failing_id = first.id();
    let mut sessions = MockSessionRepository::new();
    sessions
        .expect_list_pending_ended_before()
        .return_once(move |_| Ok(vec![first, second]));
    sessions
        .expect_apply_transition()
        .times(2)
        .returning(move |next, _| {
            if next.id() == failing_id {
                Err(SessionRepositoryError::query("deadlock detected"))
            } else {
                Ok(next.clone())
            }
        });

    let report = sweeper(
        sessions,
        MockCalendarProvider::new(),
        Arc::new(RecordingNotificationSink::default()),
    )
    .sweep_expired()
    .await
    .expect("sweep succeeds");

    assert_eq!(
        report,
        SweepReport {
            cancelled: 1,
            errors: 1
        }
    );
}

#[rstest]
#[tokio::test]
async fn unreadable_candidate_list_fails_the_pass() {
    let mut sessions = MockSessionRepository::new();
    sessions
        .expect_list_pending_ended_before()
        .return_once(|_| Err(SessionRepositoryError::connection("refused")));

    let error = sweeper(
        sessions,
        MockCalendarProvider::new(),
        Arc::new(RecordingNotificationSink::default()),
    )
    .sweep_expired()
    .await
    .expect_err("listing failure surfaces");

    assert_eq!(error.code(), crate::domain::ErrorCode::ServiceUnavailable);
}

struct CountingSweep {
    passes: AtomicUsize,
    panic_on_first: bool,
}

#[async_trait]
impl ExpirySweep for CountingSweep {
    async fn sweep_expired(&self) -> Result<SweepReport, Error> {
        let pass = self.passes.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_first && pass == 0 {
            panic!("first pass blows up");
        }
        if pass == 1 {
            return Err(Error::service_unavailable("database restarting"));
        }
        Ok(SweepReport::default())
    }
}

#[rstest]
#[case::healthy(false)]
#[case::panicking_first_pass(true)]
#[tokio::test]
async fn scheduler_keeps_running_through_failures(#[case] panic_on_first: bool) {
    let sweep = Arc::new(CountingSweep {
        passes: AtomicUsize::new(0),
        panic_on_first,
    });

    let handle = spawn_expiry_sweeper(sweep.clone(), Duration::from_millis(5));
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.shutdown().await;

    assert!(sweep.passes.load(Ordering::SeqCst) >= 3);
}

#[rstest]
#[tokio::test]
async fn shutdown_stops_further_passes() {
    let sweep = Arc::new(CountingSweep {
        passes: AtomicUsize::new(0),
        panic_on_first: false,
    });

    let handle = spawn_expiry_sweeper(sweep.clone(), Duration::from_secs(3600));
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.shutdown().await;
    let after_shutdown = sweep.passes.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(after_shutdown, 1);
    assert_eq!(sweep.passes.load(Ordering::SeqCst), 1);
}
