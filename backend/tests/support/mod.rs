//! Shared harness for HTTP integration tests.
//!
//! Wires the real domain services over the in-memory store with a frozen
//! clock and recording adapters, then mounts them under the production
//! routes plus a sign-in route standing in for the identity service.
//! [`embedded_postgres`] provisions databases for the Diesel adapter suites.

#![allow(dead_code)]

pub mod embedded_postgres;

use std::sync::Arc;
use std::time::Duration;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{App, HttpResponse, test, web};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tutor_booking::domain::ports::{CalendarProvider, NotificationSink};
use tutor_booking::domain::{
    AvailabilityService, BookingService, EffectDispatcher, Error, ExpirySweeper, Participant,
    UserId,
};
use tutor_booking::inbound::http::admin::sweep_expired_sessions;
use tutor_booking::inbound::http::availability::{
    add_slot, list_tutor_availability, remove_slot,
};
use tutor_booking::inbound::http::session::SessionContext;
use tutor_booking::inbound::http::sessions::{
    cancel_session, complete_session, confirm_session, create_session, get_session,
    list_my_sessions,
};
use tutor_booking::inbound::http::state::HttpState;
use tutor_booking::outbound::memory::{InMemoryBookingStore, InMemoryUserDirectory};
use tutor_booking::test_support::{
    MutableClock, RecordingCalendarProvider, RecordingNotificationSink,
};

pub const TUTOR: &str = "11111111-1111-1111-1111-111111111111";
pub const LEARNER: &str = "22222222-2222-2222-2222-222222222222";
pub const SECOND_LEARNER: &str = "33333333-3333-3333-3333-333333333333";

const LOGIN_PATH: &str = "/identity/login";

/// Parse an RFC 3339 instant.
pub fn at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

fn roster() -> Vec<Participant> {
    vec![
        Participant::try_from_strings(TUTOR, "Ada Lovelace", true)
            .expect("tutor")
            .with_email("ada@example.test"),
        Participant::try_from_strings(LEARNER, "Grace Hopper", false)
            .expect("learner")
            .with_email("grace@example.test"),
        Participant::try_from_strings(SECOND_LEARNER, "Alan Turing", false)
            .expect("second learner")
            .with_email("alan@example.test"),
    ]
}

/// Domain services plus the doubles a test inspects.
pub struct Harness {
    pub clock: Arc<MutableClock>,
    pub notifications: Arc<RecordingNotificationSink>,
    pub calendar: Arc<RecordingCalendarProvider>,
    pub state: HttpState,
}

impl Harness {
    pub fn new(now: DateTime<Utc>) -> Self {
        let clock = Arc::new(MutableClock::new(now));
        let notifications = Arc::new(RecordingNotificationSink::default());
        let calendar = Arc::new(RecordingCalendarProvider::default());

        let users = InMemoryUserDirectory::new();
        for participant in roster() {
            users.upsert(participant);
        }
        let users = Arc::new(users);
        let store = Arc::new(InMemoryBookingStore::new());
        let shared_clock: Arc<dyn Clock> = clock.clone();
        let calendar_port: Arc<dyn CalendarProvider> = calendar.clone();
        let notification_port: Arc<dyn NotificationSink> = notifications.clone();
        let effects =
            EffectDispatcher::new(calendar_port, notification_port, Duration::from_secs(1));

        let bookings = Arc::new(BookingService::new(
            Arc::clone(&store),
            Arc::clone(&users),
            effects.clone(),
            Arc::clone(&shared_clock),
        ));
        let availability = Arc::new(AvailabilityService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            users,
            Arc::clone(&shared_clock),
        ));
        let sweeper = Arc::new(ExpirySweeper::new(store, effects, shared_clock));

        let state = HttpState::new(
            bookings.clone(),
            bookings,
            availability.clone(),
            availability,
            sweeper,
        );
        Self {
            clock,
            notifications,
            calendar,
            state,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Login {
    user_id: String,
}

async fn login(session: SessionContext, payload: web::Json<Login>) -> Result<HttpResponse, Error> {
    let user_id =
        UserId::new(&payload.user_id).map_err(|err| Error::invalid_request(err.to_string()))?;
    session.persist_user(&user_id)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Initialise the service under test.
pub async fn init_app(
    harness: &Harness,
) -> impl Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    let session = SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build();
    test::init_service(
        App::new()
            .app_data(web::Data::new(harness.state.clone()))
            .wrap(session)
            .route(LOGIN_PATH, web::post().to(login))
            .service(
                web::scope("/api/v1")
                    .service(create_session)
                    .service(list_my_sessions)
                    .service(get_session)
                    .service(confirm_session)
                    .service(complete_session)
                    .service(cancel_session)
                    .service(add_slot)
                    .service(remove_slot)
                    .service(list_tutor_availability)
                    .service(sweep_expired_sessions),
            ),
    )
    .await
}

/// Sign `user_id` in and return the session cookie.
pub async fn sign_in<S, B>(app: &S, user_id: &str) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri(LOGIN_PATH)
        .set_json(Login {
            user_id: user_id.to_owned(),
        })
        .to_request();
    let res = test::call_service(app, req).await;
    assert!(res.status().is_success(), "sign-in failed");
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}

/// Send `req` and return the status with the decoded JSON body.
pub async fn call_json<S, B>(app: &S, req: actix_http::Request) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(app, req).await;
    let status = res.status().as_u16();
    let bytes = test::read_body(res).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, body)
}
