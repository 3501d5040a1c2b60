//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{HttpResponse, test, web};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{
    MockAvailabilityCommand, MockAvailabilityQuery, MockBookingCommand, MockBookingQuery,
    MockExpirySweep,
};
use crate::domain::{Error, UserId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Route mounted by [`test_login`] in handler tests.
pub const TEST_LOGIN_PATH: &str = "/test/login";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Body accepted by [`test_login`].
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestLogin {
    pub user_id: String,
}

/// Stand-in for the identity service: stores the posted user id in the
/// session cookie.
pub async fn test_login(
    session: SessionContext,
    payload: web::Json<TestLogin>,
) -> Result<HttpResponse, Error> {
    let user_id = UserId::new(&payload.user_id)
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    session.persist_user(&user_id)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Sign `user_id` in through [`TEST_LOGIN_PATH`] and return the cookie.
pub async fn session_cookie<S>(app: &S, user_id: &str) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri(TEST_LOGIN_PATH)
        .set_json(TestLogin {
            user_id: user_id.to_owned(),
        })
        .to_request();
    let res = test::call_service(app, req).await;
    assert!(res.status().is_success(), "test login failed");
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}

/// Mocked driving ports for handler tests. Unused ports panic when called.
#[derive(Default)]
pub struct MockPorts {
    pub bookings: MockBookingCommand,
    pub bookings_query: MockBookingQuery,
    pub availability: MockAvailabilityCommand,
    pub availability_query: MockAvailabilityQuery,
    pub sweeper: MockExpirySweep,
}

impl MockPorts {
    pub fn into_state(self) -> HttpState {
        HttpState::new(
            Arc::new(self.bookings),
            Arc::new(self.bookings_query),
            Arc::new(self.availability),
            Arc::new(self.availability_query),
            Arc::new(self.sweeper),
        )
    }
}
