//! Peer tutoring booking engine.
//!
//! Keeps tutor availability, booked sessions and their lifecycle consistent
//! under concurrent requests. The crate is laid out hexagonally: booking
//! rules live in [`domain`], HTTP handlers in [`inbound`], and storage,
//! calendar and notification adapters in [`outbound`].

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
