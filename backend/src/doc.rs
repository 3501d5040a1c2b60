//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every booking, availability, admin and health
//! endpoint together with the session cookie security scheme. The document
//! backs Swagger UI in debug builds and `cargo run --bin openapi-dump`.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::admin::SweepReportBody;
use crate::inbound::http::availability::{AddSlotBody, SlotAvailabilityResponse, SlotResponse};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::sessions::{CancelSessionBody, CreateSessionBody, SessionResponse};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Signed session cookie issued by the identity service.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Tutor booking API",
        description = "Availability, session booking and lifecycle endpoints for peer tutoring."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::sessions::create_session,
        crate::inbound::http::sessions::list_my_sessions,
        crate::inbound::http::sessions::get_session,
        crate::inbound::http::sessions::confirm_session,
        crate::inbound::http::sessions::complete_session,
        crate::inbound::http::sessions::cancel_session,
        crate::inbound::http::availability::add_slot,
        crate::inbound::http::availability::remove_slot,
        crate::inbound::http::availability::list_tutor_availability,
        crate::inbound::http::admin::sweep_expired_sessions,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        CreateSessionBody,
        CancelSessionBody,
        SessionResponse,
        AddSlotBody,
        SlotResponse,
        SlotAvailabilityResponse,
        SweepReportBody,
    )),
    tags(
        (name = "sessions", description = "Booking and session lifecycle"),
        (name = "availability", description = "Tutor availability slots"),
        (name = "admin", description = "Operational triggers"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
