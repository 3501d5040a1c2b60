//! Tutor availability HTTP handlers.
//!
//! ```text
//! POST   /api/v1/availability
//! DELETE /api/v1/availability/{slotId}
//! GET    /api/v1/tutors/{id}/availability
//! ```

use actix_web::{delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::availability::{AvailabilitySlot, SlotAvailability, format_wall_time};
use crate::domain::ports::{AddSlotRequest, RemoveSlotRequest};
use crate::domain::{Error, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::Caller;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_date, parse_time, parse_uuid};

/// Request payload for publishing a slot.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddSlotBody {
    #[schema(format = "date", example = "2026-02-01")]
    pub date: String,
    #[schema(example = "09:00")]
    pub start_time: String,
    #[schema(example = "10:30")]
    pub end_time: String,
}

/// A published slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub tutor_id: String,
    #[schema(format = "date")]
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

/// A future slot flagged when a live session occupies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailabilityResponse {
    #[serde(flatten)]
    pub slot: SlotResponse,
    pub already_booked: bool,
}

impl From<&AvailabilitySlot> for SlotResponse {
    fn from(value: &AvailabilitySlot) -> Self {
        Self {
            id: value.id().to_string(),
            tutor_id: value.owner_id().to_string(),
            date: value.date().format("%Y-%m-%d").to_string(),
            start_time: format_wall_time(value.start_time()),
            end_time: format_wall_time(value.end_time()),
        }
    }
}

impl From<SlotAvailability> for SlotAvailabilityResponse {
    fn from(value: SlotAvailability) -> Self {
        Self {
            slot: SlotResponse::from(&value.slot),
            already_booked: value.already_booked,
        }
    }
}

fn slot_list(slots: &[AvailabilitySlot]) -> Vec<SlotResponse> {
    slots.iter().map(SlotResponse::from).collect()
}

fn parse_add_slot(payload: &AddSlotBody, owner_id: UserId) -> Result<AddSlotRequest, Error> {
    Ok(AddSlotRequest {
        owner_id,
        date: parse_date(&payload.date, FieldName::new("date"))?,
        start_time: parse_time(&payload.start_time, FieldName::new("startTime"))?,
        end_time: parse_time(&payload.end_time, FieldName::new("endTime"))?,
    })
}

/// Publish a slot for the signed-in tutor and return all of their slots.
#[utoipa::path(
    post,
    path = "/api/v1/availability",
    request_body = AddSlotBody,
    responses(
        (status = 200, description = "Slots of the tutor", body = [SlotResponse]),
        (status = 400, description = "Invalid slot", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 409, description = "Overlapping slot", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["availability"],
    operation_id = "addAvailabilitySlot",
    security(("SessionCookie" = []))
)]
#[post("/availability")]
pub async fn add_slot(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<AddSlotBody>,
) -> ApiResult<web::Json<Vec<SlotResponse>>> {
    let request = parse_add_slot(&payload, caller.into_inner())?;
    let slots = state.availability.add_slot(request).await?;
    Ok(web::Json(slot_list(&slots)))
}

/// Withdraw a slot unless a live session is booked inside it.
#[utoipa::path(
    delete,
    path = "/api/v1/availability/{slotId}",
    params(("slotId" = String, Path, description = "Slot identifier")),
    responses(
        (status = 200, description = "Remaining slots", body = [SlotResponse]),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Slot not found", body = ErrorSchema),
        (status = 409, description = "Slot has a live session", body = ErrorSchema)
    ),
    tags = ["availability"],
    operation_id = "removeAvailabilitySlot",
    security(("SessionCookie" = []))
)]
#[delete("/availability/{slot_id}")]
pub async fn remove_slot(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<SlotResponse>>> {
    let slot_id = parse_uuid(&path, FieldName::new("slotId"))?;
    let slots = state
        .availability
        .remove_slot(RemoveSlotRequest {
            owner_id: caller.into_inner(),
            slot_id,
        })
        .await?;
    Ok(web::Json(slot_list(&slots)))
}

/// Future slots of a tutor, each flagged when already booked.
#[utoipa::path(
    get,
    path = "/api/v1/tutors/{id}/availability",
    params(("id" = String, Path, description = "Tutor identifier")),
    responses(
        (status = 200, description = "Future slots", body = [SlotAvailabilityResponse]),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["availability"],
    operation_id = "listTutorAvailability",
    security(("SessionCookie" = []))
)]
#[get("/tutors/{id}/availability")]
pub async fn list_tutor_availability(
    state: web::Data<HttpState>,
    _caller: Caller,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<SlotAvailabilityResponse>>> {
    let tutor_id = UserId::from_uuid(parse_uuid(&path, FieldName::new("id"))?);
    let slots = state
        .availability_query
        .list_future_availability(&tutor_id)
        .await?;
    Ok(web::Json(
        slots
            .into_iter()
            .map(SlotAvailabilityResponse::from)
            .collect(),
    ))
}
