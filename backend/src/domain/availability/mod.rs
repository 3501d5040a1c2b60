//! Tutor availability slots and their reconciliation against booked sessions.
//!
//! A slot is a calendar date plus a wall-clock `[start, end)` range. Wall
//! times carry no zone and are read as UTC when compared with sessions.

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::booking::{Session, TimeWindow};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// Validation failures for slot input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotTimeError {
    #[error("date must use the YYYY-MM-DD format")]
    InvalidDate { value: String },
    #[error("time must use the HH:MM format")]
    InvalidTime { value: String },
    #[error("end time must be after start time")]
    InvertedRange,
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_slot_date(raw: &str) -> Result<NaiveDate, SlotTimeError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| SlotTimeError::InvalidDate {
        value: raw.to_owned(),
    })
}

/// Parse an `HH:MM` wall-clock time.
pub fn parse_wall_time(raw: &str) -> Result<NaiveTime, SlotTimeError> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT).map_err(|_| SlotTimeError::InvalidTime {
        value: raw.to_owned(),
    })
}

/// Render a wall-clock time as `HH:MM`.
pub fn format_wall_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// A tutor-declared block of time on one calendar date.
///
/// ## Invariants
/// - `end_time` is strictly after `start_time`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilitySlot {
    id: Uuid,
    owner_id: UserId,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    window: TimeWindow,
}

impl AvailabilitySlot {
    pub fn new(
        id: Uuid,
        owner_id: UserId,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<Self, SlotTimeError> {
        let window = TimeWindow::new(
            date.and_time(start_time).and_utc(),
            date.and_time(end_time).and_utc(),
        )
        .map_err(|_| SlotTimeError::InvertedRange)?;
        Ok(Self {
            id,
            owner_id,
            date,
            start_time,
            end_time,
            window,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    pub fn end_time(&self) -> NaiveTime {
        self.end_time
    }

    /// Absolute `[start, end)` window with wall times read as UTC.
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// Same date and overlapping minute ranges.
    pub fn overlaps(&self, other: &AvailabilitySlot) -> bool {
        self.date == other.date
            && self.start_time < other.end_time
            && self.end_time > other.start_time
    }

    /// Ordering by date, then start time.
    pub fn chronological(a: &AvailabilitySlot, b: &AvailabilitySlot) -> Ordering {
        (a.date, a.start_time).cmp(&(b.date, b.start_time))
    }
}

/// A slot annotated with whether a live session already occupies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotAvailability {
    pub slot: AvailabilitySlot,
    pub already_booked: bool,
}

/// Future slots of a tutor in chronological order, flagged when booked.
///
/// `today` filters by date only. `sessions` may contain anything; only live
/// sessions of the slot owner count.
pub fn reconcile<'a, I>(
    slots: Vec<AvailabilitySlot>,
    sessions: I,
    today: NaiveDate,
) -> Vec<SlotAvailability>
where
    I: IntoIterator<Item = &'a Session> + Clone,
{
    let mut future: Vec<AvailabilitySlot> =
        slots.into_iter().filter(|slot| slot.date >= today).collect();
    future.sort_by(AvailabilitySlot::chronological);

    future
        .into_iter()
        .map(|slot| {
            let window = slot.window();
            let already_booked = crate::domain::booking::has_conflict(
                sessions.clone(),
                slot.owner_id(),
                &window,
                None,
            );
            SlotAvailability {
                slot,
                already_booked,
            }
        })
        .collect()
}
