//! Calendar outbound adapters.
//!
//! A thin HTTP implementation of the `CalendarProvider` port for services
//! that speak the Google Calendar events API shape.

mod dto;
mod http_provider;

pub use http_provider::HttpCalendarProvider;
