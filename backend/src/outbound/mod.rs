//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: process-local store used when no database is configured
//! - **calendar**: HTTP calendar provider for meeting links
//! - **notifications**: log-backed notification sink
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no booking rules.

pub mod calendar;
pub mod memory;
pub mod notifications;
pub mod persistence;
