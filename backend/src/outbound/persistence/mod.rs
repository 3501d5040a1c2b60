//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the booking ports backed by PostgreSQL via
//! `diesel-async` and `bb8` connection pooling.
//!
//! - **Thin adapters**: repositories translate between Diesel rows and domain
//!   types. Booking rules stay in the domain services.
//! - **Internal models**: row structs (`models.rs`) and the schema
//!   (`schema.rs`) never leave this module.
//! - **Atomic writes**: overlap checks and inserts share one transaction
//!   guarded by an advisory lock; transitions are conditional updates.
//!
//! # Example
//!
//! ```ignore
//! use tutor_booking::outbound::persistence::{DbPool, DieselSessionRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/tutoring")).await?;
//! let sessions = DieselSessionRepository::new(pool);
//! ```

mod diesel_availability_repository;
mod diesel_notification_sink;
mod diesel_session_repository;
mod diesel_user_directory;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_availability_repository::DieselAvailabilityRepository;
pub use diesel_notification_sink::DieselNotificationSink;
pub use diesel_session_repository::DieselSessionRepository;
pub use diesel_user_directory::DieselUserDirectory;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
