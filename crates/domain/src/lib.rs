//! social-state domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `state`: Post repository, comment index and engagement tracker
//! - `persistence`: Durable record codec and migration
//! - `query`: Derived read views
//! - `usecases`: Engine, feed sync and flush worker
//! - `policy`: Compose constraints

pub mod error;
pub mod model;
pub mod persistence;
pub mod policy;
pub mod ports;
pub mod query;
pub mod state;
pub mod usecases;

pub use error::EngineError;
pub use model::*;
pub use persistence::PersistedState;
pub use ports::*;
pub use query::{EngagementSummary, QueryFacade};
pub use state::{Engagement, EngagementState, IngestSummary};
