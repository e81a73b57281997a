//! Error types for the simulation core.

use thiserror::Error;

use crate::data::{ActionId, EntityId, EntityType};

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Top-level error type for all simulation errors.
///
/// Transient gameplay conditions (dead target, out of range, full energy)
/// are never errors; they surface through action prerequisites instead.
#[derive(Debug, Error)]
pub enum SimError {
    /// An action id was passed that matches no module of the entity.
    #[error("Unknown action id: {0:?}")]
    UnknownAction(ActionId),

    /// An entity type was registered twice.
    #[error("Entity type already registered: {0:?}")]
    DuplicateEntityType(EntityType),

    /// An operation required an entity that is not in the registry.
    #[error("Entity not found: {0:?}")]
    EntityNotFound(EntityId),

    /// Invalid simulation state (snapshot codec failures and the like).
    #[error("Invalid simulation state: {0}")]
    InvalidState(String),
}
