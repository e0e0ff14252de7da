use thiserror::Error;

use crate::entities::{Resource, ResourceKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} with ID: {id} already exists")]
    AlreadyExists { kind: ResourceKind, id: String },
    #[error("{kind} with ID: {id} not found")]
    NotFound { kind: ResourceKind, id: String },
    #[error(
        "attempting to delete {kind} with ID: {id} while it still has active dependents: {dependents:?}. Delete dependents first"
    )]
    PreconditionFailed {
        kind: ResourceKind,
        id: String,
        dependents: Vec<String>,
    },
    #[error("store invariant violated: {0}")]
    InvariantViolation(String),
}

impl StoreError {
    pub fn already_exists<R: Resource>(id: &R::Id) -> Self {
        Self::AlreadyExists {
            kind: R::KIND,
            id: id.to_string(),
        }
    }

    pub fn not_found<R: Resource>(id: &R::Id) -> Self {
        Self::NotFound {
            kind: R::KIND,
            id: id.to_string(),
        }
    }

    pub fn invariant_violation(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StatusCodeError {
    #[error("unknown requested status code: {0}")]
    UnknownRequested(i32),
    #[error("unknown actual status code: {0}")]
    UnknownActual(i32),
}
