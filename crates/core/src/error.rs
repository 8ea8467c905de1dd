/// Domain error taxonomy shared by every crate in the workspace.
///
/// `Upstream` covers both an unreachable remote collaborator and a remote
/// failure envelope; the core never retries on its own.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::NotFound`] with any displayable id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// The error message surfaced to a caller, without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            CoreError::NotFound { entity, id } => format!("{entity} {id} not found"),
            CoreError::Validation(msg)
            | CoreError::Conflict(msg)
            | CoreError::Upstream(msg)
            | CoreError::Internal(msg) => msg.clone(),
        }
    }
}
