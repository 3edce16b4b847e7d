/// Convenience result type used across Scrim.
pub type ScrimResult<T> = Result<T, ScrimError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum ScrimError {
    /// Invalid user-provided or authoring data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while deriving mask rectangles and UV mappings.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Errors while producing or tracking replacement materials.
    #[error("replacement error: {0}")]
    Replacement(String),

    /// Errors while sampling a mask image on the CPU.
    #[error("sampling error: {0}")]
    Sampling(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScrimError {
    /// Build a [`ScrimError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ScrimError::Geometry`] value.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`ScrimError::Replacement`] value.
    pub fn replacement(msg: impl Into<String>) -> Self {
        Self::Replacement(msg.into())
    }

    /// Build a [`ScrimError::Sampling`] value.
    pub fn sampling(msg: impl Into<String>) -> Self {
        Self::Sampling(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
