//! Crate error type.

/// Errors surfaced by construction, training, inference, and persistence.
#[derive(Debug, thiserror::Error)]
pub enum TsetlinError {
    /// A hyperparameter combination violates the documented invariants.
    #[error("invalid hyperparameters: {reason}")]
    InvalidHyperparameters { reason: String },

    /// A caller-provided buffer (`X`, `y`, `y_pred`) has the wrong shape, or
    /// `y_size`/`y_element_size` disagrees with the configured output mode.
    #[error("shape mismatch: {reason}")]
    ShapeMismatch { reason: String },

    /// A save or load call failed doing I/O; `action` names the phase.
    #[error("I/O error while {action}: {source}")]
    Io {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// On-disk data failed to parse as a valid model (bad sentinel,
    /// truncated stream, out-of-range field).
    #[error("corrupt model data: {reason}")]
    CorruptModel { reason: String },
}

pub type Result<T> = std::result::Result<T, TsetlinError>;

impl TsetlinError {
    pub(crate) fn io(action: &'static str, source: std::io::Error) -> Self {
        Self::Io { action, source }
    }
}
