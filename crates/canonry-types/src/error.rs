use thiserror::Error;

/// Data-model validation errors.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Required identity-field keys are still missing after layered
    /// resolution against the run-manifest defaults.
    #[error("missing identity field keys: {}", .0.join(", "))]
    MissingIdentityKeys(Vec<String>),
}
