/// A step of an estimate that could not produce a usable number. Always
/// recovered inside the engine by falling back to a simpler formula.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimationError {
    #[error("unit price for {item} must be positive, got {price}")]
    InvalidUnitPrice { item: &'static str, price: f64 },

    #[error("{stage} produced a non-finite value")]
    NonFinite { stage: &'static str },
}

/// Credential store errors.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("both access key id and secret access key are required")]
    MissingFields,

    #[error("credential store at {path} is malformed: {reason}")]
    Malformed { path: String, reason: String },
}
