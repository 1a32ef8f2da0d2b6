use thiserror::Error;

/// Error type for invalid configurations.
///
/// Nearly every variant is a configuration-time defect: the reaction network
/// is assembled once, validated eagerly and then runs as a deterministic
/// numerical pass. The only runtime variant is a missing forcing field that
/// an enabled rule requires. Concentrations falling below the tracer floor
/// are handled structurally by the flag/clip mechanism, not through this
/// type.
#[derive(Error, Debug)]
pub enum BgcError {
    #[error("tracer '{0}' has already been registered")]
    DuplicateTracer(String),
    #[error("rule '{0}' has already been registered")]
    DuplicateRule(String),
    #[error("rule '{0}' has already been selected")]
    DuplicateSelection(String),
    #[error("no tracer named '{0}' is registered")]
    UnknownTracer(String),
    #[error("no rule named '{0}' is registered")]
    UnknownRule(String),
    #[error("rule group '{0}' cannot carry a label or boundary")]
    GroupWithMetadata(String),
    #[error("invalid parameter file: {0}")]
    InvalidParameters(#[from] toml::de::Error),
    #[error("invalid extension combination: {0}")]
    InvalidExtensions(String),
    #[error("the air-sea carbon flux rule is selected but the forcing carries no carbon flux")]
    MissingCarbonFlux,
}

/// Convenience type for `Result<T, BgcError>`.
pub type BgcResult<T> = Result<T, BgcError>;
