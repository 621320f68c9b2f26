//! Error types for channelsol

use thiserror::Error;

/// Errors surfaced by model configuration, validation and setup I/O.
///
/// Configuration errors are raised before any voltage is processed; numerical
/// soft failures (an SVD that does not converge at one voltage) are *not*
/// errors and are reported through
/// [`MethodStatus`](crate::solver::MethodStatus) instead.
#[derive(Error, Debug)]
pub enum ChannelsolError {
    /// A channel must have at least one binding site
    #[error("a channel model requires at least one binding site")]
    NoBindingSites,

    /// The solute list may not be empty
    #[error("the solute list is empty")]
    NoSolutes,

    /// Solute identifiers must be unique
    #[error("duplicate solute identifier: {0}")]
    DuplicateSolute(String),

    /// One charge per solute, in the same order
    #[error("charge list length {charges} does not match solute list length {solutes}")]
    ChargeCountMismatch { solutes: usize, charges: usize },

    /// Interaction mode string not in the accepted set
    #[error(
        "unknown interaction mode '{0}' (expected one of: none, single Q, single QR, full Q, full QR)"
    )]
    UnknownInteractionMode(String),

    /// Numeric backend string not in the accepted set
    #[error("unknown numeric backend '{0}' (expected 'double-precision' or 'arbitrary-precision')")]
    UnknownBackend(String),

    /// Arbitrary-precision backend needs at least one decimal digit
    #[error("precision of {0} decimal digits is invalid for the arbitrary-precision backend")]
    InvalidPrecision(u32),

    /// The electrical-distance list must hold one value per profile point
    #[error("electrical distance list has {found} entries, expected {expected}")]
    DistanceCount { expected: usize, found: usize },

    /// Electrical distances are fractions of the transmembrane voltage drop
    #[error("electrical distance {value} at profile point {index} is outside [0, 1]")]
    DistanceOutOfRange { index: usize, value: f64 },

    /// Every solute must supply a complete energy profile
    #[error("energy profile for solute '{solute}' has {found} entries, expected {expected}")]
    EnergyCount {
        solute: String,
        expected: usize,
        found: usize,
    },

    /// A solute declared in the model has no energy profile
    #[error("no energy profile supplied for solute '{0}'")]
    MissingEnergyProfile(String),

    /// A solute declared in the model has no concentration pair
    #[error("no concentrations supplied for solute '{0}'")]
    MissingConcentration(String),

    /// Concentrations are molarities and cannot be negative
    #[error("negative concentration {value} M for solute '{solute}'")]
    NegativeConcentration { solute: String, value: f64 },

    /// Interaction coefficient value lists must match the declared slots
    #[error("{kind} coefficient list has {found} entries, expected {expected}")]
    CoefficientCount {
        kind: &'static str,
        expected: usize,
        found: usize,
    },

    /// Setup (de)serialization failure
    #[error("setup serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
