//! Error types for the placement engine.

use quadra_device::DeviceError;
use quadra_netlist::RegistryError;

/// The standard result type for placement operations.
pub type PlaceResult<T> = Result<T, PlacerError>;

/// Errors that abort a placement session.
///
/// Failures inside a single solve iteration (an asymmetric matrix, a stalled
/// conjugate-gradient run) are not errors: they are logged and the outer loop
/// reattempts on the next cycle. Only configuration problems and integrity
/// violations surface here.
#[derive(Debug, thiserror::Error)]
pub enum PlacerError {
    /// The session inputs or options violate a structural requirement.
    /// Fatal at session start.
    #[error("placement configuration error: {0}")]
    Configuration(String),

    /// A movable block cannot be mapped to any legal site.
    #[error("placement integrity error: {0}")]
    Integrity(String),

    /// A device-level failure (invalid or full site) during commit.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// A block registry construction failure.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
