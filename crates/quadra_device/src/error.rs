//! Error types for device construction and occupancy updates.

/// Errors produced by [`Device`](crate::Device) construction and mutation.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The device description violates a structural requirement.
    #[error("device configuration error: {0}")]
    Configuration(String),

    /// A coordinate does not identify a site of the expected kind.
    #[error("no site at ({x}, {y})")]
    InvalidSite {
        /// Column of the rejected coordinate.
        x: i32,
        /// Row of the rejected coordinate.
        y: i32,
    },

    /// A block was placed on a site that already holds another block.
    #[error("site ({x}, {y}) is already occupied")]
    FullSite {
        /// Column of the contested site.
        x: u32,
        /// Row of the contested site.
        y: u32,
    },
}
