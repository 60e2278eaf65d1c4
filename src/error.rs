use thiserror::Error;

use crate::surface::SurfaceError;

/// Library error type for slideshow operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The render surface has no usable container to draw the grid into.
    #[error("the background container must be provided and be valid")]
    MissingContainer,

    /// A slideshow needs at least one image to display.
    #[error("at least one background image is required")]
    NoImages,

    /// The grid must contain at least one cell.
    #[error("grid must have at least one row and one column (got {rows}x{columns})")]
    InvalidGrid { rows: usize, columns: usize },

    /// A pattern name did not match any known preset.
    #[error(
        "unknown pattern '{}', expected one of: {}",
        .name,
        crate::pattern::PRESETS.join(", ")
    )]
    UnknownPattern { name: String },

    /// The slideshow task is gone and no longer accepts commands.
    #[error("slideshow command channel closed")]
    ChannelClosed,

    /// The render surface refused an operation.
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),
}
