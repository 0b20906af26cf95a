use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the framework core and its resource layer.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A scene was requested by a name that was never registered.
    #[error("scene '{0}' not found")]
    SceneNotFound(String),

    /// Popping would leave the scene stack empty.
    #[error("cannot pop the last scene on the stack")]
    EmptySceneStack,

    /// An asset path could not be found on disk.
    #[error("resource not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    /// An animation was constructed without any frames.
    #[error("animation must have at least one frame")]
    EmptyAnimation,

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to load font: {0}")]
    Font(String),

    #[error("audio error: {0}")]
    Audio(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the library.
pub type Result<T, E = EngineError> = std::result::Result<T, E>;
