use thiserror::Error;

/// Failures inside the playback core. These are logged and folded into the
/// published snapshot; they never cross the `PlaybackHandle` boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("Load failed: {0}")]
    LoadFailure(String),

    #[error("Seek to {target:.3}s abandoned after {waited_ms}ms without completion")]
    SeekTimeout { target: f64, waited_ms: u64 },

    #[error("Playback controller is no longer running")]
    Disconnected,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Favorites storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
