use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while opening or running an audio session
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio session already running")]
    AlreadyRunning,

    #[error("no input device selected")]
    NoInputSelected,

    #[error("no output device selected")]
    NoOutputSelected,

    #[error("device {0} not found")]
    DeviceNotFound(usize),

    #[error("device '{0}' cannot capture audio")]
    NotInputCapable(String),

    #[error("device '{0}' cannot play audio")]
    NotOutputCapable(String),

    #[error("failed to open stream: {0}")]
    StreamOpen(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("failed to spawn audio worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("audio worker exited before reporting readiness")]
    WorkerLost,
}

impl From<cpal::BuildStreamError> for AudioError {
    fn from(e: cpal::BuildStreamError) -> Self {
        AudioError::StreamOpen(e.to_string())
    }
}

impl From<cpal::PlayStreamError> for AudioError {
    fn from(e: cpal::PlayStreamError) -> Self {
        AudioError::StreamOpen(e.to_string())
    }
}

impl From<cpal::DevicesError> for AudioError {
    fn from(e: cpal::DevicesError) -> Self {
        AudioError::StreamOpen(e.to_string())
    }
}

/// Errors raised while writing a recording to disk
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to create recordings directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Wav { path: PathBuf, source: hound::Error },
}

/// Errors raised when talking to the controller thread
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("session controller is no longer running")]
    Disconnected,
}
