use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// No default input device, or the host refused to enumerate one
    #[error("no audio recording device is available")]
    DeviceUnavailable,

    #[error("stdout is not a terminal (use --raw-output to render to a file)")]
    NotATerminal,

    #[error("failed to query audio device config: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build audio stream: {0}")]
    StreamBuild(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    StreamPlay(#[from] cpal::PlayStreamError),

    #[error("unsupported sample format: {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
