use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("video source unavailable: {uri}")]
    SourceUnavailable { uri: String },

    #[error("frame read failed: {0}")]
    FrameRead(String),

    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid video name: {0}")]
    InvalidVideoName(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, StreamError>;
