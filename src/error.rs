use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForensicsError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Report builder misuse: {0}")]
    BuilderMisuse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<image::ImageError> for ForensicsError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(io) => ForensicsError::Io(io),
            other => ForensicsError::Codec(other.to_string()),
        }
    }
}

impl From<jpeg_encoder::EncodingError> for ForensicsError {
    fn from(err: jpeg_encoder::EncodingError) -> Self {
        ForensicsError::Codec(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ForensicsError>;
