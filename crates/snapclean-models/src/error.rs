//! Model validation errors.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("No image data provided")]
    EmptyPayload,

    #[error("Not an image: {0}")]
    NotAnImage(String),

    #[error("Image is {size} bytes, the limit is {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("Malformed data URI: {0}")]
    MalformedDataUri(String),
}
