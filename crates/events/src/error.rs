//! Codec error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    /// The bytes are not a valid protobuf message of the expected type.
    #[error("Malformed event payload: {0}")]
    Decode(#[from] prost::DecodeError),

    /// An identifier field does not hold a UUID.
    #[error("Invalid UUID in field {field}: {source}")]
    InvalidUuid {
        field: &'static str,
        #[source]
        source: uuid::Error,
    },
}

impl CodecError {
    /// Returns the offending field for identifier errors.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidUuid { field, .. } => Some(field),
            Self::Decode(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
