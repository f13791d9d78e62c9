use std::borrow::Cow;

use thiserror::Error;

/// Represents an error encountered while reading or writing a PO catalog.
#[derive(Debug, Error)]
pub enum Error {
    /// The PO text could not be tokenized
    #[error("line {line}: {message}")]
    Parse {
        /// 1-based line number of the offending line
        line: usize,
        /// What the grammar expected
        message: String,
    },
    /// An invalid byte sequence for the given encoding has been encountered
    #[error("invalid byte sequence in a string")]
    DecodingError,
    /// The text contains characters the target encoding cannot represent
    #[error("text cannot be represented in the catalog encoding")]
    EncodingError,
    /// Incorrect syntax encountered while parsing the header entry
    #[error("metadata syntax error")]
    MalformedMetadata,
    /// An unknown encoding was specified in the metadata
    #[error("unknown encoding specified: {0}")]
    UnknownEncoding(String),
    /// Writer options could not be deserialized
    #[error("invalid options: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn parse<M: Into<String>>(line: usize, message: M) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}

impl From<Cow<'static, str>> for Error {
    fn from(_: Cow<'static, str>) -> Error {
        Error::DecodingError
    }
}
