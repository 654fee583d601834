//! # Filter Errors

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Filter errors.
///
/// Errors are only raised while parsing external input (field keys, JSON
/// configs, datasets and data lists). Filter matching and the registry
/// operations degrade to empty results instead.
#[derive(Error, Debug, Deserialize)]
pub enum Error {
    /// A field key string could not be parsed.
    #[error(r#"{{"code": 400, "detail": "{0}"}}"#)]
    InvalidFieldKey(String),

    /// The input was well-formed but does not describe a filter.
    #[error(r#"{{"code": 400, "detail": "{0}"}}"#)]
    InvalidInput(String),

    /// Placeholder error type until moving to more strongly typed errors.
    #[error(r#"{{"code": 400, "detail": "{0}"}}"#)]
    Unexpected(String),

    /// Input could not be (de)serialized.
    #[error(r#"{{"code": 500, "detail": "{0}"}}"#)]
    Serialization(String),
}

impl Serialize for Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error as SerdeError;

        let Ok(error) = serde_json::from_str::<FilterError>(&self.to_string()) else {
            return Err(SerdeError::custom("issue deserializing Err"));
        };
        error.serialize(serializer)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Construct an `Error::Unexpected` error from a string or existing error
/// value.
///
/// This evaluates to an [`Error`][crate::Error]. It can take either just a
/// string, or a format string with arguments.
///
/// # Example
///
/// ```
/// use credibil_filter::{Error, unexpected};
///
/// let err: Error = unexpected!("unknown filter tag: {}", "box");
/// assert_eq!(err.to_string(), r#"{"code": 400, "detail": "unknown filter tag: box"}"#);
/// ```
#[macro_export]
macro_rules! unexpected {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::Unexpected(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::Unexpected(format!($err))
    };
}

// Error response for serializing internal errors to JSON.
#[derive(Deserialize, Serialize)]
struct FilterError {
    /// Error code.
    code: u16,

    /// Error description.
    detail: String,
}

impl Error {
    /// Transform the error into its JSON representation.
    #[must_use]
    pub fn to_json(self) -> serde_json::Value {
        serde_json::from_str(&self.to_string()).unwrap_or_default()
    }
}
