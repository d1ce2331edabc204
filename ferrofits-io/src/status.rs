use std::fmt::Display;

use ferrofits_error::{FitsError, FitsResult, fits_err};

/// Writing to a container opened read-only.
pub const READONLY_FILE: i32 = 112;
/// A header card contains illegal characters or is too long.
pub const BAD_KEYCHAR: i32 = 207;
/// A header card number is out of range.
pub const KEY_OUT_BOUNDS: i32 = 203;
/// The current HDU is not a binary table.
pub const NOT_BTABLE: i32 = 227;
/// The current HDU is not an image.
pub const NOT_IMAGE: i32 = 233;
/// An HDU index is out of range.
pub const BAD_HDU_NUM: i32 = 301;
/// A column number is out of range.
pub const BAD_COL_NUM: i32 = 302;
/// A row number is out of range.
pub const BAD_ROW_NUM: i32 = 307;
/// An element number is out of range, or a transfer length does not fit the cells.
pub const BAD_ELEM_NUM: i32 = 308;
/// A dimension is negative, or a repeat count does not match a shape.
pub const BAD_DIMEN: i32 = 320;
/// The datatype of a transfer cannot be converted to or from the stored type.
pub const BAD_DATATYPE: i32 = 410;
/// A value does not fit in the stored type.
pub const NUM_OVERFLOW: i32 = 412;

/// A recoverable failure reported by a transport.
///
/// The core never interprets the code beyond success or failure: it wraps the status into a
/// [`FitsError::Transport`] together with what it was doing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("status {code}: {message}")]
pub struct Status {
    /// The status code, numbered like CFITSIO's.
    pub code: i32,
    /// A human-readable description.
    pub message: String,
}

impl Status {
    /// Creates a status.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Converts into a [`FitsError`], prefixing the message with the failed operation.
    pub fn into_error(self, context: impl Display) -> FitsError {
        fits_err!(Transport: self.code, "{}: {}", context, self.message)
    }
}

impl From<Status> for FitsError {
    fn from(status: Status) -> Self {
        fits_err!(Transport: status.code, "{}", status.message)
    }
}

/// Attaches the failed operation to a transport status.
pub trait StatusContext<T> {
    /// Converts the status, if any, into a [`FitsError`] with the given context.
    fn context(self, context: impl Display) -> FitsResult<T>;

    /// Like [`StatusContext::context`], with a lazily built context.
    fn with_context<C: Display, F: FnOnce() -> C>(self, context: F) -> FitsResult<T>;
}

impl<T> StatusContext<T> for Result<T, Status> {
    fn context(self, context: impl Display) -> FitsResult<T> {
        self.map_err(|status| status.into_error(context))
    }

    fn with_context<C: Display, F: FnOnce() -> C>(self, context: F) -> FitsResult<T> {
        self.map_err(|status| status.into_error(context()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_becomes_transport_error() {
        let result: Result<(), Status> = Err(Status::new(BAD_COL_NUM, "no column 7"));
        let err = result.context("reading column 7").unwrap_err();
        assert!(err.is_transport());
        match err {
            FitsError::Transport { code, context, .. } => {
                assert_eq!(code, BAD_COL_NUM);
                assert_eq!(&*context, "reading column 7: no column 7");
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn lazy_context_is_not_built_on_success() {
        let result: Result<u8, Status> = Ok(3);
        let value = result
            .with_context(|| -> String { panic!("context built on success") })
            .unwrap();
        assert_eq!(value, 3);
    }
}
