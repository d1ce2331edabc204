#![deny(missing_docs)]

//! Error handling for Ferrofits.
//!
//! Every fallible operation of the workspace returns a [`FitsResult`]. The variants of
//! [`FitsError`] form a closed taxonomy: callers can match on them to decide whether a failure
//! comes from their own input (a missing column, a shape mismatch, a write on a read-only
//! container) or from the transport underneath.
//!
//! Errors are built with the [`fits_err!`] and [`fits_bail!`] macros, which capture a backtrace
//! at the point of creation.

pub use ext::*;

mod ext;

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;
use std::fmt;

/// A string that can be used as an error message.
#[derive(Debug)]
pub struct ErrString(Cow<'static, str>);

#[allow(clippy::fallible_impl_from)]
impl<T> From<T> for ErrString
where
    T: Into<Cow<'static, str>>,
{
    fn from(msg: T) -> Self {
        Self(msg.into())
    }
}

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The top-level error type for Ferrofits.
#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum FitsError {
    /// A value type has no mapping for the requested role (pixel, column or record).
    #[error("unsupported type: {0}\nBacktrace:\n{1}")]
    UnsupportedType(ErrString, Box<Backtrace>),
    /// A column, keyword or region does not exist.
    #[error("not found: {0}\nBacktrace:\n{1}")]
    NotFound(ErrString, Box<Backtrace>),
    /// A name matches more than one entity.
    #[error("ambiguous: {0}\nBacktrace:\n{1}")]
    Ambiguous(ErrString, Box<Backtrace>),
    /// An entity which must be unique already exists.
    #[error("already exists: {0}\nBacktrace:\n{1}")]
    AlreadyExists(ErrString, Box<Backtrace>),
    /// Two shapes, dimensions or row counts which must agree do not.
    #[error("shape mismatch: {0}\nBacktrace:\n{1}")]
    ShapeMismatch(ErrString, Box<Backtrace>),
    /// A write was attempted through a handle opened without write permission.
    #[error("read-only: {0}\nBacktrace:\n{1}")]
    ReadOnly(ErrString, Box<Backtrace>),
    /// An index or position is out of the bounds of a container.
    #[error("out of bounds: {0}\nBacktrace:\n{1}")]
    OutOfBounds(ErrString, Box<Backtrace>),
    /// An argument is invalid, e.g. a malformed header card or a negative repeat count.
    #[error("invalid argument: {0}\nBacktrace:\n{1}")]
    InvalidArgument(ErrString, Box<Backtrace>),
    /// The transport reported a failure status.
    #[error("transport failure (status {code}): {context}\nBacktrace:\n{backtrace}")]
    Transport {
        /// The raw transport status code.
        code: i32,
        /// What the core was doing, and what the transport said.
        context: ErrString,
        /// Where the failure was observed.
        backtrace: Box<Backtrace>,
    },
    /// An error wrapped with additional context.
    #[error("{0}: {1}")]
    Context(ErrString, #[source] Box<FitsError>),
}

impl FitsError {
    /// Adds additional context to an error.
    pub fn with_context<T: Into<ErrString>>(self, msg: T) -> Self {
        FitsError::Context(msg.into(), Box::new(self))
    }

    /// The innermost error, skipping every layer of [`FitsError::Context`].
    pub fn root(&self) -> &FitsError {
        match self {
            FitsError::Context(_, inner) => inner.root(),
            other => other,
        }
    }

    /// Whether the root cause is [`FitsError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), FitsError::NotFound(..))
    }

    /// Whether the root cause is [`FitsError::Ambiguous`].
    pub fn is_ambiguous(&self) -> bool {
        matches!(self.root(), FitsError::Ambiguous(..))
    }

    /// Whether the root cause is [`FitsError::ShapeMismatch`].
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self.root(), FitsError::ShapeMismatch(..))
    }

    /// Whether the root cause is [`FitsError::ReadOnly`].
    pub fn is_read_only(&self) -> bool {
        matches!(self.root(), FitsError::ReadOnly(..))
    }

    /// Whether the root cause is [`FitsError::OutOfBounds`].
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self.root(), FitsError::OutOfBounds(..))
    }

    /// Whether the root cause is a transport failure.
    pub fn is_transport(&self) -> bool {
        matches!(self.root(), FitsError::Transport { .. })
    }
}

impl Debug for FitsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// A type alias for Results that return [`FitsError`]s as their error type.
pub type FitsResult<T> = Result<T, FitsError>;

/// A convenient macro for creating a [`FitsError`].
///
/// The first token may name the variant, e.g. `fits_err!(NotFound: "column {}", name)`.
/// Without a variant, the error is an [`FitsError::InvalidArgument`].
#[macro_export]
macro_rules! fits_err {
    (Transport: $code:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        use std::backtrace::Backtrace;
        $crate::FitsError::Transport {
            code: $code,
            context: format!($fmt $(, $arg)*).into(),
            backtrace: Box::new(Backtrace::capture()),
        }
    }};
    (Context: $msg:literal, $err:expr) => {{
        $crate::FitsError::Context($msg.into(), Box::new($err))
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {{
        use std::backtrace::Backtrace;
        $crate::FitsError::$variant(format!($fmt $(, $arg)*).into(), Box::new(Backtrace::capture()))
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::fits_err!(InvalidArgument: $fmt $(, $arg)*)
    };
}

/// A convenient macro for returning a [`FitsError`] from the current function.
#[macro_export]
macro_rules! fits_bail {
    ($($tt:tt)+) => {
        return Err($crate::fits_err!($($tt)+))
    };
}

/// A convenient macro for panicking with a [`FitsError`] in the presence of a programmer error
/// (e.g., an invariant has been violated).
#[macro_export]
macro_rules! fits_panic {
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::fits_panic!($crate::fits_err!($variant: $fmt $(, $arg)*))
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::fits_panic!($crate::fits_err!($fmt $(, $arg)*))
    };
    ($err:expr) => {{
        let err: $crate::FitsError = $err;
        #[allow(clippy::panic)]
        {
            panic!("{}", err)
        }
    }};
}
