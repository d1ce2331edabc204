use crate::{ErrString, FitsResult};

/// Extension trait for [`FitsResult`].
pub trait ResultExt<T>: private::Sealed {
    /// Wraps the error, if any, with a message describing the failed operation.
    fn context(self, msg: impl Into<ErrString>) -> FitsResult<T>;

    /// Like [`ResultExt::context`], building the message only on failure.
    fn with_context<M: Into<ErrString>, F: FnOnce() -> M>(self, msg: F) -> FitsResult<T>;
}

mod private {
    use crate::FitsResult;

    pub trait Sealed {}

    impl<T> Sealed for FitsResult<T> {}
}

impl<T> ResultExt<T> for FitsResult<T> {
    fn context(self, msg: impl Into<ErrString>) -> FitsResult<T> {
        self.map_err(|err| err.with_context(msg))
    }

    fn with_context<M: Into<ErrString>, F: FnOnce() -> M>(self, msg: F) -> FitsResult<T> {
        self.map_err(|err| err.with_context(msg()))
    }
}
