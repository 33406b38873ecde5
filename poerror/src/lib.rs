// Copyright (C) 2020-2026  The Blockhouse Technology Limited (TBTL).
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public
// License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! This crate provides the error handling system used across the PocketOne credential core.
//!
//! Constructed errors are automatically logged as warnings and carry the backtrace of source
//! errors with them, along with extra context if any.
//!
//! # Details
//!
//! Use `std::result::Result<T, poerror::Error<E>>`, or equivalently `poerror::Result<T, E>` as
//! the return type for functions which may return an error.
//!
//! The error type `E` in `poerror::Error<E>` must implement the [`PoError`] trait.  Therefore,
//! all of our concrete error types must implement [`PoError`].
//!
//! Constructing the initial, root error is done via the [`Error::root`] method.  This will also
//! log a warning.
//!
//! Error types that are not defined by us, i.e. don't implement [`PoError`] but do implement
//! [`std::error::Error`] we name as "foreign errors".  These errors can be converted & propagated
//! to `poerror::Error<E>` via the [`ForeignError`][traits::ForeignError] trait.
//!
//! Propagating `poerror::Error<E>` types is done via the
//! [`PropagateError`][traits::PropagateError] trait, instead of using `?`.  This way we preserve
//! the trace of source errors.
//!
//! Additional context can be attached to an error using the [`Error::ctx`] method.  As a
//! convenience, we also offer [`ErrorContext`][traits::ErrorContext] trait which extends the
//! [`Result`] type with the same method.
//!
//! # Examples
//!
//! ```
//! use poerror::traits::{ErrorContext, ForeignError, PropagateError};
//!
//! enum MyErrors {
//!     NumberIsNegativeError,
//!     NumberParseError,
//! }
//!
//! impl std::fmt::Display for MyErrors {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         match self {
//!             MyErrors::NumberIsNegativeError => write!(f, "MyErrors::NumberIsNegativeError"),
//!             MyErrors::NumberParseError => write!(f, "MyErrors::NumberParseError"),
//!         }
//!     }
//! }
//!
//! impl poerror::PoError for MyErrors {}
//!
//! fn my_function(s: &str) -> poerror::Result<i32, MyErrors> {
//!     let num = s
//!         .parse()
//!         // Propagate a "foreign error" and log it as a warning.
//!         .foreign_err(|| MyErrors::NumberParseError)
//!         // Add some additional context to the error.
//!         .ctx(|| format!("parsing {s}"))?;
//!     if num < 0 {
//!         // Return the root error and log it as a warning.
//!         Err(poerror::Error::root(MyErrors::NumberIsNegativeError))
//!     } else {
//!         Ok(num)
//!     }
//! }
//! ```

use crate::traits::Warnable;

mod display;
pub mod traits;

/// The trait needed for compatibility with the [`Error`] functionality.
pub trait PoError: std::fmt::Display + Send + Sync + 'static {}

// This impl covers all boxed error types, including `dyn PoError`
impl<E: PoError + ?Sized> PoError for Box<E> {}

trait KnownError: std::error::Error + Send + Sync {
    fn as_err(&self) -> &(dyn std::error::Error + 'static);
}

impl<T> KnownError for Error<T>
where
    T: PoError,
{
    fn as_err(&self) -> &(dyn std::error::Error + 'static) {
        self
    }
}

pub(crate) enum ErrorSource {
    KnownError(Box<dyn KnownError>),
    ForeignError(Box<dyn std::error::Error + Send + Sync>),
}

/// A struct that should be used for all errors in our projects.
///
/// It wraps specific errors created to model different error groups. Those errors should all
/// implement the [`PoError`] trait in order to be compatible. They should not implement the
/// [`std::error::Error`] trait themselves, it will be handled by this [`Error`] struct.
///
/// This wrapper automatically keeps track of the whole error chain, as well as the context
/// assigned to the error, which might elaborate on the error specifics. It also handles all the
/// error displays.
pub struct Error<E>
where
    E: PoError,
{
    /// The concrete error variant.
    pub error: E,
    /// The optional context of the error.
    pub(crate) context: Vec<Box<dyn std::fmt::Display + Send + Sync>>,
    /// The error source, to be able to backtrace errors.
    pub(crate) source: Option<ErrorSource>,
}

/// The [`std::result::Result`] wrapper that wraps the error object into [`Error`].
pub type Result<T, E> = std::result::Result<T, Error<E>>;

impl<E> Error<E>
where
    E: PoError,
{
    /// Create a root error (i.e. it does not have a source) and log a warning.
    ///
    /// It should be used in places where an error happened for the first time.  Do *not* use this
    /// method to propagate another error, because the whole error chain will be lost.  If you
    /// want to propagate an error (i.e. track the source error), use either a method from the
    /// [`traits::ForeignError`] or the [`traits::PropagateError`].
    #[track_caller]
    pub fn root(error: E) -> Self {
        Self {
            error,
            context: Vec::new(),
            source: None,
        }
        .log_warn(*std::panic::Location::caller())
    }

    /// Creates an error from its source, which is a foreign (unknown) error.
    pub(crate) fn from_foreign_source<S>(error: E, source: S) -> Self
    where
        S: std::error::Error + Send + Sync + 'static,
    {
        Self {
            error,
            context: Vec::new(),
            source: Some(ErrorSource::ForeignError(Box::new(source))),
        }
    }

    /// Creates an error from its source, which is a known error.
    pub(crate) fn from_known_source<S>(error: E, source: S) -> Self
    where
        S: KnownError + 'static,
    {
        Self {
            error,
            context: Vec::new(),
            source: Some(ErrorSource::KnownError(Box::new(source))),
        }
    }

    /// Adds additional context to the error and returns it. It should be used to enrich the error
    /// with further explanations.
    ///
    /// The method takes ownership of `self` so that the method can be chained.
    ///
    /// Context can be added multiple times and all the contexts will be saved to the error.
    pub fn ctx<C>(mut self, context: C) -> Self
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.context.push(Box::new(context));
        self
    }
}

// Make the Error a std::error::Error type.
impl<E> std::error::Error for Error<E>
where
    E: PoError,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|source| match source {
            ErrorSource::KnownError(source) => source.as_ref().as_err(),
            ErrorSource::ForeignError(source) => source.as_ref() as _,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[derive(Debug, PartialEq)]
    enum DummyError {
        SystemError,
        UsageError,
    }

    impl std::fmt::Display for DummyError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::SystemError => write!(f, "SystemError"),
                Self::UsageError => write!(f, "UsageError"),
            }
        }
    }

    impl PoError for DummyError {}

    #[test]
    fn test_root() {
        let error = Error::root(DummyError::SystemError);

        assert_eq!(error.error, DummyError::SystemError);
        assert!(error.source.is_none());
    }

    #[test]
    fn test_from_sources() {
        let error_sys = Error::root(DummyError::SystemError);
        let error_us = Error::from_known_source(DummyError::UsageError, error_sys);

        assert_eq!(error_us.error, DummyError::UsageError);
        assert!(matches!(error_us.source, Some(ErrorSource::KnownError(_))));

        let foreign = std::io::Error::new(std::io::ErrorKind::Other, "io");
        let error_us = Error::from_foreign_source(DummyError::UsageError, foreign);

        assert_eq!(error_us.error, DummyError::UsageError);
        assert!(matches!(
            error_us.source,
            Some(ErrorSource::ForeignError(_))
        ));
    }

    #[test]
    fn test_ctx() {
        let error = Error::root(DummyError::UsageError)
            .ctx("first context")
            .ctx("second context");

        let ctx_vec: Vec<String> = error.context.iter().map(ToString::to_string).collect();
        assert!(ctx_vec.contains(&String::from("first context")));
        assert!(ctx_vec.contains(&String::from("second context")));
    }

    #[test]
    fn test_source() {
        let error = Error {
            error: DummyError::SystemError,
            context: Vec::new(),
            source: None,
        };
        assert!(error.source().is_none());

        let error = Error {
            error: DummyError::UsageError,
            context: Vec::new(),
            source: Some(ErrorSource::KnownError(Box::new(error))),
        };
        assert!(error.source().is_some());
    }
}
