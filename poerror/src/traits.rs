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

//! Extension traits over [`Result`][crate::Result] for error propagation, context and logging.

use std::panic::Location;

/// Trait for converting foreign errors to our [`crate::Error`] types.
///
/// This should only be used when propagating from an error that is outside our system,
/// i.e. foreign.  Do *not* use this to propagate the errors that are already in our system; for
/// those, use the [`PropagateError`] trait.
pub trait ForeignError<T, S, E>
where
    S: std::error::Error + Send + Sync + 'static,
    E: crate::PoError,
{
    /// Maps a `Result<T, S>` to `Result<T, crate::Error<E>>`.
    ///
    /// The [Ok] variant is left untouched.  An error `E` is wrapped inside a [`crate::Error`],
    /// with the [Err] variant value as its source.
    fn foreign_err<F>(self, f: F) -> crate::Result<T, E>
    where
        F: FnOnce() -> E;
}

impl<T, S, E> ForeignError<T, S, E> for std::result::Result<T, S>
where
    S: std::error::Error + Send + Sync + 'static,
    E: crate::PoError,
{
    #[track_caller]
    fn foreign_err<F>(self, f: F) -> crate::Result<T, E>
    where
        F: FnOnce() -> E,
    {
        let location = *Location::caller();
        self.map_err(|source| crate::Error::from_foreign_source(f(), source).log_warn(location))
    }
}

/// Trait for converting boxed foreign errors to our [`crate::Error`] types.
///
/// This is essentially the [`ForeignError`] trait but implemented for
/// `std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>`, as returned by the
/// external signing backends.
pub trait ForeignBoxed<T, E>
where
    E: crate::PoError,
{
    /// Maps a `Result<T, Box<dyn std::error::Error + Send + Sync>>` to `Result<T, Error<E>>`.
    fn foreign_boxed_err<F>(self, f: F) -> crate::Result<T, E>
    where
        F: FnOnce() -> E;
}

impl<T, E> ForeignBoxed<T, E> for std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>
where
    E: crate::PoError,
{
    #[track_caller]
    fn foreign_boxed_err<F>(self, f: F) -> crate::Result<T, E>
    where
        F: FnOnce() -> E,
    {
        let location = *Location::caller();
        self.map_err(|source| {
            let error = crate::Error {
                error: f(),
                context: Vec::new(),
                source: Some(crate::ErrorSource::ForeignError(source)),
            };
            error.log_warn(location)
        })
    }
}

/// Trait for propagating received errors within our [`crate::Error`] system.
///
/// This should always be used when propagating from the errors that are already in our system,
/// i.e. the [`crate::Result`] type.  To track the source and propagate errors that aren't part of
/// our [`crate::Error`] system, use the [`ForeignError`] trait.
pub trait PropagateError<T, S, E>
where
    S: crate::PoError,
    E: crate::PoError,
{
    /// Maps a `Result<T, Error<S>>` to `Result<T, Error<E>>`.
    ///
    /// The [Ok] variant is left untouched.  An error `E` is wrapped inside a [`crate::Error`],
    /// with the [Err] value as its source.
    fn with_err<F>(self, f: F) -> crate::Result<T, E>
    where
        F: FnOnce() -> E;

    /// Maps a `Result<T, Error<S>>` to `Result<T, Error<E>>` by applying a function `F` to the
    /// source error value `S`.
    ///
    /// Use this method to return a different error type `E` by matching on the received error
    /// value `S`.
    fn match_err<F>(self, f: F) -> crate::Result<T, E>
    where
        F: FnOnce(&S) -> E;
}

impl<T, S, E> PropagateError<T, S, E> for crate::Result<T, S>
where
    S: crate::PoError,
    E: crate::PoError,
{
    fn with_err<F>(self, f: F) -> crate::Result<T, E>
    where
        F: FnOnce() -> E,
    {
        self.map_err(|source| crate::Error::from_known_source(f(), source))
    }

    fn match_err<F>(self, f: F) -> crate::Result<T, E>
    where
        F: FnOnce(&S) -> E,
    {
        self.map_err(|source| crate::Error::from_known_source(f(&source.error), source))
    }
}

/// Trait extending the [`crate::Result`] with the context functionality of [`crate::Error::ctx`].
pub trait ErrorContext<T, E>
where
    E: crate::PoError,
{
    /// Adds additional context to the contained error, if any.
    fn ctx<F, C>(self, context: F) -> crate::Result<T, E>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display + Send + Sync + 'static;
}

impl<T, E> ErrorContext<T, E> for crate::Result<T, E>
where
    E: crate::PoError,
{
    fn ctx<F, C>(self, context: F) -> crate::Result<T, E>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| error.ctx(context()))
    }
}

/// Trait making a [`crate::Result`] error variant loggable at the error level.
///
/// Note, all constructed errors are logged as warnings regardless.
pub trait Loggable<T, E>
where
    E: crate::PoError,
{
    /// Logs the error if it occurred.
    fn log_err(self) -> Self;
}

impl<T, E> Loggable<T, E> for crate::Result<T, E>
where
    E: crate::PoError,
{
    #[track_caller]
    fn log_err(self) -> Self {
        let location = Location::caller();

        self.map_err(|error| {
            log::error!(target: &location.to_string(), "{:?}", error);
            error
        })
    }
}

pub(crate) trait Warnable<E>
where
    E: crate::PoError,
{
    /// Logs a warning about an error if it occurred.
    fn log_warn(self, location: Location) -> Self;
}

impl<E> Warnable<E> for crate::Error<E>
where
    E: crate::PoError,
{
    fn log_warn(self, location: Location) -> Self {
        log::warn!(target: &location.to_string(), "{:?}", self);
        self
    }
}
