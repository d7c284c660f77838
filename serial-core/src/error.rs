// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Error type shared by the type registry, the stream engines and the
//! format backends.
//!
//! Error constructors sit on the cold path of every primitive read and
//! write. They are `#[cold]` and `#[track_caller]` so that the hot paths
//! stay small and `SERIAL_PANIC_ON_ERROR` reports the creation site.

use std::borrow::Cow;

use thiserror::Error;

/// Set `SERIAL_PANIC_ON_ERROR=1` at compile time to panic where an error is created.
pub const PANIC_ON_ERROR: bool = option_env!("SERIAL_PANIC_ON_ERROR").is_some();

#[inline(always)]
pub const fn should_panic_on_error() -> bool {
    PANIC_ON_ERROR
}

/// Error type for type registration, serialization and deserialization.
///
/// # Always use the static constructors
///
/// Variants must not be built with enum syntax. The constructors
/// (`Error::invalid_data`, `Error::incompatible_type`, ...) accept anything
/// convertible into a `Cow<'static, str>` and honor `SERIAL_PANIC_ON_ERROR`.
///
/// ```rust
/// use serial_core::error::Error;
///
/// let err = Error::invalid_data("unexpected end of block");
/// let err = Error::missing_member(format!("member {} expected", "name"));
/// ```
///
/// ## Debug mode
///
/// ```bash
/// RUST_BACKTRACE=1 SERIAL_PANIC_ON_ERROR=1 cargo test
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A type descriptor cannot be built for the requested layout.
    ///
    /// Raised while building a descriptor, never while streaming. The
    /// message carries the offending type name and its in-memory size.
    #[error("incompatible type: {0}")]
    IncompatibleType(Cow<'static, str>),

    /// An erased object did not have the Rust type its descriptor expects.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: Cow<'static, str>,
        found: Cow<'static, str>,
    },

    /// Buffer boundary violation during read operations.
    #[error("buffer out of bound: {0} + {1} > {2}")]
    BufferOutOfBound(usize, usize, usize),

    /// Malformed or corrupted input.
    #[error("{0}")]
    InvalidData(Cow<'static, str>),

    /// Fault reported by a foreign codec while reading.
    #[error("read fault: {0}")]
    ReadFault(Cow<'static, str>),

    /// Fault reported by a foreign codec, or a missing required handle, while writing.
    #[error("write fault: {0}")]
    WriteFault(Cow<'static, str>),

    /// Back-reference to an object that cannot be resolved.
    #[error("{0}")]
    InvalidRef(Cow<'static, str>),

    /// Enumerated value or identifier not declared by the enum.
    #[error("{0}")]
    UnknownEnum(Cow<'static, str>),

    /// Member or variant identifier not declared by the class or choice.
    #[error("{0}")]
    UnknownMember(Cow<'static, str>),

    /// Mandatory member absent from the input.
    #[error("{0}")]
    MissingMember(Cow<'static, str>),

    /// Member present twice in the input.
    #[error("{0}")]
    DuplicatedMember(Cow<'static, str>),

    /// Numeric value does not fit the destination type.
    #[error("{0}")]
    Overflow(Cow<'static, str>),

    /// Maximum nesting depth exceeded.
    #[error("{0}")]
    DepthExceed(Cow<'static, str>),

    /// Operation the type or format does not support.
    #[error("{0}")]
    Unsupported(Cow<'static, str>),

    /// Operation not allowed in the current stream state.
    #[error("{0}")]
    NotAllowed(Cow<'static, str>),

    /// A hook is already installed for the key and the policy forbids replacing it.
    #[error("{0}")]
    HookConflict(Cow<'static, str>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error raised by user code (hooks, foreign procs).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

macro_rules! cow_constructor {
    ($(#[$meta:meta])* $name:ident => $variant:ident) => {
        $(#[$meta])*
        #[inline(always)]
        #[cold]
        #[track_caller]
        pub fn $name<S: Into<Cow<'static, str>>>(s: S) -> Self {
            let err = Error::$variant(s.into());
            if PANIC_ON_ERROR {
                panic!("SERIAL_PANIC_ON_ERROR: {}", err);
            }
            err
        }
    };
}

impl Error {
    cow_constructor!(
        /// Creates a new [`Error::IncompatibleType`].
        ///
        /// Prefer [`Error::incompatible_layout`] when a type name and size are at hand.
        incompatible_type => IncompatibleType
    );
    cow_constructor!(
        /// Creates a new [`Error::InvalidData`].
        invalid_data => InvalidData
    );
    cow_constructor!(read_fault => ReadFault);
    cow_constructor!(write_fault => WriteFault);
    cow_constructor!(
        /// Creates a new [`Error::InvalidRef`].
        invalid_ref => InvalidRef
    );
    cow_constructor!(unknown_enum => UnknownEnum);
    cow_constructor!(unknown_member => UnknownMember);
    cow_constructor!(
        /// Creates a new [`Error::MissingMember`].
        ///
        /// ```
        /// use serial_core::error::Error;
        ///
        /// let err = Error::missing_member("member name expected");
        /// assert_eq!(err.to_string(), "member name expected");
        /// ```
        missing_member => MissingMember
    );
    cow_constructor!(duplicated_member => DuplicatedMember);
    cow_constructor!(overflow => Overflow);
    cow_constructor!(depth_exceed => DepthExceed);
    cow_constructor!(unsupported => Unsupported);
    cow_constructor!(not_allowed => NotAllowed);
    cow_constructor!(hook_conflict => HookConflict);

    /// Creates a new [`Error::IncompatibleType`] naming a type and its size.
    ///
    /// ```
    /// use serial_core::error::Error;
    ///
    /// let err = Error::incompatible_layout("String", 24);
    /// assert_eq!(err.to_string(), "incompatible type: String size: 24");
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn incompatible_layout(type_name: &str, size: usize) -> Self {
        Error::incompatible_type(format!("{type_name} size: {size}"))
    }

    /// Creates a new [`Error::TypeMismatch`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn type_mismatch<A, B>(expected: A, found: B) -> Self
    where
        A: Into<Cow<'static, str>>,
        B: Into<Cow<'static, str>>,
    {
        let err = Error::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        };
        if PANIC_ON_ERROR {
            panic!("SERIAL_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::BufferOutOfBound`] with the given bounds.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn buffer_out_of_bound(offset: usize, length: usize, capacity: usize) -> Self {
        let err = Error::BufferOutOfBound(offset, length, capacity);
        if PANIC_ON_ERROR {
            panic!("SERIAL_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Wraps any error raised by user code.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Other(anyhow::Error::new(err))
    }

    /// Appends a location description to data errors created by a stream.
    ///
    /// Only errors whose message is owned by this crate are extended; I/O and
    /// user errors pass through unchanged.
    #[inline(never)]
    pub fn at(self, location: &str) -> Error {
        fn extend(msg: Cow<'static, str>, location: &str) -> Cow<'static, str> {
            if location.is_empty() {
                msg
            } else {
                Cow::Owned(format!("{msg} at {location}"))
            }
        }
        match self {
            Error::InvalidData(s) => Error::InvalidData(extend(s, location)),
            Error::UnknownEnum(s) => Error::UnknownEnum(extend(s, location)),
            Error::UnknownMember(s) => Error::UnknownMember(extend(s, location)),
            Error::MissingMember(s) => Error::MissingMember(extend(s, location)),
            Error::DuplicatedMember(s) => Error::DuplicatedMember(extend(s, location)),
            Error::Overflow(s) => Error::Overflow(extend(s, location)),
            Error::InvalidRef(s) => Error::InvalidRef(extend(s, location)),
            other => other,
        }
    }
}

/// Ensures a condition is true; otherwise returns an [`enum@Error`].
///
/// # Examples
/// ```
/// use serial_core::ensure;
/// use serial_core::error::Error;
///
/// fn check_len(n: usize) -> Result<(), Error> {
///     ensure!(n > 0, Error::invalid_data("empty block"));
///     ensure!(n < 10, "block of {} elements too large", n);
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:literal) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data($msg));
        }
    };
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)));
        }
    };
}

/// Returns early with an [`Error::InvalidData`].
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($crate::error::Error::invalid_data($err))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)))
    };
}
