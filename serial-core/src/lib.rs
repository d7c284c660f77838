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

//! # Serial Core
//!
//! A type-driven object serialization engine. Every serializable type is
//! described at runtime by a [`TypeInfo`]; object streams walk values through
//! these descriptors and hand the individual values to a format backend.
//!
//! ## Architecture
//!
//! - **`meta`**: type descriptors (primitives, enumerated types, containers,
//!   classes, choices, pointers) and the global type registry
//! - **`serializer`**: descriptors of the standard Rust types, plus
//!   [`AnyObject`] and [`Delayed`]
//! - **`stream`**: [`ObjectOStream`], [`ObjectIStream`] and
//!   [`ObjectStreamCopier`]
//! - **`format`**: the ASN.1 text, ASN.1 binary and XML backends
//! - **`resolver`**: object identity tables, hook tables and the frame stack
//!   used for error locations
//! - **`buffer`**: growable output buffer and byte reader
//! - **`config`**, **`types`**, **`error`**: configuration, shared
//!   definitions and the error type
//! - **`legacy`** (feature `legacy-asn`): descriptors for value-node lists,
//!   byte stores and opaque objects of the older ASN.1 toolkit
//!
//! ## Object identity
//!
//! Values held by `Rc`, `Arc` or [`AnyObject`] are shared objects. With
//! reference tracking on, a shared object is written once per root; later
//! encounters are written as a reference to its index, and reading restores
//! the sharing.
//!
//! ## Usage
//!
//! ```rust
//! use serial_core::meta::{ClassBuilder, SerialType, TypeInfo, registry};
//! use serial_core::{DataFormat, Error, ObjectIStream, ObjectOStream};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! impl SerialType for Point {
//!     fn type_info() -> &'static TypeInfo {
//!         registry().get_or_register::<Point>(|| {
//!             ClassBuilder::<Point>::new("Point")
//!                 .member::<i32>("x", std::mem::offset_of!(Point, x), |p| &p.x, |p| &mut p.x)
//!                 .member::<i32>("y", std::mem::offset_of!(Point, y), |p| &p.y, |p| &mut p.y)
//!                 .build()
//!         })
//!     }
//! }
//!
//! # fn main() -> Result<(), Error> {
//! for format in [DataFormat::AsnText, DataFormat::AsnBinary, DataFormat::Xml] {
//!     let mut out = ObjectOStream::new(format);
//!     out.write(&Point { x: 1, y: -2 })?;
//!     let mut input = ObjectIStream::from_bytes(format, out.into_bytes());
//!     assert_eq!(input.read::<Point>()?, Point { x: 1, y: -2 });
//! }
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod format;
#[cfg(feature = "legacy-asn")]
pub mod legacy;
pub mod meta;
pub mod resolver;
pub mod serializer;
pub mod stream;
pub mod types;

pub use config::{Config, HookPolicy};
pub use error::Error;
pub use meta::{registry, SerialType, TypeInfo};
pub use serializer::{AnyObject, Delayed, OctetString};
pub use stream::{ObjectIStream, ObjectOStream, ObjectStreamCopier};
pub use types::DataFormat;
