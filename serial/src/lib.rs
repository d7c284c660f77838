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

//! # Serial
//!
//! Object serialization to ASN.1 value notation, ASN.1 binary (BER) and XML,
//! driven by runtime type descriptors.
//!
//! Types describe themselves with `#[derive(SerialObject)]`; object streams
//! then write and read them in any of the three formats, copy data from one
//! format to another, and let hooks intercept individual objects, class
//! members and choice variants.
//!
//! ```rust
//! use serial::{DataFormat, Error, SerialObject};
//!
//! #[derive(SerialObject, Default, Debug, PartialEq)]
//! struct Person {
//!     name: String,
//!     #[serial(optional)]
//!     age: i32,
//!     friends: Vec<String>,
//! }
//!
//! # fn main() -> Result<(), Error> {
//! let ada = Person {
//!     name: "Ada".to_string(),
//!     age: 36,
//!     friends: vec!["Charles".to_string()],
//! };
//!
//! let text = serial::to_bytes(DataFormat::AsnText, &ada)?;
//! assert_eq!(
//!     String::from_utf8_lossy(&text),
//!     "Person ::= {\n  name \"Ada\",\n  age 36,\n  friends {\n    \"Charles\"\n  }\n}\n"
//! );
//!
//! let xml = serial::convert::<Person>(DataFormat::AsnText, DataFormat::Xml, text)?;
//! let back: Person = serial::from_bytes(DataFormat::Xml, xml)?;
//! assert_eq!(back, ada);
//! # Ok(())
//! # }
//! ```
//!
//! ## Formats
//!
//! | [`DataFormat`] | Encoding                     | File extension |
//! |----------------|------------------------------|----------------|
//! | `AsnText`      | ASN.1 value notation         | `.asn`         |
//! | `AsnBinary`    | BER-style tag/length/value   | `.asnb`, `.ber`|
//! | `Xml`          | one element per value        | `.xml`         |
//!
//! ## Shared objects
//!
//! `Rc<T>`, `Arc<T>` and [`AnyObject`] members are shared objects. A value
//! reachable twice from the same root is written once and referenced
//! afterwards, and reading rebuilds the same sharing.

pub use serial_core::{
    config, error, format, meta, registry, resolver, serializer, stream, types, AnyObject,
    Config, DataFormat, Delayed, Error, HookPolicy, ObjectIStream, ObjectOStream,
    ObjectStreamCopier, OctetString, SerialType, TypeInfo,
};
#[cfg(feature = "legacy-asn")]
pub use serial_core::legacy;
pub use serial_derive::SerialObject;

/// Makes `T` resolvable by its type name.
///
/// Typed reads need no registration, but `ObjectIStream::read_any` and
/// [`AnyObject`] members look types up by the name written in the data. A
/// type becomes known the first time its descriptor is built; register it
/// up front when a process may read such data before using the type in any
/// other way.
///
/// Fails with [`Error::IncompatibleType`] when another type uses the same
/// name.
pub fn register<T: SerialType>() -> Result<&'static TypeInfo, Error> {
    serial_core::registry().register_type::<T>()
}

/// Serializes `value` as one root object.
pub fn to_bytes<T: SerialType>(format: DataFormat, value: &T) -> Result<Vec<u8>, Error> {
    let mut out = ObjectOStream::new(format);
    out.write(value)?;
    Ok(out.into_bytes())
}

/// Reads one root object of type `T`.
pub fn from_bytes<T: SerialType>(format: DataFormat, data: impl Into<Vec<u8>>) -> Result<T, Error> {
    ObjectIStream::from_bytes(format, data.into()).read()
}

/// Re-encodes one root object of type `T` in another format.
pub fn convert<T: SerialType>(
    from: DataFormat,
    to: DataFormat,
    data: impl Into<Vec<u8>>,
) -> Result<Vec<u8>, Error> {
    let mut input = ObjectIStream::from_bytes(from, data.into());
    let mut out = ObjectOStream::new(to);
    ObjectStreamCopier::new(&mut input, &mut out).copy(T::type_info())?;
    Ok(out.into_bytes())
}
