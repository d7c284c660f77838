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

//! # Serial Derive Macros
//!
//! `#[derive(SerialObject)]` implements `serial_core::meta::SerialType` for
//! a struct or an enum, registering its descriptor on first use.
//!
//! - Structs (named or tuple) become classes with one member per field.
//! - Enums whose variants carry at most one unnamed field become choices.
//!   A unit variant marked `#[serial(unset)]` stands for "no variant
//!   selected"; other unit variants are NULL variants.
//! - Enums whose variants are all units become enumerated types, valued by
//!   their discriminants.
//!
//! The type must implement `Default`. Field and variant types must
//! implement `SerialType` themselves.
//!
//! ```rust
//! use serial_derive::SerialObject;
//!
//! #[derive(SerialObject, Default, Debug, PartialEq)]
//! struct Person {
//!     name: String,
//!     #[serial(optional)]
//!     age: i32,
//!     #[serial(rename = "e-mail", optional)]
//!     email: Option<String>,
//! }
//!
//! #[derive(SerialObject, Default, Debug, PartialEq)]
//! enum Contact {
//!     #[default]
//!     #[serial(unset)]
//!     Unset,
//!     Phone(String),
//!     Person(Person),
//!     Anonymous,
//! }
//!
//! #[derive(SerialObject, Default, Debug, Clone, Copy, PartialEq)]
//! enum Color {
//!     #[default]
//!     Red = 1,
//!     Green,
//!     Blue = 10,
//! }
//! ```
//!
//! See the `field_meta` module for the full list of attributes.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod object;
mod util;

/// Derives `SerialType`, describing the type as a class, a choice or an
/// enumerated type.
#[proc_macro_derive(SerialObject, attributes(serial))]
pub fn proc_macro_derive_serial_object(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    object::derive_serial_type(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
