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

//! Parsing of `#[serial(...)]` attributes.
//!
//! On the type:
//! - `name = "..."`: type name used on the wire (default: the Rust identifier)
//! - `set`: members may arrive in any order (ASN.1 SET)
//! - `choice`: describe a unit-only enum as a choice of NULL variants
//!
//! On a field:
//! - `rename = "..."`: member name
//! - `optional`: omitted on write when equal to its default
//! - `default = "path"`: custom default `fn() -> T`, implies `optional`
//!
//! On a variant:
//! - `rename = "..."`: variant name
//! - `unset`: the unit variant meaning "no variant selected"
//! - `value = N`: integer value of an enumerated constant

use syn::meta::ParseNestedMeta;
use syn::{Attribute, LitInt, LitStr};

#[derive(Debug, Clone, Default)]
pub struct TypeMeta {
    pub name: Option<String>,
    pub set: bool,
    pub choice: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FieldMeta {
    pub rename: Option<String>,
    pub optional: bool,
    pub default: Option<syn::Path>,
}

#[derive(Debug, Clone, Default)]
pub struct VariantMeta {
    pub rename: Option<String>,
    pub unset: bool,
    pub value: Option<i64>,
}

fn for_each_serial_attr(
    attrs: &[Attribute],
    mut f: impl FnMut(&ParseNestedMeta) -> syn::Result<()>,
) -> syn::Result<()> {
    for attr in attrs {
        if !attr.path().is_ident("serial") {
            continue;
        }
        attr.parse_nested_meta(|nested| f(&nested))?;
    }
    Ok(())
}

fn parse_string(nested: &ParseNestedMeta) -> syn::Result<String> {
    let lit: LitStr = nested.value()?.parse()?;
    Ok(lit.value())
}

fn unknown(nested: &ParseNestedMeta) -> syn::Error {
    nested.error("unsupported serial attribute")
}

pub fn parse_type_meta(attrs: &[Attribute]) -> syn::Result<TypeMeta> {
    let mut meta = TypeMeta::default();
    for_each_serial_attr(attrs, |nested| {
        if nested.path.is_ident("name") {
            meta.name = Some(parse_string(nested)?);
        } else if nested.path.is_ident("set") {
            meta.set = true;
        } else if nested.path.is_ident("choice") {
            meta.choice = true;
        } else {
            return Err(unknown(nested));
        }
        Ok(())
    })?;
    Ok(meta)
}

pub fn parse_field_meta(attrs: &[Attribute]) -> syn::Result<FieldMeta> {
    let mut meta = FieldMeta::default();
    for_each_serial_attr(attrs, |nested| {
        if nested.path.is_ident("rename") {
            meta.rename = Some(parse_string(nested)?);
        } else if nested.path.is_ident("optional") {
            meta.optional = true;
        } else if nested.path.is_ident("default") {
            let lit: LitStr = nested.value()?.parse()?;
            meta.default = Some(lit.parse()?);
            meta.optional = true;
        } else {
            return Err(unknown(nested));
        }
        Ok(())
    })?;
    Ok(meta)
}

pub fn parse_variant_meta(attrs: &[Attribute]) -> syn::Result<VariantMeta> {
    let mut meta = VariantMeta::default();
    for_each_serial_attr(attrs, |nested| {
        if nested.path.is_ident("rename") {
            meta.rename = Some(parse_string(nested)?);
        } else if nested.path.is_ident("unset") {
            meta.unset = true;
        } else if nested.path.is_ident("value") {
            let lit: LitInt = nested.value()?.parse()?;
            meta.value = Some(lit.base10_parse()?);
        } else {
            return Err(unknown(nested));
        }
        Ok(())
    })?;
    Ok(meta)
}
