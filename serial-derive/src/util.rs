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

use crate::object::field_meta::{parse_field_meta, FieldMeta};
use proc_macro2::{Span, TokenStream};
use quote::{quote, ToTokens};
use syn::{Fields, Generics, Index, Member};

/// A struct field with its position and parsed attributes.
///
/// For tuple structs, the member name is the field index as a string.
pub struct SourceField<'a> {
    pub field: &'a syn::Field,
    pub member: Member,
    pub name: String,
    pub meta: FieldMeta,
}

pub fn source_fields(fields: &Fields) -> syn::Result<Vec<SourceField<'_>>> {
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let meta = parse_field_meta(&field.attrs)?;
            let (member, default_name) = match &field.ident {
                Some(ident) => (Member::Named(ident.clone()), ident.to_string()),
                None => (
                    Member::Unnamed(Index {
                        index: index as u32,
                        span: Span::call_site(),
                    }),
                    index.to_string(),
                ),
            };
            Ok(SourceField {
                field,
                member,
                name: meta.rename.clone().unwrap_or(default_name),
                meta,
            })
        })
        .collect()
}

/// Expression building the wire name of a possibly generic type.
///
/// `Pair<A, B>` is named after the names of its arguments, so each
/// instantiation gets its own descriptor name.
pub fn type_name_expr(base: &str, generics: &Generics) -> TokenStream {
    let params: Vec<_> = generics.type_params().map(|p| &p.ident).collect();
    if params.is_empty() {
        return base.to_token_stream();
    }
    quote! {
        format!(
            "{}<{}>",
            #base,
            [#(<#params as ::serial_core::meta::SerialType>::type_info().name()),*].join(", ")
        )
    }
}

/// Adds a `SerialType` bound to every type parameter.
pub fn add_bounds(generics: &Generics) -> Generics {
    let mut generics = generics.clone();
    for param in generics.type_params_mut() {
        param
            .bounds
            .push(syn::parse_quote!(::serial_core::meta::SerialType));
    }
    generics
}
