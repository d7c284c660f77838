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

//! Structs become classes: one member per field, in declaration order.

use super::field_meta::TypeMeta;
use crate::util::{source_fields, SourceField};
use proc_macro2::TokenStream;
use quote::quote;
use syn::DataStruct;

fn gen_member(sf: &SourceField<'_>) -> TokenStream {
    let ty = &sf.field.ty;
    let member = &sf.member;
    let name = &sf.name;
    let modifier = match (&sf.meta.default, sf.meta.optional) {
        (Some(default), _) => quote! { .default_value::<#ty>(#default) },
        (None, true) => quote! { .optional() },
        (None, false) => quote! {},
    };
    quote! {
        .member::<#ty>(
            #name,
            ::std::mem::offset_of!(Self, #member),
            |object| &object.#member,
            |object| &mut object.#member,
        )
        #modifier
    }
}

pub fn gen_type_info(data: &DataStruct, meta: &TypeMeta, name: &TokenStream) -> syn::Result<TokenStream> {
    let fields = source_fields(&data.fields)?;
    let members = fields.iter().map(gen_member);
    let random_order = meta.set.then(|| quote! { .random_order() });
    Ok(quote! {
        ::serial_core::meta::ClassBuilder::<Self>::new(#name)
            #(#members)*
            #random_order
            .build()
    })
}
