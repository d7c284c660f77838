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

use super::field_meta::parse_type_meta;
use super::{class, derive_enum};
use crate::util::{add_bounds, type_name_expr};
use proc_macro2::TokenStream;
use quote::quote;
use syn::Data;

/// Generates the `SerialType` impl of `ast`.
pub fn derive_serial_type(ast: &syn::DeriveInput) -> syn::Result<TokenStream> {
    let ident = &ast.ident;
    let meta = parse_type_meta(&ast.attrs)?;
    let base = meta.name.clone().unwrap_or_else(|| ident.to_string());
    let name = type_name_expr(&base, &ast.generics);

    let build = match &ast.data {
        Data::Struct(data) => class::gen_type_info(data, &meta, &name)?,
        Data::Enum(data) if derive_enum::is_enumerated(data, &meta) => {
            derive_enum::gen_enumerated(data, &name)?
        }
        Data::Enum(data) => derive_enum::gen_choice(data, &name)?,
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(ident, "unions are not supported"));
        }
    };

    let generics = add_bounds(&ast.generics);
    let (impl_generics, _, where_clause) = generics.split_for_impl();
    let (_, ty_generics, _) = ast.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::serial_core::meta::SerialType for #ident #ty_generics #where_clause {
            fn type_info() -> &'static ::serial_core::meta::TypeInfo {
                ::serial_core::meta::registry().get_or_register::<Self>(|| #build)
            }
        }
    })
}
