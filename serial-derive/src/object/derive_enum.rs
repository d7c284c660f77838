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

//! Enums become choices, or enumerated types when every variant is a unit.

use super::field_meta::{parse_variant_meta, TypeMeta, VariantMeta};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DataEnum, Expr, ExprLit, ExprUnary, Fields, Lit, UnOp, Variant};

struct SourceVariant<'a> {
    variant: &'a Variant,
    name: String,
    meta: VariantMeta,
}

fn source_variants(data: &DataEnum) -> syn::Result<Vec<SourceVariant<'_>>> {
    data.variants
        .iter()
        .map(|variant| {
            let meta = parse_variant_meta(&variant.attrs)?;
            Ok(SourceVariant {
                variant,
                name: meta.rename.clone().unwrap_or_else(|| variant.ident.to_string()),
                meta,
            })
        })
        .collect()
}

pub fn is_enumerated(data: &DataEnum, meta: &TypeMeta) -> bool {
    !meta.choice && data.variants.iter().all(|v| matches!(v.fields, Fields::Unit))
}

fn discriminant(expr: &Expr) -> syn::Result<i64> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(lit), ..
        }) => lit.base10_parse(),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => discriminant(expr).map(|v| -v),
        other => Err(syn::Error::new_spanned(
            other,
            "enumerated values must be integer literals",
        )),
    }
}

pub fn gen_enumerated(data: &DataEnum, name: &TokenStream) -> syn::Result<TokenStream> {
    let variants = source_variants(data)?;
    let mut next = 0i64;
    let mut values = Vec::with_capacity(variants.len());
    for sv in &variants {
        let value = match (&sv.meta.value, &sv.variant.discriminant) {
            (Some(value), _) => *value,
            (None, Some((_, expr))) => discriminant(expr)?,
            (None, None) => next,
        };
        values.push(value);
        next = value + 1;
    }
    let idents: Vec<_> = variants.iter().map(|sv| &sv.variant.ident).collect();
    let names = variants.iter().map(|sv| &sv.name);
    Ok(quote! {
        ::serial_core::meta::EnumBuilder::<Self>::new(
            #name,
            |value| match value {
                #(Self::#idents => #values,)*
            },
            |value| match value {
                #(#values => Some(Self::#idents),)*
                _ => None,
            },
        )
        #(.value(#names, #values))*
        .build()
    })
}

pub fn gen_choice(data: &DataEnum, name: &TokenStream) -> syn::Result<TokenStream> {
    let variants = source_variants(data)?;
    let mut unset = Vec::new();
    let mut selectable = Vec::new();
    for sv in variants {
        match (&sv.variant.fields, sv.meta.unset) {
            (Fields::Unit, true) => unset.push(sv),
            (_, true) => {
                return Err(syn::Error::new_spanned(
                    sv.variant,
                    "only a unit variant can mark the unset state",
                ))
            }
            (Fields::Unit, false) => selectable.push(sv),
            (Fields::Unnamed(fields), false) if fields.unnamed.len() == 1 => selectable.push(sv),
            _ => {
                return Err(syn::Error::new_spanned(
                    sv.variant,
                    "choice variants carry at most one unnamed field",
                ))
            }
        }
    }
    if unset.len() > 1 {
        return Err(syn::Error::new_spanned(
            unset[1].variant,
            "a choice has at most one unset variant",
        ));
    }

    let mut get_arms = Vec::new();
    let mut set_arms = Vec::new();
    let mut registrations = Vec::new();
    for (index, sv) in selectable.iter().enumerate() {
        let ident = &sv.variant.ident;
        let name = &sv.name;
        match &sv.variant.fields {
            Fields::Unnamed(fields) => {
                let ty = &fields.unnamed[0].ty;
                get_arms.push(quote! { Self::#ident(_) => Some(#index) });
                set_arms.push(quote! { #index => Self::#ident(::std::default::Default::default()) });
                registrations.push(quote! {
                    .variant::<#ty>(
                        #name,
                        |object| match object {
                            Self::#ident(value) => Some(value),
                            #[allow(unreachable_patterns)]
                            _ => None,
                        },
                        |object| match object {
                            Self::#ident(value) => Some(value),
                            #[allow(unreachable_patterns)]
                            _ => None,
                        },
                    )
                });
            }
            _ => {
                get_arms.push(quote! { Self::#ident => Some(#index) });
                set_arms.push(quote! { #index => Self::#ident });
                registrations.push(quote! { .null_variant(#name) });
            }
        }
    }
    for sv in &unset {
        let ident = &sv.variant.ident;
        get_arms.push(quote! { Self::#ident => None });
    }

    Ok(quote! {
        ::serial_core::meta::ChoiceBuilder::<Self>::new(
            #name,
            |object| match object {
                #(#get_arms,)*
            },
            |object, index| {
                *object = match index {
                    #(#set_arms,)*
                    _ => return false,
                };
                true
            },
        )
        #(#registrations)*
        .build()
    })
}
