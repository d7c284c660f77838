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

use super::ValNode;
use crate::ensure;
use crate::error::Error;
use crate::meta::class::{getter, getter_mut, Accessor};
use crate::meta::{registry, ChoiceInfo, TypeInfo, TypeKind, TypeRef, VariantInfo};
use std::any::{Any, TypeId};

fn node(object: &dyn Any) -> Result<&ValNode, Error> {
    object
        .downcast_ref::<ValNode>()
        .ok_or_else(|| Error::type_mismatch("ValNode", "another type"))
}

fn node_mut(object: &mut dyn Any) -> Result<&mut ValNode, Error> {
    object
        .downcast_mut::<ValNode>()
        .ok_or_else(|| Error::type_mismatch("ValNode", "another type"))
}

fn variant_accessor(index: usize) -> Accessor {
    let selector = index + 1;
    Accessor::new(
        Box::new(getter(move |object| {
            object
                .downcast_ref::<ValNode>()
                .filter(|node| node.choice as usize == selector)
                .and_then(|node| node.data.as_deref())
        })),
        Box::new(getter_mut(move |object| {
            object
                .downcast_mut::<ValNode>()
                .filter(|node| node.choice as usize == selector)
                .and_then(|node| node.data.as_deref_mut())
        })),
    )
}

/// Descriptors of choices stored in a single [`ValNode`].
///
/// The node's `choice` field holds the 1-based number of the selected
/// variant and its `data` the payload. Variants without a type carry no
/// payload.
pub struct LegacyChoiceTypeInfo;

impl LegacyChoiceTypeInfo {
    /// Registers a choice named `name`. The name must not be taken.
    pub fn new(
        name: &str,
        variants: &[(&str, Option<&'static TypeInfo>)],
    ) -> Result<&'static TypeInfo, Error> {
        ensure!(
            variants.len() < u8::MAX as usize,
            Error::unsupported(format!("{name}: too many choice variants"))
        );
        let count = variants.len();
        let variants = variants
            .iter()
            .enumerate()
            .map(|(index, (variant, type_info))| match type_info {
                Some(type_info) => VariantInfo::new(
                    *variant,
                    TypeRef::Resolved(*type_info),
                    variant_accessor(index),
                ),
                None => VariantInfo::null(*variant),
            })
            .collect();
        let choice = ChoiceInfo::new(
            variants,
            Box::new(move |object| match node(object)?.choice {
                0 => Ok(None),
                selector if selector as usize <= count => Ok(Some(selector as usize - 1)),
                selector => Err(Error::invalid_data(format!(
                    "invalid choice selector {selector}"
                ))),
            }),
            Box::new(|object, variant| {
                let node = node_mut(object)?;
                // bounded by the variant count check above
                node.choice = (variant.index() + 1) as u8;
                node.data = variant.type_info().map(TypeInfo::create);
                Ok(())
            }),
        );
        registry().register(TypeInfo::with_ops(
            name,
            std::mem::size_of::<ValNode>(),
            Some(TypeId::of::<ValNode>()),
            Box::new(|| Box::new(ValNode::default())),
            Box::new(|object| match object.downcast_mut::<ValNode>() {
                Some(node) => {
                    node.choice = 0;
                    node.data = None;
                    true
                }
                None => false,
            }),
            TypeKind::Choice(choice),
        ))
    }
}
