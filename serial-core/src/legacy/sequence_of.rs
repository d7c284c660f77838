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

//! SEQUENCE OF and SET OF over value-node lists.

use super::{ValNode, ValNodeList, DATAVAL_SIZE};
use crate::error::Error;
use crate::meta::container::{ContainerOps, NextElement};
use crate::meta::{
    registry, type_key, ContainerInfo, PointerKind, TypeFamily, TypeInfo, TypeKind,
    TypeRef,
};
use std::any::{Any, TypeId};

/// How the elements of a value-node list are stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListLayout {
    /// Each node is itself a legacy choice.
    ChoiceNext,
    /// Each node carries a boxed class whose first word is reserved for the link.
    SequenceNext,
    /// Each node carries a value of at most [`DATAVAL_SIZE`] bytes.
    ValNodeNext,
}

fn is_legacy_choice(type_info: &TypeInfo) -> bool {
    type_info.family() == TypeFamily::Choice
        && type_info.rust_type() == Some(TypeId::of::<ValNode>())
}

/// Layout of a list of `element`, and the type of the node payload.
fn classify(element: &'static TypeInfo) -> Result<(ListLayout, &'static TypeInfo), Error> {
    let pointee = element
        .as_pointer()
        .filter(|pointer| pointer.kind() == PointerKind::Auto)
        .and_then(|pointer| pointer.pointee_type());
    let Some(pointee) = pointee else {
        return if element.size() <= DATAVAL_SIZE {
            Ok((ListLayout::ValNodeNext, element))
        } else {
            Err(Error::incompatible_layout(element.name(), element.size()))
        };
    };
    if is_legacy_choice(pointee) {
        return Ok((ListLayout::ChoiceNext, pointee));
    }
    if let Some(class) = pointee.as_class() {
        if class.first_member_offset().unwrap_or(0) < std::mem::size_of::<usize>() {
            return Err(Error::incompatible_layout(pointee.name(), pointee.size()));
        }
        return Ok((ListLayout::SequenceNext, pointee));
    }
    if pointee.size() <= DATAVAL_SIZE {
        Ok((ListLayout::ValNodeNext, pointee))
    } else {
        Err(Error::incompatible_layout(pointee.name(), pointee.size()))
    }
}

struct ValNodeListOps {
    layout: ListLayout,
    data_type: &'static TypeInfo,
}

impl ValNodeListOps {
    fn new_node(&self) -> Box<ValNode> {
        match self.layout {
            ListLayout::ChoiceNext => Box::default(),
            _ => Box::new(ValNode::new(0, Some(self.data_type.create()))),
        }
    }

    fn node_data<'a>(&self, node: &'a mut ValNode) -> &'a mut dyn Any {
        match self.layout {
            ListLayout::ChoiceNext => node,
            _ => {
                let data_type = self.data_type;
                &mut **node.data.get_or_insert_with(|| data_type.create())
            }
        }
    }

    fn list<'a>(&self, object: &'a dyn Any) -> Option<&'a ValNodeList> {
        object.downcast_ref::<ValNodeList>()
    }
}

impl ContainerOps for ValNodeListOps {
    fn len(&self, object: &dyn Any) -> Option<usize> {
        self.list(object).map(ValNodeList::len)
    }

    fn elements<'a>(&self, object: &'a dyn Any) -> Option<Vec<&'a dyn Any>> {
        let list = self.list(object)?;
        list.iter()
            .map(|node| match self.layout {
                ListLayout::ChoiceNext => Some(node as &dyn Any),
                _ => node.data.as_deref(),
            })
            .collect()
    }

    fn fill(&self, object: &mut dyn Any, next: NextElement<'_>) -> Result<(), Error> {
        let list = object
            .downcast_mut::<ValNodeList>()
            .ok_or_else(|| Error::type_mismatch("ValNodeList", "another type"))?;
        let had_nodes = !list.is_empty();
        let mut spare = list.detach();
        spare.reverse();
        let mut warned = false;
        let mut filled = Vec::new();
        loop {
            let mut node = match spare.pop() {
                Some(node) => node,
                None => {
                    if had_nodes && !warned {
                        log::warn!("null sequence pointer, allocating new nodes");
                        warned = true;
                    }
                    self.new_node()
                }
            };
            if !next(self.node_data(&mut node))? {
                break;
            }
            filled.push(node);
        }
        list.relink(filled);
        Ok(())
    }
}

fn build(element: &'static TypeInfo, random_order: bool) -> Result<TypeInfo, Error> {
    let (layout, data_type) = classify(element)?;
    let name = format!(
        "{} {}",
        if random_order { "SET OF" } else { "SEQUENCE OF" },
        element.name()
    );
    let info = ContainerInfo::new(
        TypeRef::Resolved(data_type),
        random_order,
        Box::new(ValNodeListOps { layout, data_type }),
    );
    Ok(TypeInfo::with_ops(
        name,
        std::mem::size_of::<ValNodeList>(),
        Some(TypeId::of::<ValNodeList>()),
        Box::new(|| Box::new(ValNodeList::default())),
        Box::new(|object| match object.downcast_mut::<ValNodeList>() {
            Some(list) => {
                list.clear();
                true
            }
            None => false,
        }),
        TypeKind::Container(info),
    ))
}

/// Descriptors of `SEQUENCE OF` value-node lists.
pub struct SequenceOfTypeInfo;

impl SequenceOfTypeInfo {
    /// Descriptor of a list of `element`, cached per element type.
    ///
    /// Fails with an incompatible-type error when `element` cannot be stored
    /// in a value node.
    pub fn get(element: &'static TypeInfo) -> Result<&'static TypeInfo, Error> {
        registry().get_or_register_dynamic((type_key(element), "sequence-of"), || {
            build(element, false)
        })
    }

    pub fn layout(element: &'static TypeInfo) -> Result<ListLayout, Error> {
        classify(element).map(|(layout, _)| layout)
    }
}

/// Descriptors of `SET OF` value-node lists.
pub struct SetOfTypeInfo;

impl SetOfTypeInfo {
    pub fn get(element: &'static TypeInfo) -> Result<&'static TypeInfo, Error> {
        registry().get_or_register_dynamic((type_key(element), "set-of"), || build(element, true))
    }
}
