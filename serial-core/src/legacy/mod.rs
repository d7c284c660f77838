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

//! Bridge to the value-node data model of the older ASN.1 toolkit.
//!
//! Objects of that model are singly linked lists of [`ValNode`]s whose
//! payload is either a small value, a boxed object, or the node itself
//! when the node is a choice. The descriptors in this module let such
//! lists, choices, byte stores and opaque toolkit objects take part in
//! ordinary object streams.

mod choice;
mod octet_string;
mod old_asn;
mod sequence_of;

pub use choice::LegacyChoiceTypeInfo;
pub use octet_string::{ByteStore, OctetStringTypeInfo};
pub use old_asn::{AsnIo, AsnProcs, OldAsnTypeInfo, OldAsnValue};
pub use sequence_of::{ListLayout, SequenceOfTypeInfo, SetOfTypeInfo};

use std::any::Any;
use std::fmt;

/// Size of the inline payload slot of a value node.
///
/// Elements larger than this cannot be stored in a node directly and must
/// be boxed classes or choices.
pub const DATAVAL_SIZE: usize = 8;

/// One node of a value-node list.
#[derive(Default)]
pub struct ValNode {
    /// 1-based variant number when the node is a choice, 0 when unset.
    pub choice: u8,
    pub data: Option<Box<dyn Any>>,
    pub next: Option<Box<ValNode>>,
}

impl ValNode {
    pub fn new(choice: u8, data: Option<Box<dyn Any>>) -> Self {
        ValNode {
            choice,
            data,
            next: None,
        }
    }

    pub fn with_value<T: Any>(value: T) -> Self {
        ValNode::new(0, Some(Box::new(value)))
    }

    pub fn value<T: Any>(&self) -> Option<&T> {
        self.data.as_deref().and_then(|data| data.downcast_ref::<T>())
    }

    pub fn value_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.data
            .as_deref_mut()
            .and_then(|data| data.downcast_mut::<T>())
    }
}

impl Drop for ValNode {
    fn drop(&mut self) {
        // unlink iteratively, long chains would overflow the stack
        let mut next = self.next.take();
        while let Some(mut node) = next {
            next = node.next.take();
        }
    }
}

impl fmt::Debug for ValNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValNode")
            .field("choice", &self.choice)
            .field("data", &self.data.as_ref().map(|_| ".."))
            .finish_non_exhaustive()
    }
}

/// Head of a value-node list. An empty list has no head.
#[derive(Debug, Default)]
pub struct ValNodeList {
    pub head: Option<Box<ValNode>>,
}

impl ValNodeList {
    pub fn new() -> Self {
        ValNodeList::default()
    }

    /// List of nodes holding `values` as their payload.
    pub fn from_values<T: Any>(values: impl IntoIterator<Item = T>) -> Self {
        let nodes: Vec<ValNode> = values.into_iter().map(ValNode::with_value).collect();
        ValNodeList::from_nodes(nodes)
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = ValNode>) -> Self {
        let mut list = ValNodeList::new();
        list.relink(nodes.into_iter().map(Box::new).collect());
        list
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            node: self.head.as_deref(),
        }
    }

    /// Payloads of type `T`, in list order. Nodes with another payload are skipped.
    pub fn values<T: Any>(&self) -> Vec<&T> {
        self.iter().filter_map(|node| node.value::<T>()).collect()
    }

    pub fn clear(&mut self) {
        self.head = None;
    }

    /// Unlinks every node, in list order.
    pub(crate) fn detach(&mut self) -> Vec<Box<ValNode>> {
        let mut nodes = Vec::new();
        let mut next = self.head.take();
        while let Some(mut node) = next {
            next = node.next.take();
            nodes.push(node);
        }
        nodes
    }

    /// Links `nodes` in order, replacing the current chain.
    pub(crate) fn relink(&mut self, nodes: Vec<Box<ValNode>>) {
        self.head = nodes.into_iter().rev().fold(None, |next, mut node| {
            node.next = next;
            Some(node)
        });
    }
}

pub struct Iter<'a> {
    node: Option<&'a ValNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a ValNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.node?;
        self.node = node.next.as_deref();
        Some(node)
    }
}
