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

use crate::error::Error;
use crate::meta::{mismatch, LazyType, TypeInfo, TypeRef};
use std::any::Any;

/// Callback producing the next element of a container being filled.
///
/// It receives a slot holding a default element and returns `false` once
/// there are no more elements; the slot of that last call is discarded.
pub type NextElement<'f> = &'f mut dyn FnMut(&mut dyn Any) -> Result<bool, Error>;

/// Element access of one concrete container type.
pub trait ContainerOps: Send + Sync {
    /// Number of elements, `None` if `object` is not an instance.
    fn len(&self, object: &dyn Any) -> Option<usize>;

    /// Elements in iteration order.
    fn elements<'a>(&self, object: &'a dyn Any) -> Option<Vec<&'a dyn Any>>;

    /// Replaces the contents of `object` with the elements produced by `next`.
    fn fill(&self, object: &mut dyn Any, next: NextElement<'_>) -> Result<(), Error>;
}

pub struct ContainerInfo {
    element: LazyType,
    random_order: bool,
    ops: Box<dyn ContainerOps>,
}

impl ContainerInfo {
    pub fn new(element: TypeRef, random_order: bool, ops: Box<dyn ContainerOps>) -> Self {
        ContainerInfo {
            element: LazyType::new(element),
            random_order,
            ops,
        }
    }

    #[inline]
    pub fn element_type(&self) -> &'static TypeInfo {
        self.element.get()
    }

    /// SET OF: element order carries no meaning.
    #[inline]
    pub fn random_order(&self) -> bool {
        self.random_order
    }

    #[inline]
    pub fn len(&self, object: &dyn Any) -> Option<usize> {
        self.ops.len(object)
    }

    #[inline]
    pub fn elements<'a>(&self, object: &'a dyn Any) -> Option<Vec<&'a dyn Any>> {
        self.ops.elements(object)
    }

    #[inline]
    pub fn fill(&self, object: &mut dyn Any, next: NextElement<'_>) -> Result<(), Error> {
        self.ops.fill(object, next)
    }

    pub(crate) fn equals(&self, a: &dyn Any, b: &dyn Any) -> bool {
        let (Some(xs), Some(ys)) = (self.elements(a), self.elements(b)) else {
            return false;
        };
        let element = self.element_type();
        xs.len() == ys.len() && xs.iter().zip(ys.iter()).all(|(x, y)| element.equals(*x, *y))
    }

    pub(crate) fn assign(
        &self,
        type_info: &TypeInfo,
        dst: &mut dyn Any,
        src: &dyn Any,
    ) -> Result<(), Error> {
        let from = self.elements(src).ok_or_else(|| mismatch(type_info))?;
        let element = self.element_type();
        let mut iter = from.into_iter();
        self.fill(dst, &mut |slot| match iter.next() {
            Some(value) => element.assign(slot, value).map(|_| true),
            None => Ok(false),
        })
    }
}
