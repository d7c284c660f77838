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

//! SEQUENCE OF and SET OF: standard collections as containers.

use crate::error::Error;
use crate::meta::container::{ContainerOps, NextElement};
use crate::meta::{registry, ContainerInfo, SerialType, TypeInfo, TypeKind, TypeRef};
use std::any::Any;
use std::collections::{BTreeSet, VecDeque};
use std::marker::PhantomData;

struct CollectionOps<C, T>(PhantomData<fn() -> (C, T)>);

/// In-memory collection the engine can iterate and refill.
trait Collection<T>: Any + Default {
    const NAME: &'static str;
    const RANDOM_ORDER: bool;

    fn len(&self) -> usize;

    fn iter_any(&self) -> Vec<&dyn Any>;

    fn clear(&mut self);

    fn push(&mut self, value: T);
}

impl<C, T> ContainerOps for CollectionOps<C, T>
where
    C: Collection<T>,
    T: SerialType,
{
    fn len(&self, object: &dyn Any) -> Option<usize> {
        object.downcast_ref::<C>().map(<C as Collection<T>>::len)
    }

    fn elements<'a>(&self, object: &'a dyn Any) -> Option<Vec<&'a dyn Any>> {
        object.downcast_ref::<C>().map(<C as Collection<T>>::iter_any)
    }

    fn fill(&self, object: &mut dyn Any, next: NextElement<'_>) -> Result<(), Error> {
        let collection = object
            .downcast_mut::<C>()
            .ok_or_else(|| Error::type_mismatch(<C as Collection<T>>::NAME, "another type"))?;
        collection.clear();
        loop {
            let mut element = T::default();
            if !next(&mut element)? {
                return Ok(());
            }
            collection.push(element);
        }
    }
}

fn collection_type_info<C, T>() -> TypeInfo
where
    C: Collection<T>,
    T: SerialType,
{
    TypeInfo::new::<C>(
        format!("{}<{}>", <C as Collection<T>>::NAME, T::type_info().name()),
        TypeKind::Container(ContainerInfo::new(
            TypeRef::of::<T>(),
            <C as Collection<T>>::RANDOM_ORDER,
            Box::new(CollectionOps::<C, T>(PhantomData)),
        )),
    )
}

impl<T: SerialType> Collection<T> for Vec<T> {
    const NAME: &'static str = "Vec";
    const RANDOM_ORDER: bool = false;

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn iter_any(&self) -> Vec<&dyn Any> {
        self.iter().map(|e| e as &dyn Any).collect()
    }

    fn clear(&mut self) {
        Vec::clear(self)
    }

    fn push(&mut self, value: T) {
        Vec::push(self, value)
    }
}

impl<T: SerialType> Collection<T> for VecDeque<T> {
    const NAME: &'static str = "VecDeque";
    const RANDOM_ORDER: bool = false;

    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn iter_any(&self) -> Vec<&dyn Any> {
        self.iter().map(|e| e as &dyn Any).collect()
    }

    fn clear(&mut self) {
        VecDeque::clear(self)
    }

    fn push(&mut self, value: T) {
        self.push_back(value)
    }
}

impl<T: SerialType + Ord> Collection<T> for BTreeSet<T> {
    const NAME: &'static str = "BTreeSet";
    const RANDOM_ORDER: bool = true;

    fn len(&self) -> usize {
        BTreeSet::len(self)
    }

    fn iter_any(&self) -> Vec<&dyn Any> {
        self.iter().map(|e| e as &dyn Any).collect()
    }

    fn clear(&mut self) {
        BTreeSet::clear(self)
    }

    fn push(&mut self, value: T) {
        self.insert(value);
    }
}

impl<T: SerialType> SerialType for Vec<T> {
    fn type_info() -> &'static TypeInfo {
        registry().get_or_register::<Self>(collection_type_info::<Self, T>)
    }
}

impl<T: SerialType> SerialType for VecDeque<T> {
    fn type_info() -> &'static TypeInfo {
        registry().get_or_register::<Self>(collection_type_info::<Self, T>)
    }
}

impl<T: SerialType + Ord> SerialType for BTreeSet<T> {
    fn type_info() -> &'static TypeInfo {
        registry().get_or_register::<Self>(collection_type_info::<Self, T>)
    }
}
