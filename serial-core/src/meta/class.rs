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

//! Class (record) descriptors: an ordered list of named members.
//!
//! Member order is the declaration order and is also the write order.
//! Member indices are 0-based positions in that list.

use crate::error::Error;
use crate::meta::{mismatch, LazyType, SerialType, TypeInfo, TypeKind, TypeRef};
use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;

pub type GetFn = Box<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>;
pub type GetMutFn = Box<dyn for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + Send + Sync>;
pub type DefaultFn = Box<dyn Fn() -> Box<dyn Any> + Send + Sync>;

/// Coerces a closure to the higher-ranked getter signature.
pub fn getter<F>(f: F) -> F
where
    F: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any>,
{
    f
}

pub fn getter_mut<F>(f: F) -> F
where
    F: for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any>,
{
    f
}

/// Type-erased access to a part of an object (a member or a variant payload).
pub struct Accessor {
    get: GetFn,
    get_mut: GetMutFn,
}

impl Accessor {
    pub fn new(get: GetFn, get_mut: GetMutFn) -> Self {
        Accessor { get, get_mut }
    }

    /// Accessor for a field that is always present.
    pub fn field<C: Any, M: Any>(get: fn(&C) -> &M, get_mut: fn(&mut C) -> &mut M) -> Self {
        Accessor {
            get: Box::new(getter(move |object| {
                object.downcast_ref::<C>().map(|c| get(c) as &dyn Any)
            })),
            get_mut: Box::new(getter_mut(move |object| {
                object
                    .downcast_mut::<C>()
                    .map(|c| get_mut(c) as &mut dyn Any)
            })),
        }
    }

    /// Accessor for data that exists only in some states of the object,
    /// such as the payload of one enum variant.
    pub fn optional<C: Any, M: Any>(
        get: fn(&C) -> Option<&M>,
        get_mut: fn(&mut C) -> Option<&mut M>,
    ) -> Self {
        Accessor {
            get: Box::new(getter(move |object| {
                object
                    .downcast_ref::<C>()
                    .and_then(get)
                    .map(|m| m as &dyn Any)
            })),
            get_mut: Box::new(getter_mut(move |object| {
                object
                    .downcast_mut::<C>()
                    .and_then(get_mut)
                    .map(|m| m as &mut dyn Any)
            })),
        }
    }

    #[inline]
    pub fn get<'a>(&self, object: &'a dyn Any) -> Option<&'a dyn Any> {
        (self.get)(object)
    }

    #[inline]
    pub fn get_mut<'a>(&self, object: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        (self.get_mut)(object)
    }
}

pub struct MemberInfo {
    name: String,
    index: usize,
    offset: usize,
    member_type: LazyType,
    optional: bool,
    default: Option<DefaultFn>,
    accessor: Accessor,
}

impl MemberInfo {
    pub fn new(
        name: impl Into<String>,
        offset: usize,
        member_type: TypeRef,
        accessor: Accessor,
    ) -> Self {
        MemberInfo {
            name: name.into(),
            index: 0,
            offset,
            member_type: LazyType::new(member_type),
            optional: false,
            default: None,
            accessor,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Byte offset of the member inside an instance of the owning class.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn type_info(&self) -> &'static TypeInfo {
        self.member_type.get()
    }

    /// Optional members equal to their default are omitted on write and
    /// reset to their default when absent on read.
    #[inline]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    #[inline]
    pub fn get<'a>(&self, class_object: &'a dyn Any) -> Option<&'a dyn Any> {
        self.accessor.get(class_object)
    }

    #[inline]
    pub fn get_mut<'a>(&self, class_object: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        self.accessor.get_mut(class_object)
    }

    /// Whether `value` equals the member's default (custom default if declared).
    pub fn is_default_value(&self, value: &dyn Any) -> bool {
        let member_type = self.type_info();
        match &self.default {
            Some(default) => member_type.equals(value, &*default()),
            None => member_type.is_default(value),
        }
    }

    /// Resets the member of `class_object` to its default.
    pub fn reset(&self, class_object: &mut dyn Any) -> Result<(), Error> {
        let member_type = self.type_info();
        let value = self
            .get_mut(class_object)
            .ok_or_else(|| mismatch(member_type))?;
        match &self.default {
            Some(default) => member_type.assign(value, &*default()),
            None => {
                member_type.set_default(value);
                Ok(())
            }
        }
    }
}

pub struct ClassInfo {
    members: Vec<MemberInfo>,
    by_name: HashMap<String, usize>,
    random_order: bool,
}

impl ClassInfo {
    pub fn new(mut members: Vec<MemberInfo>, random_order: bool) -> Self {
        let mut by_name = HashMap::with_capacity(members.len());
        for (index, member) in members.iter_mut().enumerate() {
            member.index = index;
            if by_name.insert(member.name.clone(), index).is_some() {
                log::warn!("duplicate member name {}", member.name);
            }
        }
        ClassInfo {
            members,
            by_name,
            random_order,
        }
    }

    #[inline]
    pub fn members(&self) -> &[MemberInfo] {
        &self.members
    }

    #[inline]
    pub fn member(&self, index: usize) -> Option<&MemberInfo> {
        self.members.get(index)
    }

    pub fn find_member(&self, name: &str) -> Option<&MemberInfo> {
        self.by_name.get(name).map(|&index| &self.members[index])
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// SET semantics: members may appear in any order on input.
    #[inline]
    pub fn random_order(&self) -> bool {
        self.random_order
    }

    /// Smallest member offset, `None` for a class without members.
    pub fn first_member_offset(&self) -> Option<usize> {
        self.members.iter().map(|m| m.offset).min()
    }

    pub(crate) fn equals(&self, a: &dyn Any, b: &dyn Any) -> bool {
        self.members.iter().all(|member| {
            match (member.get(a), member.get(b)) {
                (Some(x), Some(y)) => member.type_info().equals(x, y),
                _ => false,
            }
        })
    }

    pub(crate) fn assign(
        &self,
        type_info: &TypeInfo,
        dst: &mut dyn Any,
        src: &dyn Any,
    ) -> Result<(), Error> {
        for member in &self.members {
            let from = member.get(src).ok_or_else(|| mismatch(type_info))?;
            let to = member.get_mut(dst).ok_or_else(|| mismatch(type_info))?;
            member.type_info().assign(to, from)?;
        }
        Ok(())
    }
}

/// Builds the descriptor of a class `C` member by member.
///
/// ```
/// use serial_core::meta::{ClassBuilder, SerialType, TypeInfo, registry};
///
/// #[derive(Default)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl SerialType for Point {
///     fn type_info() -> &'static TypeInfo {
///         registry().get_or_register::<Point>(|| {
///             ClassBuilder::<Point>::new("Point")
///                 .member::<i32>("x", std::mem::offset_of!(Point, x), |p| &p.x, |p| &mut p.x)
///                 .member::<i32>("y", std::mem::offset_of!(Point, y), |p| &p.y, |p| &mut p.y)
///                 .optional()
///                 .build()
///         })
///     }
/// }
///
/// let class = Point::type_info().as_class().unwrap();
/// assert_eq!(class.member(1).unwrap().name(), "y");
/// ```
pub struct ClassBuilder<C> {
    name: String,
    members: Vec<MemberInfo>,
    random_order: bool,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Any + Default> ClassBuilder<C> {
    pub fn new(name: impl Into<String>) -> Self {
        ClassBuilder {
            name: name.into(),
            members: Vec::new(),
            random_order: false,
            _marker: PhantomData,
        }
    }

    pub fn member<M: SerialType>(
        mut self,
        name: &str,
        offset: usize,
        get: fn(&C) -> &M,
        get_mut: fn(&mut C) -> &mut M,
    ) -> Self {
        self.members.push(MemberInfo::new(
            name,
            offset,
            TypeRef::of::<M>(),
            Accessor::field(get, get_mut),
        ));
        self
    }

    /// Adds a member described by hand.
    pub fn raw_member(mut self, member: MemberInfo) -> Self {
        self.members.push(member);
        self
    }

    /// Marks the last added member optional.
    pub fn optional(mut self) -> Self {
        if let Some(member) = self.members.last_mut() {
            member.optional = true;
        }
        self
    }

    /// Gives the last added member a custom default and marks it optional.
    pub fn default_value<M: Any>(mut self, default: fn() -> M) -> Self {
        if let Some(member) = self.members.last_mut() {
            member.optional = true;
            member.default = Some(Box::new(move || Box::new(default()) as Box<dyn Any>));
        }
        self
    }

    /// Members may be read in any order (ASN.1 SET).
    pub fn random_order(mut self) -> Self {
        self.random_order = true;
        self
    }

    pub fn build(self) -> TypeInfo {
        TypeInfo::new::<C>(
            self.name,
            TypeKind::Class(ClassInfo::new(self.members, self.random_order)),
        )
    }
}
