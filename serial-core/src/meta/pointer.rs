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
use crate::meta::{mismatch, registry, type_key, LazyType, TypeInfo, TypeKind, TypeRef};
use crate::stream::ObjectIStream;
use crate::types::PointerToken;
use std::any::{Any, TypeId};
use std::cell::Ref;
use std::ops::Deref;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    /// `Option<T>`: may be null, otherwise encoded like the pointee.
    Nullable,
    /// `Box<T>`: owned, never null, encoded as the pointee itself.
    Auto,
    /// `Rc<T>` / `Arc<T>`: identity tracked, may be back-referenced.
    Shared,
    /// `RefCell<T>`: interior mutability, encoded as the pointee itself.
    Cell,
    /// Shared object whose concrete type is only known at runtime.
    Polymorphic,
}

/// Borrowed view of the object a pointer designates.
pub enum Pointee<'a> {
    Plain(&'a dyn Any),
    Borrowed(Ref<'a, dyn Any>),
}

impl Deref for Pointee<'_> {
    type Target = dyn Any;

    fn deref(&self) -> &Self::Target {
        match self {
            Pointee::Plain(object) => *object,
            Pointee::Borrowed(object) => &**object,
        }
    }
}

/// What a non-null pointer designates.
pub struct PointerTarget<'a> {
    pub object: Pointee<'a>,
    /// Real type of the pointee.
    pub type_info: &'static TypeInfo,
    /// Identity of the pointee for back-references, `None` if untracked.
    pub identity: Option<usize>,
}

pub type TargetFn =
    Box<dyn for<'a> Fn(&'a dyn Any) -> Result<Option<PointerTarget<'a>>, Error> + Send + Sync>;
pub type PointerReadFn =
    Box<dyn Fn(&mut ObjectIStream, PointerToken, &mut dyn Any) -> Result<(), Error> + Send + Sync>;
pub type PointerAssignFn = Box<dyn Fn(&mut dyn Any, &dyn Any) -> Result<(), Error> + Send + Sync>;
pub type ReadInPlaceFn =
    Box<dyn Fn(&mut ObjectIStream, &dyn Any) -> Result<(), Error> + Send + Sync>;

/// Coerces a closure to the higher-ranked target signature.
pub fn target_fn<F>(f: F) -> F
where
    F: for<'a> Fn(&'a dyn Any) -> Result<Option<PointerTarget<'a>>, Error>,
{
    f
}

pub struct PointerInfo {
    kind: PointerKind,
    pointee: Option<LazyType>,
    target: TargetFn,
    read: PointerReadFn,
    assign: PointerAssignFn,
    read_in_place: Option<ReadInPlaceFn>,
}

impl PointerInfo {
    /// `pointee` is the declared pointee type, `None` for polymorphic pointers.
    pub fn new(
        kind: PointerKind,
        pointee: Option<TypeRef>,
        target: TargetFn,
        read: PointerReadFn,
        assign: PointerAssignFn,
    ) -> Self {
        PointerInfo {
            kind,
            pointee: pointee.map(LazyType::new),
            target,
            read,
            assign,
            read_in_place: None,
        }
    }

    /// Lets a shared pointer register the cell before its contents are read.
    pub fn with_read_in_place(mut self, read_in_place: ReadInPlaceFn) -> Self {
        self.read_in_place = Some(read_in_place);
        self
    }

    #[inline]
    pub fn kind(&self) -> PointerKind {
        self.kind
    }

    pub fn pointee_type(&self) -> Option<&'static TypeInfo> {
        self.pointee.as_ref().map(LazyType::get)
    }

    /// Pointers that go through the identity table.
    pub fn is_tracked(&self) -> bool {
        matches!(self.kind, PointerKind::Shared | PointerKind::Polymorphic)
    }

    /// Pointers that carry a pointer token on the wire.
    pub fn has_token(&self) -> bool {
        !matches!(self.kind, PointerKind::Auto | PointerKind::Cell)
    }

    pub fn target<'a>(&self, object: &'a dyn Any) -> Result<Option<PointerTarget<'a>>, Error> {
        (self.target)(object)
    }

    pub fn read(
        &self,
        input: &mut ObjectIStream,
        token: PointerToken,
        object: &mut dyn Any,
    ) -> Result<(), Error> {
        (self.read)(input, token, object)
    }

    pub fn read_in_place(&self) -> Option<&ReadInPlaceFn> {
        self.read_in_place.as_ref()
    }

    pub fn is_null(&self, object: &dyn Any) -> bool {
        matches!(self.target(object), Ok(None))
    }

    /// Null for pointers that may be null, otherwise whether the pointee
    /// holds its default value.
    pub fn is_default(&self, object: &dyn Any) -> bool {
        match self.kind {
            PointerKind::Auto | PointerKind::Cell => match self.target(object) {
                Ok(Some(target)) => target.type_info.is_default(&*target.object),
                _ => false,
            },
            _ => self.is_null(object),
        }
    }

    pub(crate) fn equals(&self, a: &dyn Any, b: &dyn Any) -> bool {
        match (self.target(a), self.target(b)) {
            (Ok(None), Ok(None)) => true,
            (Ok(Some(x)), Ok(Some(y))) => {
                if x.identity.is_some() && x.identity == y.identity {
                    return true;
                }
                x.type_info == y.type_info && x.type_info.equals(&*x.object, &*y.object)
            }
            _ => false,
        }
    }

    pub(crate) fn assign(&self, dst: &mut dyn Any, src: &dyn Any) -> Result<(), Error> {
        (self.assign)(dst, src)
    }
}

impl TypeInfo {
    /// Owning pointer to `pointee` whose instances are `Box<dyn Any>`.
    ///
    /// Used where the pointee type is only known at runtime; one descriptor
    /// is built per pointee and cached.
    pub fn auto_pointer(pointee: &'static TypeInfo) -> Result<&'static TypeInfo, Error> {
        registry().get_or_register_dynamic((type_key(pointee), "auto"), || {
            let info = PointerInfo::new(
                PointerKind::Auto,
                Some(TypeRef::Resolved(pointee)),
                Box::new(target_fn(move |object| {
                    let boxed = object
                        .downcast_ref::<Box<dyn Any>>()
                        .ok_or_else(|| mismatch(pointee))?;
                    Ok(Some(PointerTarget {
                        object: Pointee::Plain(&**boxed),
                        type_info: pointee,
                        identity: None,
                    }))
                })),
                Box::new(move |input, _token, object| {
                    let boxed = object
                        .downcast_mut::<Box<dyn Any>>()
                        .ok_or_else(|| mismatch(pointee))?;
                    if !pointee.is_instance(&**boxed) {
                        *boxed = pointee.create();
                    }
                    input.read_object(&mut **boxed, pointee)
                }),
                Box::new(move |dst, src| {
                    let (Some(dst), Some(src)) = (
                        dst.downcast_mut::<Box<dyn Any>>(),
                        src.downcast_ref::<Box<dyn Any>>(),
                    ) else {
                        return Err(mismatch(pointee));
                    };
                    let mut copy = pointee.create();
                    pointee.assign(&mut *copy, &**src)?;
                    *dst = copy;
                    Ok(())
                }),
            );
            Ok(TypeInfo::with_ops(
                format!("Box<dyn {}>", pointee.name()),
                std::mem::size_of::<Box<dyn Any>>(),
                Some(TypeId::of::<Box<dyn Any>>()),
                Box::new(move || Box::new(pointee.create()) as Box<dyn Any>),
                Box::new(move |object| match object.downcast_mut::<Box<dyn Any>>() {
                    Some(boxed) => {
                        *boxed = pointee.create();
                        true
                    }
                    None => false,
                }),
                TypeKind::Pointer(info),
            ))
        })
    }
}
