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

//! Type descriptors.
//!
//! A [`TypeInfo`] describes one serializable type: its name, the size of an
//! in-memory instance, how to create, compare, reset and copy instances, and
//! how the stream engines walk it. Instances are handled type-erased as
//! `&dyn Any`; every operation checks the concrete type before touching it.
//!
//! Descriptors live in the process-wide [`registry`](registry::registry) and
//! are never destroyed, so they are passed around as `&'static TypeInfo`.

pub mod choice;
pub mod class;
pub mod container;
pub mod enumerated;
pub mod pointer;
pub mod primitive;
pub mod registry;

use crate::error::Error;
use crate::stream::{ObjectIStream, ObjectOStream};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::OnceLock;

pub use choice::{ChoiceBuilder, ChoiceInfo, VariantInfo};
pub use class::{Accessor, ClassBuilder, ClassInfo, MemberInfo};
pub use container::ContainerInfo;
pub use enumerated::{EnumBuilder, EnumInfo, EnumValues};
pub use pointer::{Pointee, PointerInfo, PointerKind, PointerTarget};
pub use primitive::{PrimitiveInfo, PrimitiveKind, ValueOps};
pub use registry::{registry, TypeRegistry};

/// A Rust type with a registered descriptor.
///
/// Implemented for primitives, standard containers and smart pointers in
/// [`crate::serializer`], and generated by `#[derive(SerialObject)]` for
/// structs (classes) and enums (choices or enumerated values).
pub trait SerialType: Any + Default {
    fn type_info() -> &'static TypeInfo;
}

pub type CreateFn = Box<dyn Fn() -> Box<dyn Any> + Send + Sync>;
pub type ResetFn = Box<dyn Fn(&mut dyn Any) -> bool + Send + Sync>;

/// Reference to a descriptor that may not exist yet.
///
/// Member and element types are referenced lazily so that recursive types
/// can be described before their descriptor is registered.
#[derive(Clone, Copy)]
pub enum TypeRef {
    Resolved(&'static TypeInfo),
    Lazy(fn() -> &'static TypeInfo),
}

impl TypeRef {
    pub fn of<T: SerialType>() -> TypeRef {
        TypeRef::Lazy(T::type_info)
    }

    pub fn get(&self) -> &'static TypeInfo {
        match *self {
            TypeRef::Resolved(info) => info,
            TypeRef::Lazy(getter) => getter(),
        }
    }
}

impl From<&'static TypeInfo> for TypeRef {
    fn from(info: &'static TypeInfo) -> Self {
        TypeRef::Resolved(info)
    }
}

/// A [`TypeRef`] resolved on first use and cached afterwards.
pub struct LazyType {
    type_ref: TypeRef,
    cache: OnceLock<&'static TypeInfo>,
}

impl LazyType {
    pub fn new(type_ref: TypeRef) -> Self {
        LazyType {
            type_ref,
            cache: OnceLock::new(),
        }
    }

    #[inline]
    pub fn get(&self) -> &'static TypeInfo {
        self.cache.get_or_init(|| self.type_ref.get())
    }
}

/// Capabilities of a type whose layout the engine does not know.
///
/// Used for bridges to foreign data representations and for wrappers with
/// their own streaming logic.
pub trait CustomType: Send + Sync {
    fn is_default(&self, object: &dyn Any) -> bool;

    fn equals(&self, a: &dyn Any, b: &dyn Any) -> bool;

    fn set_default(&self, object: &mut dyn Any);

    fn assign(&self, dst: &mut dyn Any, src: &dyn Any) -> Result<(), Error>;

    fn write_data(
        &self,
        type_info: &'static TypeInfo,
        out: &mut ObjectOStream,
        object: &dyn Any,
    ) -> Result<(), Error>;

    fn read_data(
        &self,
        type_info: &'static TypeInfo,
        input: &mut ObjectIStream,
        object: &mut dyn Any,
    ) -> Result<(), Error>;

    fn skip_data(&self, type_info: &'static TypeInfo, input: &mut ObjectIStream)
        -> Result<(), Error>;
}

pub enum TypeKind {
    Primitive(PrimitiveInfo),
    Enumerated(EnumInfo),
    Container(ContainerInfo),
    Class(ClassInfo),
    Choice(ChoiceInfo),
    Pointer(PointerInfo),
    Custom(Box<dyn CustomType>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeFamily {
    Primitive,
    Enumerated,
    Container,
    Class,
    Choice,
    Pointer,
    Custom,
}

pub struct TypeInfo {
    name: String,
    size: usize,
    rust_type: Option<TypeId>,
    create: CreateFn,
    reset: ResetFn,
    kind: TypeKind,
}

fn create_value<T: Any + Default>() -> Box<dyn Any> {
    Box::new(T::default())
}

fn reset_value<T: Any + Default>(object: &mut dyn Any) -> bool {
    match object.downcast_mut::<T>() {
        Some(value) => {
            *value = T::default();
            true
        }
        None => false,
    }
}

impl TypeInfo {
    /// Descriptor for a Rust type whose default value is its `Default`.
    pub fn new<T: Any + Default>(name: impl Into<String>, kind: TypeKind) -> TypeInfo {
        TypeInfo {
            name: name.into(),
            size: std::mem::size_of::<T>(),
            rust_type: Some(TypeId::of::<T>()),
            create: Box::new(create_value::<T>),
            reset: Box::new(reset_value::<T>),
            kind,
        }
    }

    /// Descriptor built at runtime, with explicit construction and reset.
    pub fn with_ops(
        name: impl Into<String>,
        size: usize,
        rust_type: Option<TypeId>,
        create: CreateFn,
        reset: ResetFn,
        kind: TypeKind,
    ) -> TypeInfo {
        TypeInfo {
            name: name.into(),
            size,
            rust_type,
            create,
            reset,
            kind,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes of one in-memory instance.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn rust_type(&self) -> Option<TypeId> {
        self.rust_type
    }

    #[inline]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn family(&self) -> TypeFamily {
        match self.kind {
            TypeKind::Primitive(_) => TypeFamily::Primitive,
            TypeKind::Enumerated(_) => TypeFamily::Enumerated,
            TypeKind::Container(_) => TypeFamily::Container,
            TypeKind::Class(_) => TypeFamily::Class,
            TypeKind::Choice(_) => TypeFamily::Choice,
            TypeKind::Pointer(_) => TypeFamily::Pointer,
            TypeKind::Custom(_) => TypeFamily::Custom,
        }
    }

    pub fn as_class(&self) -> Option<&ClassInfo> {
        match &self.kind {
            TypeKind::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<&ChoiceInfo> {
        match &self.kind {
            TypeKind::Choice(choice) => Some(choice),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<&PointerInfo> {
        match &self.kind {
            TypeKind::Pointer(pointer) => Some(pointer),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&ContainerInfo> {
        match &self.kind {
            TypeKind::Container(container) => Some(container),
            _ => None,
        }
    }

    /// Whether `object` is an instance of the type this descriptor describes.
    pub fn is_instance(&self, object: &dyn Any) -> bool {
        self.rust_type.map_or(true, |id| object.type_id() == id)
    }

    /// Allocates a new instance holding the default value.
    pub fn create(&self) -> Box<dyn Any> {
        (self.create)()
    }

    pub fn is_default(&self, object: &dyn Any) -> bool {
        match &self.kind {
            TypeKind::Primitive(info) => info.ops().is_default(object),
            TypeKind::Container(info) => info.len(object) == Some(0),
            TypeKind::Pointer(info) => info.is_default(object),
            TypeKind::Custom(custom) => custom.is_default(object),
            TypeKind::Enumerated(_) | TypeKind::Class(_) | TypeKind::Choice(_) => {
                let default = self.create();
                self.equals(object, &*default)
            }
        }
    }

    /// Deep structural equality.
    pub fn equals(&self, a: &dyn Any, b: &dyn Any) -> bool {
        match &self.kind {
            TypeKind::Primitive(info) => info.ops().equals(a, b),
            TypeKind::Enumerated(info) => match (info.value_of(a), info.value_of(b)) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
            TypeKind::Container(info) => info.equals(a, b),
            TypeKind::Class(info) => info.equals(a, b),
            TypeKind::Choice(info) => info.equals(a, b),
            TypeKind::Pointer(info) => info.equals(a, b),
            TypeKind::Custom(custom) => custom.equals(a, b),
        }
    }

    pub fn set_default(&self, object: &mut dyn Any) {
        if !(self.reset)(object) {
            log::warn!("cannot reset an object that is not a {}", self.name);
        }
    }

    /// Deep copy of `src` into `dst`, replacing any prior contents of `dst`.
    pub fn assign(&self, dst: &mut dyn Any, src: &dyn Any) -> Result<(), Error> {
        if !self.is_instance(src) {
            return Err(mismatch(self));
        }
        match &self.kind {
            TypeKind::Primitive(info) => info.ops().assign(self, dst, src),
            TypeKind::Enumerated(info) => {
                let value = info.value_of(src).ok_or_else(|| mismatch(self))?;
                if info.set_value(dst, value) {
                    Ok(())
                } else {
                    Err(mismatch(self))
                }
            }
            TypeKind::Container(info) => info.assign(self, dst, src),
            TypeKind::Class(info) => info.assign(self, dst, src),
            TypeKind::Choice(info) => info.assign(self, dst, src),
            TypeKind::Pointer(info) => info.assign(dst, src),
            TypeKind::Custom(custom) => custom.assign(dst, src),
        }
    }

    pub fn write_data(&'static self, out: &mut ObjectOStream, object: &dyn Any) -> Result<(), Error> {
        match &self.kind {
            TypeKind::Primitive(info) => info.write(out, object),
            TypeKind::Enumerated(info) => out.write_enumerated(self, info, object),
            TypeKind::Container(info) => out.write_container(self, info, object),
            TypeKind::Class(info) => out.write_class(self, info, object),
            TypeKind::Choice(info) => out.write_choice(self, info, object),
            TypeKind::Pointer(info) => out.write_pointer_value(self, info, object),
            TypeKind::Custom(custom) => custom.write_data(self, out, object),
        }
    }

    pub fn read_data(
        &'static self,
        input: &mut ObjectIStream,
        object: &mut dyn Any,
    ) -> Result<(), Error> {
        match &self.kind {
            TypeKind::Primitive(info) => info.read(input, object),
            TypeKind::Enumerated(info) => input.read_enumerated(self, info, object),
            TypeKind::Container(info) => input.read_container(self, info, object),
            TypeKind::Class(info) => input.read_class(self, info, object),
            TypeKind::Choice(info) => input.read_choice(self, info, object),
            TypeKind::Pointer(info) => input.read_pointer_value(self, info, object),
            TypeKind::Custom(custom) => custom.read_data(self, input, object),
        }
    }

    /// Consumes exactly what [`TypeInfo::write_data`] produces, without
    /// materializing a value.
    pub fn skip_data(&'static self, input: &mut ObjectIStream) -> Result<(), Error> {
        match &self.kind {
            TypeKind::Primitive(info) => info.skip(input),
            TypeKind::Enumerated(info) => input.skip_enumerated(info),
            TypeKind::Container(info) => input.skip_container(self, info),
            TypeKind::Class(info) => input.skip_class(self, info),
            TypeKind::Choice(info) => input.skip_choice(self, info),
            TypeKind::Pointer(info) => input.skip_pointer_value(self, info),
            TypeKind::Custom(custom) => custom.skip_data(self, input),
        }
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("family", &self.family())
            .finish()
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for TypeInfo {}

/// Error for an erased object that is not an instance of `type_info`.
#[cold]
#[track_caller]
pub fn mismatch(type_info: &TypeInfo) -> Error {
    Error::type_mismatch(type_info.name().to_string(), "an object of another type")
}

/// Typed view of an erased object, failing with a type mismatch.
#[inline]
pub fn downcast_ref<'a, T: Any>(object: &'a dyn Any, type_info: &TypeInfo) -> Result<&'a T, Error> {
    object.downcast_ref::<T>().ok_or_else(|| mismatch(type_info))
}

#[inline]
pub fn downcast_mut<'a, T: Any>(
    object: &'a mut dyn Any,
    type_info: &TypeInfo,
) -> Result<&'a mut T, Error> {
    object.downcast_mut::<T>().ok_or_else(|| mismatch(type_info))
}

/// Address of the descriptor, used as hook and cache key.
#[inline]
pub fn type_key(type_info: &TypeInfo) -> usize {
    type_info as *const TypeInfo as usize
}

/// Name usable as an XML tag or a bare identifier.
pub fn xml_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        let ok = c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.';
        if i == 0 && !(c.is_ascii_alphabetic() || c == '_') {
            out.push('_');
        }
        out.push(if ok { c } else { '-' });
    }
    out
}

/// Whether a type label read from a stream names `type_info`.
pub fn type_name_matches(label: &str, type_info: &TypeInfo) -> bool {
    label == type_info.name() || label == xml_name(type_info.name())
}
