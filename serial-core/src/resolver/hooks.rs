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

//! Per-stream overrides of the default object walk.
//!
//! A hook replaces the engine's handling of every object of a type, of one
//! class member, or of one choice variant. The hook owns the encoding: a
//! write hook that writes nothing omits the member, and a read hook must
//! consume the value the stream is positioned on (it may read it with the
//! default behavior, skip it, or read it into something else).

use crate::config::HookPolicy;
use crate::error::Error;
use crate::meta::{downcast_mut, downcast_ref, mismatch, MemberInfo, TypeInfo, VariantInfo};
use crate::stream::{ObjectIStream, ObjectOStream};
use std::any::Any;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

/// An object about to be written.
pub struct ObjectRef<'a> {
    pub object: &'a dyn Any,
    pub type_info: &'static TypeInfo,
}

impl<'a> ObjectRef<'a> {
    pub fn get<T: Any>(&self) -> Result<&'a T, Error> {
        downcast_ref(self.object, self.type_info)
    }

    /// Writes the object the way the engine would without the hook.
    pub fn write_default(&self, out: &mut ObjectOStream) -> Result<(), Error> {
        out.write_object_default(self.object, self.type_info)
    }
}

/// An object about to be read.
pub struct ObjectMut<'a> {
    pub object: &'a mut dyn Any,
    pub type_info: &'static TypeInfo,
}

impl ObjectMut<'_> {
    pub fn get_mut<T: Any>(&mut self) -> Result<&mut T, Error> {
        downcast_mut(self.object, self.type_info)
    }

    pub fn read_default(&mut self, input: &mut ObjectIStream) -> Result<(), Error> {
        input.read_object_default(self.object, self.type_info)
    }

    pub fn skip(&mut self, input: &mut ObjectIStream) -> Result<(), Error> {
        input.skip_object(self.type_info)
    }
}

/// A class member about to be written.
pub struct MemberRef<'a> {
    pub class_object: &'a dyn Any,
    pub class_type: &'static TypeInfo,
    pub member: &'static MemberInfo,
}

impl<'a> MemberRef<'a> {
    pub fn value(&self) -> Result<&'a dyn Any, Error> {
        self.member
            .get(self.class_object)
            .ok_or_else(|| mismatch(self.class_type))
    }

    pub fn get<T: Any>(&self) -> Result<&'a T, Error> {
        downcast_ref(self.value()?, self.member.type_info())
    }

    /// Writes the member with its identifier, as the engine would.
    pub fn write_default(&self, out: &mut ObjectOStream) -> Result<(), Error> {
        out.write_class_member(self.member, self.value()?)
    }
}

/// A class member whose identifier has just been read.
pub struct MemberMut<'a> {
    pub class_object: &'a mut dyn Any,
    pub class_type: &'static TypeInfo,
    pub member: &'static MemberInfo,
}

impl MemberMut<'_> {
    pub fn value_mut(&mut self) -> Result<&mut dyn Any, Error> {
        self.member
            .get_mut(self.class_object)
            .ok_or_else(|| mismatch(self.class_type))
    }

    pub fn get_mut<T: Any>(&mut self) -> Result<&mut T, Error> {
        let member_type = self.member.type_info();
        downcast_mut(self.value_mut()?, member_type)
    }

    /// Reads the member value into the class object.
    pub fn read_default(&mut self, input: &mut ObjectIStream) -> Result<(), Error> {
        let member_type = self.member.type_info();
        input.read_object(self.value_mut()?, member_type)
    }

    pub fn skip(&mut self, input: &mut ObjectIStream) -> Result<(), Error> {
        input.skip_object(self.member.type_info())
    }
}

/// The selected variant of a choice about to be written.
pub struct VariantRef<'a> {
    pub choice_object: &'a dyn Any,
    pub choice_type: &'static TypeInfo,
    pub variant: &'static VariantInfo,
}

impl<'a> VariantRef<'a> {
    /// Payload of the variant, `None` for a NULL variant.
    pub fn value(&self) -> Option<&'a dyn Any> {
        self.variant.get(self.choice_object)
    }

    pub fn write_default(&self, out: &mut ObjectOStream) -> Result<(), Error> {
        out.write_choice_variant(self.variant, self.value())
    }
}

/// A choice whose variant identifier has just been read. The variant is
/// already selected and holds a default payload.
pub struct VariantMut<'a> {
    pub choice_object: &'a mut dyn Any,
    pub choice_type: &'static TypeInfo,
    pub variant: &'static VariantInfo,
}

impl VariantMut<'_> {
    pub fn value_mut(&mut self) -> Option<&mut dyn Any> {
        self.variant.get_mut(self.choice_object)
    }

    pub fn read_default(&mut self, input: &mut ObjectIStream) -> Result<(), Error> {
        let choice_type = self.choice_type;
        match self.variant.type_info() {
            None => input.read_null(),
            Some(variant_type) => {
                let value = self.value_mut().ok_or_else(|| mismatch(choice_type))?;
                input.read_object(value, variant_type)
            }
        }
    }

    pub fn skip(&mut self, input: &mut ObjectIStream) -> Result<(), Error> {
        match self.variant.type_info() {
            None => input.skip_null(),
            Some(variant_type) => input.skip_object(variant_type),
        }
    }
}

pub trait WriteObjectHook {
    fn write_object(&self, out: &mut ObjectOStream, object: ObjectRef<'_>) -> Result<(), Error>;
}

pub trait ReadObjectHook {
    fn read_object(&self, input: &mut ObjectIStream, object: ObjectMut<'_>) -> Result<(), Error>;
}

pub trait WriteClassMemberHook {
    fn write_class_member(
        &self,
        out: &mut ObjectOStream,
        member: MemberRef<'_>,
    ) -> Result<(), Error>;
}

pub trait ReadClassMemberHook {
    fn read_class_member(
        &self,
        input: &mut ObjectIStream,
        member: MemberMut<'_>,
    ) -> Result<(), Error>;
}

pub trait WriteChoiceVariantHook {
    fn write_choice_variant(
        &self,
        out: &mut ObjectOStream,
        variant: VariantRef<'_>,
    ) -> Result<(), Error>;
}

pub trait ReadChoiceVariantHook {
    fn read_choice_variant(
        &self,
        input: &mut ObjectIStream,
        variant: VariantMut<'_>,
    ) -> Result<(), Error>;
}

impl<F> WriteObjectHook for F
where
    F: Fn(&mut ObjectOStream, ObjectRef<'_>) -> Result<(), Error>,
{
    fn write_object(&self, out: &mut ObjectOStream, object: ObjectRef<'_>) -> Result<(), Error> {
        self(out, object)
    }
}

impl<F> ReadObjectHook for F
where
    F: Fn(&mut ObjectIStream, ObjectMut<'_>) -> Result<(), Error>,
{
    fn read_object(&self, input: &mut ObjectIStream, object: ObjectMut<'_>) -> Result<(), Error> {
        self(input, object)
    }
}

impl<F> WriteClassMemberHook for F
where
    F: Fn(&mut ObjectOStream, MemberRef<'_>) -> Result<(), Error>,
{
    fn write_class_member(
        &self,
        out: &mut ObjectOStream,
        member: MemberRef<'_>,
    ) -> Result<(), Error> {
        self(out, member)
    }
}

impl<F> ReadClassMemberHook for F
where
    F: Fn(&mut ObjectIStream, MemberMut<'_>) -> Result<(), Error>,
{
    fn read_class_member(
        &self,
        input: &mut ObjectIStream,
        member: MemberMut<'_>,
    ) -> Result<(), Error> {
        self(input, member)
    }
}

impl<F> WriteChoiceVariantHook for F
where
    F: Fn(&mut ObjectOStream, VariantRef<'_>) -> Result<(), Error>,
{
    fn write_choice_variant(
        &self,
        out: &mut ObjectOStream,
        variant: VariantRef<'_>,
    ) -> Result<(), Error> {
        self(out, variant)
    }
}

impl<F> ReadChoiceVariantHook for F
where
    F: Fn(&mut ObjectIStream, VariantMut<'_>) -> Result<(), Error>,
{
    fn read_choice_variant(
        &self,
        input: &mut ObjectIStream,
        variant: VariantMut<'_>,
    ) -> Result<(), Error> {
        self(input, variant)
    }
}

/// Hooks of one kind, keyed by type, member or variant.
pub struct HookTable<K, H: ?Sized> {
    hooks: HashMap<K, Rc<H>>,
}

impl<K, H: ?Sized> Default for HookTable<K, H> {
    fn default() -> Self {
        HookTable {
            hooks: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Copy, H: ?Sized> HookTable<K, H> {
    /// Installs `hook` for `key`. `what` names the key in the conflict error.
    pub fn set(
        &mut self,
        key: K,
        hook: Rc<H>,
        policy: HookPolicy,
        what: impl FnOnce() -> String,
    ) -> Result<(), Error> {
        if policy == HookPolicy::Reject && self.hooks.contains_key(&key) {
            return Err(Error::hook_conflict(format!(
                "hook already set for {}",
                what()
            )));
        }
        self.hooks.insert(key, hook);
        Ok(())
    }

    pub fn reset(&mut self, key: K) -> Option<Rc<H>> {
        self.hooks.remove(&key)
    }

    #[inline]
    pub fn get(&self, key: K) -> Option<Rc<H>> {
        if self.hooks.is_empty() {
            return None;
        }
        self.hooks.get(&key).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

/// Key of a member hook: class descriptor address and member index.
pub type MemberKey = (usize, usize);
/// Key of a variant hook: choice descriptor address and variant index.
pub type VariantKey = (usize, usize);

#[derive(Default)]
pub struct WriteHooks {
    pub object: HookTable<usize, dyn WriteObjectHook>,
    pub member: HookTable<MemberKey, dyn WriteClassMemberHook>,
    pub variant: HookTable<VariantKey, dyn WriteChoiceVariantHook>,
}

#[derive(Default)]
pub struct ReadHooks {
    pub object: HookTable<usize, dyn ReadObjectHook>,
    pub member: HookTable<MemberKey, dyn ReadClassMemberHook>,
    pub variant: HookTable<VariantKey, dyn ReadChoiceVariantHook>,
}

/// Resolves a member name of `class_type` to its hook key.
pub fn member_key(class_type: &'static TypeInfo, member: &str) -> Result<MemberKey, Error> {
    let class = class_type.as_class().ok_or_else(|| {
        Error::type_mismatch("a class", class_type.name().to_string())
    })?;
    let member = class.find_member(member).ok_or_else(|| {
        Error::unknown_member(format!("{} has no member {}", class_type.name(), member))
    })?;
    Ok((crate::meta::type_key(class_type), member.index()))
}

/// Resolves a variant name of `choice_type` to its hook key.
pub fn variant_key(choice_type: &'static TypeInfo, variant: &str) -> Result<VariantKey, Error> {
    let choice = choice_type.as_choice().ok_or_else(|| {
        Error::type_mismatch("a choice", choice_type.name().to_string())
    })?;
    let variant = choice.find_variant(variant).ok_or_else(|| {
        Error::unknown_member(format!("{} has no variant {}", choice_type.name(), variant))
    })?;
    Ok((crate::meta::type_key(choice_type), variant.index()))
}
