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

use crate::config::{Config, HookPolicy};
use crate::error::Error;
use crate::format::{new_reader, FormatReader};
use crate::meta::{
    mismatch, registry, type_key, type_name_matches, ChoiceInfo, ClassInfo, ContainerInfo,
    EnumInfo, MemberInfo, PointerInfo, PointerKind, SerialType, TypeInfo, VariantInfo,
};
use crate::resolver::frame::{FrameKind, FrameStack};
use crate::resolver::hooks::{
    member_key, variant_key, MemberMut, ObjectMut, ReadChoiceVariantHook, ReadClassMemberHook,
    ReadHooks, ReadObjectHook, VariantMut,
};
use crate::resolver::ref_resolver::{ReadObjectList, SharedObject};
use crate::types::{DataFormat, PointerToken, RawPointerToken};
use std::any::Any;
use std::io::Read;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

const BYTES_CHUNK: usize = 4096;

/// Reads object graphs written by [`crate::stream::ObjectOStream`].
pub struct ObjectIStream {
    format: Box<dyn FormatReader>,
    objects: ReadObjectList,
    hooks: ReadHooks,
    stack: FrameStack,
    config: Config,
    in_bytes: bool,
    /// Back-references met so far, read or skipped.
    references: u64,
    failed: bool,
}

impl ObjectIStream {
    pub fn from_bytes(format: DataFormat, data: Vec<u8>) -> Self {
        Self::with_config(format, data, Config::default())
    }

    pub fn with_config(format: DataFormat, data: Vec<u8>, config: Config) -> Self {
        ObjectIStream {
            format: new_reader(format, data),
            objects: ReadObjectList::new(),
            hooks: ReadHooks::default(),
            stack: FrameStack::new(config.max_depth()),
            config,
            in_bytes: false,
            references: 0,
            failed: false,
        }
    }

    pub fn from_reader(format: DataFormat, mut reader: impl Read) -> Result<Self, Error> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::from_bytes(format, data))
    }

    /// Opens `path`, choosing the format from its extension.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let format = DataFormat::from_path(path).ok_or_else(|| {
            Error::unsupported(format!("cannot tell the format of {}", path.display()))
        })?;
        Ok(Self::from_bytes(format, std::fs::read(path)?))
    }

    pub fn hook_policy(mut self, policy: HookPolicy) -> Self {
        self.config.hook_policy = policy;
        self
    }

    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.config.max_depth = max_depth;
        self.stack = FrameStack::new(max_depth);
        self
    }

    pub fn verify_type_name(mut self, verify: bool) -> Self {
        self.config.verify_type_name = verify;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn data_format(&self) -> DataFormat {
        self.format.data_format()
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn has_more_data(&mut self) -> bool {
        !self.failed && self.format.has_more_data()
    }

    pub fn stack_trace(&self) -> String {
        self.stack.trace()
    }

    /// Reads a root object of type `T`.
    pub fn read<T: SerialType>(&mut self) -> Result<T, Error> {
        let mut value = T::default();
        self.read_root(&mut value, T::type_info())?;
        Ok(value)
    }

    pub fn read_root(&mut self, object: &mut dyn Any, type_info: &'static TypeInfo) -> Result<(), Error> {
        self.check_usable()?;
        match self.read_root_inner(object, type_info) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(err)),
        }
    }

    fn read_root_inner(&mut self, object: &mut dyn Any, type_info: &'static TypeInfo) -> Result<(), Error> {
        self.stack.push(FrameKind::Named, type_info.name())?;
        if let Some(label) = self.format.begin_named_type()? {
            self.check_type_name(&label, type_info)?;
        }
        self.read_object(object, type_info)?;
        self.format.end_named_type()?;
        self.stack.pop();
        self.end_of_read()
    }

    /// Reads a root object whose type is given by its label.
    pub fn read_any(&mut self) -> Result<(&'static TypeInfo, Box<dyn Any>), Error> {
        self.check_usable()?;
        match self.read_any_inner() {
            Ok(found) => Ok(found),
            Err(err) => Err(self.fail(err)),
        }
    }

    fn read_any_inner(&mut self) -> Result<(&'static TypeInfo, Box<dyn Any>), Error> {
        let label = self.format.begin_named_type()?.ok_or_else(|| {
            Error::unsupported(format!("{} data carries no type names", self.data_format()))
        })?;
        let type_info = registry().resolve_name(&label)?;
        self.stack.push(FrameKind::Named, type_info.name())?;
        let mut object = type_info.create();
        self.read_object(&mut *object, type_info)?;
        self.format.end_named_type()?;
        self.stack.pop();
        self.end_of_read()?;
        Ok((type_info, object))
    }

    /// Skips a root object of type `type_info`.
    pub fn skip_root(&mut self, type_info: &'static TypeInfo) -> Result<(), Error> {
        self.check_usable()?;
        match self.skip_root_inner(type_info) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(err)),
        }
    }

    fn skip_root_inner(&mut self, type_info: &'static TypeInfo) -> Result<(), Error> {
        self.stack.push(FrameKind::Named, type_info.name())?;
        if let Some(label) = self.format.begin_named_type()? {
            self.check_type_name(&label, type_info)?;
        }
        self.skip_object(type_info)?;
        self.format.end_named_type()?;
        self.stack.pop();
        self.end_of_read()
    }

    fn check_usable(&self) -> Result<(), Error> {
        if self.failed {
            Err(Error::not_allowed("cannot read from a failed stream"))
        } else {
            Ok(())
        }
    }

    fn check_type_name(&self, label: &str, type_info: &'static TypeInfo) -> Result<(), Error> {
        if self.config.is_verify_type_name() && !type_name_matches(label, type_info) {
            return Err(Error::incompatible_type(format!("{label}<>{}", type_info.name())));
        }
        Ok(())
    }

    fn fail(&mut self, err: Error) -> Error {
        self.failed = true;
        let location = format!("{} ({})", self.stack.trace(), self.format.location());
        log::error!("read failed at {location}: {err}");
        self.stack.clear();
        self.in_bytes = false;
        err.at(&location)
    }

    fn end_of_read(&mut self) -> Result<(), Error> {
        self.objects.clear();
        self.format.end_of_read()
    }

    /// Reads into `object`, through the object hook of its type if one is set.
    pub fn read_object(&mut self, object: &mut dyn Any, type_info: &'static TypeInfo) -> Result<(), Error> {
        if let Some(hook) = self.hooks.object.get(type_key(type_info)) {
            return hook.read_object(self, ObjectMut { object, type_info });
        }
        self.read_object_default(object, type_info)
    }

    pub fn read_object_default(
        &mut self,
        object: &mut dyn Any,
        type_info: &'static TypeInfo,
    ) -> Result<(), Error> {
        if !type_info.is_instance(object) {
            return Err(mismatch(type_info));
        }
        type_info.read_data(self, object)
    }

    /// Consumes one value of `type_info` without building it.
    pub fn skip_object(&mut self, type_info: &'static TypeInfo) -> Result<(), Error> {
        type_info.skip_data(self)
    }

    /// Reads an object owned by the caller. References to it from the rest
    /// of the stream are rejected.
    pub fn read_external_object(
        &mut self,
        object: &mut dyn Any,
        type_info: &'static TypeInfo,
    ) -> Result<(), Error> {
        let token = self.read_pointer_token()?;
        let other = matches!(token, PointerToken::Other(_));
        match token {
            PointerToken::Null => {
                return Err(Error::invalid_data(format!("null external {}", type_info.name())))
            }
            PointerToken::Reference(index) => {
                return Err(Error::invalid_ref(format!(
                    "external {} given as reference @{index}",
                    type_info.name()
                )))
            }
            PointerToken::Other(actual) if actual != type_info => {
                return Err(Error::type_mismatch(type_info.name(), actual.name()))
            }
            PointerToken::This | PointerToken::Other(_) => {
                self.objects.register_external();
                self.read_object(object, type_info)?;
            }
        }
        self.end_pointer_token(other)
    }

    /// Reads `object` as an independent sub-graph: objects it registers
    /// cannot be referenced from what follows.
    pub fn read_separate_object(
        &mut self,
        object: &mut dyn Any,
        type_info: &'static TypeInfo,
    ) -> Result<(), Error> {
        let first = self.objects.next_index();
        let result = self.read_object(object, type_info);
        self.objects.forget_from(first);
        result
    }

    pub(crate) fn read_enumerated(
        &mut self,
        type_info: &'static TypeInfo,
        info: &'static EnumInfo,
        object: &mut dyn Any,
    ) -> Result<(), Error> {
        let value = self.format.read_enum(info.values())?;
        if !info.set_value(object, value) {
            return Err(Error::unknown_enum(format!(
                "{value} is not a value of {}",
                type_info.name()
            )));
        }
        Ok(())
    }

    pub(crate) fn skip_enumerated(&mut self, info: &'static EnumInfo) -> Result<(), Error> {
        self.format.skip_enum(info.values())
    }

    pub(crate) fn read_container(
        &mut self,
        type_info: &'static TypeInfo,
        info: &'static ContainerInfo,
        object: &mut dyn Any,
    ) -> Result<(), Error> {
        let element_type = info.element_type();
        self.begin_container(type_info)?;
        info.fill(object, &mut |slot: &mut dyn Any| {
            if !self.begin_container_element(element_type)? {
                return Ok(false);
            }
            self.read_object(slot, element_type)?;
            self.end_container_element()?;
            Ok(true)
        })?;
        self.end_container()
    }

    pub(crate) fn skip_container(
        &mut self,
        type_info: &'static TypeInfo,
        info: &'static ContainerInfo,
    ) -> Result<(), Error> {
        let element_type = info.element_type();
        self.begin_container(type_info)?;
        while self.begin_container_element(element_type)? {
            self.skip_object(element_type)?;
            self.end_container_element()?;
        }
        self.end_container()
    }

    pub fn begin_container(&mut self, type_info: &'static TypeInfo) -> Result<(), Error> {
        let info = type_info
            .as_container()
            .ok_or_else(|| Error::type_mismatch("a container", type_info.name()))?;
        self.stack.push(FrameKind::Container, type_info.name())?;
        self.format.begin_container(type_info, info)
    }

    /// Positions on the next element, `false` at the end of the container.
    pub fn begin_container_element(&mut self, element_type: &'static TypeInfo) -> Result<bool, Error> {
        if !self.format.begin_container_element(element_type)? {
            return Ok(false);
        }
        self.stack.push(FrameKind::ContainerElement, element_type.name())?;
        Ok(true)
    }

    pub fn end_container_element(&mut self) -> Result<(), Error> {
        self.format.end_container_element()?;
        self.stack.pop();
        Ok(())
    }

    pub fn end_container(&mut self) -> Result<(), Error> {
        self.format.end_container()?;
        self.stack.pop();
        Ok(())
    }

    pub(crate) fn read_class(
        &mut self,
        type_info: &'static TypeInfo,
        class: &'static ClassInfo,
        object: &mut dyn Any,
    ) -> Result<(), Error> {
        let seen = self.walk_class(type_info, class, |input, member| {
            match input.hooks.member.get((type_key(type_info), member.index())) {
                Some(hook) => hook.read_class_member(
                    input,
                    MemberMut {
                        class_object: &mut *object,
                        class_type: type_info,
                        member,
                    },
                ),
                None => input.read_class_member(member, &mut *object),
            }
        })?;
        for member in class.members() {
            if member.is_optional() && !seen[member.index()] {
                member.reset(object)?;
            }
        }
        self.end_class()
    }

    pub(crate) fn skip_class(
        &mut self,
        type_info: &'static TypeInfo,
        class: &'static ClassInfo,
    ) -> Result<(), Error> {
        self.walk_class(type_info, class, |input, member| {
            input.skip_object(member.type_info())
        })?;
        self.end_class()
    }

    /// Reads member identifiers until the end of the class, handing each
    /// member to `each`. Checks order, duplicates and mandatory members;
    /// leaves the class frame open and returns which members were present.
    fn walk_class(
        &mut self,
        type_info: &'static TypeInfo,
        class: &'static ClassInfo,
        mut each: impl FnMut(&mut Self, &'static MemberInfo) -> Result<(), Error>,
    ) -> Result<Vec<bool>, Error> {
        self.stack.push(FrameKind::Class, type_info.name())?;
        self.format.begin_class(type_info, class)?;
        let mut seen = vec![false; class.len()];
        let mut next_expected = 0;
        while let Some(index) = self.format.begin_class_member(type_info, class)? {
            let member = class.member(index).ok_or_else(|| {
                Error::unknown_member(format!("member index {index} of {}", type_info.name()))
            })?;
            if seen[index] {
                return Err(Error::duplicated_member(format!(
                    "duplicated member {}",
                    member.name()
                )));
            }
            if !class.random_order() && index < next_expected {
                return Err(Error::invalid_data(format!(
                    "member {} out of order",
                    member.name()
                )));
            }
            seen[index] = true;
            next_expected = index + 1;
            self.stack.push(FrameKind::ClassMember, member.name())?;
            each(self, member)?;
            self.format.end_class_member()?;
            self.stack.pop();
        }
        for member in class.members() {
            if !seen[member.index()] && !member.is_optional() {
                return Err(Error::missing_member(format!(
                    "{}.{} expected",
                    type_info.name(),
                    member.name()
                )));
            }
        }
        Ok(seen)
    }

    fn end_class(&mut self) -> Result<(), Error> {
        self.format.end_class()?;
        self.stack.pop();
        Ok(())
    }

    /// Reads the value of `member` into `class_object`. The member
    /// identifier must already be consumed.
    pub fn read_class_member(
        &mut self,
        member: &'static MemberInfo,
        class_object: &mut dyn Any,
    ) -> Result<(), Error> {
        let member_type = member.type_info();
        let value = member
            .get_mut(class_object)
            .ok_or_else(|| Error::type_mismatch("a class object", member.name()))?;
        self.read_object(value, member_type)
    }

    pub(crate) fn read_choice(
        &mut self,
        type_info: &'static TypeInfo,
        choice: &'static ChoiceInfo,
        object: &mut dyn Any,
    ) -> Result<(), Error> {
        let variant = self.begin_choice(type_info, choice)?;
        choice.set_index(object, variant.index())?;
        match self.hooks.variant.get((type_key(type_info), variant.index())) {
            Some(hook) => hook.read_choice_variant(
                self,
                VariantMut {
                    choice_object: &mut *object,
                    choice_type: type_info,
                    variant,
                },
            )?,
            None => self.read_choice_variant(variant, object)?,
        }
        self.end_choice()
    }

    pub(crate) fn skip_choice(
        &mut self,
        type_info: &'static TypeInfo,
        choice: &'static ChoiceInfo,
    ) -> Result<(), Error> {
        let variant = self.begin_choice(type_info, choice)?;
        match variant.type_info() {
            None => self.format.skip_null()?,
            Some(variant_type) => self.skip_object(variant_type)?,
        }
        self.end_choice()
    }

    fn begin_choice(
        &mut self,
        type_info: &'static TypeInfo,
        choice: &'static ChoiceInfo,
    ) -> Result<&'static VariantInfo, Error> {
        self.stack.push(FrameKind::Choice, type_info.name())?;
        self.format.begin_choice(type_info, choice)?;
        let index = self.format.begin_choice_variant(type_info, choice)?;
        let variant = choice.variant(index).ok_or_else(|| {
            Error::unknown_member(format!("variant index {index} of {}", type_info.name()))
        })?;
        self.stack.push(FrameKind::ChoiceVariant, variant.name())?;
        Ok(variant)
    }

    fn end_choice(&mut self) -> Result<(), Error> {
        self.format.end_choice_variant()?;
        self.stack.pop();
        self.format.end_choice()?;
        self.stack.pop();
        Ok(())
    }

    /// Reads the payload of `variant`, already selected in `choice_object`.
    pub fn read_choice_variant(
        &mut self,
        variant: &'static VariantInfo,
        choice_object: &mut dyn Any,
    ) -> Result<(), Error> {
        match variant.type_info() {
            None => self.format.read_null(),
            Some(variant_type) => {
                let value = variant
                    .get_mut(choice_object)
                    .ok_or_else(|| Error::type_mismatch("a choice object", variant.name()))?;
                self.read_object(value, variant_type)
            }
        }
    }

    pub(crate) fn read_pointer_value(
        &mut self,
        type_info: &'static TypeInfo,
        info: &'static PointerInfo,
        object: &mut dyn Any,
    ) -> Result<(), Error> {
        if !info.has_token() {
            return info.read(self, PointerToken::This, object);
        }
        let token = self.read_pointer_token()?;
        let other = matches!(token, PointerToken::Other(_));
        log::trace!("{} token {:?}", type_info.name(), token);
        info.read(self, token, object)?;
        self.end_pointer_token(other)
    }

    pub(crate) fn skip_pointer_value(
        &mut self,
        type_info: &'static TypeInfo,
        info: &'static PointerInfo,
    ) -> Result<(), Error> {
        if !info.has_token() {
            let pointee = info
                .pointee_type()
                .ok_or_else(|| Error::unsupported(format!("{} has no pointee", type_info.name())))?;
            return self.skip_object(pointee);
        }
        let token = self.read_pointer_token()?;
        let other = matches!(token, PointerToken::Other(_));
        self.skip_pointee(type_info, info, token)?;
        self.end_pointer_token(other)
    }

    fn skip_pointee(
        &mut self,
        type_info: &'static TypeInfo,
        info: &'static PointerInfo,
        token: PointerToken,
    ) -> Result<(), Error> {
        let declared = info.pointee_type();
        match (info.kind(), token) {
            (PointerKind::Nullable, PointerToken::Null) => Ok(()),
            (PointerKind::Nullable, token) => {
                let pointee = declared.ok_or_else(|| mismatch(type_info))?;
                match pointee.as_pointer() {
                    Some(inner) if inner.has_token() => self.skip_pointee(pointee, inner, token),
                    _ => {
                        let actual = self.untracked_type(pointee, token)?;
                        self.skip_object(actual)
                    }
                }
            }
            (PointerKind::Polymorphic, PointerToken::Null) => Ok(()),
            (_, PointerToken::Null) => Err(Error::invalid_data(format!(
                "null where a {} is required",
                type_info.name()
            ))),
            (_, PointerToken::Reference(index)) => {
                self.references += 1;
                self.objects.check_index(index)
            }
            (_, PointerToken::This) => {
                let pointee = declared.ok_or_else(|| {
                    Error::invalid_data(format!("{} requires a type name", type_info.name()))
                })?;
                self.objects.register_skipped();
                self.skip_object(pointee)
            }
            (_, PointerToken::Other(actual)) => {
                self.objects.register_skipped();
                self.skip_object(actual)
            }
        }
    }

    /// Type of the value following `token` for a pointer without identity.
    fn untracked_type(
        &self,
        declared: &'static TypeInfo,
        token: PointerToken,
    ) -> Result<&'static TypeInfo, Error> {
        match token {
            PointerToken::This => Ok(declared),
            PointerToken::Other(actual) if actual == declared => Ok(actual),
            PointerToken::Other(actual) => Err(Error::type_mismatch(declared.name(), actual.name())),
            PointerToken::Null => Err(Error::invalid_data(format!(
                "null where a {} is required",
                declared.name()
            ))),
            PointerToken::Reference(index) => Err(Error::invalid_ref(format!(
                "reference @{index} to an untracked {}",
                declared.name()
            ))),
        }
    }

    /// Reads the value designated by a non-null `token` into `object`, an
    /// instance of `type_info`. Pointer types carrying their own token
    /// consume `token`; any other type must be given as `This`.
    pub fn read_pointee(
        &mut self,
        type_info: &'static TypeInfo,
        token: PointerToken,
        object: &mut dyn Any,
    ) -> Result<(), Error> {
        match type_info.as_pointer() {
            Some(inner) if inner.has_token() => inner.read(self, token, object),
            _ => {
                let actual = self.untracked_type(type_info, token)?;
                self.read_object(object, actual)
            }
        }
    }

    /// Reads a pointer token, resolving the type name of an "other" pointer.
    pub fn read_pointer_token(&mut self) -> Result<PointerToken, Error> {
        Ok(match self.format.read_pointer_token()? {
            RawPointerToken::Null => PointerToken::Null,
            RawPointerToken::Reference(index) => PointerToken::Reference(index),
            RawPointerToken::This => PointerToken::This,
            RawPointerToken::Other(name) => {
                let type_info = registry().resolve_name(&name)?;
                self.stack.push(FrameKind::Pointer, type_info.name())?;
                PointerToken::Other(type_info)
            }
        })
    }

    fn end_pointer_token(&mut self, other: bool) -> Result<(), Error> {
        if other {
            self.format.end_other_pointer()?;
            self.stack.pop();
        }
        Ok(())
    }

    /// Reads a shared object of type `T` following a `This` or `Other`
    /// token and registers it under the next index.
    pub fn read_shared_rc<T: SerialType>(&mut self) -> Result<Rc<T>, Error> {
        let type_info = T::type_info();
        let index = self.objects.reserve();
        let in_place = type_info.as_pointer().and_then(PointerInfo::read_in_place);
        match in_place {
            Some(read_in_place) => {
                let rc = Rc::new(T::default());
                self.objects.fill(index, type_info, SharedObject::Rc(rc.clone()));
                read_in_place(self, &*rc)?;
                Ok(rc)
            }
            None => {
                let mut value = T::default();
                self.read_object(&mut value, type_info)?;
                let rc = Rc::new(value);
                self.objects.fill(index, type_info, SharedObject::Rc(rc.clone()));
                Ok(rc)
            }
        }
    }

    pub fn read_shared_arc<T: SerialType + Send + Sync>(&mut self) -> Result<Arc<T>, Error> {
        let type_info = T::type_info();
        let index = self.objects.reserve();
        let mut value = T::default();
        self.read_object(&mut value, type_info)?;
        let arc = Arc::new(value);
        self.objects.fill(index, type_info, SharedObject::Arc(arc.clone()));
        Ok(arc)
    }

    /// Reads a shared object whose type is only known at runtime.
    pub fn read_shared_any(&mut self, type_info: &'static TypeInfo) -> Result<Rc<dyn Any>, Error> {
        let index = self.objects.reserve();
        let mut object = type_info.create();
        self.read_object(&mut *object, type_info)?;
        let rc: Rc<dyn Any> = Rc::from(object);
        self.objects.fill(index, type_info, SharedObject::Rc(rc.clone()));
        Ok(rc)
    }

    pub fn registered_rc<T: 'static>(&mut self, index: u32) -> Result<Rc<T>, Error> {
        self.references += 1;
        self.objects.get_rc(index)
    }

    pub fn registered_arc<T: Send + Sync + 'static>(&mut self, index: u32) -> Result<Arc<T>, Error> {
        self.references += 1;
        self.objects.get_arc(index)
    }

    pub fn registered_any(&mut self, index: u32) -> Result<(&'static TypeInfo, Rc<dyn Any>), Error> {
        self.references += 1;
        self.objects.get_rc_any(index)
    }

    /// Reserves the index of an object about to be read by custom code.
    pub fn reserve_object(&mut self) -> u32 {
        self.objects.reserve()
    }

    /// Completes a reservation made with [`reserve_object`](Self::reserve_object).
    pub fn fill_object(&mut self, index: u32, type_info: &'static TypeInfo, object: SharedObject) {
        self.objects.fill(index, type_info, object);
    }

    /// Registers an object that was skipped; references to it are errors.
    pub fn register_skipped(&mut self) -> u32 {
        self.objects.register_skipped()
    }

    /// Object registered under `index`, counted as a reference.
    pub fn registered_object(&mut self, index: u32) -> Result<(&'static TypeInfo, SharedObject), Error> {
        self.references += 1;
        self.objects
            .get(index)
            .map(|(type_info, object)| (type_info, object.clone()))
    }

    /// Index the next registered object will get.
    pub fn next_object_index(&self) -> u32 {
        self.objects.next_index()
    }

    pub fn reference_count(&self) -> u64 {
        self.references
    }

    /// Reserves `count` indices for objects that are not available, so that
    /// a value read out of its original stream keeps its indices.
    pub fn skip_object_indices(&mut self, count: u32) {
        for _ in 0..count {
            self.objects.register_skipped();
        }
    }

    /// Starts capturing the raw encoding of the next value. `None` when the
    /// format cannot capture.
    pub fn capture_start(&mut self) -> Result<Option<usize>, Error> {
        self.format.capture_start()
    }

    pub fn captured(&self, start: usize) -> Result<Vec<u8>, Error> {
        self.format.captured(start)
    }

    /// Opens a byte block; returns its length when the format knows it.
    pub fn begin_bytes(&mut self) -> Result<Option<usize>, Error> {
        if self.in_bytes {
            return Err(Error::not_allowed("byte block already open"));
        }
        let len = self.format.begin_bytes()?;
        self.in_bytes = true;
        Ok(len)
    }

    /// Reads up to `buf.len()` bytes of the open block; 0 at its end.
    pub fn read_bytes_chunk(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if !self.in_bytes {
            return Err(Error::not_allowed("no byte block open"));
        }
        self.format.read_bytes_chunk(buf)
    }

    pub fn end_bytes(&mut self) -> Result<(), Error> {
        if !self.in_bytes {
            return Err(Error::not_allowed("no byte block open"));
        }
        self.in_bytes = false;
        self.format.end_bytes()
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>, Error> {
        self.begin_bytes()?;
        let mut bytes = Vec::new();
        let mut chunk = [0u8; BYTES_CHUNK];
        loop {
            let n = self.read_bytes_chunk(&mut chunk)?;
            if n == 0 {
                break;
            }
            bytes.extend_from_slice(&chunk[..n]);
        }
        self.end_bytes()?;
        Ok(bytes)
    }

    pub fn skip_bytes(&mut self) -> Result<(), Error> {
        self.format.skip_bytes()
    }

    pub fn read_bool(&mut self) -> Result<bool, Error> {
        self.format.read_bool()
    }

    pub fn read_char(&mut self) -> Result<char, Error> {
        self.format.read_char()
    }

    pub fn read_i8(&mut self) -> Result<i8, Error> {
        self.format.read_i8()
    }

    pub fn read_i16(&mut self) -> Result<i16, Error> {
        self.format.read_i16()
    }

    pub fn read_i32(&mut self) -> Result<i32, Error> {
        self.format.read_i32()
    }

    pub fn read_i64(&mut self) -> Result<i64, Error> {
        self.format.read_i64()
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        self.format.read_u8()
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        self.format.read_u16()
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        self.format.read_u32()
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        self.format.read_u64()
    }

    pub fn read_f32(&mut self) -> Result<f32, Error> {
        self.format.read_f32()
    }

    pub fn read_f64(&mut self) -> Result<f64, Error> {
        self.format.read_f64()
    }

    pub fn read_string(&mut self) -> Result<String, Error> {
        self.format.read_string()
    }

    pub fn read_null(&mut self) -> Result<(), Error> {
        self.format.read_null()
    }

    pub fn skip_bool(&mut self) -> Result<(), Error> {
        self.format.skip_bool()
    }

    pub fn skip_signed(&mut self) -> Result<(), Error> {
        self.format.skip_signed()
    }

    pub fn skip_unsigned(&mut self) -> Result<(), Error> {
        self.format.skip_unsigned()
    }

    pub fn skip_f64(&mut self) -> Result<(), Error> {
        self.format.skip_f64()
    }

    pub fn skip_string(&mut self) -> Result<(), Error> {
        self.format.skip_string()
    }

    pub fn skip_null(&mut self) -> Result<(), Error> {
        self.format.skip_null()
    }

    pub fn set_read_object_hook(
        &mut self,
        type_info: &'static TypeInfo,
        hook: impl ReadObjectHook + 'static,
    ) -> Result<(), Error> {
        self.hooks.object.set(
            type_key(type_info),
            Rc::new(hook) as Rc<dyn ReadObjectHook>,
            self.config.hook_policy(),
            || format!("type {}", type_info.name()),
        )?;
        log::debug!("read hook set for {}", type_info.name());
        Ok(())
    }

    pub fn reset_read_object_hook(&mut self, type_info: &'static TypeInfo) -> bool {
        self.hooks.object.reset(type_key(type_info)).is_some()
    }

    pub fn set_read_class_member_hook(
        &mut self,
        class_type: &'static TypeInfo,
        member: &str,
        hook: impl ReadClassMemberHook + 'static,
    ) -> Result<(), Error> {
        let key = member_key(class_type, member)?;
        self.hooks.member.set(
            key,
            Rc::new(hook) as Rc<dyn ReadClassMemberHook>,
            self.config.hook_policy(),
            || format!("member {}.{}", class_type.name(), member),
        )?;
        log::debug!("read hook set for {}.{}", class_type.name(), member);
        Ok(())
    }

    pub fn reset_read_class_member_hook(
        &mut self,
        class_type: &'static TypeInfo,
        member: &str,
    ) -> Result<bool, Error> {
        let key = member_key(class_type, member)?;
        Ok(self.hooks.member.reset(key).is_some())
    }

    pub fn set_read_choice_variant_hook(
        &mut self,
        choice_type: &'static TypeInfo,
        variant: &str,
        hook: impl ReadChoiceVariantHook + 'static,
    ) -> Result<(), Error> {
        let key = variant_key(choice_type, variant)?;
        self.hooks.variant.set(
            key,
            Rc::new(hook) as Rc<dyn ReadChoiceVariantHook>,
            self.config.hook_policy(),
            || format!("variant {}.{}", choice_type.name(), variant),
        )?;
        log::debug!("read hook set for {}.{}", choice_type.name(), variant);
        Ok(())
    }

    pub fn reset_read_choice_variant_hook(
        &mut self,
        choice_type: &'static TypeInfo,
        variant: &str,
    ) -> Result<bool, Error> {
        let key = variant_key(choice_type, variant)?;
        Ok(self.hooks.variant.reset(key).is_some())
    }
}
