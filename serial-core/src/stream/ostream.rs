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
use crate::format::{new_writer, FormatWriter};
use crate::meta::{
    mismatch, type_key, ChoiceInfo, ClassInfo, ContainerInfo, EnumInfo, MemberInfo, Pointee,
    PointerInfo, PointerKind, PointerTarget, SerialType, TypeInfo, VariantInfo,
};
use crate::resolver::frame::{FrameKind, FrameStack};
use crate::resolver::hooks::{
    member_key, variant_key, MemberRef, ObjectRef, VariantRef, WriteChoiceVariantHook,
    WriteClassMemberHook, WriteHooks, WriteObjectHook,
};
use crate::resolver::ref_resolver::{Registration, WriteObjectList};
use crate::types::DataFormat;
use std::any::Any;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::rc::Rc;

/// Writes object graphs in one wire format.
///
/// ```
/// use serial_core::stream::ObjectOStream;
/// use serial_core::types::DataFormat;
///
/// let mut out = ObjectOStream::new(DataFormat::AsnText);
/// out.write(&vec![1i32, 2]).unwrap();
/// assert_eq!(out.bytes(), b"Vec<i32> ::= {\n  1,\n  2\n}\n");
/// ```
pub struct ObjectOStream {
    format: Box<dyn FormatWriter>,
    sink: Option<Box<dyn Write>>,
    objects: WriteObjectList,
    hooks: WriteHooks,
    stack: FrameStack,
    config: Config,
    /// Bytes still expected by the open byte block.
    bytes_left: Option<usize>,
    failed: bool,
}

impl ObjectOStream {
    pub fn new(format: DataFormat) -> Self {
        Self::with_config(format, Config::default())
    }

    pub fn with_config(format: DataFormat, config: Config) -> Self {
        ObjectOStream {
            format: new_writer(format, &config),
            sink: None,
            objects: WriteObjectList::new(),
            hooks: WriteHooks::default(),
            stack: FrameStack::new(config.max_depth()),
            config,
            bytes_left: None,
            failed: false,
        }
    }

    /// Sends the output to `sink` after every root object instead of
    /// keeping it in memory.
    pub fn with_sink(mut self, sink: impl Write + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Creates `path`, choosing the format from its extension.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let format = DataFormat::from_path(path).ok_or_else(|| {
            Error::unsupported(format!("cannot tell the format of {}", path.display()))
        })?;
        let file = File::create(path)?;
        Ok(Self::new(format).with_sink(BufWriter::new(file)))
    }

    pub fn track_refs(mut self, track_refs: bool) -> Self {
        self.config.track_refs = track_refs;
        self
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

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn data_format(&self) -> DataFormat {
        self.format.data_format()
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Path of the object being written, e.g. `Person.friends.E.name`.
    pub fn stack_trace(&self) -> String {
        self.stack.trace()
    }

    /// Writes `value` as a root object.
    pub fn write<T: SerialType>(&mut self, value: &T) -> Result<(), Error> {
        self.write_root(value, T::type_info())
    }

    pub fn write_root(&mut self, object: &dyn Any, type_info: &'static TypeInfo) -> Result<(), Error> {
        if self.failed {
            return Err(Error::not_allowed("cannot write to a failed stream"));
        }
        match self.write_root_inner(object, type_info) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(err)),
        }
    }

    fn write_root_inner(&mut self, object: &dyn Any, type_info: &'static TypeInfo) -> Result<(), Error> {
        self.stack.push(FrameKind::Named, type_info.name())?;
        self.format.begin_named_type(type_info)?;
        self.write_object(object, type_info)?;
        self.format.end_named_type()?;
        self.stack.pop();
        self.end_of_write()
    }

    fn fail(&mut self, err: Error) -> Error {
        self.failed = true;
        let location = self.stack.trace();
        log::error!("write failed at {location}: {err}");
        self.stack.clear();
        self.bytes_left = None;
        err.at(&location)
    }

    fn end_of_write(&mut self) -> Result<(), Error> {
        self.objects.clear();
        self.format.end_of_write()?;
        if self.sink.is_some() {
            self.flush()?;
        }
        Ok(())
    }

    /// Writes `object`, through the object hook of its type if one is set.
    pub fn write_object(&mut self, object: &dyn Any, type_info: &'static TypeInfo) -> Result<(), Error> {
        if let Some(hook) = self.hooks.object.get(type_key(type_info)) {
            return hook.write_object(self, ObjectRef { object, type_info });
        }
        self.write_object_default(object, type_info)
    }

    /// Writes `object` ignoring any object hook of its type.
    pub fn write_object_default(
        &mut self,
        object: &dyn Any,
        type_info: &'static TypeInfo,
    ) -> Result<(), Error> {
        if !type_info.is_instance(object) {
            return Err(mismatch(type_info));
        }
        type_info.write_data(self, object)
    }

    /// Writes an object owned outside of the written graph. Later pointers
    /// to the same object are written as references.
    pub fn write_external_object(
        &mut self,
        object: &dyn Any,
        type_info: &'static TypeInfo,
    ) -> Result<(), Error> {
        let identity = object as *const dyn Any as *const () as usize;
        self.write_pointer(
            Some(type_info),
            Some(PointerTarget {
                object: Pointee::Plain(object),
                type_info,
                identity: Some(identity),
            }),
        )
    }

    /// Writes `object` as an independent sub-graph: objects it registers
    /// cannot be referenced from what follows.
    pub fn write_separate_object(
        &mut self,
        object: &dyn Any,
        type_info: &'static TypeInfo,
    ) -> Result<(), Error> {
        let first = self.objects.next_index();
        let result = self.write_object(object, type_info);
        self.objects.forget_from(first);
        result
    }

    pub(crate) fn write_enumerated(
        &mut self,
        type_info: &'static TypeInfo,
        info: &'static EnumInfo,
        object: &dyn Any,
    ) -> Result<(), Error> {
        let value = info.value_of(object).ok_or_else(|| mismatch(type_info))?;
        if !self.format.write_enum(info.values(), value)? {
            self.format.write_i64(value)?;
        }
        Ok(())
    }

    pub(crate) fn write_container(
        &mut self,
        type_info: &'static TypeInfo,
        info: &'static ContainerInfo,
        object: &dyn Any,
    ) -> Result<(), Error> {
        let elements = info.elements(object).ok_or_else(|| mismatch(type_info))?;
        let element_type = info.element_type();
        self.begin_container(type_info)?;
        for element in elements {
            self.begin_container_element(element_type)?;
            self.write_object(element, element_type)?;
            self.end_container_element()?;
        }
        self.end_container()
    }

    pub(crate) fn write_class(
        &mut self,
        type_info: &'static TypeInfo,
        class: &'static ClassInfo,
        object: &dyn Any,
    ) -> Result<(), Error> {
        self.stack.push(FrameKind::Class, type_info.name())?;
        self.format.begin_class(type_info, class)?;
        for member in class.members() {
            let value = member.get(object).ok_or_else(|| mismatch(type_info))?;
            if member.is_optional() && member.is_default_value(value) {
                continue;
            }
            match self.hooks.member.get((type_key(type_info), member.index())) {
                Some(hook) => hook.write_class_member(
                    self,
                    MemberRef {
                        class_object: object,
                        class_type: type_info,
                        member,
                    },
                )?,
                None => self.write_class_member(member, value)?,
            }
        }
        self.format.end_class()?;
        self.stack.pop();
        Ok(())
    }

    /// Writes one member with its identifier.
    pub fn write_class_member(&mut self, member: &'static MemberInfo, value: &dyn Any) -> Result<(), Error> {
        self.stack.push(FrameKind::ClassMember, member.name())?;
        self.format.begin_class_member(member)?;
        self.write_object(value, member.type_info())?;
        self.format.end_class_member()?;
        self.stack.pop();
        Ok(())
    }

    pub(crate) fn write_choice(
        &mut self,
        type_info: &'static TypeInfo,
        choice: &'static ChoiceInfo,
        object: &dyn Any,
    ) -> Result<(), Error> {
        let index = choice.get_index(object)?.ok_or_else(|| {
            Error::invalid_data(format!("cannot write empty choice {}", type_info.name()))
        })?;
        let variant = choice
            .variant(index)
            .ok_or_else(|| Error::unknown_member(format!("variant index {index} out of range")))?;
        self.stack.push(FrameKind::Choice, type_info.name())?;
        self.format.begin_choice(type_info, choice)?;
        match self.hooks.variant.get((type_key(type_info), index)) {
            Some(hook) => hook.write_choice_variant(
                self,
                VariantRef {
                    choice_object: object,
                    choice_type: type_info,
                    variant,
                },
            )?,
            None => self.write_choice_variant(variant, variant.get(object))?,
        }
        self.format.end_choice()?;
        self.stack.pop();
        Ok(())
    }

    /// Writes the variant identifier followed by its payload (`NULL` for a
    /// variant without data).
    pub fn write_choice_variant(
        &mut self,
        variant: &'static VariantInfo,
        value: Option<&dyn Any>,
    ) -> Result<(), Error> {
        self.stack.push(FrameKind::ChoiceVariant, variant.name())?;
        self.format.begin_choice_variant(variant)?;
        match variant.type_info() {
            None => self.format.write_null()?,
            Some(variant_type) => {
                let value = value.ok_or_else(|| {
                    Error::type_mismatch(variant.name(), "a choice holding another variant")
                })?;
                self.write_object(value, variant_type)?;
            }
        }
        self.format.end_choice_variant()?;
        self.stack.pop();
        Ok(())
    }

    pub(crate) fn write_pointer_value(
        &mut self,
        type_info: &'static TypeInfo,
        info: &'static PointerInfo,
        object: &dyn Any,
    ) -> Result<(), Error> {
        match info.kind() {
            PointerKind::Auto | PointerKind::Cell => {
                let target = info
                    .target(object)?
                    .ok_or_else(|| Error::write_fault(format!("null {}", type_info.name())))?;
                self.write_object(&*target.object, target.type_info)
            }
            PointerKind::Nullable => match info.target(object)? {
                None => self.format.write_null_pointer(),
                Some(target) => self.write_object(&*target.object, target.type_info),
            },
            PointerKind::Shared | PointerKind::Polymorphic => {
                let target = info.target(object)?;
                self.write_pointer(info.pointee_type(), target)
            }
        }
    }

    /// Writes a tracked pointer: a null token, a reference to an object
    /// already written, or the object itself (framed with its type name
    /// when it differs from `declared`).
    pub fn write_pointer(
        &mut self,
        declared: Option<&'static TypeInfo>,
        target: Option<PointerTarget<'_>>,
    ) -> Result<(), Error> {
        let Some(target) = target else {
            return self.format.write_null_pointer();
        };
        if self.config.is_track_refs() {
            if let Some(identity) = target.identity {
                if let Registration::Existing(index) = self.objects.register(identity) {
                    return self.format.write_object_reference(index);
                }
            }
        }
        if declared.is_some_and(|declared| std::ptr::eq(declared, target.type_info)) {
            return self.write_object(&*target.object, target.type_info);
        }
        self.stack.push(FrameKind::Pointer, target.type_info.name())?;
        self.format.begin_other_pointer(target.type_info)?;
        self.write_object(&*target.object, target.type_info)?;
        self.format.end_other_pointer()?;
        self.stack.pop();
        Ok(())
    }

    pub fn begin_container(&mut self, type_info: &'static TypeInfo) -> Result<(), Error> {
        let info = type_info
            .as_container()
            .ok_or_else(|| Error::type_mismatch("a container", type_info.name()))?;
        self.stack.push(FrameKind::Container, type_info.name())?;
        self.format.begin_container(type_info, info)
    }

    pub fn end_container(&mut self) -> Result<(), Error> {
        self.format.end_container()?;
        self.stack.pop();
        Ok(())
    }

    pub fn begin_container_element(&mut self, element_type: &'static TypeInfo) -> Result<(), Error> {
        self.stack.push(FrameKind::ContainerElement, element_type.name())?;
        self.format.begin_container_element(element_type)
    }

    pub fn end_container_element(&mut self) -> Result<(), Error> {
        self.format.end_container_element()?;
        self.stack.pop();
        Ok(())
    }

    /// Opens a byte block of exactly `len` bytes.
    pub fn begin_bytes(&mut self, len: usize) -> Result<(), Error> {
        if self.bytes_left.is_some() {
            return Err(Error::not_allowed("byte block already open"));
        }
        self.format.begin_bytes(len)?;
        self.bytes_left = Some(len);
        Ok(())
    }

    pub fn write_bytes_chunk(&mut self, chunk: &[u8]) -> Result<(), Error> {
        let left = self
            .bytes_left
            .ok_or_else(|| Error::not_allowed("no byte block open"))?;
        if chunk.len() > left {
            return Err(Error::write_fault(format!(
                "{} bytes written to a byte block with {left} bytes left",
                chunk.len()
            )));
        }
        self.format.write_bytes_chunk(chunk)?;
        self.bytes_left = Some(left - chunk.len());
        Ok(())
    }

    pub fn end_bytes(&mut self) -> Result<(), Error> {
        match self.bytes_left.take() {
            Some(0) => self.format.end_bytes(),
            Some(left) => Err(Error::write_fault(format!(
                "byte block closed with {left} bytes missing"
            ))),
            None => Err(Error::not_allowed("no byte block open")),
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.begin_bytes(bytes.len())?;
        self.write_bytes_chunk(bytes)?;
        self.end_bytes()
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), Error> {
        self.format.write_bool(value)
    }

    pub fn write_char(&mut self, value: char) -> Result<(), Error> {
        self.format.write_char(value)
    }

    pub fn write_i8(&mut self, value: i8) -> Result<(), Error> {
        self.format.write_i8(value)
    }

    pub fn write_i16(&mut self, value: i16) -> Result<(), Error> {
        self.format.write_i16(value)
    }

    pub fn write_i32(&mut self, value: i32) -> Result<(), Error> {
        self.format.write_i32(value)
    }

    pub fn write_i64(&mut self, value: i64) -> Result<(), Error> {
        self.format.write_i64(value)
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), Error> {
        self.format.write_u8(value)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), Error> {
        self.format.write_u16(value)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), Error> {
        self.format.write_u32(value)
    }

    pub fn write_u64(&mut self, value: u64) -> Result<(), Error> {
        self.format.write_u64(value)
    }

    pub fn write_f32(&mut self, value: f32) -> Result<(), Error> {
        self.format.write_f32(value)
    }

    pub fn write_f64(&mut self, value: f64) -> Result<(), Error> {
        self.format.write_f64(value)
    }

    pub fn write_str(&mut self, value: &str) -> Result<(), Error> {
        self.format.write_str(value)
    }

    pub fn write_null(&mut self) -> Result<(), Error> {
        self.format.write_null()
    }

    /// Copies a value already encoded in `format` to the output.
    pub fn write_raw_value(&mut self, format: DataFormat, bytes: &[u8]) -> Result<(), Error> {
        if format != self.data_format() {
            return Err(Error::not_allowed(format!(
                "cannot copy {format} data to a {} stream",
                self.data_format()
            )));
        }
        self.format.write_raw(bytes)
    }

    pub fn set_write_object_hook(
        &mut self,
        type_info: &'static TypeInfo,
        hook: impl WriteObjectHook + 'static,
    ) -> Result<(), Error> {
        self.hooks.object.set(
            type_key(type_info),
            Rc::new(hook) as Rc<dyn WriteObjectHook>,
            self.config.hook_policy(),
            || format!("type {}", type_info.name()),
        )?;
        log::debug!("write hook set for {}", type_info.name());
        Ok(())
    }

    pub fn reset_write_object_hook(&mut self, type_info: &'static TypeInfo) -> bool {
        self.hooks.object.reset(type_key(type_info)).is_some()
    }

    pub fn set_write_class_member_hook(
        &mut self,
        class_type: &'static TypeInfo,
        member: &str,
        hook: impl WriteClassMemberHook + 'static,
    ) -> Result<(), Error> {
        let key = member_key(class_type, member)?;
        self.hooks.member.set(
            key,
            Rc::new(hook) as Rc<dyn WriteClassMemberHook>,
            self.config.hook_policy(),
            || format!("member {}.{}", class_type.name(), member),
        )?;
        log::debug!("write hook set for {}.{}", class_type.name(), member);
        Ok(())
    }

    pub fn reset_write_class_member_hook(
        &mut self,
        class_type: &'static TypeInfo,
        member: &str,
    ) -> Result<bool, Error> {
        let key = member_key(class_type, member)?;
        Ok(self.hooks.member.reset(key).is_some())
    }

    pub fn set_write_choice_variant_hook(
        &mut self,
        choice_type: &'static TypeInfo,
        variant: &str,
        hook: impl WriteChoiceVariantHook + 'static,
    ) -> Result<(), Error> {
        let key = variant_key(choice_type, variant)?;
        self.hooks.variant.set(
            key,
            Rc::new(hook) as Rc<dyn WriteChoiceVariantHook>,
            self.config.hook_policy(),
            || format!("variant {}.{}", choice_type.name(), variant),
        )?;
        log::debug!("write hook set for {}.{}", choice_type.name(), variant);
        Ok(())
    }

    pub fn reset_write_choice_variant_hook(
        &mut self,
        choice_type: &'static TypeInfo,
        variant: &str,
    ) -> Result<bool, Error> {
        let key = variant_key(choice_type, variant)?;
        Ok(self.hooks.variant.reset(key).is_some())
    }

    /// Moves buffered output to the sink, if there is one.
    pub fn flush(&mut self) -> Result<(), Error> {
        if let Some(sink) = self.sink.as_mut() {
            let bytes = self.format.buffer().take();
            sink.write_all(&bytes)?;
            sink.flush()?;
        }
        Ok(())
    }

    pub fn close(mut self) -> Result<(), Error> {
        self.flush()
    }

    /// Output kept in memory (everything, when there is no sink).
    pub fn bytes(&self) -> &[u8] {
        self.format.buffer_ref().as_slice()
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        self.format.buffer().take()
    }
}
