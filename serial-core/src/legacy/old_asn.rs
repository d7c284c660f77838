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

//! Opaque objects of the older toolkit, streamed by their own procedures.

use crate::error::Error;
use crate::meta::{mismatch, registry, CustomType, TypeInfo, TypeKind};
use crate::stream::{ObjectIStream, ObjectOStream};
use std::any::Any;
use std::fmt;

/// Byte channel handed to the toolkit's read and write procedures.
///
/// On output the procedure appends its encoding, which is then stored as
/// one byte block. On input the block is read first and the procedure
/// consumes it.
#[derive(Debug)]
pub struct AsnIo {
    type_name: String,
    data: Vec<u8>,
    pos: usize,
}

impl AsnIo {
    fn new(type_name: &str, data: Vec<u8>) -> Self {
        AsnIo {
            type_name: type_name.to_string(),
            data,
            pos: 0,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn write(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Reads up to `buf.len()` unread bytes; 0 at the end.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let rest = self.remaining();
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        n
    }

    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }
}

pub type AsnNewProc = fn() -> Box<dyn Any>;
pub type AsnFreeProc = fn(Box<dyn Any>);
/// Returns `None` when the input cannot be decoded.
pub type AsnReadProc = fn(&mut AsnIo) -> Option<Box<dyn Any>>;
/// Returns `false` when the object cannot be encoded.
pub type AsnWriteProc = fn(&dyn Any, &mut AsnIo) -> bool;

/// Procedure table of one toolkit type.
#[derive(Clone, Copy, Debug)]
pub struct AsnProcs {
    pub new: AsnNewProc,
    pub free: AsnFreeProc,
    pub read: AsnReadProc,
    pub write: AsnWriteProc,
}

/// Handle to a toolkit object; the null handle is the default value.
#[derive(Default)]
pub struct OldAsnValue(pub Option<Box<dyn Any>>);

impl OldAsnValue {
    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|value| value.downcast_ref::<T>())
    }
}

impl fmt::Debug for OldAsnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("OldAsnValue(..)"),
            None => f.write_str("OldAsnValue(null)"),
        }
    }
}

struct OldAsnType {
    procs: AsnProcs,
}

impl OldAsnType {
    fn release(&self, value: &mut OldAsnValue) {
        if let Some(object) = value.0.take() {
            (self.procs.free)(object);
        }
    }
}

impl CustomType for OldAsnType {
    fn is_default(&self, object: &dyn Any) -> bool {
        object
            .downcast_ref::<OldAsnValue>()
            .map_or(false, OldAsnValue::is_null)
    }

    fn equals(&self, a: &dyn Any, b: &dyn Any) -> bool {
        self.is_default(a) && self.is_default(b)
    }

    fn set_default(&self, object: &mut dyn Any) {
        if let Some(value) = object.downcast_mut::<OldAsnValue>() {
            self.release(value);
        }
    }

    fn assign(&self, dst: &mut dyn Any, src: &dyn Any) -> Result<(), Error> {
        if !self.is_default(src) {
            return Err(Error::unsupported("cannot assign non default value"));
        }
        self.set_default(dst);
        Ok(())
    }

    fn write_data(
        &self,
        type_info: &'static TypeInfo,
        out: &mut ObjectOStream,
        object: &dyn Any,
    ) -> Result<(), Error> {
        let value = object
            .downcast_ref::<OldAsnValue>()
            .ok_or_else(|| mismatch(type_info))?;
        let mut io = AsnIo::new(type_info.name(), Vec::new());
        match value.0.as_deref() {
            Some(object) if (self.procs.write)(object, &mut io) => out.write_bytes(&io.data),
            _ => Err(Error::write_fault("write fault")),
        }
    }

    fn read_data(
        &self,
        type_info: &'static TypeInfo,
        input: &mut ObjectIStream,
        object: &mut dyn Any,
    ) -> Result<(), Error> {
        let value = object
            .downcast_mut::<OldAsnValue>()
            .ok_or_else(|| mismatch(type_info))?;
        let mut io = AsnIo::new(type_info.name(), input.read_bytes()?);
        self.release(value);
        value.0 = Some((self.procs.read)(&mut io).ok_or_else(|| Error::read_fault("read fault"))?);
        Ok(())
    }

    fn skip_data(&self, _type_info: &'static TypeInfo, _input: &mut ObjectIStream) -> Result<(), Error> {
        Err(Error::unsupported("cannot skip OldAsn"))
    }
}

/// A toolkit type registered under its ASN.1 name.
#[derive(Clone, Copy, Debug)]
pub struct OldAsnTypeInfo {
    type_info: &'static TypeInfo,
    procs: AsnProcs,
}

impl OldAsnTypeInfo {
    /// Registers `name` with its procedure table. The name must not be taken.
    pub fn new(name: &str, procs: AsnProcs) -> Result<Self, Error> {
        let type_info = registry().register(TypeInfo::new::<OldAsnValue>(
            name,
            TypeKind::Custom(Box::new(OldAsnType { procs })),
        ))?;
        Ok(OldAsnTypeInfo { type_info, procs })
    }

    pub fn type_info(&self) -> &'static TypeInfo {
        self.type_info
    }

    /// Fresh toolkit object, allocated by the type's own procedure.
    pub fn create(&self) -> OldAsnValue {
        OldAsnValue(Some((self.procs.new)()))
    }
}
