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
use crate::meta::{mismatch, TypeInfo};
use crate::stream::{ObjectIStream, ObjectOStream};
use std::any::Any;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveKind {
    Null,
    Bool,
    Char,
    SignedInteger,
    UnsignedInteger,
    Real,
    String,
    OctetString,
}

/// Value semantics of a leaf type, as plain function pointers.
#[derive(Clone, Copy)]
pub struct ValueOps {
    is_default: fn(&dyn Any) -> bool,
    equals: fn(&dyn Any, &dyn Any) -> bool,
    assign: fn(&mut dyn Any, &dyn Any) -> bool,
}

fn is_default_value<T: Any + Default + PartialEq>(object: &dyn Any) -> bool {
    object.downcast_ref::<T>().map_or(false, |v| *v == T::default())
}

fn equal_values<T: Any + PartialEq>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn assign_value<T: Any + Clone>(dst: &mut dyn Any, src: &dyn Any) -> bool {
    match (dst.downcast_mut::<T>(), src.downcast_ref::<T>()) {
        (Some(dst), Some(src)) => {
            dst.clone_from(src);
            true
        }
        _ => false,
    }
}

impl ValueOps {
    pub fn of<T: Any + Default + Clone + PartialEq>() -> ValueOps {
        ValueOps {
            is_default: is_default_value::<T>,
            equals: equal_values::<T>,
            assign: assign_value::<T>,
        }
    }

    #[inline]
    pub fn is_default(&self, object: &dyn Any) -> bool {
        (self.is_default)(object)
    }

    #[inline]
    pub fn equals(&self, a: &dyn Any, b: &dyn Any) -> bool {
        (self.equals)(a, b)
    }

    pub fn assign(&self, type_info: &TypeInfo, dst: &mut dyn Any, src: &dyn Any) -> Result<(), Error> {
        if (self.assign)(dst, src) {
            Ok(())
        } else {
            Err(mismatch(type_info))
        }
    }
}

pub type WritePrimitiveFn = fn(&mut ObjectOStream, &dyn Any) -> Result<(), Error>;
pub type ReadPrimitiveFn = fn(&mut ObjectIStream, &mut dyn Any) -> Result<(), Error>;
pub type SkipPrimitiveFn = fn(&mut ObjectIStream) -> Result<(), Error>;

/// Leaf type encoded directly by the format backends.
pub struct PrimitiveInfo {
    kind: PrimitiveKind,
    ops: ValueOps,
    write: WritePrimitiveFn,
    read: ReadPrimitiveFn,
    skip: SkipPrimitiveFn,
}

impl PrimitiveInfo {
    pub fn new(
        kind: PrimitiveKind,
        ops: ValueOps,
        write: WritePrimitiveFn,
        read: ReadPrimitiveFn,
        skip: SkipPrimitiveFn,
    ) -> Self {
        PrimitiveInfo {
            kind,
            ops,
            write,
            read,
            skip,
        }
    }

    #[inline]
    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    #[inline]
    pub fn ops(&self) -> &ValueOps {
        &self.ops
    }

    #[inline]
    pub fn write(&self, out: &mut ObjectOStream, object: &dyn Any) -> Result<(), Error> {
        (self.write)(out, object)
    }

    #[inline]
    pub fn read(&self, input: &mut ObjectIStream, object: &mut dyn Any) -> Result<(), Error> {
        (self.read)(input, object)
    }

    #[inline]
    pub fn skip(&self, input: &mut ObjectIStream) -> Result<(), Error> {
        (self.skip)(input)
    }
}
