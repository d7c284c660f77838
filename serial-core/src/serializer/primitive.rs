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

//! Leaf types encoded directly by the format backends.

use crate::error::Error;
use crate::meta::{
    downcast_mut, downcast_ref, registry, PrimitiveInfo, PrimitiveKind, SerialType, TypeInfo,
    TypeKind, ValueOps,
};
use crate::stream::{ObjectIStream, ObjectOStream};
use std::any::Any;
use std::ops::{Deref, DerefMut};

/// Binary data, encoded as an OCTET STRING rather than a sequence of
/// integers like `Vec<u8>`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct OctetString(pub Vec<u8>);

impl From<Vec<u8>> for OctetString {
    fn from(bytes: Vec<u8>) -> Self {
        OctetString(bytes)
    }
}

impl Deref for OctetString {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.0
    }
}

impl DerefMut for OctetString {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.0
    }
}

trait Primitive: Any + Default + Clone + PartialEq + Sized {
    const NAME: &'static str;
    const KIND: PrimitiveKind;

    fn write(&self, out: &mut ObjectOStream) -> Result<(), Error>;

    fn read(input: &mut ObjectIStream) -> Result<Self, Error>;

    fn skip(input: &mut ObjectIStream) -> Result<(), Error>;
}

fn write_primitive<T: Primitive + SerialType>(
    out: &mut ObjectOStream,
    object: &dyn Any,
) -> Result<(), Error> {
    downcast_ref::<T>(object, T::type_info())?.write(out)
}

fn read_primitive<T: Primitive + SerialType>(
    input: &mut ObjectIStream,
    object: &mut dyn Any,
) -> Result<(), Error> {
    let value = T::read(input)?;
    *downcast_mut::<T>(object, T::type_info())? = value;
    Ok(())
}

fn primitive_type_info<T: Primitive + SerialType>() -> TypeInfo {
    TypeInfo::new::<T>(
        T::NAME,
        TypeKind::Primitive(PrimitiveInfo::new(
            T::KIND,
            ValueOps::of::<T>(),
            write_primitive::<T>,
            read_primitive::<T>,
            T::skip,
        )),
    )
}

macro_rules! impl_primitive {
    ($ty:ty, $name:expr, $kind:expr, $writer:ident, $reader:ident, $skipper:ident) => {
        impl Primitive for $ty {
            const NAME: &'static str = $name;
            const KIND: PrimitiveKind = $kind;

            #[inline(always)]
            fn write(&self, out: &mut ObjectOStream) -> Result<(), Error> {
                out.$writer(*self)
            }

            #[inline(always)]
            fn read(input: &mut ObjectIStream) -> Result<Self, Error> {
                input.$reader()
            }

            #[inline(always)]
            fn skip(input: &mut ObjectIStream) -> Result<(), Error> {
                input.$skipper()
            }
        }

        impl SerialType for $ty {
            fn type_info() -> &'static TypeInfo {
                registry().get_or_register::<$ty>(primitive_type_info::<$ty>)
            }
        }
    };
}

impl_primitive!(bool, "bool", PrimitiveKind::Bool, write_bool, read_bool, skip_bool);
impl_primitive!(char, "char", PrimitiveKind::Char, write_char, read_char, skip_string);
impl_primitive!(i8, "i8", PrimitiveKind::SignedInteger, write_i8, read_i8, skip_signed);
impl_primitive!(i16, "i16", PrimitiveKind::SignedInteger, write_i16, read_i16, skip_signed);
impl_primitive!(i32, "i32", PrimitiveKind::SignedInteger, write_i32, read_i32, skip_signed);
impl_primitive!(i64, "i64", PrimitiveKind::SignedInteger, write_i64, read_i64, skip_signed);
impl_primitive!(u8, "u8", PrimitiveKind::UnsignedInteger, write_u8, read_u8, skip_unsigned);
impl_primitive!(u16, "u16", PrimitiveKind::UnsignedInteger, write_u16, read_u16, skip_unsigned);
impl_primitive!(u32, "u32", PrimitiveKind::UnsignedInteger, write_u32, read_u32, skip_unsigned);
impl_primitive!(u64, "u64", PrimitiveKind::UnsignedInteger, write_u64, read_u64, skip_unsigned);
impl_primitive!(f32, "f32", PrimitiveKind::Real, write_f32, read_f32, skip_f64);
impl_primitive!(f64, "f64", PrimitiveKind::Real, write_f64, read_f64, skip_f64);

impl Primitive for () {
    const NAME: &'static str = "NULL";
    const KIND: PrimitiveKind = PrimitiveKind::Null;

    fn write(&self, out: &mut ObjectOStream) -> Result<(), Error> {
        out.write_null()
    }

    fn read(input: &mut ObjectIStream) -> Result<Self, Error> {
        input.read_null()
    }

    fn skip(input: &mut ObjectIStream) -> Result<(), Error> {
        input.skip_null()
    }
}

impl SerialType for () {
    fn type_info() -> &'static TypeInfo {
        registry().get_or_register::<()>(primitive_type_info::<()>)
    }
}

impl Primitive for String {
    const NAME: &'static str = "String";
    const KIND: PrimitiveKind = PrimitiveKind::String;

    fn write(&self, out: &mut ObjectOStream) -> Result<(), Error> {
        out.write_str(self)
    }

    fn read(input: &mut ObjectIStream) -> Result<Self, Error> {
        input.read_string()
    }

    fn skip(input: &mut ObjectIStream) -> Result<(), Error> {
        input.skip_string()
    }
}

impl SerialType for String {
    fn type_info() -> &'static TypeInfo {
        registry().get_or_register::<String>(primitive_type_info::<String>)
    }
}

impl Primitive for OctetString {
    const NAME: &'static str = "OctetString";
    const KIND: PrimitiveKind = PrimitiveKind::OctetString;

    fn write(&self, out: &mut ObjectOStream) -> Result<(), Error> {
        out.write_bytes(&self.0)
    }

    fn read(input: &mut ObjectIStream) -> Result<Self, Error> {
        input.read_bytes().map(OctetString)
    }

    fn skip(input: &mut ObjectIStream) -> Result<(), Error> {
        input.skip_bytes()
    }
}

impl SerialType for OctetString {
    fn type_info() -> &'static TypeInfo {
        registry().get_or_register::<OctetString>(primitive_type_info::<OctetString>)
    }
}
