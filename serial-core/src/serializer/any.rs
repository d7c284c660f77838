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
use crate::meta::pointer::target_fn;
use crate::meta::{
    registry, Pointee, PointerInfo, PointerKind, PointerTarget, SerialType, TypeInfo, TypeKind,
};
use crate::types::PointerToken;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Shared pointer to an object of any registered type.
///
/// The concrete type is written as a type name in front of the object and
/// resolved through the registry on input.
///
/// ```
/// use serial_core::serializer::AnyObject;
///
/// let object = AnyObject::new(7i32);
/// assert_eq!(object.downcast_ref::<i32>(), Some(&7));
/// assert_eq!(object.type_info().unwrap().name(), "i32");
/// ```
#[derive(Clone, Default)]
pub struct AnyObject(pub Option<Rc<dyn Any>>);

impl AnyObject {
    pub fn new<T: SerialType>(value: T) -> Self {
        // registers T so that its name can be resolved when read back
        T::type_info();
        AnyObject(Some(Rc::new(value)))
    }

    pub fn from_rc(rc: Rc<dyn Any>) -> Self {
        AnyObject(Some(rc))
    }

    pub fn null() -> Self {
        AnyObject(None)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|object| object.downcast_ref::<T>())
    }

    pub fn as_rc(&self) -> Option<&Rc<dyn Any>> {
        self.0.as_ref()
    }

    /// Descriptor of the object's concrete type.
    pub fn type_info(&self) -> Option<&'static TypeInfo> {
        self.0
            .as_deref()
            .and_then(|object| registry().find_by_type_id(object.type_id()))
    }

    /// Whether both handles designate the same object.
    pub fn ptr_eq(&self, other: &AnyObject) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for AnyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.type_info() {
            Some(info) => write!(f, "AnyObject({})", info.name()),
            None if self.is_null() => f.write_str("AnyObject(null)"),
            None => f.write_str("AnyObject(?)"),
        }
    }
}

fn concrete_type(object: &dyn Any) -> Result<&'static TypeInfo, Error> {
    registry()
        .find_by_type_id(object.type_id())
        .ok_or_else(|| Error::unsupported("object of an unregistered type"))
}

fn cast(object: &dyn Any) -> Result<&AnyObject, Error> {
    object
        .downcast_ref::<AnyObject>()
        .ok_or_else(|| Error::type_mismatch("AnyObject", "another type"))
}

fn cast_mut(object: &mut dyn Any) -> Result<&mut AnyObject, Error> {
    object
        .downcast_mut::<AnyObject>()
        .ok_or_else(|| Error::type_mismatch("AnyObject", "another type"))
}

fn any_object_type_info() -> TypeInfo {
    let info = PointerInfo::new(
        PointerKind::Polymorphic,
        None,
        Box::new(target_fn(|object| {
            let Some(rc) = cast(object)?.0.as_ref() else {
                return Ok(None);
            };
            Ok(Some(PointerTarget {
                object: Pointee::Plain(&**rc),
                type_info: concrete_type(&**rc)?,
                identity: Some(Rc::as_ptr(rc) as *const () as usize),
            }))
        })),
        Box::new(|input, token, object| {
            let slot = cast_mut(object)?;
            slot.0 = match token {
                PointerToken::Null => None,
                PointerToken::Reference(index) => Some(input.registered_any(index)?.1),
                PointerToken::This => {
                    return Err(Error::invalid_data("type name expected before AnyObject"))
                }
                PointerToken::Other(actual) => Some(input.read_shared_any(actual)?),
            };
            Ok(())
        }),
        Box::new(|dst, src| {
            let copy = match cast(src)?.0.as_deref() {
                None => None,
                Some(object) => {
                    let type_info = concrete_type(object)?;
                    let mut copy = type_info.create();
                    type_info.assign(&mut *copy, object)?;
                    Some(Rc::<dyn Any>::from(copy))
                }
            };
            cast_mut(dst)?.0 = copy;
            Ok(())
        }),
    );
    TypeInfo::new::<AnyObject>("AnyObject", TypeKind::Pointer(info))
}

impl SerialType for AnyObject {
    fn type_info() -> &'static TypeInfo {
        registry().get_or_register::<AnyObject>(any_object_type_info)
    }
}
