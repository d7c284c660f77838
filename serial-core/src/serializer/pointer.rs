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

//! Smart pointers and `Option` as pointer types.
//!
//! | Rust type    | Pointer kind | On the wire                               |
//! |--------------|--------------|-------------------------------------------|
//! | `Option<T>`  | nullable     | null token, or `T`                        |
//! | `Box<T>`     | auto         | `T`                                       |
//! | `Rc<T>`      | shared       | null/reference token, or `T`, tracked     |
//! | `Arc<T>`     | shared       | same as `Rc<T>`                           |
//! | `RefCell<T>` | cell         | `T`; lets an `Rc<RefCell<T>>` form cycles |

use crate::error::Error;
use crate::meta::pointer::target_fn;
use crate::meta::{
    mismatch, registry, Pointee, PointerInfo, PointerKind, PointerTarget,
    SerialType, TypeInfo, TypeKind, TypeRef,
};
use crate::types::PointerToken;
use std::any::Any;
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::sync::Arc;

fn cast<P: SerialType>(object: &dyn Any) -> Result<&P, Error> {
    object.downcast_ref::<P>().ok_or_else(|| mismatch(P::type_info()))
}

fn cast_mut<P: SerialType>(object: &mut dyn Any) -> Result<&mut P, Error> {
    object.downcast_mut::<P>().ok_or_else(|| mismatch(P::type_info()))
}

/// Deep copy of a `T` through its descriptor.
fn deep_copy<T: SerialType>(src: &T) -> Result<T, Error> {
    let mut copy = T::default();
    T::type_info().assign(&mut copy, src)?;
    Ok(copy)
}

fn plain_target<T: SerialType>(value: &T, identity: Option<usize>) -> PointerTarget<'_> {
    PointerTarget {
        object: Pointee::Plain(value),
        type_info: T::type_info(),
        identity,
    }
}

fn option_type_info<T: SerialType>() -> TypeInfo {
    let info = PointerInfo::new(
        PointerKind::Nullable,
        Some(TypeRef::of::<T>()),
        Box::new(target_fn(|object| {
            let value = cast::<Option<T>>(object)?;
            Ok(value.as_ref().map(|v| plain_target(v, None)))
        })),
        Box::new(|input, token, object| {
            let slot = cast_mut::<Option<T>>(object)?;
            if matches!(token, PointerToken::Null) {
                *slot = None;
                return Ok(());
            }
            let value = slot.insert(T::default());
            input.read_pointee(T::type_info(), token, value)
        }),
        Box::new(|dst, src| {
            let src = cast::<Option<T>>(src)?;
            let copy = src.as_ref().map(deep_copy).transpose()?;
            *cast_mut::<Option<T>>(dst)? = copy;
            Ok(())
        }),
    );
    TypeInfo::new::<Option<T>>(
        format!("Option<{}>", T::type_info().name()),
        TypeKind::Pointer(info),
    )
}

fn box_type_info<T: SerialType>() -> TypeInfo {
    let info = PointerInfo::new(
        PointerKind::Auto,
        Some(TypeRef::of::<T>()),
        Box::new(target_fn(|object| {
            let value = cast::<Box<T>>(object)?;
            Ok(Some(plain_target(&**value, None)))
        })),
        Box::new(|input, _token, object| {
            let value = cast_mut::<Box<T>>(object)?;
            input.read_object(&mut **value, T::type_info())
        }),
        Box::new(|dst, src| {
            let src = cast::<Box<T>>(src)?;
            let copy = deep_copy(&**src)?;
            **cast_mut::<Box<T>>(dst)? = copy;
            Ok(())
        }),
    );
    TypeInfo::new::<Box<T>>(format!("Box<{}>", T::type_info().name()), TypeKind::Pointer(info))
}

fn rc_type_info<T: SerialType>() -> TypeInfo {
    let info = PointerInfo::new(
        PointerKind::Shared,
        Some(TypeRef::of::<T>()),
        Box::new(target_fn(|object| {
            let rc = cast::<Rc<T>>(object)?;
            let identity = Rc::as_ptr(rc) as *const () as usize;
            Ok(Some(plain_target(&**rc, Some(identity))))
        })),
        Box::new(|input, token, object| {
            let slot = cast_mut::<Rc<T>>(object)?;
            *slot = match token {
                PointerToken::Null => {
                    return Err(Error::invalid_data(format!(
                        "null where a {} is required",
                        Rc::<T>::type_info().name()
                    )))
                }
                PointerToken::Reference(index) => input.registered_rc::<T>(index)?,
                PointerToken::Other(actual) if actual != T::type_info() => {
                    return Err(Error::type_mismatch(T::type_info().name(), actual.name()))
                }
                PointerToken::This | PointerToken::Other(_) => input.read_shared_rc::<T>()?,
            };
            Ok(())
        }),
        Box::new(|dst, src| {
            let src = cast::<Rc<T>>(src)?;
            let copy = deep_copy(&**src)?;
            *cast_mut::<Rc<T>>(dst)? = Rc::new(copy);
            Ok(())
        }),
    );
    TypeInfo::new::<Rc<T>>(format!("Rc<{}>", T::type_info().name()), TypeKind::Pointer(info))
}

fn arc_type_info<T: SerialType + Send + Sync>() -> TypeInfo {
    let info = PointerInfo::new(
        PointerKind::Shared,
        Some(TypeRef::of::<T>()),
        Box::new(target_fn(|object| {
            let arc = cast::<Arc<T>>(object)?;
            let identity = Arc::as_ptr(arc) as *const () as usize;
            Ok(Some(plain_target(&**arc, Some(identity))))
        })),
        Box::new(|input, token, object| {
            let slot = cast_mut::<Arc<T>>(object)?;
            *slot = match token {
                PointerToken::Null => {
                    return Err(Error::invalid_data(format!(
                        "null where a {} is required",
                        Arc::<T>::type_info().name()
                    )))
                }
                PointerToken::Reference(index) => input.registered_arc::<T>(index)?,
                PointerToken::Other(actual) if actual != T::type_info() => {
                    return Err(Error::type_mismatch(T::type_info().name(), actual.name()))
                }
                PointerToken::This | PointerToken::Other(_) => input.read_shared_arc::<T>()?,
            };
            Ok(())
        }),
        Box::new(|dst, src| {
            let src = cast::<Arc<T>>(src)?;
            let copy = deep_copy(&**src)?;
            *cast_mut::<Arc<T>>(dst)? = Arc::new(copy);
            Ok(())
        }),
    );
    TypeInfo::new::<Arc<T>>(format!("Arc<{}>", T::type_info().name()), TypeKind::Pointer(info))
}

fn refcell_type_info<T: SerialType>() -> TypeInfo {
    let info = PointerInfo::new(
        PointerKind::Cell,
        Some(TypeRef::of::<T>()),
        Box::new(target_fn(|object| {
            let cell = cast::<RefCell<T>>(object)?;
            let value = cell.try_borrow().map_err(|_| {
                Error::not_allowed(format!("{} is mutably borrowed", RefCell::<T>::type_info().name()))
            })?;
            Ok(Some(PointerTarget {
                object: Pointee::Borrowed(Ref::map(value, |v| v as &dyn Any)),
                type_info: T::type_info(),
                identity: None,
            }))
        })),
        Box::new(|input, _token, object| {
            let cell = cast_mut::<RefCell<T>>(object)?;
            input.read_object(cell.get_mut(), T::type_info())
        }),
        Box::new(|dst, src| {
            let src = cast::<RefCell<T>>(src)?;
            let copy = {
                let value = src.try_borrow().map_err(|_| {
                    Error::not_allowed(format!("{} is mutably borrowed", RefCell::<T>::type_info().name()))
                })?;
                deep_copy(&*value)?
            };
            *cast_mut::<RefCell<T>>(dst)?.get_mut() = copy;
            Ok(())
        }),
    )
    .with_read_in_place(Box::new(|input, object| {
        let cell = cast::<RefCell<T>>(object)?;
        let mut value = cell.try_borrow_mut().map_err(|_| {
            Error::not_allowed(format!("{} is already borrowed", RefCell::<T>::type_info().name()))
        })?;
        input.read_object(&mut *value, T::type_info())
    }));
    TypeInfo::new::<RefCell<T>>(
        format!("RefCell<{}>", T::type_info().name()),
        TypeKind::Pointer(info),
    )
}

impl<T: SerialType> SerialType for Option<T> {
    fn type_info() -> &'static TypeInfo {
        registry().get_or_register::<Self>(option_type_info::<T>)
    }
}

impl<T: SerialType> SerialType for Box<T> {
    fn type_info() -> &'static TypeInfo {
        registry().get_or_register::<Self>(box_type_info::<T>)
    }
}

impl<T: SerialType> SerialType for Rc<T> {
    fn type_info() -> &'static TypeInfo {
        registry().get_or_register::<Self>(rc_type_info::<T>)
    }
}

impl<T: SerialType + Send + Sync> SerialType for Arc<T> {
    fn type_info() -> &'static TypeInfo {
        registry().get_or_register::<Self>(arc_type_info::<T>)
    }
}

impl<T: SerialType> SerialType for RefCell<T> {
    fn type_info() -> &'static TypeInfo {
        registry().get_or_register::<Self>(refcell_type_info::<T>)
    }
}
