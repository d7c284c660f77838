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
use crate::meta::{registry, CustomType, SerialType, TypeInfo, TypeKind};
use crate::stream::{ObjectIStream, ObjectOStream};
use crate::types::DataFormat;
use std::any::Any;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::marker::PhantomData;

enum State<T> {
    Loaded(T),
    Captured {
        format: DataFormat,
        bytes: Vec<u8>,
        /// Index of the first object registered inside the value.
        first_index: u32,
        /// Whether the value registers or references objects.
        linked: bool,
    },
}

/// A value parsed on first access.
///
/// When read from a stream that can capture raw input, the encoded value
/// is skipped and kept; it is parsed the first time it is accessed. Written
/// back unaccessed to a stream of the same format, the captured bytes are
/// copied as they are.
///
/// A captured value that referenced objects outside of itself cannot be
/// loaded, since those objects are not available anymore.
pub struct Delayed<T> {
    state: RefCell<State<T>>,
}

impl<T: SerialType> Delayed<T> {
    pub fn new(value: T) -> Self {
        Delayed {
            state: RefCell::new(State::Loaded(value)),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(&*self.state.borrow(), State::Loaded(_))
    }

    /// Parses the captured value, if not done yet.
    pub fn load(&self) -> Result<(), Error> {
        let pending = match &*self.state.borrow() {
            State::Captured {
                format,
                bytes,
                first_index,
                ..
            } => Some((*format, bytes.clone(), *first_index)),
            State::Loaded(_) => None,
        };
        if let Some((format, bytes, first_index)) = pending {
            log::debug!("loading delayed {} ({} bytes)", T::type_info().name(), bytes.len());
            let mut input = ObjectIStream::from_bytes(format, bytes);
            input.skip_object_indices(first_index);
            let mut value = T::default();
            input.read_object(&mut value, T::type_info())?;
            *self.state.borrow_mut() = State::Loaded(value);
        }
        Ok(())
    }

    pub fn get(&self) -> Result<Ref<'_, T>, Error> {
        self.load()?;
        Ref::filter_map(self.state.borrow(), |state| match state {
            State::Loaded(value) => Some(value),
            State::Captured { .. } => None,
        })
        .map_err(|_| Error::invalid_data("delayed value not loaded"))
    }

    pub fn get_mut(&mut self) -> Result<&mut T, Error> {
        self.load()?;
        match self.state.get_mut() {
            State::Loaded(value) => Ok(value),
            State::Captured { .. } => Err(Error::invalid_data("delayed value not loaded")),
        }
    }

    pub fn set(&mut self, value: T) {
        *self.state.get_mut() = State::Loaded(value);
    }

    pub fn into_inner(self) -> Result<T, Error> {
        self.load()?;
        match self.state.into_inner() {
            State::Loaded(value) => Ok(value),
            State::Captured { .. } => Err(Error::invalid_data("delayed value not loaded")),
        }
    }
}

impl<T: SerialType> Default for Delayed<T> {
    fn default() -> Self {
        Delayed::new(T::default())
    }
}

impl<T: SerialType> From<T> for Delayed<T> {
    fn from(value: T) -> Self {
        Delayed::new(value)
    }
}

impl<T: SerialType + fmt::Debug> fmt::Debug for Delayed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.state.borrow() {
            State::Loaded(value) => f.debug_tuple("Delayed").field(value).finish(),
            State::Captured { format, bytes, .. } => {
                write!(f, "Delayed(<{} bytes of {format}>)", bytes.len())
            }
        }
    }
}

struct DelayedType<T>(PhantomData<fn() -> T>);

fn cast<T: SerialType>(object: &dyn Any) -> Result<&Delayed<T>, Error> {
    object
        .downcast_ref::<Delayed<T>>()
        .ok_or_else(|| Error::type_mismatch(Delayed::<T>::type_info().name(), "another type"))
}

fn cast_mut<T: SerialType>(object: &mut dyn Any) -> Result<&mut Delayed<T>, Error> {
    object
        .downcast_mut::<Delayed<T>>()
        .ok_or_else(|| Error::type_mismatch(Delayed::<T>::type_info().name(), "another type"))
}

impl<T: SerialType> CustomType for DelayedType<T> {
    fn is_default(&self, object: &dyn Any) -> bool {
        cast::<T>(object)
            .and_then(Delayed::get)
            .map_or(false, |value| T::type_info().is_default(&*value))
    }

    fn equals(&self, a: &dyn Any, b: &dyn Any) -> bool {
        let (Ok(a), Ok(b)) = (cast::<T>(a).and_then(Delayed::get), cast::<T>(b).and_then(Delayed::get))
        else {
            return false;
        };
        T::type_info().equals(&*a, &*b)
    }

    fn set_default(&self, object: &mut dyn Any) {
        if let Ok(delayed) = cast_mut::<T>(object) {
            delayed.set(T::default());
        }
    }

    fn assign(&self, dst: &mut dyn Any, src: &dyn Any) -> Result<(), Error> {
        let mut copy = T::default();
        T::type_info().assign(&mut copy, &*cast::<T>(src)?.get()?)?;
        cast_mut::<T>(dst)?.set(copy);
        Ok(())
    }

    fn write_data(
        &self,
        _type_info: &'static TypeInfo,
        out: &mut ObjectOStream,
        object: &dyn Any,
    ) -> Result<(), Error> {
        let delayed = cast::<T>(object)?;
        if let State::Captured {
            format,
            bytes,
            linked: false,
            ..
        } = &*delayed.state.borrow()
        {
            if *format == out.data_format() {
                return out.write_raw_value(*format, bytes);
            }
        }
        let value = delayed.get()?;
        out.write_object(&*value, T::type_info())
    }

    fn read_data(
        &self,
        _type_info: &'static TypeInfo,
        input: &mut ObjectIStream,
        object: &mut dyn Any,
    ) -> Result<(), Error> {
        let delayed = cast_mut::<T>(object)?;
        let Some(start) = input.capture_start()? else {
            let mut value = T::default();
            input.read_object(&mut value, T::type_info())?;
            delayed.set(value);
            return Ok(());
        };
        let first_index = input.next_object_index();
        let references = input.reference_count();
        input.skip_object(T::type_info())?;
        let bytes = input.captured(start)?;
        let linked =
            input.next_object_index() != first_index || input.reference_count() != references;
        *delayed.state.get_mut() = State::Captured {
            format: input.data_format(),
            bytes,
            first_index,
            linked,
        };
        Ok(())
    }

    fn skip_data(&self, _type_info: &'static TypeInfo, input: &mut ObjectIStream) -> Result<(), Error> {
        input.skip_object(T::type_info())
    }
}

impl<T: SerialType> SerialType for Delayed<T> {
    fn type_info() -> &'static TypeInfo {
        registry().get_or_register::<Self>(|| {
            TypeInfo::new::<Self>(
                format!("Delayed<{}>", T::type_info().name()),
                TypeKind::Custom(Box::new(DelayedType::<T>(PhantomData))),
            )
        })
    }
}
