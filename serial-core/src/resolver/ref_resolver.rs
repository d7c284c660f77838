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
use crate::meta::TypeInfo;
use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

/// Result of registering an object with a [`WriteObjectList`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    /// First encounter; the object must be written in full.
    New(u32),
    /// Seen before; a back-reference to this index must be written.
    Existing(u32),
}

/// Identity table of an output stream.
///
/// Maps the address of every shared object written in the current session
/// to a small index assigned in first-encounter order.
///
/// # Examples
///
/// ```rust
/// use serial_core::resolver::ref_resolver::{Registration, WriteObjectList};
/// use std::rc::Rc;
///
/// let mut objects = WriteObjectList::new();
/// let rc = Rc::new(42);
/// let identity = Rc::as_ptr(&rc) as usize;
///
/// assert_eq!(objects.register(identity), Registration::New(0));
/// assert_eq!(objects.register(identity), Registration::Existing(0));
/// ```
#[derive(Default)]
pub struct WriteObjectList {
    indices: HashMap<usize, u32>,
    /// Identity of every index, `None` once forgotten.
    objects: Vec<Option<usize>>,
}

impl WriteObjectList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `identity`, or returns the index it already has.
    pub fn register(&mut self, identity: usize) -> Registration {
        if let Some(&index) = self.indices.get(&identity) {
            log::trace!("object {identity:#x} already written as @{index}");
            return Registration::Existing(index);
        }
        let index = self.next_index();
        self.indices.insert(identity, index);
        self.objects.push(Some(identity));
        log::trace!("object {identity:#x} registered as @{index}");
        Registration::New(index)
    }

    /// Index the next registered object will get.
    pub fn next_index(&self) -> u32 {
        self.objects.len() as u32
    }

    /// Forgets objects registered at or after `first`. Their indices stay
    /// allocated, so later objects never reuse them.
    pub fn forget_from(&mut self, first: u32) {
        for slot in self.objects.iter_mut().skip(first as usize) {
            if let Some(identity) = slot.take() {
                self.indices.remove(&identity);
            }
        }
    }

    pub fn clear(&mut self) {
        self.indices.clear();
        self.objects.clear();
    }
}

/// An object registered on input, shared with the reconstructed graph.
#[derive(Clone)]
pub enum SharedObject {
    Rc(Rc<dyn Any>),
    Arc(Arc<dyn Any + Send + Sync>),
}

enum Entry {
    /// Index reserved, object still being read.
    Pending,
    Ready(&'static TypeInfo, SharedObject),
    Skipped,
    External,
    Forgotten,
}

/// Identity table of an input stream: index to reconstructed object.
///
/// An index is reserved before the object's contents are read so that
/// indices are assigned in the same order as on output.
///
/// # Examples
///
/// ```rust
/// use serial_core::meta::SerialType;
/// use serial_core::resolver::ref_resolver::{ReadObjectList, SharedObject};
/// use std::rc::Rc;
///
/// let mut objects = ReadObjectList::new();
/// let index = objects.reserve();
/// let rc = Rc::new(42i32);
/// objects.fill(index, i32::type_info(), SharedObject::Rc(rc.clone()));
///
/// let found = objects.get_rc::<i32>(index).unwrap();
/// assert!(Rc::ptr_eq(&rc, &found));
/// ```
#[derive(Default)]
pub struct ReadObjectList {
    entries: Vec<Entry>,
}

impl ReadObjectList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_index(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn reserve(&mut self) -> u32 {
        let index = self.next_index();
        self.entries.push(Entry::Pending);
        index
    }

    pub fn fill(&mut self, index: u32, type_info: &'static TypeInfo, object: SharedObject) {
        if let Some(entry) = self.entries.get_mut(index as usize) {
            log::trace!("object @{index} of type {} read", type_info.name());
            *entry = Entry::Ready(type_info, object);
        }
    }

    /// Registers an object that was skipped rather than read.
    pub fn register_skipped(&mut self) -> u32 {
        let index = self.next_index();
        self.entries.push(Entry::Skipped);
        index
    }

    /// Registers an object owned by the caller rather than by the stream.
    pub fn register_external(&mut self) -> u32 {
        let index = self.next_index();
        self.entries.push(Entry::External);
        index
    }

    /// Checks that `index` was assigned, whatever its state. Used when
    /// skipping, where references to skipped objects are legal.
    pub fn check_index(&self, index: u32) -> Result<(), Error> {
        if (index as usize) < self.entries.len() {
            Ok(())
        } else {
            Err(Error::invalid_ref(format!("invalid object index @{index}")))
        }
    }

    pub fn get(&self, index: u32) -> Result<(&'static TypeInfo, &SharedObject), Error> {
        match self.entries.get(index as usize) {
            Some(Entry::Ready(type_info, object)) => Ok((*type_info, object)),
            Some(Entry::Pending) => Err(Error::invalid_ref(format!(
                "reference to object @{index} which is still being read"
            ))),
            Some(Entry::Skipped) => Err(Error::invalid_ref(format!(
                "invalid reference to skipped object @{index}"
            ))),
            Some(Entry::External) => Err(Error::invalid_ref(format!(
                "reference to external object @{index}"
            ))),
            Some(Entry::Forgotten) => Err(Error::invalid_ref(format!(
                "reference to forgotten object @{index}"
            ))),
            None => Err(Error::invalid_ref(format!("invalid object index @{index}"))),
        }
    }

    pub fn get_rc_any(&self, index: u32) -> Result<(&'static TypeInfo, Rc<dyn Any>), Error> {
        match self.get(index)? {
            (type_info, SharedObject::Rc(rc)) => Ok((type_info, rc.clone())),
            (type_info, SharedObject::Arc(_)) => Err(Error::type_mismatch(
                "Rc",
                format!("Arc<{}> at @{index}", type_info.name()),
            )),
        }
    }

    pub fn get_rc<T: 'static>(&self, index: u32) -> Result<Rc<T>, Error> {
        let (type_info, rc) = self.get_rc_any(index)?;
        rc.downcast::<T>().map_err(|_| {
            Error::type_mismatch(
                std::any::type_name::<T>(),
                format!("{} at @{index}", type_info.name()),
            )
        })
    }

    pub fn get_arc<T: Send + Sync + 'static>(&self, index: u32) -> Result<Arc<T>, Error> {
        match self.get(index)? {
            (type_info, SharedObject::Arc(arc)) => arc.clone().downcast::<T>().map_err(|_| {
                Error::type_mismatch(
                    std::any::type_name::<T>(),
                    format!("{} at @{index}", type_info.name()),
                )
            }),
            (type_info, SharedObject::Rc(_)) => Err(Error::type_mismatch(
                "Arc",
                format!("Rc<{}> at @{index}", type_info.name()),
            )),
        }
    }

    /// Forgets objects registered at or after `first`.
    pub fn forget_from(&mut self, first: u32) {
        for entry in self.entries.iter_mut().skip(first as usize) {
            *entry = Entry::Forgotten;
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
