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
use crate::meta::{mismatch, registry, CustomType, TypeInfo, TypeKind};
use crate::stream::{ObjectIStream, ObjectOStream};
use std::any::Any;

const CHUNK: usize = 1024;

/// Seekable in-memory byte store of the older toolkit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ByteStore {
    data: Vec<u8>,
    pos: usize,
}

impl ByteStore {
    pub fn new() -> Self {
        ByteStore::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Moves the cursor, clamped to the end of the store.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Reads at the cursor and advances it.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = self.read_at(self.pos, buf);
        self.pos += n;
        n
    }

    /// Reads at `pos` without moving the cursor.
    pub fn read_at(&self, pos: usize, buf: &mut [u8]) -> usize {
        let available = self.data.get(pos..).unwrap_or_default();
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        n
    }

    /// Writes at the cursor, overwriting and then extending the store.
    pub fn write(&mut self, bytes: &[u8]) {
        let overlap = (self.data.len() - self.pos).min(bytes.len());
        self.data[self.pos..self.pos + overlap].copy_from_slice(&bytes[..overlap]);
        self.data.extend_from_slice(&bytes[overlap..]);
        self.pos += bytes.len();
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for ByteStore {
    fn from(data: Vec<u8>) -> Self {
        ByteStore { data, pos: 0 }
    }
}

impl From<&[u8]> for ByteStore {
    fn from(data: &[u8]) -> Self {
        ByteStore::from(data.to_vec())
    }
}

type Handle = Option<Box<ByteStore>>;

fn same_contents(a: &ByteStore, b: &ByteStore) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let (mut x, mut y) = ([0u8; CHUNK], [0u8; CHUNK]);
    let mut pos = 0;
    while pos < a.len() {
        let n = a.read_at(pos, &mut x);
        if b.read_at(pos, &mut y) != n || x[..n] != y[..n] {
            return false;
        }
        pos += n;
    }
    true
}

struct OctetStringType;

impl CustomType for OctetStringType {
    fn is_default(&self, object: &dyn Any) -> bool {
        match object.downcast_ref::<Handle>() {
            Some(Some(store)) => store.is_empty(),
            Some(None) => true,
            None => false,
        }
    }

    fn equals(&self, a: &dyn Any, b: &dyn Any) -> bool {
        match (a.downcast_ref::<Handle>(), b.downcast_ref::<Handle>()) {
            (Some(None), Some(None)) => true,
            (Some(Some(x)), Some(Some(y))) => same_contents(x, y),
            _ => false,
        }
    }

    fn set_default(&self, object: &mut dyn Any) {
        if let Some(handle) = object.downcast_mut::<Handle>() {
            *handle = None;
        }
    }

    fn assign(&self, dst: &mut dyn Any, src: &dyn Any) -> Result<(), Error> {
        let src = src
            .downcast_ref::<Handle>()
            .ok_or_else(|| mismatch(OctetStringTypeInfo::get()))?;
        let dst = dst
            .downcast_mut::<Handle>()
            .ok_or_else(|| mismatch(OctetStringTypeInfo::get()))?;
        let store = src
            .as_deref()
            .ok_or_else(|| Error::invalid_data("null bytestore pointer"))?;
        let mut copy = store.clone();
        copy.seek(0);
        *dst = Some(Box::new(copy));
        Ok(())
    }

    fn write_data(
        &self,
        type_info: &'static TypeInfo,
        out: &mut ObjectOStream,
        object: &dyn Any,
    ) -> Result<(), Error> {
        let store = object
            .downcast_ref::<Handle>()
            .ok_or_else(|| mismatch(type_info))?
            .as_deref()
            .ok_or_else(|| Error::write_fault("null bytestore pointer"))?;
        out.begin_bytes(store.len())?;
        let mut chunk = [0u8; CHUNK];
        let mut pos = 0;
        while pos < store.len() {
            let n = store.read_at(pos, &mut chunk);
            out.write_bytes_chunk(&chunk[..n])?;
            pos += n;
        }
        out.end_bytes()
    }

    fn read_data(
        &self,
        type_info: &'static TypeInfo,
        input: &mut ObjectIStream,
        object: &mut dyn Any,
    ) -> Result<(), Error> {
        let handle = object
            .downcast_mut::<Handle>()
            .ok_or_else(|| mismatch(type_info))?;
        *handle = None;
        let expected = input.begin_bytes()?;
        let mut store = ByteStore::new();
        let mut chunk = [0u8; CHUNK];
        loop {
            let n = input.read_bytes_chunk(&mut chunk)?;
            if n == 0 {
                break;
            }
            store.write(&chunk[..n]);
        }
        input.end_bytes()?;
        if let Some(expected) = expected {
            if expected != store.len() {
                return Err(Error::read_fault(format!(
                    "byte block of {expected} bytes ended after {}",
                    store.len()
                )));
            }
        }
        store.seek(0);
        *handle = Some(Box::new(store));
        Ok(())
    }

    fn skip_data(&self, _type_info: &'static TypeInfo, input: &mut ObjectIStream) -> Result<(), Error> {
        input.skip_bytes()
    }
}

/// Descriptor of OCTET STRING values held as `Option<Box<ByteStore>>`.
///
/// A null handle is the default value. Writing one fails; assigning from
/// one fails as well.
pub struct OctetStringTypeInfo;

impl OctetStringTypeInfo {
    pub fn get() -> &'static TypeInfo {
        registry().get_or_register::<Handle>(|| {
            TypeInfo::new::<Handle>("OCTET STRING", TypeKind::Custom(Box::new(OctetStringType)))
        })
    }
}
