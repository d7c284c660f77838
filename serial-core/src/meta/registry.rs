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
use crate::meta::{xml_name, SerialType, TypeInfo};
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Key of a descriptor built at runtime: the address of the descriptor it
/// is derived from plus a tag naming the derivation.
pub type DynamicKey = (usize, &'static str);

#[derive(Default)]
struct Maps {
    by_type: HashMap<TypeId, &'static TypeInfo>,
    by_name: HashMap<String, &'static TypeInfo>,
    dynamic: HashMap<DynamicKey, &'static TypeInfo>,
    /// Names claimed by more than one type; they resolve to nothing.
    ambiguous: HashSet<String>,
}

impl Maps {
    fn is_ambiguous(&self, name: &str) -> bool {
        self.ambiguous.contains(name) || self.ambiguous.iter().any(|n| xml_name(n) == name)
    }
}

/// Process-wide table of type descriptors.
///
/// Descriptors are built outside the lock, so a builder may itself look up
/// other types. When two threads race to build the same type the first
/// insert wins and the other build is dropped.
#[derive(Default)]
pub struct TypeRegistry {
    maps: RwLock<Maps>,
}

static REGISTRY: OnceLock<TypeRegistry> = OnceLock::new();

pub fn registry() -> &'static TypeRegistry {
    REGISTRY.get_or_init(TypeRegistry::default)
}

impl TypeRegistry {
    fn read(&self) -> RwLockReadGuard<'_, Maps> {
        self.maps.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Maps> {
        self.maps.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn index_name(maps: &mut Maps, info: &'static TypeInfo) {
        if maps.ambiguous.contains(info.name()) {
            return;
        }
        match maps.by_name.get(info.name()) {
            Some(existing) if !std::ptr::eq(*existing, info) => {
                log::warn!(
                    "type name {} is used by more than one type, it no longer resolves",
                    info.name()
                );
                maps.by_name.remove(info.name());
                maps.ambiguous.insert(info.name().to_string());
            }
            Some(_) => {}
            None => {
                maps.by_name.insert(info.name().to_string(), info);
            }
        }
    }

    /// Descriptor of the Rust type `T`, built by `build` on first request.
    pub fn get_or_register<T: Any>(&self, build: impl FnOnce() -> TypeInfo) -> &'static TypeInfo {
        let id = TypeId::of::<T>();
        if let Some(info) = self.find_by_type_id(id) {
            return info;
        }
        let built = build();
        let mut maps = self.write();
        if let Some(info) = maps.by_type.get(&id).copied() {
            return info;
        }
        let info: &'static TypeInfo = Box::leak(Box::new(built));
        maps.by_type.insert(id, info);
        Self::index_name(&mut maps, info);
        log::debug!("registered type {}", info.name());
        info
    }

    /// Descriptor built at runtime and cached under `key`.
    pub fn get_or_register_dynamic(
        &self,
        key: DynamicKey,
        build: impl FnOnce() -> Result<TypeInfo, Error>,
    ) -> Result<&'static TypeInfo, Error> {
        if let Some(info) = self.read().dynamic.get(&key).copied() {
            return Ok(info);
        }
        let built = build()?;
        let mut maps = self.write();
        if let Some(info) = maps.dynamic.get(&key).copied() {
            return Ok(info);
        }
        let info: &'static TypeInfo = Box::leak(Box::new(built));
        maps.dynamic.insert(key, info);
        Self::index_name(&mut maps, info);
        log::debug!("registered dynamic type {}", info.name());
        Ok(info)
    }

    /// Makes `T` resolvable by name before any value of it is written or
    /// read, so that `read_any` and "other" pointers can find it.
    ///
    /// Fails when another type already claims the same name.
    pub fn register_type<T: SerialType>(&self) -> Result<&'static TypeInfo, Error> {
        let info = T::type_info();
        let maps = self.read();
        match maps.by_name.get(info.name()) {
            Some(found) if std::ptr::eq(*found, info) => Ok(info),
            _ => Err(Error::incompatible_type(format!(
                "type name {} is used by more than one type",
                info.name()
            ))),
        }
    }

    /// Registers a descriptor by name only. The name must be free.
    pub fn register(&self, info: TypeInfo) -> Result<&'static TypeInfo, Error> {
        let mut maps = self.write();
        if maps.by_name.contains_key(info.name()) || maps.ambiguous.contains(info.name()) {
            return Err(Error::incompatible_type(format!(
                "type {} already registered",
                info.name()
            )));
        }
        let info: &'static TypeInfo = Box::leak(Box::new(info));
        maps.by_name.insert(info.name().to_string(), info);
        log::debug!("registered type {}", info.name());
        Ok(info)
    }

    /// Resolves a type name read from a stream.
    pub fn resolve_name(&self, name: &str) -> Result<&'static TypeInfo, Error> {
        if let Some(info) = self.find_by_name(name) {
            return Ok(info);
        }
        if self.read().is_ambiguous(name) {
            Err(Error::incompatible_type(format!(
                "type name {name} is used by more than one type"
            )))
        } else {
            Err(Error::incompatible_type(format!("unknown type {name}")))
        }
    }

    /// Looks a type up by its name, or by the XML form of its name.
    pub fn find_by_name(&self, name: &str) -> Option<&'static TypeInfo> {
        let maps = self.read();
        if let Some(info) = maps.by_name.get(name) {
            return Some(*info);
        }
        maps.by_name
            .values()
            .find(|info| xml_name(info.name()) == name)
            .copied()
    }

    pub fn find_by_type_id(&self, id: TypeId) -> Option<&'static TypeInfo> {
        self.read().by_type.get(&id).copied()
    }
}
