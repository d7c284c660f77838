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
use crate::meta::class::Accessor;
use crate::meta::{mismatch, LazyType, SerialType, TypeInfo, TypeKind, TypeRef};
use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;

pub type GetIndexFn = Box<dyn Fn(&dyn Any) -> Result<Option<usize>, Error> + Send + Sync>;
pub type SetIndexFn = Box<dyn Fn(&mut dyn Any, &VariantInfo) -> Result<(), Error> + Send + Sync>;

/// One alternative of a choice. A variant without a type carries no data
/// and is encoded as NULL.
pub struct VariantInfo {
    name: String,
    index: usize,
    variant_type: Option<LazyType>,
    accessor: Option<Accessor>,
}

impl VariantInfo {
    pub fn new(name: impl Into<String>, variant_type: TypeRef, accessor: Accessor) -> Self {
        VariantInfo {
            name: name.into(),
            index: 0,
            variant_type: Some(LazyType::new(variant_type)),
            accessor: Some(accessor),
        }
    }

    pub fn null(name: impl Into<String>) -> Self {
        VariantInfo {
            name: name.into(),
            index: 0,
            variant_type: None,
            accessor: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn type_info(&self) -> Option<&'static TypeInfo> {
        self.variant_type.as_ref().map(LazyType::get)
    }

    pub fn is_null(&self) -> bool {
        self.variant_type.is_none()
    }

    /// Payload of this variant, `None` if another variant is selected.
    pub fn get<'a>(&self, choice_object: &'a dyn Any) -> Option<&'a dyn Any> {
        self.accessor.as_ref()?.get(choice_object)
    }

    pub fn get_mut<'a>(&self, choice_object: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        self.accessor.as_ref()?.get_mut(choice_object)
    }
}

/// Tagged union: exactly one variant is selected at a time, or none when
/// the object is unset.
pub struct ChoiceInfo {
    variants: Vec<VariantInfo>,
    by_name: HashMap<String, usize>,
    get_index: GetIndexFn,
    set_index: SetIndexFn,
}

impl ChoiceInfo {
    pub fn new(mut variants: Vec<VariantInfo>, get_index: GetIndexFn, set_index: SetIndexFn) -> Self {
        let mut by_name = HashMap::with_capacity(variants.len());
        for (index, variant) in variants.iter_mut().enumerate() {
            variant.index = index;
            by_name.insert(variant.name.clone(), index);
        }
        ChoiceInfo {
            variants,
            by_name,
            get_index,
            set_index,
        }
    }

    #[inline]
    pub fn variants(&self) -> &[VariantInfo] {
        &self.variants
    }

    #[inline]
    pub fn variant(&self, index: usize) -> Option<&VariantInfo> {
        self.variants.get(index)
    }

    pub fn find_variant(&self, name: &str) -> Option<&VariantInfo> {
        self.by_name.get(name).map(|&index| &self.variants[index])
    }

    /// 0-based index of the selected variant, `None` when unset.
    pub fn get_index(&self, object: &dyn Any) -> Result<Option<usize>, Error> {
        (self.get_index)(object)
    }

    /// Selects variant `index`, its payload reset to the payload's default.
    pub fn set_index(&self, object: &mut dyn Any, index: usize) -> Result<(), Error> {
        let variant = self.variants.get(index).ok_or_else(|| {
            Error::unknown_member(format!("choice variant index {index} out of range"))
        })?;
        (self.set_index)(object, variant)
    }

    pub(crate) fn equals(&self, a: &dyn Any, b: &dyn Any) -> bool {
        let (Ok(ia), Ok(ib)) = (self.get_index(a), self.get_index(b)) else {
            return false;
        };
        match (ia, ib) {
            (None, None) => true,
            (Some(x), Some(y)) if x == y => {
                let variant = &self.variants[x];
                match variant.type_info() {
                    None => true,
                    Some(variant_type) => match (variant.get(a), variant.get(b)) {
                        (Some(da), Some(db)) => variant_type.equals(da, db),
                        (None, None) => true,
                        _ => false,
                    },
                }
            }
            _ => false,
        }
    }

    pub(crate) fn assign(
        &self,
        type_info: &TypeInfo,
        dst: &mut dyn Any,
        src: &dyn Any,
    ) -> Result<(), Error> {
        let Some(index) = self.get_index(src)? else {
            type_info.set_default(dst);
            return Ok(());
        };
        self.set_index(dst, index)?;
        let variant = &self.variants[index];
        if let Some(variant_type) = variant.type_info() {
            let from = variant.get(src).ok_or_else(|| mismatch(type_info))?;
            let to = variant.get_mut(dst).ok_or_else(|| mismatch(type_info))?;
            variant_type.assign(to, from)?;
        }
        Ok(())
    }
}

/// Builds the descriptor of a choice implemented as a Rust enum `C`.
pub struct ChoiceBuilder<C> {
    name: String,
    variants: Vec<VariantInfo>,
    get_index: fn(&C) -> Option<usize>,
    set_index: fn(&mut C, usize) -> bool,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Any + Default> ChoiceBuilder<C> {
    /// `get_index` reports the selected variant; `set_index` replaces the
    /// value with the given variant holding a default payload and returns
    /// false for an index it does not know.
    pub fn new(
        name: impl Into<String>,
        get_index: fn(&C) -> Option<usize>,
        set_index: fn(&mut C, usize) -> bool,
    ) -> Self {
        ChoiceBuilder {
            name: name.into(),
            variants: Vec::new(),
            get_index,
            set_index,
            _marker: PhantomData,
        }
    }

    pub fn variant<M: SerialType>(
        mut self,
        name: &str,
        get: fn(&C) -> Option<&M>,
        get_mut: fn(&mut C) -> Option<&mut M>,
    ) -> Self {
        self.variants.push(VariantInfo::new(
            name,
            TypeRef::of::<M>(),
            Accessor::optional(get, get_mut),
        ));
        self
    }

    pub fn null_variant(mut self, name: &str) -> Self {
        self.variants.push(VariantInfo::null(name));
        self
    }

    pub fn build(self) -> TypeInfo {
        let name = self.name.clone();
        let get_index = self.get_index;
        let set_index = self.set_index;
        let get_name = name.clone();
        let info = ChoiceInfo::new(
            self.variants,
            Box::new(move |object| {
                object
                    .downcast_ref::<C>()
                    .map(get_index)
                    .ok_or_else(|| Error::type_mismatch(get_name.clone(), "an object of another type"))
            }),
            Box::new(move |object, variant| {
                let choice = object.downcast_mut::<C>().ok_or_else(|| {
                    Error::type_mismatch(name.clone(), "an object of another type")
                })?;
                if set_index(choice, variant.index()) {
                    Ok(())
                } else {
                    Err(Error::unknown_member(format!(
                        "{}: cannot select variant {}",
                        name,
                        variant.name()
                    )))
                }
            }),
        );
        TypeInfo::new::<C>(self.name, TypeKind::Choice(info))
    }
}
