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

use crate::meta::{TypeInfo, TypeKind};
use std::any::Any;
use std::marker::PhantomData;

/// Name/value table of an enumerated type.
#[derive(Clone, Debug, Default)]
pub struct EnumValues {
    entries: Vec<(String, i64)>,
}

impl EnumValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, value: i64) {
        self.entries.push((name.into(), value));
    }

    pub fn entries(&self) -> &[(String, i64)] {
        &self.entries
    }

    pub fn find_name(&self, value: i64) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(name, _)| name.as_str())
    }

    pub fn find_value(&self, name: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| *value)
    }
}

type ToValueFn = Box<dyn Fn(&dyn Any) -> Option<i64> + Send + Sync>;
type FromValueFn = Box<dyn Fn(&mut dyn Any, i64) -> bool + Send + Sync>;

pub struct EnumInfo {
    values: EnumValues,
    to_value: ToValueFn,
    from_value: FromValueFn,
}

impl EnumInfo {
    pub fn new(values: EnumValues, to_value: ToValueFn, from_value: FromValueFn) -> Self {
        EnumInfo {
            values,
            to_value,
            from_value,
        }
    }

    #[inline]
    pub fn values(&self) -> &EnumValues {
        &self.values
    }

    /// Integer value of `object`, `None` if it is not an instance.
    pub fn value_of(&self, object: &dyn Any) -> Option<i64> {
        (self.to_value)(object)
    }

    /// Stores `value`; false if the value is not declared.
    pub fn set_value(&self, object: &mut dyn Any, value: i64) -> bool {
        (self.from_value)(object, value)
    }
}

pub struct EnumBuilder<E> {
    name: String,
    values: EnumValues,
    to_value: fn(&E) -> i64,
    from_value: fn(i64) -> Option<E>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Any + Default> EnumBuilder<E> {
    pub fn new(
        name: impl Into<String>,
        to_value: fn(&E) -> i64,
        from_value: fn(i64) -> Option<E>,
    ) -> Self {
        EnumBuilder {
            name: name.into(),
            values: EnumValues::new(),
            to_value,
            from_value,
            _marker: PhantomData,
        }
    }

    pub fn value(mut self, name: &str, value: i64) -> Self {
        self.values.add(name, value);
        self
    }

    pub fn build(self) -> TypeInfo {
        let to_value = self.to_value;
        let from_value = self.from_value;
        let info = EnumInfo::new(
            self.values,
            Box::new(move |object| object.downcast_ref::<E>().map(to_value)),
            Box::new(move |object, value| match (object.downcast_mut::<E>(), from_value(value)) {
                (Some(slot), Some(decoded)) => {
                    *slot = decoded;
                    true
                }
                _ => false,
            }),
        );
        TypeInfo::new::<E>(self.name, TypeKind::Enumerated(info))
    }
}
