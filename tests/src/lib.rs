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

//! Shared fixture types and helpers of the integration tests.

use serial_core::{DataFormat, ObjectIStream, ObjectOStream, SerialType};
use serial_derive::SerialObject;
use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

pub const FORMATS: [DataFormat; 3] = [DataFormat::AsnText, DataFormat::AsnBinary, DataFormat::Xml];

/// Writes `value` as one root object.
pub fn write_bytes<T: SerialType>(format: DataFormat, value: &T) -> Vec<u8> {
    let mut out = ObjectOStream::new(format);
    out.write(value).unwrap();
    out.into_bytes()
}

pub fn read_bytes<T: SerialType>(format: DataFormat, bytes: &[u8]) -> T {
    ObjectIStream::from_bytes(format, bytes.to_vec())
        .read()
        .unwrap_or_else(|err| panic!("{format}: {err}\n{}", String::from_utf8_lossy(bytes)))
}

/// Writes and reads back `value` in every format.
pub fn roundtrip<T>(value: &T)
where
    T: SerialType + PartialEq + Debug,
{
    for format in FORMATS {
        let bytes = write_bytes(format, value);
        let back: T = read_bytes(format, &bytes);
        assert_eq!(&back, value, "{format}");
    }
}

pub fn text(bytes: &[u8]) -> String {
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[derive(SerialObject, Default, Debug, Clone, PartialEq)]
pub struct Person {
    pub name: String,
    #[serial(optional)]
    pub age: i32,
    #[serial(rename = "e-mail", optional)]
    pub email: Option<String>,
    pub friends: Vec<String>,
}

impl Person {
    pub fn ada() -> Person {
        Person {
            name: "Ada".to_string(),
            age: 36,
            email: Some("ada@example.org".to_string()),
            friends: vec!["Charles".to_string(), "Mary".to_string()],
        }
    }
}

#[derive(SerialObject, Default, Debug, Clone, Copy, PartialEq)]
pub enum Color {
    #[default]
    Red = 1,
    Green,
    Blue = 10,
}

#[derive(SerialObject, Default, Debug, Clone, PartialEq)]
pub struct Rect {
    pub width: i32,
    pub height: i32,
}

#[derive(SerialObject, Default, Debug, Clone, PartialEq)]
pub enum Shape {
    #[default]
    #[serial(unset)]
    Unset,
    #[serial(rename = "circle")]
    Circle(f64),
    #[serial(rename = "rect")]
    Rect(Rect),
    #[serial(rename = "label")]
    Label(String),
    #[serial(rename = "empty")]
    Empty,
}

#[derive(SerialObject, Default, Debug, Clone, PartialEq)]
pub struct Drawing {
    pub title: String,
    pub color: Color,
    pub shapes: Vec<Shape>,
}

/// Node of a graph whose edges may be shared or cyclic.
#[derive(SerialObject, Default, Debug)]
pub struct GraphNode {
    pub id: i32,
    pub edges: Vec<Rc<RefCell<GraphNode>>>,
}

pub fn node(id: i32) -> Rc<RefCell<GraphNode>> {
    Rc::new(RefCell::new(GraphNode { id, edges: Vec::new() }))
}

#[derive(SerialObject, Default, Debug)]
pub struct SharedPair {
    pub first: Rc<String>,
    pub second: Rc<String>,
}
