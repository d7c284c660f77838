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

use serial_core::{DataFormat, Error, ObjectIStream, ObjectOStream, SerialType};
use std::rc::Rc;
use tests::{Color, Drawing, Person, Rect, Shape, SharedPair, FORMATS};

fn mixed_stream(format: DataFormat) -> Vec<u8> {
    let mut out = ObjectOStream::new(format);
    out.write(&Person::ada()).unwrap();
    out.write(&Drawing {
        title: "t".to_string(),
        color: Color::Blue,
        shapes: vec![Shape::Circle(2.5), Shape::Empty],
    })
    .unwrap();
    out.write(&Person::default()).unwrap();
    out.into_bytes()
}

#[test]
fn test_skip_root() {
    for format in FORMATS {
        let mut input = ObjectIStream::from_bytes(format, mixed_stream(format));
        input.skip_root(Person::type_info()).unwrap();
        let drawing: Drawing = input.read().unwrap();
        assert_eq!(drawing.color, Color::Blue, "{format}");
        assert_eq!(drawing.shapes, vec![Shape::Circle(2.5), Shape::Empty]);
        input.skip_root(Person::type_info()).unwrap();
        assert!(!input.has_more_data(), "{format}");
    }
}

#[test]
fn test_skip_shared_objects() {
    let value = Rc::new("x".to_string());
    let pair = SharedPair {
        first: value.clone(),
        second: value,
    };
    for format in FORMATS {
        let mut out = ObjectOStream::new(format);
        out.write(&pair).unwrap();
        out.write(&pair).unwrap();
        let mut input = ObjectIStream::from_bytes(format, out.into_bytes());
        input.skip_root(SharedPair::type_info()).unwrap();
        let back: SharedPair = input.read().unwrap();
        assert!(Rc::ptr_eq(&back.first, &back.second), "{format}");
    }
}

#[test]
fn test_skip_checks_the_label() {
    for format in [DataFormat::AsnText, DataFormat::Xml] {
        let mut input = ObjectIStream::from_bytes(format, mixed_stream(format));
        let err = input.skip_root(Drawing::type_info()).unwrap_err();
        assert!(matches!(err, Error::IncompatibleType(_)), "{format}: {err}");
        assert!(err.to_string().contains("Person<>Drawing"));
    }
}

#[test]
fn test_skip_rejects_malformed_data() {
    let data = "Rect ::= {\n  width 1,\n  height\n}\n";
    let mut input = ObjectIStream::from_bytes(DataFormat::AsnText, data.as_bytes().to_vec());
    let err = input.skip_root(Rect::type_info()).unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)), "{err}");
    assert!(input.is_failed());
}

#[test]
fn test_read_any() {
    for format in [DataFormat::AsnText, DataFormat::Xml] {
        let mut input = ObjectIStream::from_bytes(format, mixed_stream(format));
        let mut names = Vec::new();
        while input.has_more_data() {
            let (type_info, object) = input.read_any().unwrap();
            names.push(type_info.name());
            if let Some(person) = object.downcast_ref::<Person>() {
                assert!(person.name.is_empty() || *person == Person::ada());
            } else {
                let drawing = object.downcast_ref::<Drawing>().unwrap();
                assert_eq!(drawing.title, "t");
            }
        }
        assert_eq!(names, ["Person", "Drawing", "Person"], "{format}");
    }
}

#[test]
fn test_read_any_needs_type_names() {
    let mut input = ObjectIStream::from_bytes(DataFormat::AsnBinary, mixed_stream(DataFormat::AsnBinary));
    let err = input.read_any().unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)), "{err}");
}

#[test]
fn test_read_any_unknown_type() {
    let data = "Unicorn ::= { horn 1 }\n";
    let mut input = ObjectIStream::from_bytes(DataFormat::AsnText, data.as_bytes().to_vec());
    let err = input.read_any().unwrap_err();
    assert!(matches!(err, Error::IncompatibleType(_)), "{err}");
    assert!(err.to_string().contains("unknown type Unicorn"));
}

#[test]
fn test_unverified_type_name() {
    let data = "Box ::= {\n  width 4,\n  height 5\n}\n";
    let mut input = ObjectIStream::from_bytes(DataFormat::AsnText, data.as_bytes().to_vec());
    let err = input.read::<Rect>().unwrap_err();
    assert!(matches!(err, Error::IncompatibleType(_)), "{err}");

    let mut input =
        ObjectIStream::from_bytes(DataFormat::AsnText, data.as_bytes().to_vec()).verify_type_name(false);
    assert_eq!(
        input.read::<Rect>().unwrap(),
        Rect {
            width: 4,
            height: 5
        }
    );
}
