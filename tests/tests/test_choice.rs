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

use serial_core::meta::SerialType;
use serial_core::{DataFormat, Error, ObjectIStream, ObjectOStream};
use serial_derive::SerialObject;
use tests::{read_bytes, roundtrip, text, write_bytes, Rect, Shape, FORMATS};

#[derive(SerialObject, Default, Debug, Clone, Copy, PartialEq)]
#[serial(choice)]
enum Switch {
    #[default]
    Off,
    On,
}

#[test]
fn test_every_variant() {
    roundtrip(&Shape::Circle(0.5));
    roundtrip(&Shape::Rect(Rect::default()));
    roundtrip(&Shape::Label("x".to_string()));
    roundtrip(&Shape::Empty);
}

#[test]
fn test_text_form() {
    let bytes = write_bytes(DataFormat::AsnText, &Shape::Label("door".to_string()));
    assert_eq!(text(&bytes), "Shape ::= label \"door\"\n");
    let bytes = write_bytes(DataFormat::AsnText, &Shape::Empty);
    assert_eq!(text(&bytes), "Shape ::= empty NULL\n");
}

#[test]
fn test_unset_choice_cannot_be_written() {
    for format in FORMATS {
        let mut out = ObjectOStream::new(format);
        let err = out.write(&Shape::Unset).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)), "{format}: {err}");
        assert!(err.to_string().contains("cannot write empty choice Shape"));
        assert!(out.is_failed());
    }
}

#[test]
fn test_descriptor() {
    let info = Shape::type_info();
    let choice = info.as_choice().unwrap();
    let names: Vec<_> = choice.variants().iter().map(|v| v.name()).collect();
    assert_eq!(names, ["circle", "rect", "label", "empty"]);
    assert!(choice.variant(3).unwrap().is_null());

    assert_eq!(choice.get_index(&Shape::Unset).unwrap(), None);
    assert_eq!(choice.get_index(&Shape::Label(String::new())).unwrap(), Some(2));

    let mut shape = Shape::Circle(1.0);
    choice.set_index(&mut shape, 1).unwrap();
    assert_eq!(shape, Shape::Rect(Rect::default()));
    assert!(info.is_default(&Shape::Unset));
}

#[test]
fn test_unit_enum_as_choice() {
    roundtrip(&Switch::On);
    let bytes = write_bytes(DataFormat::AsnText, &Switch::Off);
    assert_eq!(text(&bytes), "Switch ::= Off NULL\n");
}

#[test]
fn test_unknown_variant() {
    let mut input = ObjectIStream::from_bytes(DataFormat::AsnText, b"Shape ::= square 4".to_vec());
    let err = input.read::<Shape>().unwrap_err();
    assert!(matches!(err, Error::UnknownMember(_)), "{err}");
}

#[test]
fn test_variant_replaced_on_read() {
    let bytes = write_bytes(DataFormat::Xml, &Shape::Circle(3.0));
    let mut shape = Shape::Label("old".to_string());
    ObjectIStream::from_bytes(DataFormat::Xml, bytes)
        .read_root(&mut shape, Shape::type_info())
        .unwrap();
    assert_eq!(shape, Shape::Circle(3.0));
    let back: Shape = read_bytes(DataFormat::AsnBinary, &write_bytes(DataFormat::AsnBinary, &shape));
    assert_eq!(back, shape);
}
