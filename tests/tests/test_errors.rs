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

use serial_core::{DataFormat, Error, ObjectIStream, ObjectOStream, OctetString, SerialType};
use serial_derive::SerialObject;
use tests::{write_bytes, Color, Person, Rect, Shape, FORMATS};

#[derive(SerialObject, Default, Debug, PartialEq)]
#[serial(set)]
struct Extent {
    low: i32,
    high: i32,
}

fn read_text<T: SerialType>(data: &str) -> Result<T, Error> {
    ObjectIStream::from_bytes(DataFormat::AsnText, data.as_bytes().to_vec()).read()
}

#[test]
fn test_missing_member() {
    let err = read_text::<Rect>("Rect ::= {\n  width 1\n}\n").unwrap_err();
    assert!(matches!(err, Error::MissingMember(_)), "{err}");
    assert!(err.to_string().contains("Rect.height expected"), "{err}");

    let data = "<?xml version=\"1.0\"?>\n<Rect>\n  <width>1</width>\n</Rect>\n";
    let err = ObjectIStream::from_bytes(DataFormat::Xml, data.as_bytes().to_vec())
        .read::<Rect>()
        .unwrap_err();
    assert!(matches!(err, Error::MissingMember(_)), "{err}");
}

#[test]
fn test_duplicated_member() {
    let err = read_text::<Rect>("Rect ::= { width 1, width 2, height 3 }\n").unwrap_err();
    assert!(matches!(err, Error::DuplicatedMember(_)), "{err}");
    assert!(err.to_string().contains("duplicated member width"));
}

#[test]
fn test_member_order() {
    let err = read_text::<Rect>("Rect ::= { height 1, width 2 }\n").unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)), "{err}");
    assert!(err.to_string().contains("member width out of order"));

    let extent = read_text::<Extent>("Extent ::= { high 9, low 1 }\n").unwrap();
    assert_eq!(extent, Extent { low: 1, high: 9 });
}

#[test]
fn test_unknown_member() {
    let err = read_text::<Rect>("Rect ::= { width 1, depth 2, height 3 }\n").unwrap_err();
    assert!(matches!(err, Error::UnknownMember(_)), "{err}");
}

#[test]
fn test_overflow() {
    let err = read_text::<u8>("u8 ::= 300\n").unwrap_err();
    assert!(matches!(err, Error::Overflow(_)), "{err}");
    assert!(err.to_string().contains("300 does not fit u8"));
    let err = read_text::<i8>("i8 ::= -129\n").unwrap_err();
    assert!(matches!(err, Error::Overflow(_)), "{err}");
    let err = read_text::<u32>("u32 ::= -1\n").unwrap_err();
    assert!(matches!(err, Error::Overflow(_)), "{err}");

    for format in FORMATS {
        let bytes = write_bytes(format, &i64::MAX);
        let mut input = ObjectIStream::from_bytes(format, bytes).verify_type_name(false);
        let err = input.read::<i32>().unwrap_err();
        assert!(matches!(err, Error::Overflow(_)), "{format}: {err}");
    }
}

#[test]
fn test_unknown_enumerated_value() {
    let err = read_text::<Color>("Color ::= purple\n").unwrap_err();
    assert!(matches!(err, Error::UnknownEnum(_)), "{err}");
    let err = read_text::<Color>("Color ::= 4\n").unwrap_err();
    assert!(matches!(err, Error::UnknownEnum(_)), "{err}");
    assert!(err.to_string().contains("4 is not a value of Color"));
    assert_eq!(read_text::<Color>("Color ::= 10\n").unwrap(), Color::Blue);
}

#[test]
fn test_type_label_mismatch() {
    let bytes = write_bytes(DataFormat::AsnText, &Person::ada());
    let mut input = ObjectIStream::from_bytes(DataFormat::AsnText, bytes);
    let err = input.read::<Rect>().unwrap_err();
    assert!(matches!(err, Error::IncompatibleType(_)), "{err}");
    assert!(err.to_string().contains("Person<>Rect"));
}

#[test]
fn test_error_location() {
    let data = "Person ::= {\n  name \"Ada\",\n  age \"old\",\n  friends { }\n}\n";
    let err = read_text::<Person>(data).unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)), "{err}");
    assert!(err.to_string().contains("Person.age"), "{err}");
    assert!(err.to_string().contains("line 3"), "{err}");

    let data = "Drawing ::= {\n  title \"\",\n  color Red,\n  shapes {\n    circle 1.5,\n    rect { width 1, height x }\n  }\n}\n";
    let err = read_text::<tests::Drawing>(data).unwrap_err();
    assert!(err.to_string().contains("Drawing.shapes.E.rect.height"), "{err}");
}

#[test]
fn test_failed_input_stream_refuses_reads() {
    let data = "Rect ::= { width 1 }\nRect ::= { width 1, height 2 }\n";
    let mut input = ObjectIStream::from_bytes(DataFormat::AsnText, data.as_bytes().to_vec());
    assert!(input.read::<Rect>().is_err());
    assert!(input.is_failed());
    assert!(!input.has_more_data());
    let err = input.read::<Rect>().unwrap_err();
    assert!(matches!(err, Error::NotAllowed(_)), "{err}");
    assert!(matches!(input.skip_root(Rect::type_info()), Err(Error::NotAllowed(_))));
}

#[test]
fn test_failed_output_stream_refuses_writes() {
    let mut out = ObjectOStream::new(DataFormat::AsnText);
    assert!(out.write(&Shape::Unset).is_err());
    let err = out.write(&Rect::default()).unwrap_err();
    assert!(matches!(err, Error::NotAllowed(_)), "{err}");
    assert!(err.to_string().contains("failed stream"));
}

#[test]
fn test_depth_limit_on_input() {
    let value = vec![vec![vec![1i32]]];
    for format in FORMATS {
        let bytes = write_bytes(format, &value);
        let mut input = ObjectIStream::from_bytes(format, bytes.clone()).max_depth(4);
        let err = input.read::<Vec<Vec<Vec<i32>>>>().unwrap_err();
        assert!(matches!(err, Error::DepthExceed(_)), "{format}: {err}");

        let mut input = ObjectIStream::from_bytes(format, bytes).max_depth(16);
        assert_eq!(input.read::<Vec<Vec<Vec<i32>>>>().unwrap(), value);
    }
}

#[test]
fn test_truncated_input() {
    for format in FORMATS {
        let bytes = write_bytes(format, &Person::ada());
        let cut = bytes[..bytes.len() / 2].to_vec();
        let mut input = ObjectIStream::from_bytes(format, cut);
        assert!(input.read::<Person>().is_err(), "{format}");
        assert!(input.is_failed());
    }
}

#[test]
fn test_malformed_xml() {
    let data = "<?xml version=\"1.0\"?>\n<Rect><width>1</height></Rect>\n";
    let err = ObjectIStream::from_bytes(DataFormat::Xml, data.as_bytes().to_vec())
        .read::<Rect>()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)), "{err}");
    assert!(err.to_string().contains("malformed XML"));
}

#[test]
fn test_trailing_garbage_in_binary() {
    let mut bytes = write_bytes(DataFormat::AsnBinary, &7i32);
    bytes.push(0xff);
    let mut input = ObjectIStream::from_bytes(DataFormat::AsnBinary, bytes);
    assert_eq!(input.read::<i32>().unwrap(), 7);
    assert!(input.has_more_data());
    assert!(input.read::<i32>().is_err());
}

#[test]
fn test_binary_length_past_end() {
    let bytes = vec![0x04, 0x88, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
    let mut input = ObjectIStream::from_bytes(DataFormat::AsnBinary, bytes);
    let err = input.read::<OctetString>().unwrap_err();
    assert!(matches!(err, Error::BufferOutOfBound(10, _, 10)), "{err}");

    // a string that claims more bytes than the document holds
    let mut bytes = write_bytes(DataFormat::AsnBinary, &"abc".to_string());
    bytes.truncate(bytes.len() - 1);
    let err = ObjectIStream::from_bytes(DataFormat::AsnBinary, bytes)
        .read::<String>()
        .unwrap_err();
    assert!(matches!(err, Error::BufferOutOfBound(..)), "{err}");
}
