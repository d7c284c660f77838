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

use serial_core::{DataFormat, OctetString};
use serial_derive::SerialObject;
use std::collections::{BTreeSet, VecDeque};
use tests::{read_bytes, roundtrip, text, write_bytes, Color, Drawing, Person, Rect, Shape, FORMATS};

#[derive(SerialObject, Default, Debug, PartialEq)]
struct Scalars {
    flag: bool,
    letter: char,
    tiny: i8,
    small: i16,
    int: i32,
    big: i64,
    byte: u8,
    word: u16,
    dword: u32,
    qword: u64,
    single: f32,
    double: f64,
}

#[derive(SerialObject, Default, Debug, PartialEq)]
struct Wrapper<T> {
    inner: T,
}

#[derive(SerialObject, Default, Debug, PartialEq)]
struct Tuple(i32, String);

fn default_port() -> u16 {
    8080
}

#[derive(SerialObject, Debug, PartialEq)]
struct Server {
    host: String,
    #[serial(default = "default_port")]
    port: u16,
}

impl Default for Server {
    fn default() -> Self {
        Server {
            host: String::new(),
            port: default_port(),
        }
    }
}

#[test]
fn test_scalar_extremes() {
    roundtrip(&Scalars {
        flag: true,
        letter: 'ж',
        tiny: i8::MIN,
        small: i16::MAX,
        int: -123_456,
        big: i64::MIN,
        byte: u8::MAX,
        word: 0,
        dword: u32::MAX,
        qword: u64::MAX,
        single: 1.5,
        double: -0.1,
    });
}

#[test]
fn test_default_scalars() {
    roundtrip(&Scalars::default());
    roundtrip(&Scalars {
        letter: '\u{1}',
        ..Scalars::default()
    });
    roundtrip(&"\u{0}\r\n\u{7f}\u{fffe}".to_string());
}

#[test]
fn test_special_reals() {
    for value in [0.0, 1e300, -2.5e-300, f64::INFINITY, f64::NEG_INFINITY, 123456.789] {
        roundtrip(&value);
    }
    for format in FORMATS {
        let back: f64 = read_bytes(format, &write_bytes(format, &f64::NAN));
        assert!(back.is_nan(), "{format}");
    }
}

#[test]
fn test_strings_need_escaping() {
    roundtrip(&"say \"hi\" <b>&amp;</b>\nline".to_string());
    roundtrip(&String::new());
}

#[test]
fn test_class() {
    roundtrip(&Person::ada());
    roundtrip(&Person::default());
}

#[test]
fn test_containers() {
    roundtrip(&vec![1i32, -2, 3]);
    roundtrip(&Vec::<String>::new());
    roundtrip(&VecDeque::from([1.5f64, 2.5]));
    roundtrip(&BTreeSet::from([3u32, 1, 2]));
    roundtrip(&vec![vec![1u8, 2], vec![], vec![3]]);
    roundtrip(&vec![Person::ada(), Person::default()]);
}

#[test]
fn test_octet_string() {
    roundtrip(&OctetString(vec![0x00, 0x0a, 0xff, 0x7f]));
    roundtrip(&OctetString::default());
    let long = OctetString((0..5000u32).map(|i| (i % 256) as u8).collect());
    roundtrip(&long);
}

#[test]
fn test_enumerated() {
    for color in [Color::Red, Color::Green, Color::Blue] {
        roundtrip(&color);
    }
    let bytes = write_bytes(DataFormat::AsnText, &Color::Green);
    assert_eq!(text(&bytes), "Color ::= Green\n");
}

#[test]
fn test_nested_choice_and_enum() {
    roundtrip(&Drawing {
        title: "plan".to_string(),
        color: Color::Blue,
        shapes: vec![
            Shape::Circle(2.0),
            Shape::Rect(Rect {
                width: 3,
                height: 4,
            }),
            Shape::Label("door".to_string()),
            Shape::Empty,
        ],
    });
}

#[test]
fn test_option_members() {
    let mut ada = Person::ada();
    ada.email = None;
    roundtrip(&ada);
    roundtrip(&Some(5i32));
    roundtrip(&None::<i32>);
    roundtrip(&Box::new(Rect {
        width: 1,
        height: 2,
    }));
}

#[test]
fn test_generic_and_tuple_structs() {
    roundtrip(&Wrapper { inner: 7i64 });
    roundtrip(&Wrapper {
        inner: vec!["x".to_string()],
    });
    roundtrip(&Tuple(4, "four".to_string()));
    let bytes = write_bytes(DataFormat::AsnText, &Wrapper { inner: 1u8 });
    assert!(text(&bytes).starts_with("Wrapper<u8> ::= {"));
}

#[test]
fn test_custom_default_is_omitted() {
    let server = Server {
        host: "localhost".to_string(),
        port: 8080,
    };
    let bytes = write_bytes(DataFormat::AsnText, &server);
    assert_eq!(text(&bytes), "Server ::= {\n  host \"localhost\"\n}\n");
    roundtrip(&server);

    let custom = Server {
        host: "localhost".to_string(),
        port: 0,
    };
    let bytes = write_bytes(DataFormat::AsnText, &custom);
    assert!(text(&bytes).contains("port 0"));
    roundtrip(&custom);
}

#[test]
fn test_absent_optional_member_is_reset() {
    let data = b"Person ::= { name \"Bob\", friends { } }".to_vec();
    let bob: Person = read_bytes(DataFormat::AsnText, &data);
    assert_eq!(
        bob,
        Person {
            name: "Bob".to_string(),
            ..Person::default()
        }
    );
}

#[test]
fn test_many_roots_in_one_stream() {
    for format in FORMATS {
        let mut out = serial_core::ObjectOStream::new(format);
        for i in 0..3 {
            out.write(&i).unwrap();
        }
        out.write(&Person::ada()).unwrap();
        let mut input = serial_core::ObjectIStream::from_bytes(format, out.into_bytes());
        for i in 0..3 {
            assert_eq!(input.read::<i32>().unwrap(), i, "{format}");
        }
        assert_eq!(input.read::<Person>().unwrap(), Person::ada());
        assert!(!input.has_more_data());
    }
}
