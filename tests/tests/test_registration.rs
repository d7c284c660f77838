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

//! Name lookups that happen before a type is used in any other way. Each
//! type here is touched by one test only, so the order of tests does not
//! matter.

use serial_core::{AnyObject, DataFormat, Error, ObjectIStream};
use serial_derive::SerialObject;

#[derive(SerialObject, Default, Debug, PartialEq)]
struct Lonely {
    v: i32,
}

#[derive(SerialObject, Default, Debug, PartialEq)]
struct Hermit {
    v: i32,
}

mod north {
    use serial_derive::SerialObject;

    #[derive(SerialObject, Default, Debug, PartialEq)]
    pub struct Point {
        pub x: i32,
    }
}

mod south {
    use serial_derive::SerialObject;

    #[derive(SerialObject, Default, Debug, PartialEq)]
    pub struct Point {
        pub y: i32,
    }
}

fn input(data: &str) -> ObjectIStream {
    ObjectIStream::from_bytes(DataFormat::AsnText, data.as_bytes().to_vec())
}

#[test]
fn test_read_any_after_register() {
    let data = "Lonely ::= {\n  v 1\n}\n";
    let err = input(data).read_any().unwrap_err();
    assert!(matches!(err, Error::IncompatibleType(_)), "{err}");
    assert!(err.to_string().contains("unknown type Lonely"), "{err}");

    let info = serial::register::<Lonely>().unwrap();
    assert_eq!(info.name(), "Lonely");
    let (type_info, object) = input(data).read_any().unwrap();
    assert!(std::ptr::eq(type_info, info));
    assert_eq!(object.downcast_ref::<Lonely>(), Some(&Lonely { v: 1 }));
}

#[test]
fn test_any_object_after_register() {
    let data = "AnyObject ::= :\"Hermit\" {\n  v 2\n}\n";
    let err = input(data).read::<AnyObject>().unwrap_err();
    assert!(matches!(err, Error::IncompatibleType(_)), "{err}");

    serial::register::<Hermit>().unwrap();
    // registering twice is harmless
    serial::register::<Hermit>().unwrap();
    let any: AnyObject = input(data).read().unwrap();
    assert_eq!(any.downcast_ref::<Hermit>(), Some(&Hermit { v: 2 }));
}

#[test]
fn test_shared_type_name() {
    serial::register::<north::Point>().unwrap();
    let err = serial::register::<south::Point>().unwrap_err();
    assert!(matches!(err, Error::IncompatibleType(_)), "{err}");
    let err = serial::register::<north::Point>().unwrap_err();
    assert!(matches!(err, Error::IncompatibleType(_)), "{err}");

    let data = "Point ::= {\n  x 1\n}\n";
    let err = input(data).read_any().unwrap_err();
    assert!(matches!(err, Error::IncompatibleType(_)), "{err}");
    assert!(err.to_string().contains("more than one type"), "{err}");
    let err = input("AnyObject ::= :\"Point\" {\n  x 1\n}\n")
        .read::<AnyObject>()
        .unwrap_err();
    assert!(matches!(err, Error::IncompatibleType(_)), "{err}");

    // typed reads do not go through the name table
    let point: north::Point = input(data).read().unwrap();
    assert_eq!(point, north::Point { x: 1 });
}
