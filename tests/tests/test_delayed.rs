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

use serial_core::{DataFormat, Delayed, Error, ObjectIStream, ObjectOStream};
use serial_derive::SerialObject;
use std::rc::Rc;
use tests::{read_bytes, write_bytes, Person, SharedPair, FORMATS};

#[derive(SerialObject, Default, Debug)]
struct Document {
    id: i32,
    body: Delayed<Person>,
}

#[derive(SerialObject, Default, Debug)]
struct Holder {
    before: Rc<String>,
    lazy: Delayed<SharedPair>,
}

#[derive(SerialObject, Default, Debug)]
struct Linked {
    head: Rc<String>,
    tail: Delayed<Rc<String>>,
}

fn document() -> Document {
    Document {
        id: 7,
        body: Delayed::new(Person::ada()),
    }
}

#[test]
fn test_value_is_parsed_on_access() {
    for format in [DataFormat::AsnText, DataFormat::AsnBinary] {
        let bytes = write_bytes(format, &document());
        let back: Document = read_bytes(format, &bytes);
        assert_eq!(back.id, 7);
        assert!(!back.body.is_loaded(), "{format}");
        assert_eq!(*back.body.get().unwrap(), Person::ada());
        assert!(back.body.is_loaded());
    }
}

#[test]
fn test_formats_without_capture_read_eagerly() {
    let bytes = write_bytes(DataFormat::Xml, &document());
    let back: Document = read_bytes(DataFormat::Xml, &bytes);
    assert!(back.body.is_loaded());
    assert_eq!(back.body.into_inner().unwrap(), Person::ada());
}

#[test]
fn test_unaccessed_value_is_copied_verbatim() {
    for format in FORMATS {
        let bytes = write_bytes(format, &document());
        let back: Document = read_bytes(format, &bytes);
        assert_eq!(write_bytes(format, &back), bytes, "{format}");
        if format != DataFormat::Xml {
            assert!(!back.body.is_loaded());
        }
    }
}

#[test]
fn test_captured_value_converts_to_another_format() {
    let bytes = write_bytes(DataFormat::AsnBinary, &document());
    let back: Document = read_bytes(DataFormat::AsnBinary, &bytes);
    assert_eq!(
        write_bytes(DataFormat::AsnText, &back),
        write_bytes(DataFormat::AsnText, &document())
    );
}

#[test]
fn test_modified_value_is_written() {
    let bytes = write_bytes(DataFormat::AsnText, &document());
    let mut back: Document = read_bytes(DataFormat::AsnText, &bytes);
    back.body.get_mut().unwrap().age = 37;
    let again: Document = read_bytes(DataFormat::AsnText, &write_bytes(DataFormat::AsnText, &back));
    assert_eq!(again.body.get().unwrap().age, 37);

    back.body.set(Person::default());
    let again: Document = read_bytes(DataFormat::AsnText, &write_bytes(DataFormat::AsnText, &back));
    assert_eq!(*again.body.get().unwrap(), Person::default());
}

#[test]
fn test_objects_shared_inside_the_value() {
    let value = Rc::new("y".to_string());
    let holder = Holder {
        before: Rc::new("x".to_string()),
        lazy: Delayed::new(SharedPair {
            first: value.clone(),
            second: value,
        }),
    };
    for format in FORMATS {
        let bytes = write_bytes(format, &holder);
        let back: Holder = read_bytes(format, &bytes);
        assert_eq!(*back.before, "x");
        let pair = back.lazy.get().unwrap();
        assert_eq!(*pair.first, "y");
        assert!(Rc::ptr_eq(&pair.first, &pair.second), "{format}");
    }
}

#[test]
fn test_value_referencing_outer_objects() {
    let value = Rc::new("x".to_string());
    let linked = Linked {
        head: value.clone(),
        tail: Delayed::new(value),
    };
    let bytes = write_bytes(DataFormat::AsnText, &linked);
    let back: Linked = read_bytes(DataFormat::AsnText, &bytes);
    let err = back.tail.get().unwrap_err();
    assert!(matches!(err, Error::InvalidRef(_)), "{err}");

    let back: Linked = read_bytes(DataFormat::Xml, &write_bytes(DataFormat::Xml, &linked));
    assert!(Rc::ptr_eq(&back.head, &back.tail.get().unwrap()));
}

#[test]
fn test_delayed_root() {
    let mut out = ObjectOStream::new(DataFormat::AsnText);
    out.write(&Delayed::new(Person::ada())).unwrap();
    let bytes = out.into_bytes();
    assert!(String::from_utf8_lossy(&bytes).starts_with("Delayed<Person> ::= {"));
    let mut input = ObjectIStream::from_bytes(DataFormat::AsnText, bytes);
    let back: Delayed<Person> = input.read().unwrap();
    assert_eq!(back.into_inner().unwrap(), Person::ada());
}
