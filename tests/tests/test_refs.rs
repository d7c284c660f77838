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

use serial_core::serializer::AnyObject;
use serial_core::{DataFormat, Error, ObjectIStream, ObjectOStream};
use serial_derive::SerialObject;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tests::{node, read_bytes, text, write_bytes, GraphNode, Rect, SharedPair, FORMATS};

#[derive(SerialObject, Default, Debug)]
struct ArcPair {
    left: Arc<Vec<i32>>,
    right: Arc<Vec<i32>>,
}

#[derive(SerialObject, Default, Debug)]
struct Bag {
    items: Vec<AnyObject>,
}

fn shared_pair() -> SharedPair {
    let value = Rc::new("x".to_string());
    SharedPair {
        first: value.clone(),
        second: value,
    }
}

#[test]
fn test_shared_object_is_written_once() {
    let bytes = write_bytes(DataFormat::AsnText, &shared_pair());
    assert_eq!(text(&bytes), "SharedPair ::= {\n  first \"x\",\n  second @0\n}\n");
    let bytes = write_bytes(DataFormat::Xml, &shared_pair());
    assert!(text(&bytes).contains("<_ref id=\"0\"/>"));
}

#[test]
fn test_shared_identity_survives_roundtrip() {
    for format in FORMATS {
        let bytes = write_bytes(format, &shared_pair());
        let back: SharedPair = read_bytes(format, &bytes);
        assert_eq!(*back.first, "x");
        assert!(Rc::ptr_eq(&back.first, &back.second), "{format}");
    }
}

#[test]
fn test_arc_identity_survives_roundtrip() {
    let value = Arc::new(vec![1, 2, 3]);
    let pair = ArcPair {
        left: value.clone(),
        right: value,
    };
    for format in FORMATS {
        let bytes = write_bytes(format, &pair);
        let back: ArcPair = read_bytes(format, &bytes);
        assert_eq!(*back.left, vec![1, 2, 3]);
        assert!(Arc::ptr_eq(&back.left, &back.right), "{format}");
    }
}

#[test]
fn test_distinct_objects_stay_distinct() {
    let pair = SharedPair {
        first: Rc::new("x".to_string()),
        second: Rc::new("x".to_string()),
    };
    for format in FORMATS {
        let bytes = write_bytes(format, &pair);
        let back: SharedPair = read_bytes(format, &bytes);
        assert!(!Rc::ptr_eq(&back.first, &back.second), "{format}");
    }
}

#[test]
fn test_cycle() {
    let a = node(1);
    let b = node(2);
    a.borrow_mut().edges.push(b.clone());
    b.borrow_mut().edges.push(a.clone());

    let bytes = write_bytes(DataFormat::AsnText, &a);
    assert_eq!(
        text(&bytes),
        "Rc<RefCell<GraphNode>> ::= {\n  id 1,\n  edges {\n    {\n      id 2,\n      edges {\n        @0\n      }\n    }\n  }\n}\n"
    );

    for format in FORMATS {
        let bytes = write_bytes(format, &a);
        let back: Rc<RefCell<GraphNode>> = read_bytes(format, &bytes);
        let second = back.borrow().edges[0].clone();
        assert_eq!(second.borrow().id, 2);
        assert!(Rc::ptr_eq(&second.borrow().edges[0], &back), "{format}");
        // break the cycle so both nodes are freed
        back.borrow_mut().edges.clear();
    }
    a.borrow_mut().edges.clear();
}

#[test]
fn test_diamond() {
    let shared = node(3);
    let root = node(0);
    let left = node(1);
    let right = node(2);
    left.borrow_mut().edges.push(shared.clone());
    right.borrow_mut().edges.push(shared);
    root.borrow_mut().edges.extend([left, right]);
    for format in FORMATS {
        let bytes = write_bytes(format, &root);
        let back: Rc<RefCell<GraphNode>> = read_bytes(format, &bytes);
        let back = back.borrow();
        let left = back.edges[0].borrow();
        let right = back.edges[1].borrow();
        assert!(Rc::ptr_eq(&left.edges[0], &right.edges[0]), "{format}");
        assert_eq!(left.edges[0].borrow().id, 3);
    }
}

#[test]
fn test_untracked_refs_write_copies() {
    let mut out = ObjectOStream::new(DataFormat::AsnText).track_refs(false);
    out.write(&shared_pair()).unwrap();
    let bytes = out.into_bytes();
    assert_eq!(text(&bytes), "SharedPair ::= {\n  first \"x\",\n  second \"x\"\n}\n");
    let back: SharedPair = read_bytes(DataFormat::AsnText, &bytes);
    assert!(!Rc::ptr_eq(&back.first, &back.second));
}

#[test]
fn test_untracked_cycle_exceeds_depth() {
    let a = node(1);
    a.borrow_mut().edges.push(a.clone());
    for format in FORMATS {
        let mut out = ObjectOStream::new(format).track_refs(false).max_depth(32);
        let err = out.write(&a).unwrap_err();
        assert!(matches!(err, Error::DepthExceed(_)), "{format}: {err}");
        assert!(out.is_failed());
    }
    a.borrow_mut().edges.clear();
}

#[test]
fn test_identities_reset_between_roots() {
    let value = Rc::new("x".to_string());
    let pair = SharedPair {
        first: value.clone(),
        second: value,
    };
    let mut out = ObjectOStream::new(DataFormat::AsnText);
    out.write(&pair).unwrap();
    out.write(&pair).unwrap();
    let bytes = out.into_bytes();
    let expected = "SharedPair ::= {\n  first \"x\",\n  second @0\n}\n";
    assert_eq!(text(&bytes), format!("{expected}{expected}"));

    let mut input = ObjectIStream::from_bytes(DataFormat::AsnText, bytes);
    let one: SharedPair = input.read().unwrap();
    let two: SharedPair = input.read().unwrap();
    assert!(Rc::ptr_eq(&one.first, &one.second));
    assert!(Rc::ptr_eq(&two.first, &two.second));
    assert!(!Rc::ptr_eq(&one.first, &two.first));
}

#[test]
fn test_dangling_reference() {
    let data = "SharedPair ::= {\n  first @3,\n  second \"y\"\n}\n";
    let mut input = ObjectIStream::from_bytes(DataFormat::AsnText, data.as_bytes().to_vec());
    let err = input.read::<SharedPair>().unwrap_err();
    assert!(matches!(err, Error::InvalidRef(_)), "{err}");
    assert!(err.to_string().contains("@3"));
    assert!(input.is_failed());
}

#[test]
fn test_any_object_carries_its_type() {
    let rect = AnyObject::new(Rect {
        width: 3,
        height: 4,
    });
    let bag = Bag {
        items: vec![
            rect.clone(),
            AnyObject::new("text".to_string()),
            AnyObject::null(),
            rect,
        ],
    };
    let bytes = write_bytes(DataFormat::AsnText, &bag);
    let out = text(&bytes);
    assert!(out.contains(":\"Rect\" {"), "{out}");
    assert!(out.contains(":\"String\" \"text\""), "{out}");
    assert!(out.contains("NULL"), "{out}");
    assert!(out.contains("@0"), "{out}");

    for format in FORMATS {
        let bytes = write_bytes(format, &bag);
        let back: Bag = read_bytes(format, &bytes);
        assert_eq!(back.items.len(), 4);
        assert_eq!(
            back.items[0].downcast_ref::<Rect>(),
            Some(&Rect {
                width: 3,
                height: 4
            })
        );
        assert_eq!(back.items[1].downcast_ref::<String>().map(String::as_str), Some("text"));
        assert!(back.items[2].is_null());
        assert!(back.items[3].ptr_eq(&back.items[0]), "{format}");
    }
}

#[test]
fn test_any_object_of_unknown_type() {
    let data = "AnyObject ::= :\"NoSuchType\" 1\n";
    let mut input = ObjectIStream::from_bytes(DataFormat::AsnText, data.as_bytes().to_vec());
    let err = input.read::<AnyObject>().unwrap_err();
    assert!(matches!(err, Error::IncompatibleType(_)), "{err}");
    assert!(err.to_string().contains("unknown type NoSuchType"));
}
