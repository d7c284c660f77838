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

use serial_core::resolver::hooks::{
    MemberMut, MemberRef, ObjectMut, ObjectRef, ReadClassMemberHook, VariantMut, VariantRef,
    WriteChoiceVariantHook,
};
use serial_core::{DataFormat, Error, HookPolicy, ObjectIStream, ObjectOStream, SerialType};
use serial_derive::SerialObject;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tests::{read_bytes, text, write_bytes, Color, Drawing, Person, Rect, Shape, FORMATS};

/// Counts the friends lists read, keeping their content.
struct CountFriends(Rc<Cell<usize>>);

impl ReadClassMemberHook for CountFriends {
    fn read_class_member(&self, input: &mut ObjectIStream, mut member: MemberMut<'_>) -> Result<(), Error> {
        member.read_default(input)?;
        self.0.set(self.0.get() + member.get_mut::<Vec<String>>()?.len());
        Ok(())
    }
}

/// Writes label variants in upper case.
struct ShoutLabels;

impl WriteChoiceVariantHook for ShoutLabels {
    fn write_choice_variant(&self, out: &mut ObjectOStream, variant: VariantRef<'_>) -> Result<(), Error> {
        let Some(Shape::Label(label)) = variant.choice_object.downcast_ref::<Shape>() else {
            return variant.write_default(out);
        };
        let upper = label.to_uppercase();
        out.write_choice_variant(variant.variant, Some(&upper as &dyn Any))
    }
}

#[derive(SerialObject, Default, Debug, PartialEq)]
struct Triple {
    first: i32,
    second: i32,
    third: i32,
}

#[derive(Debug)]
struct QuotaExceeded;

impl std::fmt::Display for QuotaExceeded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("quota exceeded")
    }
}

impl std::error::Error for QuotaExceeded {}

fn drawing() -> Drawing {
    Drawing {
        title: "plan".to_string(),
        color: Color::Green,
        shapes: vec![
            Shape::Rect(Rect {
                width: 2,
                height: 3,
            }),
            Shape::Label("door".to_string()),
        ],
    }
}

#[test]
fn test_write_object_hook() {
    let mut out = ObjectOStream::new(DataFormat::AsnText);
    out.set_write_object_hook(Rect::type_info(), |out: &mut ObjectOStream, object: ObjectRef<'_>| {
        let rect = object.get::<Rect>()?;
        let scaled = Rect {
            width: rect.width * 10,
            height: rect.height * 10,
        };
        out.write_object_default(&scaled, object.type_info)
    })
    .unwrap();
    out.write(&drawing()).unwrap();
    let bytes = out.into_bytes();
    let back: Drawing = read_bytes(DataFormat::AsnText, &bytes);
    assert_eq!(
        back.shapes[0],
        Shape::Rect(Rect {
            width: 20,
            height: 30
        })
    );
    assert_eq!(back.shapes[1], Shape::Label("door".to_string()));
}

#[test]
fn test_write_member_hook_can_omit() {
    for format in FORMATS {
        let mut out = ObjectOStream::new(format);
        out.set_write_class_member_hook(
            Person::type_info(),
            "e-mail",
            |_: &mut ObjectOStream, _: MemberRef<'_>| -> Result<(), Error> { Ok(()) },
        )
        .unwrap();
        out.write(&Person::ada()).unwrap();
        let bytes = out.into_bytes();
        assert!(!text(&bytes).contains("ada@example.org"), "{format}");
        let back: Person = read_bytes(format, &bytes);
        assert_eq!(back.email, None);
        assert_eq!(back.friends, Person::ada().friends);
    }
}

#[test]
fn test_write_member_hook_default_behavior() {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let mut out = ObjectOStream::new(DataFormat::AsnText);
    out.set_write_class_member_hook(
        Person::type_info(),
        "name",
        move |out: &mut ObjectOStream, member: MemberRef<'_>| {
            counter.set(counter.get() + 1);
            assert_eq!(member.get::<String>()?, "Ada");
            member.write_default(out)
        },
    )
    .unwrap();
    out.write(&Person::ada()).unwrap();
    out.write(&Person::ada()).unwrap();
    assert_eq!(calls.get(), 2);
    let expected = write_bytes(DataFormat::AsnText, &Person::ada());
    assert_eq!(out.bytes(), [expected.clone(), expected].concat().as_slice());
}

#[test]
fn test_read_member_hook() {
    let count = Rc::new(Cell::new(0));
    for format in FORMATS {
        let mut out = ObjectOStream::new(format);
        out.write(&Person::ada()).unwrap();
        out.write(&Person::default()).unwrap();
        let mut input = ObjectIStream::from_bytes(format, out.into_bytes());
        input
            .set_read_class_member_hook(Person::type_info(), "friends", CountFriends(count.clone()))
            .unwrap();
        assert_eq!(input.read::<Person>().unwrap(), Person::ada());
        assert_eq!(input.read::<Person>().unwrap(), Person::default());
    }
    assert_eq!(count.get(), 6);
}

#[test]
fn test_read_member_hook_can_skip() {
    for format in FORMATS {
        let bytes = write_bytes(format, &Person::ada());
        let mut input = ObjectIStream::from_bytes(format, bytes);
        input
            .set_read_class_member_hook(
                Person::type_info(),
                "friends",
                |input: &mut ObjectIStream, mut member: MemberMut<'_>| member.skip(input),
            )
            .unwrap();
        let person: Person = input.read().unwrap();
        assert_eq!(person.name, "Ada");
        assert!(person.friends.is_empty(), "{format}");
    }
}

#[test]
fn test_read_object_hook() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    for format in FORMATS {
        let bytes = write_bytes(format, &drawing());
        let mut input = ObjectIStream::from_bytes(format, bytes);
        let log = log.clone();
        input
            .set_read_object_hook(Color::type_info(), move |input: &mut ObjectIStream, mut object: ObjectMut<'_>| {
                object.read_default(input)?;
                let color = object.get_mut::<Color>()?;
                log.borrow_mut().push(*color);
                *color = Color::Blue;
                Ok(())
            })
            .unwrap();
        let back: Drawing = input.read().unwrap();
        assert_eq!(back.color, Color::Blue);
        assert_eq!(back.shapes, drawing().shapes);
    }
    assert_eq!(*seen.borrow(), vec![Color::Green; 3]);
}

#[test]
fn test_variant_hooks() {
    for format in FORMATS {
        let mut out = ObjectOStream::new(format);
        out.set_write_choice_variant_hook(Shape::type_info(), "label", ShoutLabels)
            .unwrap();
        out.write(&drawing()).unwrap();
        let bytes = out.into_bytes();

        let back: Drawing = read_bytes(format, &bytes);
        assert_eq!(back.shapes[1], Shape::Label("DOOR".to_string()), "{format}");

        let mut input = ObjectIStream::from_bytes(format, bytes);
        input
            .set_read_choice_variant_hook(
                Shape::type_info(),
                "rect",
                |input: &mut ObjectIStream, mut variant: VariantMut<'_>| {
                    variant.skip(input)?;
                    *variant.choice_object.downcast_mut::<Shape>().unwrap() = Shape::Circle(1.0);
                    Ok(())
                },
            )
            .unwrap();
        let back: Drawing = input.read().unwrap();
        assert_eq!(back.shapes[0], Shape::Circle(1.0), "{format}");
        assert_eq!(back.shapes[1], Shape::Label("DOOR".to_string()));
    }
}

#[test]
fn test_hook_conflict() {
    let mut out = ObjectOStream::new(DataFormat::AsnText);
    let omit = |_: &mut ObjectOStream, _: MemberRef<'_>| -> Result<(), Error> { Ok(()) };
    out.set_write_class_member_hook(Person::type_info(), "age", omit)
        .unwrap();
    let err = out
        .set_write_class_member_hook(Person::type_info(), "age", omit)
        .unwrap_err();
    assert!(matches!(err, Error::HookConflict(_)), "{err}");
    assert!(err.to_string().contains("Person.age"));

    assert!(out
        .reset_write_class_member_hook(Person::type_info(), "age")
        .unwrap());
    assert!(!out
        .reset_write_class_member_hook(Person::type_info(), "age")
        .unwrap());
    out.set_write_class_member_hook(Person::type_info(), "age", omit)
        .unwrap();
}

#[test]
fn test_hook_replace_policy() {
    let mut input = ObjectIStream::from_bytes(DataFormat::AsnText, Vec::new()).hook_policy(HookPolicy::Replace);
    let read = |input: &mut ObjectIStream, mut object: ObjectMut<'_>| object.read_default(input);
    input.set_read_object_hook(Rect::type_info(), read).unwrap();
    input.set_read_object_hook(Rect::type_info(), read).unwrap();
    assert!(input.reset_read_object_hook(Rect::type_info()));
    assert!(!input.reset_read_object_hook(Rect::type_info()));
}

#[test]
fn test_hook_keys_are_checked() {
    let mut out = ObjectOStream::new(DataFormat::AsnText);
    let omit = |_: &mut ObjectOStream, _: MemberRef<'_>| -> Result<(), Error> { Ok(()) };
    let err = out
        .set_write_class_member_hook(Person::type_info(), "nickname", omit)
        .unwrap_err();
    assert!(matches!(err, Error::UnknownMember(_)), "{err}");
    let err = out
        .set_write_class_member_hook(Shape::type_info(), "label", omit)
        .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }), "{err}");
    let err = out
        .set_write_choice_variant_hook(Shape::type_info(), "triangle", ShoutLabels)
        .unwrap_err();
    assert!(matches!(err, Error::UnknownMember(_)), "{err}");
}

#[test]
fn test_hooks_are_per_stream() {
    let mut hooked = ObjectOStream::new(DataFormat::AsnText);
    hooked
        .set_write_class_member_hook(
            Person::type_info(),
            "name",
            |_: &mut ObjectOStream, _: MemberRef<'_>| -> Result<(), Error> { Ok(()) },
        )
        .unwrap();
    let plain = write_bytes(DataFormat::AsnText, &Person::ada());
    assert!(text(&plain).contains("name \"Ada\""));
}

#[test]
fn test_write_member_hook_writes_fixed_value() {
    const SENTINEL: i32 = -777;
    let triple = Triple {
        first: 1,
        second: 2,
        third: 3,
    };
    for format in FORMATS {
        let mut out = ObjectOStream::new(format);
        out.set_write_class_member_hook(
            Triple::type_info(),
            "second",
            |out: &mut ObjectOStream, member: MemberRef<'_>| {
                out.write_class_member(member.member, &SENTINEL as &dyn Any)
            },
        )
        .unwrap();
        out.write(&triple).unwrap();
        let bytes = out.into_bytes();
        if format == DataFormat::AsnText {
            assert!(text(&bytes).contains("second -777"), "{}", text(&bytes));
        }
        let back: Triple = read_bytes(format, &bytes);
        assert_eq!(
            back,
            Triple {
                first: 1,
                second: SENTINEL,
                third: 3
            },
            "{format}"
        );
    }
}

#[test]
fn test_hook_errors_pass_through() {
    let mut out = ObjectOStream::new(DataFormat::AsnText);
    out.set_write_class_member_hook(
        Triple::type_info(),
        "third",
        |_: &mut ObjectOStream, _: MemberRef<'_>| -> Result<(), Error> {
            Err(anyhow::anyhow!("disk full").into())
        },
    )
    .unwrap();
    let err = out.write(&Triple::default()).unwrap_err();
    let Error::Other(inner) = &err else {
        panic!("unexpected error {err}");
    };
    assert_eq!(inner.to_string(), "disk full");
    assert!(out.is_failed());
    assert!(matches!(out.write(&Triple::default()), Err(Error::NotAllowed(_))));

    let bytes = write_bytes(DataFormat::AsnBinary, &Triple::default());
    let mut input = ObjectIStream::from_bytes(DataFormat::AsnBinary, bytes);
    input
        .set_read_class_member_hook(
            Triple::type_info(),
            "first",
            |_: &mut ObjectIStream, _: MemberMut<'_>| -> Result<(), Error> {
                Err(anyhow::Error::new(QuotaExceeded).into())
            },
        )
        .unwrap();
    let err = input.read::<Triple>().unwrap_err();
    let Error::Other(inner) = &err else {
        panic!("unexpected error {err}");
    };
    assert!(inner.downcast_ref::<QuotaExceeded>().is_some());
    assert_eq!(err.to_string(), "quota exceeded");
    assert!(input.is_failed());
}
