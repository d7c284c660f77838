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

use serial_core::legacy::{
    AsnIo, AsnProcs, ByteStore, LegacyChoiceTypeInfo, ListLayout, OctetStringTypeInfo,
    OldAsnTypeInfo, OldAsnValue, SequenceOfTypeInfo, SetOfTypeInfo, ValNode, ValNodeList,
};
use serial_core::meta::{registry, Accessor, ClassBuilder, MemberInfo, SerialType, TypeInfo, TypeRef};
use serial_core::{DataFormat, Error, ObjectIStream, ObjectOStream};
use serial_derive::SerialObject;
use std::any::Any;
use std::mem::offset_of;
use std::sync::OnceLock;
use tests::{text, FORMATS};

fn write_root(format: DataFormat, object: &dyn Any, type_info: &'static TypeInfo) -> Vec<u8> {
    let mut out = ObjectOStream::new(format);
    out.write_root(object, type_info).unwrap();
    out.into_bytes()
}

fn read_root<T: Default + Any>(format: DataFormat, bytes: &[u8], type_info: &'static TypeInfo) -> T {
    let mut value = T::default();
    ObjectIStream::from_bytes(format, bytes.to_vec())
        .read_root(&mut value, type_info)
        .unwrap_or_else(|err| panic!("{format}: {err}\n{}", String::from_utf8_lossy(bytes)));
    value
}

fn qualifier() -> &'static TypeInfo {
    static INFO: OnceLock<&'static TypeInfo> = OnceLock::new();
    INFO.get_or_init(|| {
        LegacyChoiceTypeInfo::new(
            "Gb-qual",
            &[
                ("gene", Some(String::type_info())),
                ("score", Some(i32::type_info())),
                ("pseudo", None),
            ],
        )
        .unwrap()
    })
}

fn counter() -> OldAsnTypeInfo {
    static INFO: OnceLock<OldAsnTypeInfo> = OnceLock::new();
    *INFO.get_or_init(|| {
        OldAsnTypeInfo::new(
            "Old-counter",
            AsnProcs {
                new: || Box::new(0u32) as Box<dyn Any>,
                free: drop,
                read: |io: &mut AsnIo| {
                    let mut buf = [0u8; 4];
                    (io.read(&mut buf) == 4 && io.remaining().is_empty())
                        .then(|| Box::new(u32::from_le_bytes(buf)) as Box<dyn Any>)
                },
                write: |object: &dyn Any, io: &mut AsnIo| match object.downcast_ref::<u32>() {
                    Some(value) => {
                        io.write(&value.to_le_bytes());
                        true
                    }
                    None => false,
                },
            },
        )
        .unwrap()
    })
}

/// A toolkit record: the first word is the list link, members follow it.
#[repr(C)]
#[derive(Default)]
struct Gene {
    #[allow(dead_code)]
    link: usize,
    locus: String,
    start: i32,
    exons: ValNodeList,
    product: Option<Box<ByteStore>>,
}

impl SerialType for Gene {
    fn type_info() -> &'static TypeInfo {
        registry().get_or_register::<Gene>(|| {
            let exons = SequenceOfTypeInfo::get(i32::type_info()).unwrap();
            ClassBuilder::<Gene>::new("Gene-ref")
                .member::<String>("locus", offset_of!(Gene, locus), |g| &g.locus, |g| &mut g.locus)
                .member::<i32>("start", offset_of!(Gene, start), |g| &g.start, |g| &mut g.start)
                .optional()
                .raw_member(MemberInfo::new(
                    "exons",
                    offset_of!(Gene, exons),
                    TypeRef::Resolved(exons),
                    Accessor::field(|g: &Gene| &g.exons, |g: &mut Gene| &mut g.exons),
                ))
                .raw_member(MemberInfo::new(
                    "product",
                    offset_of!(Gene, product),
                    TypeRef::Resolved(OctetStringTypeInfo::get()),
                    Accessor::field(|g: &Gene| &g.product, |g: &mut Gene| &mut g.product),
                ))
                .optional()
                .build()
        })
    }
}

impl Gene {
    fn new(locus: &str, start: i32, exons: &[i32]) -> Gene {
        Gene {
            locus: locus.to_string(),
            start,
            exons: ValNodeList::from_values(exons.iter().copied()),
            ..Gene::default()
        }
    }
}

#[derive(Default)]
struct Record {
    id: i32,
    counter: OldAsnValue,
}

impl SerialType for Record {
    fn type_info() -> &'static TypeInfo {
        registry().get_or_register::<Record>(|| {
            ClassBuilder::<Record>::new("Record")
                .member::<i32>("id", offset_of!(Record, id), |r| &r.id, |r| &mut r.id)
                .raw_member(MemberInfo::new(
                    "counter",
                    offset_of!(Record, counter),
                    TypeRef::Resolved(counter().type_info()),
                    Accessor::field(|r: &Record| &r.counter, |r: &mut Record| &mut r.counter),
                ))
                .build()
        })
    }
}

#[derive(SerialObject, Default)]
#[repr(C)]
struct Flat {
    a: i64,
    b: i64,
}

fn qualifiers() -> ValNodeList {
    ValNodeList::from_nodes([
        ValNode::new(1, Some(Box::new("dnaK".to_string()))),
        ValNode::new(2, Some(Box::new(7i32))),
        ValNode::new(3, None),
    ])
}

#[test]
fn test_layouts() {
    assert_eq!(SequenceOfTypeInfo::layout(i32::type_info()).unwrap(), ListLayout::ValNodeNext);
    let choice = TypeInfo::auto_pointer(qualifier()).unwrap();
    assert_eq!(SequenceOfTypeInfo::layout(choice).unwrap(), ListLayout::ChoiceNext);
    let gene = TypeInfo::auto_pointer(Gene::type_info()).unwrap();
    assert_eq!(SequenceOfTypeInfo::layout(gene).unwrap(), ListLayout::SequenceNext);
}

#[test]
fn test_incompatible_layouts() {
    let err = SequenceOfTypeInfo::get(String::type_info()).unwrap_err();
    assert!(matches!(err, Error::IncompatibleType(_)), "{err}");
    assert!(err.to_string().contains("String size:"));

    let flat = TypeInfo::auto_pointer(Flat::type_info()).unwrap();
    let err = SequenceOfTypeInfo::get(flat).unwrap_err();
    assert!(err.to_string().contains("Flat size: 16"), "{err}");
}

#[test]
fn test_sequence_of_values() {
    let info = SequenceOfTypeInfo::get(i32::type_info()).unwrap();
    let list = ValNodeList::from_values([1i32, -2, 3]);
    let bytes = write_root(DataFormat::AsnText, &list, info);
    assert_eq!(text(&bytes), "SEQUENCE OF i32 ::= {\n  1,\n  -2,\n  3\n}\n");
    for format in FORMATS {
        let bytes = write_root(format, &list, info);
        let back: ValNodeList = read_root(format, &bytes, info);
        assert_eq!(back.values::<i32>(), [&1, &-2, &3], "{format}");
        assert!(info.equals(&back, &list));
    }
}

#[test]
fn test_set_of_values() {
    let info = SetOfTypeInfo::get(u8::type_info()).unwrap();
    assert_eq!(info.name(), "SET OF u8");
    let list = ValNodeList::from_values([9u8, 4]);
    for format in FORMATS {
        let back: ValNodeList = read_root(format, &write_root(format, &list, info), info);
        assert_eq!(back.values::<u8>(), [&9, &4], "{format}");
    }
}

#[test]
fn test_sequence_of_choices() {
    let info = SequenceOfTypeInfo::get(TypeInfo::auto_pointer(qualifier()).unwrap()).unwrap();
    let list = qualifiers();
    let bytes = write_root(DataFormat::AsnText, &list, info);
    assert_eq!(
        text(&bytes),
        "SEQUENCE OF Box<dyn Gb-qual> ::= {\n  gene \"dnaK\",\n  score 7,\n  pseudo NULL\n}\n"
    );
    for format in FORMATS {
        let bytes = write_root(format, &list, info);
        let back: ValNodeList = read_root(format, &bytes, info);
        let nodes: Vec<_> = back.iter().collect();
        assert_eq!(nodes.len(), 3, "{format}");
        assert_eq!(nodes[0].choice, 1);
        assert_eq!(nodes[0].value::<String>().map(String::as_str), Some("dnaK"));
        assert_eq!(nodes[1].value::<i32>(), Some(&7));
        assert_eq!(nodes[2].choice, 3);
        assert!(nodes[2].data.is_none());
    }
}

#[test]
fn test_sequence_of_classes() {
    let info = SequenceOfTypeInfo::get(TypeInfo::auto_pointer(Gene::type_info()).unwrap()).unwrap();
    let mut product = ByteStore::new();
    product.write(&(0..=255u8).cycle().take(3000).collect::<Vec<_>>());
    let mut first = Gene::new("dnaK", 12, &[1, 2]);
    first.product = Some(Box::new(product));
    let list = ValNodeList::from_values([first, Gene::new("dnaJ", 0, &[])]);

    let bytes = write_root(DataFormat::AsnText, &list, info);
    let out = text(&bytes);
    assert!(out.contains("locus \"dnaJ\",\n    exons { }"), "{out}");

    for format in FORMATS {
        let bytes = write_root(format, &list, info);
        let back: ValNodeList = read_root(format, &bytes, info);
        assert!(info.equals(&back, &list), "{format}");
        let genes = back.values::<Gene>();
        assert_eq!(genes[0].exons.values::<i32>(), [&1, &2]);
        assert_eq!(genes[0].product.as_ref().map(|p| p.len()), Some(3000));
        assert_eq!(genes[1].start, 0);
        assert!(genes[1].product.is_none());
    }
}

#[test]
fn test_read_reuses_nodes() {
    let info = SequenceOfTypeInfo::get(i32::type_info()).unwrap();
    let bytes = write_root(DataFormat::AsnBinary, &ValNodeList::from_values([5i32, 6]), info);
    let mut list = ValNodeList::from_values([0i32, 0, 0, 0]);
    ObjectIStream::from_bytes(DataFormat::AsnBinary, bytes)
        .read_root(&mut list, info)
        .unwrap();
    assert_eq!(list.values::<i32>(), [&5, &6]);
}

#[test]
fn test_choice_node() {
    let info = qualifier();
    let data = "Gb-qual ::= score 5\n";
    let node: ValNode = read_root(DataFormat::AsnText, data.as_bytes(), info);
    assert_eq!(node.choice, 2);
    assert_eq!(node.value::<i32>(), Some(&5));

    let bytes = write_root(DataFormat::AsnText, &ValNode::new(3, None), info);
    assert_eq!(text(&bytes), "Gb-qual ::= pseudo NULL\n");
}

#[test]
fn test_bad_choice_selector() {
    let mut out = ObjectOStream::new(DataFormat::AsnText);
    let err = out
        .write_root(&ValNode::new(9, None), qualifier())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)), "{err}");
    assert!(err.to_string().contains("invalid choice selector 9"));
}

#[test]
fn test_octet_string() {
    let info = OctetStringTypeInfo::get();
    let handle: Option<Box<ByteStore>> = Some(Box::new(ByteStore::from(&b"\x00\x01\xfe"[..])));
    let bytes = write_root(DataFormat::AsnText, &handle, info);
    assert_eq!(text(&bytes), "OCTET STRING ::= '0001FE'H\n");
    for format in FORMATS {
        let back: Option<Box<ByteStore>> = read_root(format, &write_root(format, &handle, info), info);
        assert_eq!(back.unwrap().as_slice(), b"\x00\x01\xfe");
    }

    let mut out = ObjectOStream::new(DataFormat::AsnText);
    let err = out.write_root(&None::<Box<ByteStore>>, info).unwrap_err();
    assert!(matches!(err, Error::WriteFault(_)), "{err}");
}

#[test]
fn test_old_asn_object() {
    let info = Record::type_info();
    let record = Record {
        id: 3,
        counter: OldAsnValue(Some(Box::new(0x0102_0304u32))),
    };
    let bytes = write_root(DataFormat::AsnText, &record, info);
    assert_eq!(text(&bytes), "Record ::= {\n  id 3,\n  counter '04030201'H\n}\n");
    for format in FORMATS {
        let back: Record = read_root(format, &write_root(format, &record, info), info);
        assert_eq!(back.id, 3);
        assert_eq!(back.counter.get::<u32>(), Some(&0x0102_0304), "{format}");
    }
    assert_eq!(counter().create().get::<u32>(), Some(&0));
}

#[test]
fn test_old_asn_faults() {
    let info = Record::type_info();
    let data = "Record ::= {\n  id 3,\n  counter '0102'H\n}\n";
    let mut input = ObjectIStream::from_bytes(DataFormat::AsnText, data.as_bytes().to_vec());
    let mut record = Record::default();
    let err = input.read_root(&mut record, info).unwrap_err();
    assert!(matches!(err, Error::ReadFault(_)), "{err}");

    let mut out = ObjectOStream::new(DataFormat::AsnText);
    let err = out.write_root(&Record::default(), info).unwrap_err();
    assert!(matches!(err, Error::WriteFault(_)), "{err}");

    let record = Record {
        id: 1,
        counter: counter().create(),
    };
    let bytes = write_root(DataFormat::AsnText, &record, info);
    let mut input = ObjectIStream::from_bytes(DataFormat::AsnText, bytes);
    let err = input.skip_root(info).unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)), "{err}");
    assert!(err.to_string().contains("cannot skip OldAsn"));
}

#[test]
fn test_legacy_names_are_unique() {
    qualifier();
    let err = LegacyChoiceTypeInfo::new("Gb-qual", &[("x", None)]).unwrap_err();
    assert!(matches!(err, Error::IncompatibleType(_)), "{err}");
    counter();
    let procs = AsnProcs {
        new: || Box::new(()) as Box<dyn Any>,
        free: drop,
        read: |_: &mut AsnIo| None,
        write: |_: &dyn Any, _: &mut AsnIo| false,
    };
    assert!(OldAsnTypeInfo::new("Old-counter", procs).is_err());
}
