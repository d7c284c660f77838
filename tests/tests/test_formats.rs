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

use serial_core::{DataFormat, Error, ObjectIStream, ObjectOStream, ObjectStreamCopier, SerialType};
use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;
use tests::{read_bytes, text, write_bytes, Color, Drawing, Person, Rect, Shape, FORMATS};

fn rect() -> Rect {
    Rect {
        width: 1,
        height: 2,
    }
}

fn drawing() -> Drawing {
    Drawing {
        title: "floor".to_string(),
        color: Color::Green,
        shapes: vec![Shape::Circle(0.25), Shape::Label("hall".to_string())],
    }
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("serial-{}-{name}", std::process::id()))
}

#[derive(Clone, Default)]
struct SharedSink(Rc<RefCell<Vec<u8>>>);

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_asn_text_layout() {
    let bytes = write_bytes(DataFormat::AsnText, &rect());
    assert_eq!(text(&bytes), "Rect ::= {\n  width 1,\n  height 2\n}\n");
    let bytes = write_bytes(DataFormat::AsnText, &drawing());
    assert_eq!(
        text(&bytes),
        "Drawing ::= {\n  title \"floor\",\n  color Green,\n  shapes {\n    circle { 25, 10, -2 },\n    label \"hall\"\n  }\n}\n"
    );
}

#[test]
fn test_asn_binary_layout() {
    let bytes = write_bytes(DataFormat::AsnBinary, &rect());
    assert_eq!(
        bytes,
        [
            0x30, 0x80, 0xa0, 0x80, 0x02, 0x01, 0x01, 0x00, 0x00, 0xa1, 0x80, 0x02, 0x01, 0x02,
            0x00, 0x00, 0x00, 0x00
        ]
    );
}

#[test]
fn test_xml_layout() {
    let bytes = write_bytes(DataFormat::Xml, &rect());
    assert_eq!(
        text(&bytes),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Rect>\n  <width>1</width>\n  <height>2</height>\n</Rect>\n"
    );
    let xml = text(&write_bytes(DataFormat::Xml, &drawing()));
    assert!(xml.contains("<title>floor</title>"), "{xml}");
    assert!(xml.contains("Green"), "{xml}");
    assert!(xml.contains("<label>hall</label>"), "{xml}");
}

#[test]
fn test_xml_escaping() {
    let person = Person {
        name: "<Ada & \"Co\">".to_string(),
        ..Person::default()
    };
    let xml = text(&write_bytes(DataFormat::Xml, &person));
    assert!(xml.contains("&lt;Ada &amp;"), "{xml}");
    let back: Person = read_bytes(DataFormat::Xml, xml.as_bytes());
    assert_eq!(back.name, person.name);

    let person = Person {
        name: "a\r\nb\tc\u{0}d\u{1b}".to_string(),
        ..Person::default()
    };
    let xml = text(&write_bytes(DataFormat::Xml, &person));
    assert!(xml.contains("a&#xD;\nb\tc<_char code=\"0\"/>d<_char code=\"27\"/>"), "{xml}");
    let back: Person = read_bytes(DataFormat::Xml, xml.as_bytes());
    assert_eq!(back.name, person.name);
}

#[test]
fn test_format_names() {
    for format in FORMATS {
        assert_eq!(format.to_string().parse::<DataFormat>().unwrap(), format);
    }
    assert_eq!("ber".parse::<DataFormat>().unwrap(), DataFormat::AsnBinary);
    assert!(matches!("json".parse::<DataFormat>(), Err(Error::Unsupported(_))));
}

#[test]
fn test_files() {
    for format in FORMATS {
        let path = temp_path(&format!("drawing.{format}"));
        let mut out = ObjectOStream::open(&path).unwrap();
        assert_eq!(out.data_format(), format);
        out.write(&drawing()).unwrap();
        out.write(&rect()).unwrap();
        assert!(out.bytes().is_empty());
        out.close().unwrap();

        let mut input = ObjectIStream::open(&path).unwrap();
        assert_eq!(input.read::<Drawing>().unwrap(), drawing());
        assert_eq!(input.read::<Rect>().unwrap(), rect());
        assert!(!input.has_more_data());
        std::fs::remove_file(&path).unwrap();
    }
    let err = ObjectOStream::open(temp_path("drawing.txt")).err().unwrap();
    assert!(matches!(err, Error::Unsupported(_)), "{err}");
    let err = ObjectIStream::open(temp_path("missing.asn")).err().unwrap();
    assert!(matches!(err, Error::Io(_)), "{err}");
}

#[test]
fn test_sink_receives_every_root() {
    let sink = SharedSink::default();
    let mut out = ObjectOStream::new(DataFormat::AsnText).with_sink(sink.clone());
    out.write(&rect()).unwrap();
    assert_eq!(text(&sink.0.borrow()), "Rect ::= {\n  width 1,\n  height 2\n}\n");
    out.write(&rect()).unwrap();
    assert_eq!(sink.0.borrow().len(), 2 * write_bytes(DataFormat::AsnText, &rect()).len());

    let input = ObjectIStream::from_reader(DataFormat::AsnText, &sink.0.borrow()[..]).unwrap();
    let mut input = input;
    assert_eq!(input.read::<Rect>().unwrap(), rect());
}

#[test]
fn test_copier_converts_between_formats() {
    for from in FORMATS {
        for to in FORMATS {
            let mut input = ObjectIStream::from_bytes(from, write_bytes(from, &drawing()));
            let mut out = ObjectOStream::new(to);
            ObjectStreamCopier::new(&mut input, &mut out)
                .copy(Drawing::type_info())
                .unwrap();
            assert_eq!(out.into_bytes(), write_bytes(to, &drawing()), "{from} -> {to}");
        }
    }
}

#[test]
fn test_copy_all_and_copy_any() {
    let mut source = ObjectOStream::new(DataFormat::AsnBinary);
    for id in 0..3 {
        source
            .write(&Rect {
                width: id,
                height: id,
            })
            .unwrap();
    }
    let mut input = ObjectIStream::from_bytes(DataFormat::AsnBinary, source.into_bytes());
    let mut out = ObjectOStream::new(DataFormat::AsnText);
    let copied = ObjectStreamCopier::new(&mut input, &mut out)
        .copy_all(Rect::type_info())
        .unwrap();
    assert_eq!(copied, 3);
    let asn = out.into_bytes();
    assert!(text(&asn).ends_with("Rect ::= {\n  width 2,\n  height 2\n}\n"));

    let mut input = ObjectIStream::from_bytes(DataFormat::AsnText, asn);
    let mut out = ObjectOStream::new(DataFormat::Xml);
    let mut copier = ObjectStreamCopier::new(&mut input, &mut out);
    assert_eq!(copier.copy_any().unwrap().name(), "Rect");
}

#[test]
fn test_facade() {
    let bytes = serial::to_bytes(DataFormat::Xml, &drawing()).unwrap();
    let back: Drawing = serial::from_bytes(DataFormat::Xml, bytes.clone()).unwrap();
    assert_eq!(back, drawing());
    let asn = serial::convert::<Drawing>(DataFormat::Xml, DataFormat::AsnText, bytes).unwrap();
    assert_eq!(asn, write_bytes(DataFormat::AsnText, &drawing()));
}
