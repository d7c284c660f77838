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

//! XML encoding. Every root object is a separate document:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <Person>
//!   <name>Ada</name>
//!   <scores>
//!     <scores_E>1</scores_E>
//!     <scores_E>2</scores_E>
//!   </scores>
//! </Person>
//! ```
//!
//! Pointers use the reserved elements `<_null/>`, `<_ref id="N"/>` and
//! `<_object type="T">...</_object>`.

use crate::buffer::Writer;
use crate::error::Error;
use crate::format::{FormatReader, FormatWriter};
use crate::meta::{
    xml_name, ChoiceInfo, ClassInfo, ContainerInfo, EnumValues, MemberInfo, TypeInfo, VariantInfo,
};
use crate::types::{DataFormat, RawPointerToken};

const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";
const NULL_TAG: &str = "_null";
const REF_TAG: &str = "_ref";
const OBJECT_TAG: &str = "_object";

const CHAR_TAG: &str = "_char";

/// Characters XML 1.0 cannot carry, not even as character references.
fn is_forbidden(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}')
}

/// Escapes element text. Forbidden characters become `<_char code="N"/>`
/// elements that the reader folds back into the text.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\r' => out.push_str("&#xD;"),
            c if is_forbidden(c) => {
                out.push_str(&format!("<{CHAR_TAG} code=\"{}\"/>", u32::from(c)))
            }
            _ => out.push(c),
        }
    }
    out
}

/// Escapes an attribute value. Attribute whitespace other than a space is
/// normalized by parsers, so it is written as character references.
fn escape_attr(value: &str) -> Result<String, Error> {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            c if is_forbidden(c) => {
                return Err(Error::write_fault(format!(
                    "character {c:?} cannot be written in an XML attribute"
                )))
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}

fn render_attrs(attrs: &[(&str, &str)]) -> Result<String, Error> {
    let mut out = String::new();
    for (name, value) in attrs {
        out.push_str(&format!(" {name}=\"{}\"", escape_attr(value)?));
    }
    Ok(out)
}

struct OpenElement {
    tag: String,
    has_children: bool,
}

pub struct XmlWriter {
    buf: Writer,
    indent: usize,
    open: Vec<OpenElement>,
}

impl XmlWriter {
    pub fn new(indent: usize) -> Self {
        XmlWriter {
            buf: Writer::default(),
            indent,
            open: Vec::new(),
        }
    }

    fn start_child(&mut self) {
        if let Some(parent) = self.open.last_mut() {
            parent.has_children = true;
            self.newline(self.open.len());
        }
    }

    fn newline(&mut self, level: usize) {
        self.buf.write_u8(b'\n');
        for _ in 0..level * self.indent {
            self.buf.write_u8(b' ');
        }
    }

    fn open_element(&mut self, tag: String, attrs: &[(&str, &str)]) -> Result<(), Error> {
        let attrs = render_attrs(attrs)?;
        self.start_child();
        self.buf.write_u8(b'<');
        self.buf.write_str(&tag);
        self.buf.write_str(&attrs);
        self.buf.write_u8(b'>');
        self.open.push(OpenElement {
            tag,
            has_children: false,
        });
        Ok(())
    }

    fn empty_element(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<(), Error> {
        let attrs = render_attrs(attrs)?;
        self.start_child();
        self.buf.write_u8(b'<');
        self.buf.write_str(tag);
        self.buf.write_str(&attrs);
        self.buf.write_str("/>");
        Ok(())
    }

    fn close_element(&mut self) -> Result<(), Error> {
        let element = self
            .open
            .pop()
            .ok_or_else(|| Error::invalid_data("unbalanced XML element"))?;
        if element.has_children {
            self.newline(self.open.len());
        }
        self.buf.write_str(&format!("</{}>", element.tag));
        Ok(())
    }

    fn text(&mut self, text: &str) {
        self.buf.write_str(&escape(text));
    }
}

impl FormatWriter for XmlWriter {
    fn data_format(&self) -> DataFormat {
        DataFormat::Xml
    }

    fn buffer(&mut self) -> &mut Writer {
        &mut self.buf
    }

    fn buffer_ref(&self) -> &Writer {
        &self.buf
    }

    fn begin_named_type(&mut self, type_info: &'static TypeInfo) -> Result<(), Error> {
        self.buf.write_str(XML_HEADER);
        self.buf.write_u8(b'\n');
        self.open_element(xml_name(type_info.name()), &[])
    }

    fn end_named_type(&mut self) -> Result<(), Error> {
        self.close_element()
    }

    fn write_bool(&mut self, value: bool) -> Result<(), Error> {
        self.text(if value { "true" } else { "false" });
        Ok(())
    }

    fn write_i64(&mut self, value: i64) -> Result<(), Error> {
        self.text(&value.to_string());
        Ok(())
    }

    fn write_u64(&mut self, value: u64) -> Result<(), Error> {
        self.text(&value.to_string());
        Ok(())
    }

    fn write_f64(&mut self, value: f64) -> Result<(), Error> {
        if value.is_nan() {
            self.text("NaN");
        } else if value.is_infinite() {
            self.text(if value > 0.0 { "INF" } else { "-INF" });
        } else {
            self.text(&format!("{value:?}"));
        }
        Ok(())
    }

    fn write_str(&mut self, value: &str) -> Result<(), Error> {
        self.text(value);
        Ok(())
    }

    fn write_null(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn write_enum(&mut self, values: &EnumValues, value: i64) -> Result<bool, Error> {
        match values.find_name(value) {
            Some(name) => {
                self.text(name);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn begin_bytes(&mut self, _len: usize) -> Result<(), Error> {
        Ok(())
    }

    fn write_bytes_chunk(&mut self, chunk: &[u8]) -> Result<(), Error> {
        for byte in chunk {
            self.buf.write_str(&format!("{byte:02X}"));
        }
        Ok(())
    }

    fn end_bytes(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn begin_class(&mut self, _type_info: &'static TypeInfo, _class: &ClassInfo) -> Result<(), Error> {
        Ok(())
    }

    fn end_class(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn begin_class_member(&mut self, member: &MemberInfo) -> Result<(), Error> {
        self.open_element(xml_name(member.name()), &[])
    }

    fn end_class_member(&mut self) -> Result<(), Error> {
        self.close_element()
    }

    fn begin_container(
        &mut self,
        _type_info: &'static TypeInfo,
        _container: &ContainerInfo,
    ) -> Result<(), Error> {
        Ok(())
    }

    fn end_container(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn begin_container_element(&mut self, _element_type: &'static TypeInfo) -> Result<(), Error> {
        let tag = match self.open.last() {
            Some(parent) => format!("{}_E", parent.tag),
            None => "E".to_string(),
        };
        self.open_element(tag, &[])
    }

    fn end_container_element(&mut self) -> Result<(), Error> {
        self.close_element()
    }

    fn begin_choice_variant(&mut self, variant: &VariantInfo) -> Result<(), Error> {
        self.open_element(xml_name(variant.name()), &[])
    }

    fn end_choice_variant(&mut self) -> Result<(), Error> {
        self.close_element()
    }

    fn write_null_pointer(&mut self) -> Result<(), Error> {
        self.empty_element(NULL_TAG, &[])
    }

    fn write_object_reference(&mut self, index: u32) -> Result<(), Error> {
        self.empty_element(REF_TAG, &[("id", &index.to_string())])
    }

    fn begin_other_pointer(&mut self, type_info: &'static TypeInfo) -> Result<(), Error> {
        self.open_element(OBJECT_TAG.to_string(), &[("type", type_info.name())])
    }

    fn end_other_pointer(&mut self) -> Result<(), Error> {
        self.close_element()
    }

    fn end_of_write(&mut self) -> Result<(), Error> {
        self.buf.write_u8(b'\n');
        Ok(())
    }
}

/// Element of a parsed document, owned so that no borrow of the input
/// outlives a root read.
#[derive(Debug, Default)]
struct XmlNode {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<usize>,
}

impl XmlNode {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

struct Cursor {
    node: usize,
    next_child: usize,
}

pub struct XmlReader {
    data: String,
    pos: usize,
    decode_error: Option<String>,
    document: usize,
    nodes: Vec<XmlNode>,
    stack: Vec<Cursor>,
    bytes: Vec<u8>,
    bytes_pos: usize,
}

fn build_tree(node: roxmltree::Node<'_, '_>, nodes: &mut Vec<XmlNode>) -> Result<usize, Error> {
    let index = nodes.len();
    nodes.push(XmlNode {
        name: node.tag_name().name().to_string(),
        attrs: node
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect(),
        ..XmlNode::default()
    });
    let mut text = String::new();
    let mut children = Vec::new();
    for child in node.children() {
        if child.is_element() && child.tag_name().name() == CHAR_TAG {
            text.push(decode_char(child)?);
        } else if child.is_element() {
            children.push(build_tree(child, nodes)?);
        } else if child.is_text() {
            text.push_str(child.text().unwrap_or_default());
        }
    }
    nodes[index].text = text;
    nodes[index].children = children;
    Ok(index)
}

fn decode_char(node: roxmltree::Node<'_, '_>) -> Result<char, Error> {
    node.attribute("code")
        .and_then(|code| code.parse::<u32>().ok())
        .and_then(char::from_u32)
        .ok_or_else(|| Error::invalid_data(format!("invalid <{CHAR_TAG}> element")))
}

fn parse_hex(text: &str) -> Result<Vec<u8>, Error> {
    let digits: Vec<u8> = text.bytes().filter(|c| !c.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err(Error::invalid_data("odd number of hex digits"));
    }
    digits
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| Error::invalid_data("invalid hex digits"))
        })
        .collect()
}

impl XmlReader {
    pub fn new(data: Vec<u8>) -> Self {
        let (data, decode_error) = match String::from_utf8(data) {
            Ok(text) => (text, None),
            Err(e) => (String::new(), Some(e.to_string())),
        };
        XmlReader {
            data,
            pos: 0,
            decode_error,
            document: 0,
            nodes: Vec::new(),
            stack: Vec::new(),
            bytes: Vec::new(),
            bytes_pos: 0,
        }
    }

    fn top(&self) -> Result<&Cursor, Error> {
        self.stack
            .last()
            .ok_or_else(|| Error::invalid_data("no open XML element"))
    }

    fn node(&self, index: usize) -> &XmlNode {
        &self.nodes[index]
    }

    fn peek_child(&self) -> Result<Option<usize>, Error> {
        let top = self.top()?;
        Ok(self.node(top.node).children.get(top.next_child).copied())
    }

    fn advance(&mut self) {
        if let Some(top) = self.stack.last_mut() {
            top.next_child += 1;
        }
    }

    fn enter(&mut self, child: usize) {
        self.advance();
        self.stack.push(Cursor {
            node: child,
            next_child: 0,
        });
    }

    fn leave(&mut self) -> Result<(), Error> {
        self.stack
            .pop()
            .map(|_| ())
            .ok_or_else(|| Error::invalid_data("unbalanced XML element"))
    }

    fn text(&self) -> Result<&str, Error> {
        let top = self.top()?;
        Ok(&self.node(top.node).text)
    }

    fn trimmed_text(&self) -> Result<String, Error> {
        Ok(self.text()?.trim().to_string())
    }
}

impl FormatReader for XmlReader {
    fn data_format(&self) -> DataFormat {
        DataFormat::Xml
    }

    fn location(&self) -> String {
        match self.stack.last() {
            Some(top) => format!("document {} element <{}>", self.document, self.node(top.node).name),
            None => format!("document {}", self.document),
        }
    }

    fn has_more_data(&mut self) -> bool {
        !self.data[self.pos..].trim().is_empty()
    }

    fn begin_named_type(&mut self) -> Result<Option<String>, Error> {
        if let Some(e) = &self.decode_error {
            return Err(Error::invalid_data(format!("invalid UTF-8 in XML input: {e}")));
        }
        let rest = &self.data[self.pos..];
        let start = rest
            .find("<?xml")
            .ok_or_else(|| Error::invalid_data("XML declaration expected"))?;
        let end = rest[start + 5..]
            .find("<?xml")
            .map_or(rest.len(), |n| start + 5 + n);
        let doc = roxmltree::Document::parse(&rest[start..end])
            .map_err(|e| Error::invalid_data(format!("malformed XML: {e}")))?;
        let mut nodes = Vec::new();
        let root = build_tree(doc.root_element(), &mut nodes)?;
        let label = nodes[root].name.clone();
        self.pos += end;
        self.document += 1;
        self.nodes = nodes;
        self.stack.clear();
        self.stack.push(Cursor {
            node: root,
            next_child: 0,
        });
        Ok(Some(label))
    }

    fn end_named_type(&mut self) -> Result<(), Error> {
        self.leave()
    }

    fn read_bool(&mut self) -> Result<bool, Error> {
        match self.trimmed_text()?.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(Error::invalid_data(format!("boolean expected, found {other:?}"))),
        }
    }

    fn read_i64(&mut self) -> Result<i64, Error> {
        let text = self.trimmed_text()?;
        text.parse()
            .map_err(|_| Error::overflow(format!("{text:?} is not an i64")))
    }

    fn read_u64(&mut self) -> Result<u64, Error> {
        let text = self.trimmed_text()?;
        text.parse()
            .map_err(|_| Error::overflow(format!("{text:?} is not a u64")))
    }

    fn read_f64(&mut self) -> Result<f64, Error> {
        let text = self.trimmed_text()?;
        match text.as_str() {
            "INF" => Ok(f64::INFINITY),
            "-INF" => Ok(f64::NEG_INFINITY),
            "NaN" => Ok(f64::NAN),
            _ => text
                .parse()
                .map_err(|_| Error::invalid_data(format!("invalid real {text:?}"))),
        }
    }

    fn read_string(&mut self) -> Result<String, Error> {
        self.text().map(str::to_string)
    }

    fn read_null(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn read_enum(&mut self, values: &EnumValues) -> Result<i64, Error> {
        let text = self.trimmed_text()?;
        if let Some(value) = values.find_value(&text) {
            return Ok(value);
        }
        text.parse()
            .map_err(|_| Error::unknown_enum(format!("unknown enumerated value {text}")))
    }

    fn begin_bytes(&mut self) -> Result<Option<usize>, Error> {
        self.bytes = parse_hex(self.text()?)?;
        self.bytes_pos = 0;
        Ok(Some(self.bytes.len()))
    }

    fn read_bytes_chunk(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let n = buf.len().min(self.bytes.len() - self.bytes_pos);
        buf[..n].copy_from_slice(&self.bytes[self.bytes_pos..self.bytes_pos + n]);
        self.bytes_pos += n;
        Ok(n)
    }

    fn end_bytes(&mut self) -> Result<(), Error> {
        self.bytes.clear();
        self.bytes_pos = 0;
        Ok(())
    }

    fn begin_class(&mut self, _type_info: &'static TypeInfo, _class: &ClassInfo) -> Result<(), Error> {
        self.top().map(|_| ())
    }

    fn begin_class_member(
        &mut self,
        type_info: &'static TypeInfo,
        class: &ClassInfo,
    ) -> Result<Option<usize>, Error> {
        let Some(child) = self.peek_child()? else {
            return Ok(None);
        };
        let name = &self.node(child).name;
        let member = class
            .find_member(name)
            .or_else(|| class.members().iter().find(|m| xml_name(m.name()) == *name))
            .ok_or_else(|| {
                Error::unknown_member(format!("unknown member {name} of {}", type_info.name()))
            })?;
        let index = member.index();
        self.enter(child);
        Ok(Some(index))
    }

    fn end_class_member(&mut self) -> Result<(), Error> {
        self.leave()
    }

    fn end_class(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn begin_container(
        &mut self,
        _type_info: &'static TypeInfo,
        _container: &ContainerInfo,
    ) -> Result<(), Error> {
        self.top().map(|_| ())
    }

    fn begin_container_element(&mut self, _element_type: &'static TypeInfo) -> Result<bool, Error> {
        match self.peek_child()? {
            Some(child) => {
                self.enter(child);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn end_container_element(&mut self) -> Result<(), Error> {
        self.leave()
    }

    fn end_container(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn begin_choice_variant(
        &mut self,
        type_info: &'static TypeInfo,
        choice: &ChoiceInfo,
    ) -> Result<usize, Error> {
        let child = self.peek_child()?.ok_or_else(|| {
            Error::invalid_data(format!("variant of {} expected", type_info.name()))
        })?;
        let name = &self.node(child).name;
        let variant = choice
            .find_variant(name)
            .or_else(|| choice.variants().iter().find(|v| xml_name(v.name()) == *name))
            .ok_or_else(|| {
                Error::unknown_member(format!("unknown variant {name} of {}", type_info.name()))
            })?;
        let index = variant.index();
        self.enter(child);
        Ok(index)
    }

    fn end_choice_variant(&mut self) -> Result<(), Error> {
        self.leave()
    }

    fn read_pointer_token(&mut self) -> Result<RawPointerToken, Error> {
        let Some(child) = self.peek_child()? else {
            return Ok(RawPointerToken::This);
        };
        let node = self.node(child);
        match node.name.as_str() {
            NULL_TAG => {
                self.advance();
                Ok(RawPointerToken::Null)
            }
            REF_TAG => {
                let id = node
                    .attr("id")
                    .ok_or_else(|| Error::invalid_data("<_ref> without id"))?;
                let index = id
                    .parse()
                    .map_err(|_| Error::invalid_data(format!("invalid object index {id:?}")))?;
                self.advance();
                Ok(RawPointerToken::Reference(index))
            }
            OBJECT_TAG => {
                let type_name = node
                    .attr("type")
                    .ok_or_else(|| Error::invalid_data("<_object> without type"))?
                    .to_string();
                self.enter(child);
                Ok(RawPointerToken::Other(type_name))
            }
            _ => Ok(RawPointerToken::This),
        }
    }

    fn end_other_pointer(&mut self) -> Result<(), Error> {
        self.leave()
    }

    fn end_of_read(&mut self) -> Result<(), Error> {
        self.nodes.clear();
        self.stack.clear();
        Ok(())
    }
}
