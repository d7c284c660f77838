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

//! ASN.1 value notation.
//!
//! ```text
//! Person ::= {
//!   name "Ada",
//!   scores { 1, 2 },
//!   height { 1755, 10, -3 }
//! }
//! ```

use crate::buffer::Writer;
use crate::error::Error;
use crate::format::{FormatReader, FormatWriter};
use crate::meta::{ChoiceInfo, ClassInfo, ContainerInfo, EnumValues, MemberInfo, TypeInfo, VariantInfo};
use crate::types::{DataFormat, RawPointerToken};

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Splits a finite real into an integer mantissa and a base 10 exponent
/// that reproduce it exactly.
pub(crate) fn decimal_parts(value: f64) -> (String, i64) {
    let text = format!("{value:e}");
    let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
    let mut exponent: i64 = exponent.parse().unwrap_or(0);
    let digits = match mantissa.split_once('.') {
        Some((int, frac)) => {
            exponent -= frac.len() as i64;
            format!("{int}{frac}")
        }
        None => mantissa.to_string(),
    };
    (digits, exponent)
}

pub struct AsnTextWriter {
    buf: Writer,
    indent: usize,
    level: usize,
    /// Per open block: whether an element was written.
    blocks: Vec<bool>,
}

impl AsnTextWriter {
    pub fn new(indent: usize) -> Self {
        AsnTextWriter {
            buf: Writer::default(),
            indent,
            level: 0,
            blocks: Vec::new(),
        }
    }

    fn newline(&mut self) {
        self.buf.write_u8(b'\n');
        for _ in 0..self.level * self.indent {
            self.buf.write_u8(b' ');
        }
    }

    fn open_block(&mut self) {
        self.buf.write_u8(b'{');
        self.level += 1;
        self.blocks.push(false);
    }

    fn next_element(&mut self) {
        if let Some(has_elements) = self.blocks.last_mut() {
            if *has_elements {
                self.buf.write_u8(b',');
            }
            *has_elements = true;
        }
        self.newline();
    }

    fn close_block(&mut self) -> Result<(), Error> {
        let has_elements = self
            .blocks
            .pop()
            .ok_or_else(|| Error::invalid_data("unbalanced block"))?;
        self.level = self.level.saturating_sub(1);
        if has_elements {
            self.newline();
            self.buf.write_u8(b'}');
        } else {
            self.buf.write_str(" }");
        }
        Ok(())
    }
}

impl FormatWriter for AsnTextWriter {
    fn data_format(&self) -> DataFormat {
        DataFormat::AsnText
    }

    fn buffer(&mut self) -> &mut Writer {
        &mut self.buf
    }

    fn buffer_ref(&self) -> &Writer {
        &self.buf
    }

    fn begin_named_type(&mut self, type_info: &'static TypeInfo) -> Result<(), Error> {
        self.buf.write_str(type_info.name());
        self.buf.write_str(" ::= ");
        Ok(())
    }

    fn write_bool(&mut self, value: bool) -> Result<(), Error> {
        self.buf.write_str(if value { "TRUE" } else { "FALSE" });
        Ok(())
    }

    fn write_i64(&mut self, value: i64) -> Result<(), Error> {
        self.buf.write_str(&value.to_string());
        Ok(())
    }

    fn write_u64(&mut self, value: u64) -> Result<(), Error> {
        self.buf.write_str(&value.to_string());
        Ok(())
    }

    fn write_f64(&mut self, value: f64) -> Result<(), Error> {
        if value.is_nan() {
            self.buf.write_str("NOT-A-NUMBER");
        } else if value.is_infinite() {
            self.buf.write_str(if value > 0.0 {
                "PLUS-INFINITY"
            } else {
                "MINUS-INFINITY"
            });
        } else {
            let (mantissa, exponent) = decimal_parts(value);
            self.buf
                .write_str(&format!("{{ {mantissa}, 10, {exponent} }}"));
        }
        Ok(())
    }

    fn write_str(&mut self, value: &str) -> Result<(), Error> {
        self.buf.write_u8(b'"');
        self.buf.write_str(&value.replace('"', "\"\""));
        self.buf.write_u8(b'"');
        Ok(())
    }

    fn write_null(&mut self) -> Result<(), Error> {
        self.buf.write_str("NULL");
        Ok(())
    }

    fn write_enum(&mut self, values: &EnumValues, value: i64) -> Result<bool, Error> {
        match values.find_name(value) {
            Some(name) => {
                self.buf.write_str(name);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn begin_bytes(&mut self, _len: usize) -> Result<(), Error> {
        self.buf.write_u8(b'\'');
        Ok(())
    }

    fn write_bytes_chunk(&mut self, chunk: &[u8]) -> Result<(), Error> {
        for byte in chunk {
            self.buf.write_u8(HEX[(byte >> 4) as usize]);
            self.buf.write_u8(HEX[(byte & 0x0f) as usize]);
        }
        Ok(())
    }

    fn end_bytes(&mut self) -> Result<(), Error> {
        self.buf.write_str("'H");
        Ok(())
    }

    fn begin_class(&mut self, _type_info: &'static TypeInfo, _class: &ClassInfo) -> Result<(), Error> {
        self.open_block();
        Ok(())
    }

    fn end_class(&mut self) -> Result<(), Error> {
        self.close_block()
    }

    fn begin_class_member(&mut self, member: &MemberInfo) -> Result<(), Error> {
        self.next_element();
        self.buf.write_str(member.name());
        self.buf.write_u8(b' ');
        Ok(())
    }

    fn end_class_member(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn begin_container(
        &mut self,
        _type_info: &'static TypeInfo,
        _container: &ContainerInfo,
    ) -> Result<(), Error> {
        self.open_block();
        Ok(())
    }

    fn end_container(&mut self) -> Result<(), Error> {
        self.close_block()
    }

    fn begin_container_element(&mut self, _element_type: &'static TypeInfo) -> Result<(), Error> {
        self.next_element();
        Ok(())
    }

    fn end_container_element(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn begin_choice_variant(&mut self, variant: &VariantInfo) -> Result<(), Error> {
        self.buf.write_str(variant.name());
        self.buf.write_u8(b' ');
        Ok(())
    }

    fn end_choice_variant(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn write_null_pointer(&mut self) -> Result<(), Error> {
        self.write_null()
    }

    fn write_object_reference(&mut self, index: u32) -> Result<(), Error> {
        self.buf.write_str(&format!("@{index}"));
        Ok(())
    }

    fn begin_other_pointer(&mut self, type_info: &'static TypeInfo) -> Result<(), Error> {
        self.buf.write_u8(b':');
        self.write_str(type_info.name())?;
        self.buf.write_u8(b' ');
        Ok(())
    }

    fn end_other_pointer(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn end_of_write(&mut self) -> Result<(), Error> {
        self.buf.write_u8(b'\n');
        Ok(())
    }
}

pub struct AsnTextReader {
    data: Vec<u8>,
    pos: usize,
    line: usize,
    /// Per open block: whether no element was read yet.
    blocks: Vec<bool>,
    bytes: Vec<u8>,
    bytes_pos: usize,
}

fn is_identifier_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'_'
}

impl AsnTextReader {
    pub fn new(data: Vec<u8>) -> Self {
        AsnTextReader {
            data,
            pos: 0,
            line: 1,
            blocks: Vec::new(),
            bytes: Vec::new(),
            bytes_pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Skips whitespace and `--` comments. A comment ends at the end of
    /// the line or at the next `--`.
    fn skip_ws(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_whitespace() => {
                    self.bump();
                }
                Some(b'-') if self.data.get(self.pos + 1) == Some(&b'-') => {
                    self.pos += 2;
                    loop {
                        match self.peek() {
                            None | Some(b'\n') => break,
                            Some(b'-') if self.data.get(self.pos + 1) == Some(&b'-') => {
                                self.pos += 2;
                                break;
                            }
                            Some(_) => {
                                self.pos += 1;
                            }
                        }
                    }
                }
                _ => return,
            }
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        match self.peek() {
            Some(c) => Error::invalid_data(format!(
                "{expected} expected, found '{}'",
                char::from(c)
            )),
            None => Error::invalid_data(format!("{expected} expected, found end of input")),
        }
    }

    fn expect(&mut self, c: u8) -> Result<(), Error> {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.bump();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", char::from(c))))
        }
    }

    fn peek_identifier(&mut self) -> Option<&str> {
        self.skip_ws();
        let start = self.pos;
        if !self.peek()?.is_ascii_alphabetic() {
            return None;
        }
        let mut end = start;
        while end < self.data.len() && is_identifier_char(self.data[end]) {
            end += 1;
        }
        std::str::from_utf8(&self.data[start..end]).ok()
    }

    fn read_identifier(&mut self) -> Result<String, Error> {
        let ident = self
            .peek_identifier()
            .map(str::to_string)
            .ok_or_else(|| self.unexpected("identifier"))?;
        self.pos += ident.len();
        Ok(ident)
    }

    fn read_number_text(&mut self) -> Result<String, Error> {
        self.skip_ws();
        let start = self.pos;
        if matches!(self.peek(), Some(b'-') | Some(b'+')) {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == start || !self.data[self.pos - 1].is_ascii_digit() {
            self.pos = start;
            return Err(self.unexpected("number"));
        }
        Ok(String::from_utf8_lossy(&self.data[start..self.pos]).into_owned())
    }

    fn read_quoted(&mut self) -> Result<String, Error> {
        self.expect(b'"')?;
        let mut out = Vec::new();
        loop {
            match self.bump() {
                None => return Err(Error::invalid_data("unterminated string")),
                Some(b'"') if self.peek() == Some(b'"') => {
                    self.bump();
                    out.push(b'"');
                }
                Some(b'"') => break,
                Some(c) => out.push(c),
            }
        }
        String::from_utf8(out).map_err(|e| Error::invalid_data(format!("invalid UTF-8 string: {e}")))
    }

    fn block_first(&mut self) -> Result<bool, Error> {
        let first = self
            .blocks
            .last_mut()
            .ok_or_else(|| Error::invalid_data("element outside of a block"))?;
        Ok(std::mem::replace(first, false))
    }

    /// Moves to the next element of the open block; false at its end.
    fn next_element(&mut self) -> Result<bool, Error> {
        self.skip_ws();
        if self.peek() == Some(b'}') {
            return Ok(false);
        }
        if !self.block_first()? {
            self.expect(b',')?;
        }
        Ok(true)
    }

    fn close_block(&mut self) -> Result<(), Error> {
        self.blocks.pop();
        self.expect(b'}')
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl FormatReader for AsnTextReader {
    fn data_format(&self) -> DataFormat {
        DataFormat::AsnText
    }

    fn location(&self) -> String {
        format!("line {}", self.line)
    }

    fn has_more_data(&mut self) -> bool {
        self.skip_ws();
        self.pos < self.data.len()
    }

    fn begin_named_type(&mut self) -> Result<Option<String>, Error> {
        self.skip_ws();
        let rest = &self.data[self.pos..];
        let at = rest
            .windows(3)
            .position(|w| w == b"::=")
            .ok_or_else(|| Error::invalid_data("'::=' expected after type name"))?;
        let label = String::from_utf8_lossy(&rest[..at]).trim().to_string();
        for _ in 0..at + 3 {
            self.bump();
        }
        Ok(Some(label))
    }

    fn read_bool(&mut self) -> Result<bool, Error> {
        match self.read_identifier()?.as_str() {
            "TRUE" => Ok(true),
            "FALSE" => Ok(false),
            other => Err(Error::invalid_data(format!(
                "TRUE or FALSE expected, found {other}"
            ))),
        }
    }

    fn read_i64(&mut self) -> Result<i64, Error> {
        let text = self.read_number_text()?;
        text.parse()
            .map_err(|_| Error::overflow(format!("{text} does not fit i64")))
    }

    fn read_u64(&mut self) -> Result<u64, Error> {
        let text = self.read_number_text()?;
        text.parse()
            .map_err(|_| Error::overflow(format!("{text} does not fit u64")))
    }

    fn read_f64(&mut self) -> Result<f64, Error> {
        self.skip_ws();
        if self.peek() == Some(b'{') {
            self.bump();
            let mantissa = self.read_number_text()?;
            self.expect(b',')?;
            let base = self.read_number_text()?;
            if base != "10" {
                return Err(Error::invalid_data(format!("real base {base} not supported")));
            }
            self.expect(b',')?;
            let exponent = self.read_number_text()?;
            self.expect(b'}')?;
            let text = format!("{mantissa}e{exponent}");
            return text
                .parse()
                .map_err(|_| Error::invalid_data(format!("invalid real {text}")));
        }
        if let Some(ident) = self.peek_identifier() {
            let value = match ident {
                "PLUS-INFINITY" => f64::INFINITY,
                "MINUS-INFINITY" => f64::NEG_INFINITY,
                "NOT-A-NUMBER" => f64::NAN,
                other => {
                    return Err(Error::invalid_data(format!("real expected, found {other}")))
                }
            };
            let len = ident.len();
            self.pos += len;
            return Ok(value);
        }
        let text = self.read_number_text()?;
        text.parse()
            .map_err(|_| Error::invalid_data(format!("invalid real {text}")))
    }

    fn read_string(&mut self) -> Result<String, Error> {
        self.read_quoted()
    }

    fn read_null(&mut self) -> Result<(), Error> {
        match self.read_identifier()?.as_str() {
            "NULL" => Ok(()),
            other => Err(Error::invalid_data(format!("NULL expected, found {other}"))),
        }
    }

    fn read_enum(&mut self, values: &EnumValues) -> Result<i64, Error> {
        match self.peek_identifier().map(str::to_string) {
            Some(ident) => {
                self.pos += ident.len();
                values
                    .find_value(&ident)
                    .ok_or_else(|| Error::unknown_enum(format!("unknown enumerated value {ident}")))
            }
            None => self.read_i64(),
        }
    }

    fn skip_enum(&mut self, _values: &EnumValues) -> Result<(), Error> {
        if self.peek_identifier().is_some() {
            self.read_identifier().map(|_| ())
        } else {
            self.read_i64().map(|_| ())
        }
    }

    fn begin_bytes(&mut self) -> Result<Option<usize>, Error> {
        self.expect(b'\'')?;
        let mut bytes = Vec::new();
        let mut high: Option<u8> = None;
        loop {
            match self.bump() {
                None => return Err(Error::invalid_data("unterminated octet string")),
                Some(b'\'') => break,
                Some(c) if c.is_ascii_whitespace() => {}
                Some(c) => {
                    let nibble = hex_value(c).ok_or_else(|| {
                        Error::invalid_data(format!("invalid hex digit '{}'", char::from(c)))
                    })?;
                    match high.take() {
                        Some(h) => bytes.push((h << 4) | nibble),
                        None => high = Some(nibble),
                    }
                }
            }
        }
        if let Some(h) = high {
            bytes.push(h << 4);
        }
        if self.bump() != Some(b'H') {
            return Err(Error::invalid_data("'H' expected after octet string"));
        }
        self.bytes = bytes;
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
        self.expect(b'{')?;
        self.blocks.push(true);
        Ok(())
    }

    fn begin_class_member(
        &mut self,
        type_info: &'static TypeInfo,
        class: &ClassInfo,
    ) -> Result<Option<usize>, Error> {
        if !self.next_element()? {
            return Ok(None);
        }
        let name = self.read_identifier()?;
        class
            .find_member(&name)
            .map(|member| Some(member.index()))
            .ok_or_else(|| {
                Error::unknown_member(format!("unknown member {name} of {}", type_info.name()))
            })
    }

    fn end_class_member(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn end_class(&mut self) -> Result<(), Error> {
        self.close_block()
    }

    fn begin_container(
        &mut self,
        _type_info: &'static TypeInfo,
        _container: &ContainerInfo,
    ) -> Result<(), Error> {
        self.expect(b'{')?;
        self.blocks.push(true);
        Ok(())
    }

    fn begin_container_element(&mut self, _element_type: &'static TypeInfo) -> Result<bool, Error> {
        self.next_element()
    }

    fn end_container_element(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn end_container(&mut self) -> Result<(), Error> {
        self.close_block()
    }

    fn begin_choice_variant(
        &mut self,
        type_info: &'static TypeInfo,
        choice: &ChoiceInfo,
    ) -> Result<usize, Error> {
        let name = self.read_identifier()?;
        choice
            .find_variant(&name)
            .map(|variant| variant.index())
            .ok_or_else(|| {
                Error::unknown_member(format!("unknown variant {name} of {}", type_info.name()))
            })
    }

    fn end_choice_variant(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn read_pointer_token(&mut self) -> Result<RawPointerToken, Error> {
        self.skip_ws();
        match self.peek() {
            Some(b'@') => {
                self.bump();
                let text = self.read_number_text()?;
                let index = text
                    .parse()
                    .map_err(|_| Error::invalid_data(format!("invalid object index @{text}")))?;
                Ok(RawPointerToken::Reference(index))
            }
            Some(b':') => {
                self.bump();
                Ok(RawPointerToken::Other(self.read_quoted()?))
            }
            _ if self.peek_identifier() == Some("NULL") => {
                self.pos += 4;
                Ok(RawPointerToken::Null)
            }
            _ => Ok(RawPointerToken::This),
        }
    }

    fn end_other_pointer(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn capture_start(&mut self) -> Result<Option<usize>, Error> {
        self.skip_ws();
        Ok(Some(self.pos))
    }

    fn captured(&self, start: usize) -> Result<Vec<u8>, Error> {
        Ok(self.data[start.min(self.pos)..self.pos].to_vec())
    }
}
