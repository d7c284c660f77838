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

//! BER-style tag/length/value encoding.
//!
//! Constructed values (classes, containers, members, variants, other
//! pointers) use the indefinite length form closed by an end-of-contents
//! marker; primitives use definite lengths. Members and variants are tagged
//! `[index]` in the context class.

use crate::buffer::{be_length_size, Reader, Writer};
use crate::error::Error;
use crate::format::{FormatReader, FormatWriter};
use crate::meta::{ChoiceInfo, ClassInfo, ContainerInfo, EnumValues, MemberInfo, TypeInfo, VariantInfo};
use crate::types::{DataFormat, RawPointerToken};

pub const TAG_BOOLEAN: u8 = 0x01;
pub const TAG_INTEGER: u8 = 0x02;
pub const TAG_OCTET_STRING: u8 = 0x04;
pub const TAG_NULL: u8 = 0x05;
pub const TAG_REAL: u8 = 0x09;
pub const TAG_ENUMERATED: u8 = 0x0a;
pub const TAG_UTF8_STRING: u8 = 0x0c;
pub const TAG_SEQUENCE: u8 = 0x30;
pub const TAG_SET: u8 = 0x31;
/// `[APPLICATION 0]` primitive: back-reference to an object index.
pub const TAG_OBJECT_REFERENCE: u8 = 0x40;
/// `[APPLICATION 1]` constructed: type name followed by the object.
pub const TAG_OTHER_POINTER: u8 = 0x61;

const CLASS_CONTEXT: u8 = 0x80;
const CONSTRUCTED: u8 = 0x20;
const INDEFINITE_LENGTH: u8 = 0x80;

const REAL_PLUS_INFINITY: u8 = 0x40;
const REAL_MINUS_INFINITY: u8 = 0x41;
const REAL_NOT_A_NUMBER: u8 = 0x42;
const REAL_MINUS_ZERO: u8 = 0x43;
const REAL_DECIMAL_NR3: u8 = 0x03;

#[derive(Default)]
pub struct AsnBinaryWriter {
    buf: Writer,
}

impl AsnBinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_tag(&mut self, bits: u8, number: u32) {
        if number < 0x1f {
            self.buf.write_u8(bits | number as u8);
            return;
        }
        self.buf.write_u8(bits | 0x1f);
        let mut groups = Vec::new();
        let mut n = number;
        loop {
            groups.push((n & 0x7f) as u8);
            n >>= 7;
            if n == 0 {
                break;
            }
        }
        for (i, group) in groups.iter().rev().enumerate() {
            let more = if i + 1 < groups.len() { 0x80 } else { 0 };
            self.buf.write_u8(group | more);
        }
    }

    fn write_length(&mut self, len: usize) {
        if len < 0x80 {
            self.buf.write_u8(len as u8);
        } else {
            let n = be_length_size(len);
            self.buf.write_u8(0x80 | n as u8);
            self.buf.write_be_length(len, n);
        }
    }

    fn write_primitive(&mut self, tag: u8, content: &[u8]) {
        self.buf.write_u8(tag);
        self.write_length(content.len());
        self.buf.write_bytes(content);
    }

    fn open_constructed(&mut self, tag_bits: u8, number: u32) {
        self.write_tag(tag_bits | CONSTRUCTED, number);
        self.buf.write_u8(INDEFINITE_LENGTH);
    }

    fn write_eoc(&mut self) {
        self.buf.write_bytes(&[0, 0]);
    }

    fn write_integer(&mut self, tag: u8, value: i64) {
        let mut content = Writer::default();
        content.write_be_int(value);
        self.write_primitive(tag, content.as_slice());
    }
}

impl FormatWriter for AsnBinaryWriter {
    fn data_format(&self) -> DataFormat {
        DataFormat::AsnBinary
    }

    fn buffer(&mut self) -> &mut Writer {
        &mut self.buf
    }

    fn buffer_ref(&self) -> &Writer {
        &self.buf
    }

    fn begin_named_type(&mut self, _type_info: &'static TypeInfo) -> Result<(), Error> {
        Ok(())
    }

    fn write_bool(&mut self, value: bool) -> Result<(), Error> {
        self.write_primitive(TAG_BOOLEAN, &[if value { 0xff } else { 0x00 }]);
        Ok(())
    }

    fn write_i64(&mut self, value: i64) -> Result<(), Error> {
        self.write_integer(TAG_INTEGER, value);
        Ok(())
    }

    fn write_u64(&mut self, value: u64) -> Result<(), Error> {
        let mut content = Writer::default();
        content.write_be_uint(value);
        self.write_primitive(TAG_INTEGER, content.as_slice());
        Ok(())
    }

    fn write_f64(&mut self, value: f64) -> Result<(), Error> {
        if value.is_nan() {
            self.write_primitive(TAG_REAL, &[REAL_NOT_A_NUMBER]);
        } else if value.is_infinite() {
            let marker = if value > 0.0 {
                REAL_PLUS_INFINITY
            } else {
                REAL_MINUS_INFINITY
            };
            self.write_primitive(TAG_REAL, &[marker]);
        } else if value == 0.0 {
            if value.is_sign_negative() {
                self.write_primitive(TAG_REAL, &[REAL_MINUS_ZERO]);
            } else {
                self.write_primitive(TAG_REAL, &[]);
            }
        } else {
            let mut content = vec![REAL_DECIMAL_NR3];
            content.extend_from_slice(format!("{value:e}").as_bytes());
            self.write_primitive(TAG_REAL, &content);
        }
        Ok(())
    }

    fn write_str(&mut self, value: &str) -> Result<(), Error> {
        self.write_primitive(TAG_UTF8_STRING, value.as_bytes());
        Ok(())
    }

    fn write_null(&mut self) -> Result<(), Error> {
        self.write_primitive(TAG_NULL, &[]);
        Ok(())
    }

    fn write_enum(&mut self, _values: &EnumValues, value: i64) -> Result<bool, Error> {
        self.write_integer(TAG_ENUMERATED, value);
        Ok(true)
    }

    fn begin_bytes(&mut self, len: usize) -> Result<(), Error> {
        self.buf.write_u8(TAG_OCTET_STRING);
        self.write_length(len);
        Ok(())
    }

    fn write_bytes_chunk(&mut self, chunk: &[u8]) -> Result<(), Error> {
        self.buf.write_bytes(chunk);
        Ok(())
    }

    fn end_bytes(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn begin_class(&mut self, _type_info: &'static TypeInfo, class: &ClassInfo) -> Result<(), Error> {
        let tag = if class.random_order() { TAG_SET } else { TAG_SEQUENCE };
        self.buf.write_u8(tag);
        self.buf.write_u8(INDEFINITE_LENGTH);
        Ok(())
    }

    fn end_class(&mut self) -> Result<(), Error> {
        self.write_eoc();
        Ok(())
    }

    fn begin_class_member(&mut self, member: &MemberInfo) -> Result<(), Error> {
        self.open_constructed(CLASS_CONTEXT, member.index() as u32);
        Ok(())
    }

    fn end_class_member(&mut self) -> Result<(), Error> {
        self.write_eoc();
        Ok(())
    }

    fn begin_container(
        &mut self,
        _type_info: &'static TypeInfo,
        container: &ContainerInfo,
    ) -> Result<(), Error> {
        let tag = if container.random_order() {
            TAG_SET
        } else {
            TAG_SEQUENCE
        };
        self.buf.write_u8(tag);
        self.buf.write_u8(INDEFINITE_LENGTH);
        Ok(())
    }

    fn end_container(&mut self) -> Result<(), Error> {
        self.write_eoc();
        Ok(())
    }

    fn begin_container_element(&mut self, _element_type: &'static TypeInfo) -> Result<(), Error> {
        Ok(())
    }

    fn end_container_element(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn begin_choice_variant(&mut self, variant: &VariantInfo) -> Result<(), Error> {
        self.open_constructed(CLASS_CONTEXT, variant.index() as u32);
        Ok(())
    }

    fn end_choice_variant(&mut self) -> Result<(), Error> {
        self.write_eoc();
        Ok(())
    }

    fn write_null_pointer(&mut self) -> Result<(), Error> {
        self.write_null()
    }

    fn write_object_reference(&mut self, index: u32) -> Result<(), Error> {
        self.write_integer(TAG_OBJECT_REFERENCE, index as i64);
        Ok(())
    }

    fn begin_other_pointer(&mut self, type_info: &'static TypeInfo) -> Result<(), Error> {
        self.buf.write_u8(TAG_OTHER_POINTER);
        self.buf.write_u8(INDEFINITE_LENGTH);
        self.write_str(type_info.name())
    }

    fn end_other_pointer(&mut self) -> Result<(), Error> {
        self.write_eoc();
        Ok(())
    }
}

pub struct AsnBinaryReader {
    reader: Reader,
    /// Bytes left in the open byte block.
    block_remaining: usize,
}

impl AsnBinaryReader {
    pub fn new(data: Vec<u8>) -> Self {
        AsnBinaryReader {
            reader: Reader::new(data),
            block_remaining: 0,
        }
    }

    /// Reads an identifier octet group: the first octet and the tag number.
    fn read_tag(&mut self) -> Result<(u8, u32), Error> {
        let first = self.reader.read_u8()?;
        if first & 0x1f != 0x1f {
            return Ok((first, (first & 0x1f) as u32));
        }
        let mut number: u32 = 0;
        loop {
            let b = self.reader.read_u8()?;
            number = number
                .checked_mul(128)
                .ok_or_else(|| Error::overflow("tag number too large"))?
                | (b & 0x7f) as u32;
            if b & 0x80 == 0 {
                return Ok((first, number));
            }
        }
    }

    /// `None` for the indefinite form.
    fn read_length(&mut self) -> Result<Option<usize>, Error> {
        let b = self.reader.read_u8()?;
        if b == INDEFINITE_LENGTH {
            Ok(None)
        } else if b < 0x80 {
            Ok(Some(b as usize))
        } else {
            self.reader.read_be_length((b & 0x7f) as usize).map(Some)
        }
    }

    fn expect_primitive(&mut self, tag: u8) -> Result<usize, Error> {
        let at = self.reader.cursor();
        let first = self.reader.read_u8()?;
        if first != tag {
            return Err(Error::invalid_data(format!(
                "tag {tag:#04x} expected, found {first:#04x} at byte {at}"
            )));
        }
        let len = self.read_length()?.ok_or_else(|| {
            Error::invalid_data(format!("definite length expected for tag {tag:#04x}"))
        })?;
        let remaining = self.reader.remaining();
        if len > remaining {
            let cursor = self.reader.cursor();
            return Err(Error::buffer_out_of_bound(cursor, len, cursor + remaining));
        }
        Ok(len)
    }

    fn expect_indefinite(&mut self) -> Result<(), Error> {
        match self.read_length()? {
            None => Ok(()),
            Some(_) => Err(Error::invalid_data("indefinite length expected")),
        }
    }

    fn at_eoc(&self) -> Result<bool, Error> {
        match self.reader.peek_u8() {
            None => Err(Error::invalid_data("unexpected end of data")),
            Some(0) => Ok(self.reader.peek_at(1) == Some(0)),
            Some(_) => Ok(false),
        }
    }

    fn expect_eoc(&mut self) -> Result<(), Error> {
        let at = self.reader.cursor();
        let bytes = self.reader.read_bytes(2)?;
        if bytes != [0, 0] {
            return Err(Error::invalid_data(format!(
                "end of contents expected at byte {at}"
            )));
        }
        Ok(())
    }

    fn open_sequence(&mut self) -> Result<(), Error> {
        let first = self.reader.read_u8()?;
        if first != TAG_SEQUENCE && first != TAG_SET {
            return Err(Error::invalid_data(format!(
                "SEQUENCE or SET expected, found tag {first:#04x}"
            )));
        }
        self.expect_indefinite()
    }

    /// Reads a context constructed `[n]` tag opening a member or variant.
    fn read_context_tag(&mut self) -> Result<usize, Error> {
        let (first, number) = self.read_tag()?;
        if first & 0xe0 != CLASS_CONTEXT | CONSTRUCTED {
            return Err(Error::invalid_data(format!(
                "context tag expected, found {first:#04x}"
            )));
        }
        self.expect_indefinite()?;
        Ok(number as usize)
    }
}

impl FormatReader for AsnBinaryReader {
    fn data_format(&self) -> DataFormat {
        DataFormat::AsnBinary
    }

    fn location(&self) -> String {
        format!("byte {}", self.reader.cursor())
    }

    fn has_more_data(&mut self) -> bool {
        !self.reader.is_at_end()
    }

    fn begin_named_type(&mut self) -> Result<Option<String>, Error> {
        Ok(None)
    }

    fn read_bool(&mut self) -> Result<bool, Error> {
        let len = self.expect_primitive(TAG_BOOLEAN)?;
        if len != 1 {
            return Err(Error::invalid_data(format!("BOOLEAN of length {len}")));
        }
        Ok(self.reader.read_u8()? != 0)
    }

    fn read_i64(&mut self) -> Result<i64, Error> {
        let len = self.expect_primitive(TAG_INTEGER)?;
        self.reader.read_be_int(len)
    }

    fn read_u64(&mut self) -> Result<u64, Error> {
        let len = self.expect_primitive(TAG_INTEGER)?;
        self.reader.read_be_uint(len)
    }

    fn read_f64(&mut self) -> Result<f64, Error> {
        let len = self.expect_primitive(TAG_REAL)?;
        if len == 0 {
            return Ok(0.0);
        }
        let content = self.reader.read_bytes(len)?;
        match content[0] {
            REAL_PLUS_INFINITY => Ok(f64::INFINITY),
            REAL_MINUS_INFINITY => Ok(f64::NEG_INFINITY),
            REAL_NOT_A_NUMBER => Ok(f64::NAN),
            REAL_MINUS_ZERO => Ok(-0.0),
            REAL_DECIMAL_NR3 | 0x01 | 0x02 => {
                let text = std::str::from_utf8(&content[1..])
                    .map_err(|_| Error::invalid_data("invalid decimal REAL"))?;
                text.trim()
                    .parse()
                    .map_err(|_| Error::invalid_data(format!("invalid decimal REAL {text}")))
            }
            other => Err(Error::unsupported(format!(
                "REAL encoding {other:#04x} not supported"
            ))),
        }
    }

    fn read_string(&mut self) -> Result<String, Error> {
        let len = self.expect_primitive(TAG_UTF8_STRING)?;
        let bytes = self.reader.read_bytes(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::invalid_data(format!("invalid UTF-8 string: {e}")))
    }

    fn read_null(&mut self) -> Result<(), Error> {
        let len = self.expect_primitive(TAG_NULL)?;
        if len != 0 {
            return Err(Error::invalid_data(format!("NULL of length {len}")));
        }
        Ok(())
    }

    fn read_enum(&mut self, _values: &EnumValues) -> Result<i64, Error> {
        let len = self.expect_primitive(TAG_ENUMERATED)?;
        self.reader.read_be_int(len)
    }

    fn skip_string(&mut self) -> Result<(), Error> {
        let len = self.expect_primitive(TAG_UTF8_STRING)?;
        self.reader.skip(len)
    }

    fn begin_bytes(&mut self) -> Result<Option<usize>, Error> {
        let len = self.expect_primitive(TAG_OCTET_STRING)?;
        self.block_remaining = len;
        Ok(Some(len))
    }

    fn read_bytes_chunk(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let n = buf.len().min(self.block_remaining);
        buf[..n].copy_from_slice(self.reader.read_bytes(n)?);
        self.block_remaining -= n;
        Ok(n)
    }

    fn end_bytes(&mut self) -> Result<(), Error> {
        let left = std::mem::take(&mut self.block_remaining);
        self.reader.skip(left)
    }

    fn skip_bytes(&mut self) -> Result<(), Error> {
        let len = self.expect_primitive(TAG_OCTET_STRING)?;
        self.reader.skip(len)
    }

    fn begin_class(&mut self, _type_info: &'static TypeInfo, _class: &ClassInfo) -> Result<(), Error> {
        self.open_sequence()
    }

    fn begin_class_member(
        &mut self,
        type_info: &'static TypeInfo,
        class: &ClassInfo,
    ) -> Result<Option<usize>, Error> {
        if self.at_eoc()? {
            return Ok(None);
        }
        let index = self.read_context_tag()?;
        if index >= class.len() {
            return Err(Error::unknown_member(format!(
                "unknown member tag [{index}] of {}",
                type_info.name()
            )));
        }
        Ok(Some(index))
    }

    fn end_class_member(&mut self) -> Result<(), Error> {
        self.expect_eoc()
    }

    fn end_class(&mut self) -> Result<(), Error> {
        self.expect_eoc()
    }

    fn begin_container(
        &mut self,
        _type_info: &'static TypeInfo,
        _container: &ContainerInfo,
    ) -> Result<(), Error> {
        self.open_sequence()
    }

    fn begin_container_element(&mut self, _element_type: &'static TypeInfo) -> Result<bool, Error> {
        Ok(!self.at_eoc()?)
    }

    fn end_container_element(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn end_container(&mut self) -> Result<(), Error> {
        self.expect_eoc()
    }

    fn begin_choice_variant(
        &mut self,
        type_info: &'static TypeInfo,
        choice: &ChoiceInfo,
    ) -> Result<usize, Error> {
        let index = self.read_context_tag()?;
        if index >= choice.variants().len() {
            return Err(Error::unknown_member(format!(
                "unknown variant tag [{index}] of {}",
                type_info.name()
            )));
        }
        Ok(index)
    }

    fn end_choice_variant(&mut self) -> Result<(), Error> {
        self.expect_eoc()
    }

    fn read_pointer_token(&mut self) -> Result<RawPointerToken, Error> {
        match self.reader.peek_u8() {
            Some(TAG_NULL) => {
                self.read_null()?;
                Ok(RawPointerToken::Null)
            }
            Some(TAG_OBJECT_REFERENCE) => {
                let len = self.expect_primitive(TAG_OBJECT_REFERENCE)?;
                let index = self.reader.read_be_uint(len)?;
                let index = u32::try_from(index)
                    .map_err(|_| Error::overflow(format!("object index {index} too large")))?;
                Ok(RawPointerToken::Reference(index))
            }
            Some(TAG_OTHER_POINTER) => {
                self.reader.read_u8()?;
                self.expect_indefinite()?;
                Ok(RawPointerToken::Other(self.read_string()?))
            }
            Some(_) => Ok(RawPointerToken::This),
            None => Err(Error::invalid_data("unexpected end of data")),
        }
    }

    fn end_other_pointer(&mut self) -> Result<(), Error> {
        self.expect_eoc()
    }

    fn capture_start(&mut self) -> Result<Option<usize>, Error> {
        Ok(Some(self.reader.cursor()))
    }

    fn captured(&self, start: usize) -> Result<Vec<u8>, Error> {
        Ok(self.reader.slice(start, self.reader.cursor()).to_vec())
    }
}
