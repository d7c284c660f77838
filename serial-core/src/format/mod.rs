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

//! Wire format backends.
//!
//! The stream engines walk objects and call these traits for every
//! structural event and every primitive. A backend only knows how to encode
//! one event at a time; identity tracking, hooks, defaults and member
//! bookkeeping all live in the engines.

pub mod asn_binary;
pub mod asn_text;
pub mod xml;

use crate::buffer::Writer;
use crate::config::Config;
use crate::error::Error;
use crate::meta::{ChoiceInfo, ClassInfo, ContainerInfo, EnumValues, MemberInfo, TypeInfo, VariantInfo};
use crate::types::{DataFormat, RawPointerToken};

pub use asn_binary::{AsnBinaryReader, AsnBinaryWriter};
pub use asn_text::{AsnTextReader, AsnTextWriter};
pub use xml::{XmlReader, XmlWriter};

pub fn new_writer(format: DataFormat, config: &Config) -> Box<dyn FormatWriter> {
    match format {
        DataFormat::AsnText => Box::new(AsnTextWriter::new(config.indent())),
        DataFormat::AsnBinary => Box::new(AsnBinaryWriter::new()),
        DataFormat::Xml => Box::new(XmlWriter::new(config.indent())),
    }
}

pub fn new_reader(format: DataFormat, data: Vec<u8>) -> Box<dyn FormatReader> {
    match format {
        DataFormat::AsnText => Box::new(AsnTextReader::new(data)),
        DataFormat::AsnBinary => Box::new(AsnBinaryReader::new(data)),
        DataFormat::Xml => Box::new(XmlReader::new(data)),
    }
}

/// Encoder side of a wire format.
pub trait FormatWriter {
    fn data_format(&self) -> DataFormat;

    /// Output produced so far.
    fn buffer(&mut self) -> &mut Writer;

    fn buffer_ref(&self) -> &Writer;

    /// Starts a root object, writing its type label if the format has one.
    fn begin_named_type(&mut self, type_info: &'static TypeInfo) -> Result<(), Error>;

    fn end_named_type(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn write_bool(&mut self, value: bool) -> Result<(), Error>;

    fn write_char(&mut self, value: char) -> Result<(), Error> {
        let mut buf = [0u8; 4];
        self.write_str(value.encode_utf8(&mut buf))
    }

    fn write_i8(&mut self, value: i8) -> Result<(), Error> {
        self.write_i32(value as i32)
    }

    fn write_i16(&mut self, value: i16) -> Result<(), Error> {
        self.write_i32(value as i32)
    }

    fn write_i32(&mut self, value: i32) -> Result<(), Error> {
        self.write_i64(value as i64)
    }

    fn write_i64(&mut self, value: i64) -> Result<(), Error>;

    fn write_u8(&mut self, value: u8) -> Result<(), Error> {
        self.write_u32(value as u32)
    }

    fn write_u16(&mut self, value: u16) -> Result<(), Error> {
        self.write_u32(value as u32)
    }

    fn write_u32(&mut self, value: u32) -> Result<(), Error> {
        self.write_u64(value as u64)
    }

    fn write_u64(&mut self, value: u64) -> Result<(), Error>;

    fn write_f32(&mut self, value: f32) -> Result<(), Error> {
        self.write_f64(value as f64)
    }

    fn write_f64(&mut self, value: f64) -> Result<(), Error>;

    fn write_str(&mut self, value: &str) -> Result<(), Error>;

    fn write_null(&mut self) -> Result<(), Error>;

    /// Writes an enumerated value symbolically. Returns false when the
    /// backend has no symbolic form for `value`, in which case the engine
    /// writes it as an integer.
    fn write_enum(&mut self, values: &EnumValues, value: i64) -> Result<bool, Error>;

    /// Starts a byte block of exactly `len` bytes.
    fn begin_bytes(&mut self, len: usize) -> Result<(), Error>;

    fn write_bytes_chunk(&mut self, chunk: &[u8]) -> Result<(), Error>;

    fn end_bytes(&mut self) -> Result<(), Error>;

    fn begin_class(&mut self, type_info: &'static TypeInfo, class: &ClassInfo) -> Result<(), Error>;

    fn end_class(&mut self) -> Result<(), Error>;

    fn begin_class_member(&mut self, member: &MemberInfo) -> Result<(), Error>;

    fn end_class_member(&mut self) -> Result<(), Error>;

    fn begin_container(
        &mut self,
        type_info: &'static TypeInfo,
        container: &ContainerInfo,
    ) -> Result<(), Error>;

    fn end_container(&mut self) -> Result<(), Error>;

    fn begin_container_element(&mut self, element_type: &'static TypeInfo) -> Result<(), Error>;

    fn end_container_element(&mut self) -> Result<(), Error>;

    fn begin_choice(&mut self, _type_info: &'static TypeInfo, _choice: &ChoiceInfo) -> Result<(), Error> {
        Ok(())
    }

    fn end_choice(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn begin_choice_variant(&mut self, variant: &VariantInfo) -> Result<(), Error>;

    fn end_choice_variant(&mut self) -> Result<(), Error>;

    fn write_null_pointer(&mut self) -> Result<(), Error>;

    fn write_object_reference(&mut self, index: u32) -> Result<(), Error>;

    /// Starts an object whose real type differs from the declared one.
    fn begin_other_pointer(&mut self, type_info: &'static TypeInfo) -> Result<(), Error>;

    fn end_other_pointer(&mut self) -> Result<(), Error>;

    /// Appends an already encoded value of this format.
    fn write_raw(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.buffer().write_bytes(bytes);
        Ok(())
    }

    /// Called after every root object.
    fn end_of_write(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// Decoder side of a wire format.
pub trait FormatReader {
    fn data_format(&self) -> DataFormat;

    /// Human readable input position, for error messages.
    fn location(&self) -> String;

    /// Whether anything but whitespace is left.
    fn has_more_data(&mut self) -> bool;

    /// Starts a root object and returns its type label, `None` for formats
    /// without labels.
    fn begin_named_type(&mut self) -> Result<Option<String>, Error>;

    fn end_named_type(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn read_bool(&mut self) -> Result<bool, Error>;

    fn read_char(&mut self) -> Result<char, Error> {
        let s = self.read_string()?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(Error::invalid_data(format!("one character expected, found {s:?}"))),
        }
    }

    fn read_i8(&mut self) -> Result<i8, Error> {
        let v = self.read_i64()?;
        i8::try_from(v).map_err(|_| Error::overflow(format!("{v} does not fit i8")))
    }

    fn read_i16(&mut self) -> Result<i16, Error> {
        let v = self.read_i64()?;
        i16::try_from(v).map_err(|_| Error::overflow(format!("{v} does not fit i16")))
    }

    fn read_i32(&mut self) -> Result<i32, Error> {
        let v = self.read_i64()?;
        i32::try_from(v).map_err(|_| Error::overflow(format!("{v} does not fit i32")))
    }

    fn read_i64(&mut self) -> Result<i64, Error>;

    fn read_u8(&mut self) -> Result<u8, Error> {
        let v = self.read_u64()?;
        u8::try_from(v).map_err(|_| Error::overflow(format!("{v} does not fit u8")))
    }

    fn read_u16(&mut self) -> Result<u16, Error> {
        let v = self.read_u64()?;
        u16::try_from(v).map_err(|_| Error::overflow(format!("{v} does not fit u16")))
    }

    fn read_u32(&mut self) -> Result<u32, Error> {
        let v = self.read_u64()?;
        u32::try_from(v).map_err(|_| Error::overflow(format!("{v} does not fit u32")))
    }

    fn read_u64(&mut self) -> Result<u64, Error>;

    fn read_f32(&mut self) -> Result<f32, Error> {
        Ok(self.read_f64()? as f32)
    }

    fn read_f64(&mut self) -> Result<f64, Error>;

    fn read_string(&mut self) -> Result<String, Error>;

    fn read_null(&mut self) -> Result<(), Error>;

    /// Reads an enumerated value, symbolic or numeric. Identifiers not in
    /// `values` are an error; numeric values are checked by the caller.
    fn read_enum(&mut self, values: &EnumValues) -> Result<i64, Error>;

    fn skip_bool(&mut self) -> Result<(), Error> {
        self.read_bool().map(|_| ())
    }

    fn skip_signed(&mut self) -> Result<(), Error> {
        self.read_i64().map(|_| ())
    }

    fn skip_unsigned(&mut self) -> Result<(), Error> {
        self.read_u64().map(|_| ())
    }

    fn skip_f64(&mut self) -> Result<(), Error> {
        self.read_f64().map(|_| ())
    }

    fn skip_string(&mut self) -> Result<(), Error> {
        self.read_string().map(|_| ())
    }

    fn skip_null(&mut self) -> Result<(), Error> {
        self.read_null()
    }

    fn skip_enum(&mut self, values: &EnumValues) -> Result<(), Error> {
        self.read_enum(values).map(|_| ())
    }

    /// Starts a byte block and returns its length when known.
    fn begin_bytes(&mut self) -> Result<Option<usize>, Error>;

    /// Copies the next bytes of the block into `buf`; 0 once exhausted.
    fn read_bytes_chunk(&mut self, buf: &mut [u8]) -> Result<usize, Error>;

    fn end_bytes(&mut self) -> Result<(), Error>;

    fn skip_bytes(&mut self) -> Result<(), Error> {
        self.begin_bytes()?;
        let mut buf = [0u8; 1024];
        while self.read_bytes_chunk(&mut buf)? != 0 {}
        self.end_bytes()
    }

    fn begin_class(&mut self, type_info: &'static TypeInfo, class: &ClassInfo) -> Result<(), Error>;

    /// Index of the next member present in the input, `None` at the end of
    /// the class.
    fn begin_class_member(
        &mut self,
        type_info: &'static TypeInfo,
        class: &ClassInfo,
    ) -> Result<Option<usize>, Error>;

    fn end_class_member(&mut self) -> Result<(), Error>;

    fn end_class(&mut self) -> Result<(), Error>;

    fn begin_container(
        &mut self,
        type_info: &'static TypeInfo,
        container: &ContainerInfo,
    ) -> Result<(), Error>;

    /// Whether another element follows.
    fn begin_container_element(&mut self, element_type: &'static TypeInfo) -> Result<bool, Error>;

    fn end_container_element(&mut self) -> Result<(), Error>;

    fn end_container(&mut self) -> Result<(), Error>;

    fn begin_choice(&mut self, _type_info: &'static TypeInfo, _choice: &ChoiceInfo) -> Result<(), Error> {
        Ok(())
    }

    /// Index of the variant present in the input.
    fn begin_choice_variant(
        &mut self,
        type_info: &'static TypeInfo,
        choice: &ChoiceInfo,
    ) -> Result<usize, Error>;

    fn end_choice_variant(&mut self) -> Result<(), Error>;

    fn end_choice(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn read_pointer_token(&mut self) -> Result<RawPointerToken, Error>;

    /// Closes the framing opened by an [`RawPointerToken::Other`] token.
    fn end_other_pointer(&mut self) -> Result<(), Error>;

    /// Starts capturing the encoding of the next value. `None` when the
    /// backend cannot capture.
    fn capture_start(&mut self) -> Result<Option<usize>, Error> {
        Ok(None)
    }

    /// Encoding consumed since `start`.
    fn captured(&self, _start: usize) -> Result<Vec<u8>, Error> {
        Err(Error::unsupported("capture is not supported by this format"))
    }

    /// Called after every root object.
    fn end_of_read(&mut self) -> Result<(), Error> {
        Ok(())
    }
}
