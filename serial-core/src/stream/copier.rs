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

use crate::error::Error;
use crate::meta::TypeInfo;
use crate::stream::{ObjectIStream, ObjectOStream};

/// Re-encodes root objects from one stream into another, typically to
/// convert between formats.
///
/// ```
/// use serial_core::stream::{ObjectIStream, ObjectOStream, ObjectStreamCopier};
/// use serial_core::meta::SerialType;
/// use serial_core::types::DataFormat;
///
/// let mut input = ObjectIStream::from_bytes(DataFormat::AsnText, b"i32 ::= 7\n".to_vec());
/// let mut output = ObjectOStream::new(DataFormat::Xml);
/// ObjectStreamCopier::new(&mut input, &mut output).copy(i32::type_info()).unwrap();
/// assert!(std::str::from_utf8(output.bytes()).unwrap().contains("<i32>7</i32>"));
/// ```
pub struct ObjectStreamCopier<'a> {
    input: &'a mut ObjectIStream,
    output: &'a mut ObjectOStream,
}

impl<'a> ObjectStreamCopier<'a> {
    pub fn new(input: &'a mut ObjectIStream, output: &'a mut ObjectOStream) -> Self {
        ObjectStreamCopier { input, output }
    }

    /// Copies one root object of type `type_info`.
    pub fn copy(&mut self, type_info: &'static TypeInfo) -> Result<(), Error> {
        let mut object = type_info.create();
        self.input.read_root(&mut *object, type_info)?;
        self.output.write_root(&*object, type_info)
    }

    /// Copies one root object whose type is named in the input.
    pub fn copy_any(&mut self) -> Result<&'static TypeInfo, Error> {
        let (type_info, object) = self.input.read_any()?;
        self.output.write_root(&*object, type_info)?;
        Ok(type_info)
    }

    /// Copies root objects of type `type_info` until the input is exhausted.
    pub fn copy_all(&mut self, type_info: &'static TypeInfo) -> Result<usize, Error> {
        let mut copied = 0;
        while self.input.has_more_data() {
            self.copy(type_info)?;
            copied += 1;
        }
        log::debug!("copied {copied} {} objects", type_info.name());
        Ok(copied)
    }
}
