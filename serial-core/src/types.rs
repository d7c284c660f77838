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
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Wire format of an object stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataFormat {
    /// ASN.1 value notation.
    AsnText,
    /// BER-style tag/length/value encoding.
    AsnBinary,
    Xml,
}

impl DataFormat {
    /// Guesses the format from a file extension (`asn`, `asnb`/`ber`, `xml`).
    pub fn from_path(path: &Path) -> Option<DataFormat> {
        let ext = path.extension()?.to_str()?;
        ext.parse().ok()
    }

    pub fn name(self) -> &'static str {
        match self {
            DataFormat::AsnText => "asn",
            DataFormat::AsnBinary => "asnb",
            DataFormat::Xml => "xml",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asn" | "asn1" | "text" => Ok(DataFormat::AsnText),
            "asnb" | "ber" | "binary" => Ok(DataFormat::AsnBinary),
            "xml" => Ok(DataFormat::Xml),
            _ => Err(Error::unsupported(format!("unknown data format: {s}"))),
        }
    }
}

/// Pointer token as decoded by a format backend, before the type name of an
/// "other" pointer has been resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawPointerToken {
    Null,
    Reference(u32),
    This,
    Other(String),
}

/// Pointer token with the type of an "other" pointer resolved.
#[derive(Clone, Copy, Debug)]
pub enum PointerToken {
    /// No object.
    Null,
    /// Back-reference to an object already read in this session.
    Reference(u32),
    /// Object of the declared type follows.
    This,
    /// Object of the given (possibly more specific) type follows.
    Other(&'static TypeInfo),
}

impl PointerToken {
    pub fn is_null(&self) -> bool {
        matches!(self, PointerToken::Null)
    }
}
