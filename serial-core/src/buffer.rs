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
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

/// Growable output buffer that every format backend writes into.
#[derive(Default)]
pub struct Writer {
    pub(crate) bf: Vec<u8>,
}

impl Writer {
    pub fn reset(&mut self) {
        // keep capacity and reset len to 0
        self.bf.clear();
    }

    pub fn dump(&self) -> Vec<u8> {
        self.bf.clone()
    }

    /// Moves the buffered bytes out, leaving the writer empty.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bf)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bf
    }

    pub fn len(&self) -> usize {
        self.bf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bf.is_empty()
    }

    pub fn write_bytes(&mut self, v: &[u8]) -> usize {
        self.bf.extend_from_slice(v);
        v.len()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.bf.push(value);
    }

    pub fn write_str(&mut self, s: &str) {
        self.bf.extend_from_slice(s.as_bytes());
    }

    /// Last byte written, if any.
    pub fn last(&self) -> Option<u8> {
        self.bf.last().copied()
    }

    /// Writes `value` as a minimal big-endian two's complement integer and
    /// returns the number of bytes used.
    pub fn write_be_int(&mut self, value: i64) -> usize {
        let mut len = 8;
        while len > 1 {
            let shift = (len - 1) * 8 - 1;
            // the top byte is redundant when the remaining bits already sign-extend
            if (value >> shift) == 0 || (value >> shift) == -1 {
                len -= 1;
            } else {
                break;
            }
        }
        let mut scratch = [0u8; 8];
        BigEndian::write_int(&mut scratch, value, len);
        self.write_bytes(&scratch[..len])
    }

    /// Writes `value` as a minimal big-endian unsigned integer whose first
    /// byte never has its top bit set, so it reads back as non-negative.
    pub fn write_be_uint(&mut self, value: u64) -> usize {
        if value <= i64::MAX as u64 {
            return self.write_be_int(value as i64);
        }
        // a leading zero keeps the sign bit clear
        let mut len = 1;
        self.bf.push(0);
        let mut scratch = [0u8; 8];
        BigEndian::write_u64(&mut scratch, value);
        len += self.write_bytes(&scratch);
        len
    }

    /// Writes an unsigned length in the fewest big-endian bytes.
    pub fn write_be_length(&mut self, value: usize, nbytes: usize) {
        let mut scratch = Vec::with_capacity(8);
        // write_uint cannot fail on a Vec sink
        let _ = scratch.write_uint::<BigEndian>(value as u64, nbytes);
        self.bf.extend_from_slice(&scratch);
    }
}

/// Number of bytes needed to hold `value` in big-endian form.
pub fn be_length_size(value: usize) -> usize {
    let mut n = 1;
    while n < 8 && (value >> (n * 8)) != 0 {
        n += 1;
    }
    n
}

/// Cursor over an owned input buffer.
#[derive(Default)]
pub struct Reader {
    bf: Vec<u8>,
    cursor: usize,
}

impl Reader {
    pub fn new(bf: Vec<u8>) -> Reader {
        Reader { bf, cursor: 0 }
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    #[inline(always)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.bf.len());
    }

    pub fn len(&self) -> usize {
        self.bf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bf.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.bf.len() - self.cursor
    }

    pub fn is_at_end(&self) -> bool {
        self.cursor >= self.bf.len()
    }

    pub fn get_slice(&self) -> &[u8] {
        &self.bf
    }

    pub fn slice_after_cursor(&self) -> &[u8] {
        &self.bf[self.cursor..]
    }

    /// Bytes between two cursor positions previously observed on this reader.
    pub fn slice(&self, start: usize, end: usize) -> &[u8] {
        let end = end.min(self.bf.len());
        &self.bf[start.min(end)..end]
    }

    #[inline(always)]
    pub fn peek_u8(&self) -> Option<u8> {
        self.bf.get(self.cursor).copied()
    }

    #[inline(always)]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bf.get(self.cursor + offset).copied()
    }

    #[inline(always)]
    fn check_bound(&self, n: usize) -> Result<(), Error> {
        if self.cursor + n > self.bf.len() {
            return Err(Error::buffer_out_of_bound(self.cursor, n, self.bf.len()));
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        self.check_bound(1)?;
        let v = self.bf[self.cursor];
        self.cursor += 1;
        Ok(v)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8], Error> {
        self.check_bound(len)?;
        let start = self.cursor;
        self.cursor += len;
        Ok(&self.bf[start..self.cursor])
    }

    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        self.check_bound(len)?;
        self.cursor += len;
        Ok(())
    }

    /// Reads a big-endian two's complement integer of `len` bytes (1..=8).
    pub fn read_be_int(&mut self, len: usize) -> Result<i64, Error> {
        if len == 0 || len > 8 {
            return Err(Error::overflow(format!(
                "integer of {len} bytes does not fit 64 bits"
            )));
        }
        let bytes = self.read_bytes(len)?;
        Ok(BigEndian::read_int(bytes, len))
    }

    /// Reads a big-endian unsigned integer of `len` bytes (1..=9, a leading
    /// zero byte is allowed for the ninth).
    pub fn read_be_uint(&mut self, len: usize) -> Result<u64, Error> {
        if len == 0 {
            return Err(Error::invalid_data("empty integer"));
        }
        let bytes = self.read_bytes(len)?;
        if bytes[0] & 0x80 != 0 {
            return Err(Error::overflow("negative value for unsigned integer"));
        }
        let (bytes, len) = if len == 9 && bytes[0] == 0 {
            (&bytes[1..], 8)
        } else if len > 8 {
            return Err(Error::overflow(format!(
                "integer of {len} bytes does not fit 64 bits"
            )));
        } else {
            (bytes, len)
        };
        Ok(BigEndian::read_uint(bytes, len))
    }

    pub fn read_be_length(&mut self, nbytes: usize) -> Result<usize, Error> {
        if nbytes == 0 || nbytes > 8 {
            return Err(Error::invalid_data(format!(
                "length of {nbytes} bytes is not supported"
            )));
        }
        let bytes = self.read_bytes(nbytes)?;
        let value = BigEndian::read_uint(bytes, nbytes);
        usize::try_from(value).map_err(|_| Error::overflow("length does not fit usize"))
    }
}
