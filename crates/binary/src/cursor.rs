// Copyright (c) 2026 ArkVM contributors, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

use ark_vm_types::{VmError, VmResult};

/// A bounds-checked big-endian reader over an in-memory image. Every read
/// that would run past the end of `bytes` fails with
/// `VmError::MalformedBytecode` rather than panicking.
pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    fn truncated(&self, what: &str) -> VmError {
        VmError::MalformedBytecode(format!("truncated image while reading {what}"))
    }

    pub fn take(&mut self, n: usize) -> VmResult<&'a [u8]> {
        if self.pos + n > self.bytes.len() {
            return Err(self.truncated("a fixed-size field"));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> VmResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> VmResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u64(&mut self) -> VmResult<u64> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes(b.try_into().unwrap()))
    }

    /// Reads a null-terminated UTF-8 string.
    pub fn read_cstr(&mut self) -> VmResult<String> {
        let start = self.pos;
        loop {
            let byte = self.read_u8()?;
            if byte == 0 {
                break;
            }
        }
        let slice = &self.bytes[start..self.pos - 1];
        String::from_utf8(slice.to_vec())
            .map_err(|_| VmError::MalformedBytecode("invalid UTF-8 in string field".into()))
    }

    pub fn expect_marker(&mut self, marker: u8, section: &str) -> VmResult<()> {
        let found = self.read_u8()?;
        if found != marker {
            return Err(VmError::MalformedBytecode(format!(
                "expected {section} section marker 0x{marker:02x}, found 0x{found:02x}"
            )));
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn read_u8_if_available(&mut self) -> Option<u8> {
        if self.is_empty() {
            None
        } else {
            self.read_u8().ok()
        }
    }
}

/// A growable big-endian writer mirroring [`Cursor`].
#[derive(Default)]
pub struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Writer::default()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.bytes.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.bytes.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.bytes.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_cstr(&mut self, s: &str) {
        self.bytes.extend_from_slice(s.as_bytes());
        self.bytes.push(0);
    }

    pub fn write_bytes(&mut self, b: &[u8]) {
        self.bytes.extend_from_slice(b);
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}
