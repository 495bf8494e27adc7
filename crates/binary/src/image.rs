// Copyright (c) 2026 ArkVM contributors, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

use std::sync::Arc;

use ark_vm_types::{Number, Value, VmError, VmResult};

use crate::cursor::{Cursor, Writer};
use crate::{
    MAGIC, SECTION_CODE, SECTION_PLUGINS, SECTION_SYM_TABLE, SECTION_VAL_TABLE, VAL_KIND_NUMBER,
    VAL_KIND_PAGE_ADDR, VAL_KIND_STRING,
};

/// A fully decoded program image (spec.md §6), before it becomes the
/// runtime's immutable `State`.
#[derive(Debug, Clone, PartialEq)]
pub struct BytecodeImage {
    pub version: (u8, u8, u8),
    pub timestamp: u64,
    pub symbols: Vec<String>,
    pub constants: Vec<Value>,
    pub plugins: Vec<String>,
    /// One byte array per page; `pages[0]` is always the top-level page.
    pub pages: Vec<Vec<u8>>,
}

impl BytecodeImage {
    /// Parses a complete bytecode image per spec.md §6. Rejects the image
    /// with `VmError::MalformedBytecode` on any missing marker, size
    /// overflow, or out-of-range reference.
    pub fn read(bytes: &[u8]) -> VmResult<Self> {
        let mut cursor = Cursor::new(bytes);

        let magic = cursor.take(4)?;
        if magic != MAGIC {
            return Err(VmError::MalformedBytecode("bad magic, expected b\"ark\\0\"".into()));
        }

        let version = (cursor.read_u8()?, cursor.read_u8()?, cursor.read_u8()?);
        let timestamp = cursor.read_u64()?;

        cursor.expect_marker(SECTION_SYM_TABLE, "SymTable")?;
        let symbol_count = cursor.read_u16()? as usize;
        let mut symbols = Vec::with_capacity(symbol_count);
        for _ in 0..symbol_count {
            symbols.push(cursor.read_cstr()?);
        }

        cursor.expect_marker(SECTION_VAL_TABLE, "ValTable")?;
        let value_count = cursor.read_u16()? as usize;
        let mut constants = Vec::with_capacity(value_count);
        for _ in 0..value_count {
            let kind = cursor.read_u8()?;
            let value = match kind {
                VAL_KIND_NUMBER => {
                    let text = cursor.read_cstr()?;
                    parse_number_text(&text)?
                }
                VAL_KIND_STRING => Value::String(Arc::from(cursor.read_cstr()?.as_str())),
                VAL_KIND_PAGE_ADDR => Value::PageAddr(cursor.read_u16()?),
                other => {
                    return Err(VmError::MalformedBytecode(format!(
                        "unknown ValTable entry kind 0x{other:02x}"
                    )))
                }
            };
            constants.push(value);
        }

        cursor.expect_marker(SECTION_PLUGINS, "Plugins")?;
        let plugin_count = cursor.read_u16()? as usize;
        let mut plugins = Vec::with_capacity(plugin_count);
        for _ in 0..plugin_count {
            plugins.push(cursor.read_cstr()?);
        }

        let mut pages = Vec::new();
        while let Some(marker) = cursor.read_u8_if_available() {
            if marker != SECTION_CODE {
                return Err(VmError::MalformedBytecode(format!(
                    "expected Code section marker 0x{SECTION_CODE:02x}, found 0x{marker:02x}"
                )));
            }
            let len = cursor.read_u16()? as usize;
            let code = cursor.take(len)?.to_vec();
            pages.push(code);
        }

        if pages.is_empty() {
            return Err(VmError::MalformedBytecode(
                "image has no Code sections; page 0 (top-level) is mandatory".into(),
            ));
        }

        let image = BytecodeImage { version, timestamp, symbols, constants, plugins, pages };
        image.validate()?;
        Ok(image)
    }

    /// Validates cross-references the reader's own marker/size checks
    /// cannot catch: every `PageAddr` constant must reference a loaded
    /// page. Called automatically by [`BytecodeImage::read`]; exposed so
    /// a `BytecodeImage` assembled by hand (e.g. in tests) can also be
    /// checked before use.
    pub fn validate(&self) -> VmResult<()> {
        for value in &self.constants {
            if let Value::PageAddr(p) = value {
                if *p as usize >= self.pages.len() {
                    return Err(VmError::MalformedBytecode(format!(
                        "ValTable references out-of-range page {p}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Encodes this image back to the spec.md §6 byte layout. Mirror of
    /// [`BytecodeImage::read`]. Fails with `VmError::MalformedBytecode` if
    /// the constants table holds a value kind the ValTable format has no
    /// tag for (only Number, String, and PageAddr are encodable).
    pub fn write(&self) -> VmResult<Vec<u8>> {
        let mut w = Writer::new();
        w.write_bytes(MAGIC);
        w.write_u8(self.version.0);
        w.write_u8(self.version.1);
        w.write_u8(self.version.2);
        w.write_u64(self.timestamp);

        w.write_u8(SECTION_SYM_TABLE);
        w.write_u16(self.symbols.len() as u16);
        for s in &self.symbols {
            w.write_cstr(s);
        }

        w.write_u8(SECTION_VAL_TABLE);
        w.write_u16(self.constants.len() as u16);
        for value in &self.constants {
            match value {
                Value::Number(n) => {
                    w.write_u8(VAL_KIND_NUMBER);
                    w.write_cstr(&n.to_string());
                }
                Value::String(s) => {
                    w.write_u8(VAL_KIND_STRING);
                    w.write_cstr(s);
                }
                Value::PageAddr(p) => {
                    w.write_u8(VAL_KIND_PAGE_ADDR);
                    w.write_u16(*p);
                }
                other => {
                    return Err(VmError::MalformedBytecode(format!(
                        "constants table cannot hold a {other:?} literal"
                    )))
                }
            }
        }

        w.write_u8(SECTION_PLUGINS);
        w.write_u16(self.plugins.len() as u16);
        for p in &self.plugins {
            w.write_cstr(p);
        }

        for page in &self.pages {
            w.write_u8(SECTION_CODE);
            w.write_u16(page.len() as u16);
            w.write_bytes(page);
        }

        Ok(w.into_vec())
    }
}

fn parse_number_text(text: &str) -> VmResult<Value> {
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Value::Number(Number::Integer(i)));
    }
    if let Ok(f) = text.parse::<f64>() {
        return Ok(Value::Number(Number::Float(f)));
    }
    Err(VmError::MalformedBytecode(format!("invalid numeric literal '{text}' in ValTable")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> BytecodeImage {
        BytecodeImage {
            version: (1, 0, 0),
            timestamp: 1_700_000_000,
            symbols: vec!["f".to_string(), "x".to_string()],
            constants: vec![Value::Number(Number::Integer(42)), Value::PageAddr(1)],
            plugins: vec![],
            pages: vec![vec![0x0f], vec![0x02, 0x00, 0x00, 0x0e]],
        }
    }

    #[test]
    fn round_trips_through_write_then_read() {
        let image = sample();
        let bytes = image.write().expect("sample image is encodable");
        let decoded = BytecodeImage::read(&bytes).expect("valid image");
        assert_eq!(decoded, image);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = sample().write().expect("sample image is encodable");
        bytes[0] = b'X';
        assert!(matches!(
            BytecodeImage::read(&bytes),
            Err(VmError::MalformedBytecode(_))
        ));
    }

    #[test]
    fn rejects_truncated_image() {
        let bytes = sample().write().expect("sample image is encodable");
        let truncated = &bytes[..bytes.len() - 3];
        assert!(BytecodeImage::read(truncated).is_err());
    }

    #[test]
    fn rejects_out_of_range_page_addr_constant() {
        let mut image = sample();
        image.constants.push(Value::PageAddr(99));
        let bytes = image.write().expect("sample image is encodable");
        assert!(matches!(
            BytecodeImage::read(&bytes),
            Err(VmError::MalformedBytecode(_))
        ));
    }

    #[test]
    fn rejects_image_without_a_top_level_page() {
        let mut image = sample();
        image.pages.clear();
        let bytes = image.write().expect("sample image is encodable");
        assert!(BytecodeImage::read(&bytes).is_err());
    }

    #[test]
    fn parses_float_constants_from_decimal_text() {
        let mut image = sample();
        image.constants.push(Value::Number(Number::Float(3.5)));
        let bytes = image.write().expect("sample image is encodable");
        let decoded = BytecodeImage::read(&bytes).expect("valid image");
        match decoded.constants.last() {
            Some(Value::Number(Number::Float(f))) => assert_eq!(*f, 3.5),
            other => panic!("expected a float constant, got {other:?}"),
        }
    }

    #[test]
    fn write_rejects_an_unencodable_constant_kind() {
        let mut image = sample();
        image.constants.push(Value::True);
        assert!(matches!(image.write(), Err(VmError::MalformedBytecode(_))));
    }
}
