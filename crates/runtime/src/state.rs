// Copyright (c) 2026 ArkVM contributors, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

use ark_vm_binary::BytecodeImage;
use ark_vm_types::{Location, Opcode, PageAddr, SymbolId, Value, VmError, VmResult};

/// The two feature flags named in spec.md §3: `function-arity-check` and
/// `remove-unused-vars`. Defaults mirror the original ArkScript VM.
#[derive(Debug, Clone, Copy)]
pub struct FeatureFlags {
    pub function_arity_check: bool,
    pub remove_unused_vars: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        FeatureFlags { function_arity_check: true, remove_unused_vars: false }
    }
}

/// The program image: immutable after loading, shareable across VM
/// instances on separate threads (spec.md §3, §5 "Shared resources").
#[derive(Debug)]
pub struct State {
    pages: Vec<Vec<u8>>,
    symbols: Vec<String>,
    constants: Vec<Value>,
    plugins: Vec<String>,
    pub feature_flags: FeatureFlags,
}

impl State {
    pub fn from_image(image: BytecodeImage) -> VmResult<State> {
        image.validate()?;
        Ok(State {
            pages: image.pages,
            symbols: image.symbols,
            constants: image.constants,
            plugins: image.plugins,
            feature_flags: FeatureFlags::default(),
        })
    }

    pub fn with_feature_flags(mut self, flags: FeatureFlags) -> Self {
        self.feature_flags = flags;
        self
    }

    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    pub fn symbol_id(&self, name: &str) -> Option<SymbolId> {
        self.symbols.iter().position(|s| s == name).map(|i| i as SymbolId)
    }

    pub fn symbol_name(&self, id: SymbolId) -> Option<&str> {
        self.symbols.get(id as usize).map(String::as_str)
    }

    pub fn constant(&self, k: u16) -> VmResult<Value> {
        self.constants
            .get(k as usize)
            .cloned()
            .ok_or_else(|| VmError::MalformedBytecode(format!("constant index {k} out of range")))
    }

    pub fn page_len(&self, page: PageAddr) -> VmResult<usize> {
        self.pages
            .get(page as usize)
            .map(Vec::len)
            .ok_or_else(|| VmError::MalformedBytecode(format!("page {page} does not exist")))
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Decodes the opcode at `page:ip`, returning it along with its
    /// instruction length in bytes.
    pub fn opcode_at(&self, page: PageAddr, ip: usize) -> VmResult<(Opcode, usize)> {
        let bytes = self.page_bytes(page, ip)?;
        let byte = *bytes.first().ok_or_else(|| {
            VmError::MalformedBytecode(format!(
                "instruction pointer ran past the end of page {page}"
            ))
        })?;
        let opcode = Opcode::try_from(byte)
            .map_err(|b| VmError::MalformedBytecode(format!("unknown opcode byte 0x{b:02x}")))?;
        Ok((opcode, opcode.instruction_len()))
    }

    /// Reads the 16-bit big-endian operand following the opcode byte at
    /// `page:ip`.
    pub fn operand_at(&self, page: PageAddr, ip: usize) -> VmResult<u16> {
        let bytes = self.page_bytes(page, ip)?;
        if bytes.len() < 3 {
            return Err(VmError::MalformedBytecode(format!(
                "truncated operand for instruction at {page}:{ip}"
            )));
        }
        Ok(u16::from_be_bytes([bytes[1], bytes[2]]))
    }

    fn page_bytes(&self, page: PageAddr, ip: usize) -> VmResult<&[u8]> {
        let code = self
            .pages
            .get(page as usize)
            .ok_or_else(|| VmError::MalformedBytecode(format!("page {page} does not exist")))?;
        code.get(ip..).ok_or_else(|| {
            VmError::MalformedBytecode(format!(
                "instruction pointer ran past the end of page {page}"
            ))
        })
    }

    /// The arity-check prefix scan of spec.md §4.4: the number of leading
    /// 3-byte `MUT` instructions at the start of `page`.
    pub fn arity_of(&self, page: PageAddr, at: Location) -> VmResult<usize> {
        let code = self
            .pages
            .get(page as usize)
            .ok_or(VmError::PageOutOfRange { page, at })?;
        let mut count = 0;
        let mut i = 0;
        while i + 3 <= code.len() && code[i] == Opcode::mut_ as u8 {
            count += 1;
            i += 3;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> State {
        let image = BytecodeImage {
            version: (1, 0, 0),
            timestamp: 0,
            symbols: vec!["f".to_string(), "x".to_string()],
            constants: vec![Value::Number(ark_vm_types::Number::Integer(42))],
            plugins: vec!["plugin-a".to_string()],
            pages: vec![
                vec![Opcode::halt as u8],
                vec![Opcode::mut_ as u8, 0, 0, Opcode::mut_ as u8, 0, 1, Opcode::ret as u8],
            ],
        };
        State::from_image(image).expect("valid image")
    }

    #[test]
    fn default_feature_flags_match_the_original_arkscript_defaults() {
        let flags = FeatureFlags::default();
        assert!(flags.function_arity_check);
        assert!(!flags.remove_unused_vars);
    }

    #[test]
    fn symbol_id_and_name_round_trip() {
        let state = sample_state();
        assert_eq!(state.symbol_id("f"), Some(0));
        assert_eq!(state.symbol_name(0), Some("f"));
        assert_eq!(state.symbol_id("missing"), None);
    }

    #[test]
    fn constant_lookup_is_bounds_checked() {
        let state = sample_state();
        assert_eq!(state.constant(0).unwrap(), Value::Number(ark_vm_types::Number::Integer(42)));
        assert!(state.constant(1).is_err());
    }

    #[test]
    fn arity_of_counts_the_leading_mut_run_only() {
        let state = sample_state();
        assert_eq!(state.arity_of(1, Location::new(1, 0)).unwrap(), 2);
        assert_eq!(state.arity_of(0, Location::new(0, 0)).unwrap(), 0);
    }

    #[test]
    fn opcode_at_decodes_the_byte_and_its_instruction_length() {
        let state = sample_state();
        let (op, len) = state.opcode_at(1, 0).unwrap();
        assert_eq!(op, Opcode::mut_);
        assert_eq!(len, 3);
    }

    #[test]
    fn opcode_at_past_the_end_of_a_page_is_malformed_bytecode() {
        let state = sample_state();
        assert!(matches!(state.opcode_at(0, 5), Err(VmError::MalformedBytecode(_))));
    }

    #[test]
    fn plugins_are_exposed_in_load_order() {
        let state = sample_state();
        assert_eq!(state.plugins(), &["plugin-a".to_string()]);
    }
}
