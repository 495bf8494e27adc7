// Copyright (c) 2026 ArkVM contributors, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! Tagged-union value representation, the opcode set and the error
//! taxonomy shared by the bytecode reader and the runtime.
//!
//! This crate has no I/O and no allocation policy beyond `Arc`: it is the
//! vocabulary the other two crates (`ark-vm-binary`, `ark-vm-runtime`)
//! speak.

pub mod error;
pub mod number;
pub mod opcode;
pub mod value;

pub use error::{Location, VmError, VmResult};
pub use number::Number;
pub use opcode::Opcode;
pub use value::{NativeProcedure, Value, ValueKind};

/// A 16-bit index into the program's symbol table (`spec.md` §3, §4.3).
pub type SymbolId = u16;

/// A 16-bit index of a code page (the compiled body of a function).
/// Page 0 is always the top-level page.
pub type PageAddr = u16;
