// Copyright (c) 2026 ArkVM contributors, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! The execution core: scopes, frames, the dispatch loop, and the two host
//! entry points (`run`, `call`/`resolve`) of spec.md §2 and §4.
//!
//! Everything here operates on a [`State`] produced by `ark_vm_binary`; this
//! crate never touches a byte stream itself.

mod builtins;
mod frame;
mod interpreter;
mod reentrant_lock;
mod scope_chain;
mod state;
mod vm;

pub use ark_vm_types::value::VmHandle;
pub use ark_vm_types::{Location, Number, Opcode, SymbolId, Value, ValueKind, VmError, VmResult};
pub use ark_vm_types::value::{ClosureData, NativeProcedure};

pub use builtins::Builtins;
pub use state::{FeatureFlags, State};
pub use vm::Vm;
