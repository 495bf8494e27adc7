// Copyright (c) 2026 ArkVM contributors, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! The fetch/decode/execute loop (spec.md §4.3–§4.5), split into one
//! submodule per opcode family, mirroring the teacher codebase's
//! `interpreter/{fundamental,local,control_flow,...}.rs` layout.

use ark_vm_types::Opcode;

use crate::builtins::Builtins;
use crate::state::State;
use crate::vm::{StepOutcome, VmInner};

pub(crate) mod control_flow;
pub(crate) mod fundamental;
pub(crate) mod funcall;
pub(crate) mod immediate;
pub(crate) mod local;

/// Fetches, decodes, and executes the single instruction at the VM's
/// current `page:ip`. Every handler is responsible for leaving
/// `VmInner::page`/`ip` pointing at the next instruction to run before it
/// returns — there is no separate "advance ip" step afterward, matching
/// the explicit-`next_ip` allowance of spec.md §4.5.
pub(crate) fn step(inner: &mut VmInner, state: &State, builtins: &Builtins) -> ark_vm_types::VmResult<StepOutcome> {
    let page = inner.page;
    let ip = inner.ip;
    let (opcode, len) = state.opcode_at(page, ip)?;
    let next_ip = ip + len;
    let operand = if opcode.has_operand() { state.operand_at(page, ip)? } else { 0 };

    match opcode {
        Opcode::nop => fundamental::nop(inner, next_ip),
        Opcode::halt => fundamental::halt(),
        Opcode::load_symbol => local::load_symbol(inner, state, operand, next_ip),
        Opcode::load_const => immediate::load_const(inner, state, operand, next_ip),
        Opcode::store => local::store(inner, state, operand, next_ip),
        Opcode::let_ => local::let_(inner, state, operand, next_ip),
        Opcode::mut_ => local::mut_(inner, state, operand, next_ip),
        Opcode::new_scope => local::new_scope(inner, next_ip),
        Opcode::pop_scope => local::pop_scope(inner, next_ip),
        Opcode::capture => local::capture(inner, state, operand, next_ip),
        Opcode::builtin => funcall::builtin(inner, builtins, operand, next_ip),
        Opcode::save_env => funcall::save_env(inner, next_ip),
        Opcode::call => funcall::call(inner, state, operand, next_ip),
        Opcode::ret => funcall::ret(inner),
        Opcode::jump => control_flow::jump(inner, state, operand),
        Opcode::pop_jump_if_true => control_flow::pop_jump_if_true(inner, state, operand, next_ip),
    }
}
