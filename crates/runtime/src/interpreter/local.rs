// Copyright (c) 2026 ArkVM contributors, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

use ark_vm_types::{SymbolId, VmError, VmResult};

use crate::state::State;
use crate::vm::{StepOutcome, VmInner};

fn symbol_name(state: &State, id: SymbolId) -> String {
    state.symbol_name(id).map(str::to_string).unwrap_or_else(|| format!("<symbol {id}>"))
}

/// `LOAD_SYMBOL id` (spec.md §4.3): push the nearest binding of `id`, and
/// remember it as `lastSymLoaded` for diagnostics and for the recursive
/// self-reference trick of §4.4.
pub(crate) fn load_symbol(
    inner: &mut VmInner,
    state: &State,
    id: SymbolId,
    next_ip: usize,
) -> VmResult<StepOutcome> {
    inner.last_sym_loaded = Some(id);
    let at = inner.location();
    let value = inner
        .chain
        .lookup(id)
        .ok_or_else(|| VmError::UnboundVariable { symbol: symbol_name(state, id), at })?;
    inner.current_frame_mut().push(value);
    inner.set_ip(next_ip);
    Ok(StepOutcome::Continue)
}

/// `STORE id` (spec.md §4.3): mutate, not shadow, the existing binding.
pub(crate) fn store(
    inner: &mut VmInner,
    state: &State,
    id: SymbolId,
    next_ip: usize,
) -> VmResult<StepOutcome> {
    let at = inner.location();
    let value = inner.current_frame_mut().pop(at)?;
    match inner.chain.store(id, value) {
        Some(true) => {}
        Some(false) => {
            return Err(VmError::TypeError {
                message: format!("cannot STORE into the immutable binding '{}'", symbol_name(state, id)),
                at,
            })
        }
        None => return Err(VmError::UnboundVariable { symbol: symbol_name(state, id), at }),
    }
    inner.set_ip(next_ip);
    Ok(StepOutcome::Continue)
}

/// `LET id` (spec.md §4.3): a new immutable binding in the innermost
/// scope.
pub(crate) fn let_(
    inner: &mut VmInner,
    state: &State,
    id: SymbolId,
    next_ip: usize,
) -> VmResult<StepOutcome> {
    define(inner, state, id, next_ip, false)
}

/// `MUT id` (spec.md §4.3): as `LET`, but the binding may later be
/// `STORE`d.
pub(crate) fn mut_(
    inner: &mut VmInner,
    state: &State,
    id: SymbolId,
    next_ip: usize,
) -> VmResult<StepOutcome> {
    define(inner, state, id, next_ip, true)
}

fn define(
    inner: &mut VmInner,
    state: &State,
    id: SymbolId,
    next_ip: usize,
    mutable: bool,
) -> VmResult<StepOutcome> {
    let at = inner.location();
    let value = inner.current_frame_mut().pop(at)?;
    if !inner.chain.define_innermost(id, value, mutable) {
        return Err(VmError::Redefinition { symbol: symbol_name(state, id), at });
    }
    inner.set_ip(next_ip);
    Ok(StepOutcome::Continue)
}

/// `NEW_SCOPE` (spec.md §4.3): push a fresh scope, tracked by the current
/// frame's `scopeCountToDelete` so `RET` pops it back off.
pub(crate) fn new_scope(inner: &mut VmInner, next_ip: usize) -> VmResult<StepOutcome> {
    inner.chain.push_new();
    inner.current_frame_mut().scope_count_to_delete += 1;
    inner.set_ip(next_ip);
    Ok(StepOutcome::Continue)
}

/// `POP_SCOPE` (spec.md §4.3). A `scopeCountToDelete` of zero means there
/// is no matching `NEW_SCOPE` to undo — a malformed instruction stream,
/// since a well-formed compiler never emits an unbalanced pair.
pub(crate) fn pop_scope(inner: &mut VmInner, next_ip: usize) -> VmResult<StepOutcome> {
    if inner.current_frame().scope_count_to_delete == 0 {
        return Err(VmError::MalformedBytecode(
            "POP_SCOPE with no matching NEW_SCOPE in the current frame".into(),
        ));
    }
    inner.chain.pop();
    inner.current_frame_mut().scope_count_to_delete -= 1;
    inner.set_ip(next_ip);
    Ok(StepOutcome::Continue)
}

/// `CAPTURE id` (spec.md §4.3): pre-materialize an upvalue by copying the
/// nearest binding of `id` into the innermost scope.
pub(crate) fn capture(
    inner: &mut VmInner,
    state: &State,
    id: SymbolId,
    next_ip: usize,
) -> VmResult<StepOutcome> {
    let at = inner.location();
    let value = inner
        .chain
        .lookup(id)
        .ok_or_else(|| VmError::UnboundVariable { symbol: symbol_name(state, id), at })?;
    if !inner.chain.define_innermost(id, value, false) {
        return Err(VmError::Redefinition { symbol: symbol_name(state, id), at });
    }
    inner.set_ip(next_ip);
    Ok(StepOutcome::Continue)
}
