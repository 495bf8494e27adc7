// Copyright (c) 2026 ArkVM contributors, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

use std::sync::Arc;

use ark_vm_types::value::{ClosureData, Scope};
use ark_vm_types::{PageAddr, Value, VmError, VmResult};

use crate::builtins::Builtins;
use crate::frame::Frame;
use crate::state::State;
use crate::vm::{StepOutcome, VmInner};

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Nil => "Nil",
        Value::True => "True",
        Value::False => "False",
        Value::Undefined => "Undefined",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
        Value::List(_) => "List",
        Value::PageAddr(_) => "PageAddr",
        Value::CProc(_) => "CProc",
        Value::Closure(_) => "Closure",
        Value::User(_) => "User",
    }
}

/// `BUILTIN k` (spec.md §4.3): push the k-th value from the fixed
/// registry.
pub(crate) fn builtin(
    inner: &mut VmInner,
    builtins: &Builtins,
    k: u16,
    next_ip: usize,
) -> VmResult<StepOutcome> {
    let value = builtins
        .get(k)
        .cloned()
        .ok_or_else(|| VmError::MalformedBytecode(format!("builtin index {k} out of range")))?;
    inner.current_frame_mut().push(value);
    inner.set_ip(next_ip);
    Ok(StepOutcome::Continue)
}

/// `SAVE_ENV` (spec.md §4.3): pop a page address, push a Closure pairing
/// it with a snapshot of the current scope chain.
pub(crate) fn save_env(inner: &mut VmInner, next_ip: usize) -> VmResult<StepOutcome> {
    let at = inner.location();
    let top = inner.current_frame_mut().pop(at)?;
    let page = match top {
        Value::PageAddr(p) => p,
        other => {
            return Err(VmError::TypeError {
                message: format!(
                    "SAVE_ENV expects a PageAddr on top of the stack, found {}",
                    kind_name(&other)
                ),
                at,
            })
        }
    };
    let captured_chain = inner.chain.snapshot();
    let closure = Value::Closure(Arc::new(ClosureData { captured_chain, page }));
    inner.current_frame_mut().push(closure);
    inner.set_ip(next_ip);
    Ok(StepOutcome::Continue)
}

/// `CALL argc` (spec.md §4.4): pop the callee and its `argc` arguments off
/// the current frame, in source order, then dispatch on the callee's kind.
pub(crate) fn call(
    inner: &mut VmInner,
    state: &State,
    argc: u16,
    next_ip: usize,
) -> VmResult<StepOutcome> {
    let at = inner.location();
    let callee = inner.current_frame_mut().pop(at)?;
    let n = argc as usize;
    let mut args = Vec::with_capacity(n);
    for _ in 0..n {
        args.push(inner.current_frame_mut().pop(at)?);
    }
    args.reverse();
    perform_call(inner, state, callee, args, next_ip)
}

/// The calling convention of spec.md §4.4, shared by the `CALL` opcode and
/// the `call`/`resolve` host entry points.
pub(crate) fn perform_call(
    inner: &mut VmInner,
    state: &State,
    callee: Value,
    args: Vec<Value>,
    return_ip: usize,
) -> VmResult<StepOutcome> {
    let at = inner.location();
    match callee {
        Value::CProc(proc) => Ok(StepOutcome::InvokeNative { proc, args, resume_ip: return_ip }),
        Value::PageAddr(p) => {
            let callee = Value::PageAddr(p);
            enter_page(inner, state, p, &[], args, return_ip, callee)
        }
        Value::Closure(c) => {
            let page = c.page;
            let chain = c.captured_chain.clone();
            let callee = Value::Closure(c);
            enter_page(inner, state, page, &chain, args, return_ip, callee)
        }
        other => Err(VmError::NotCallable { kind: kind_name(&other), at }),
    }
}

#[allow(clippy::too_many_arguments)]
fn enter_page(
    inner: &mut VmInner,
    state: &State,
    page: PageAddr,
    captured_chain: &[Scope],
    args: Vec<Value>,
    return_ip: usize,
    callee: Value,
) -> VmResult<StepOutcome> {
    let at = inner.location();
    if page as usize >= state.page_count() {
        return Err(VmError::PageOutOfRange { page, at });
    }

    let return_page = inner.page;
    let spliced = inner.chain.splice(captured_chain);
    inner.chain.push_new();

    if state.feature_flags.function_arity_check {
        let arity = state.arity_of(page, at)?;
        if arity != args.len() {
            inner.chain.pop();
            inner.chain.pop_n(spliced);
            let symbol = inner
                .last_sym_loaded
                .and_then(|id| state.symbol_name(id))
                .unwrap_or("<anonymous>")
                .to_string();
            return Err(VmError::ArityMismatch { expected: arity, got: args.len(), symbol, at });
        }
    }

    let mut frame = Frame::new(page, return_page, return_ip);
    frame.scope_count_to_delete = spliced;
    // Pushed in reverse so the first argument ends up on top, matching the
    // declaration-order MUT prefix: the first MUT pops the first argument,
    // binding param_i = arg_i (VM.inl's transfer loop + host call()).
    for arg in args.into_iter().rev() {
        frame.push(arg);
    }

    // Diagnostic aid for recursive self-reference by name (spec.md §4.4):
    // if the callee was just resolved by LOAD_SYMBOL, re-bind that same id
    // to the callee inside its own new scope.
    if let Some(last_id) = inner.last_sym_loaded {
        if state.symbol_name(last_id).is_some() {
            inner.chain.define_innermost(last_id, callee, true);
        }
    }

    inner.frames.push(frame);
    inner.page = page;
    inner.ip = 0;
    Ok(StepOutcome::Continue)
}

/// `RET` (spec.md §4.4): pop the current frame, propagate its top operand
/// (or `Nil`) to the caller, and pop `1 + scopeCountToDelete` scopes.
pub(crate) fn ret(inner: &mut VmInner) -> VmResult<StepOutcome> {
    if inner.frames.len() <= 1 {
        return Err(VmError::MalformedBytecode("RET with no active call frame".into()));
    }
    let mut frame = inner.frames.pop().expect("checked above");
    let return_value = frame.pop_or_nil();

    for _ in 0..(1 + frame.scope_count_to_delete) {
        inner.chain.pop();
    }

    inner.page = frame.return_page;
    inner.ip = frame.return_ip;
    inner.current_frame_mut().push(return_value);
    Ok(StepOutcome::Continue)
}
