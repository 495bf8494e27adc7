// Copyright (c) 2026 ArkVM contributors, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

use std::sync::Arc;

use ark_vm_types::value::VmHandle;
use ark_vm_types::{Location, NativeProcedure, SymbolId, Value, ValueKind, VmError, VmResult};

use crate::builtins::Builtins;
use crate::frame::Frame;
use crate::interpreter;
use crate::reentrant_lock::ReentrantLock;
use crate::scope_chain::ScopeChain;
use crate::state::State;

/// Per-VM mutable state guarded by the re-entrant host mutex: the scope
/// chain, the frame stack, and the current execution position.
pub(crate) struct VmInner {
    pub(crate) chain: ScopeChain,
    pub(crate) frames: Vec<Frame>,
    pub(crate) page: u16,
    pub(crate) ip: usize,
    pub(crate) last_sym_loaded: Option<SymbolId>,
}

impl VmInner {
    fn new() -> Self {
        VmInner {
            chain: ScopeChain::new(),
            frames: vec![Frame::new(0, 0, 0)],
            page: 0,
            ip: 0,
            last_sym_loaded: None,
        }
    }

    pub(crate) fn location(&self) -> Location {
        Location::new(self.page, self.ip)
    }

    pub(crate) fn current_frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("frame stack is never empty")
    }

    pub(crate) fn current_frame(&self) -> &Frame {
        self.frames.last().expect("frame stack is never empty")
    }

    pub(crate) fn set_ip(&mut self, ip: usize) {
        self.ip = ip;
    }
}

/// What a single dispatch step produced (spec.md §4.5).
pub(crate) enum StepOutcome {
    /// Keep looping; `VmInner::page`/`ip` already reflect the next
    /// instruction to execute.
    Continue,
    /// `HALT` was executed.
    Halted,
    /// The `CALL` opcode's `CProc` branch: the native procedure must run
    /// with the host lock released (spec.md §9 re-entrant mutex design).
    InvokeNative { proc: Arc<NativeProcedure>, args: Vec<Value>, resume_ip: usize },
}

pub(crate) enum ExitCondition {
    Halt,
    Watermark(usize),
}

fn kind_name(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Nil => "Nil",
        ValueKind::True => "True",
        ValueKind::False => "False",
        ValueKind::Undefined => "Undefined",
        ValueKind::Number => "Number",
        ValueKind::String => "String",
        ValueKind::List => "List",
        ValueKind::PageAddr => "PageAddr",
        ValueKind::CProc => "CProc",
        ValueKind::Closure => "Closure",
        ValueKind::User => "User",
    }
}

/// The bytecode virtual machine (spec.md §2 "Host interface"): one `Vm`
/// owns its own frame/scope state, and may share a read-only [`State`]
/// program image with other `Vm`s on other threads.
pub struct Vm {
    state: Arc<State>,
    builtins: Arc<Builtins>,
    lock: ReentrantLock<VmInner>,
}

impl Vm {
    pub fn new(state: Arc<State>, builtins: Arc<Builtins>) -> Self {
        Vm { state, builtins, lock: ReentrantLock::new(VmInner::new()) }
    }

    pub fn state(&self) -> &Arc<State> {
        &self.state
    }

    /// `run()` (spec.md §4.6): execute the top-level page (page 0) from
    /// `ip = 0` until `HALT`.
    pub fn run(&self) -> VmResult<()> {
        log::debug!("run: starting top-level page");
        let guard = self.lock.lock();
        let guard = self.drive(guard, ExitCondition::Halt)?;
        drop(guard);
        log::debug!("run: halted");
        Ok(())
    }

    /// `call(name, args…)` (spec.md §4.6). The resolved callee must be a
    /// `PageAddr` or `Closure`; a native procedure bound under `name` is
    /// rejected, matching the original `call()`'s explicit kind check.
    pub fn call(&self, name: &str, args: Vec<Value>) -> VmResult<Value> {
        let mut guard = self.lock.lock();
        let at = guard.location();
        let id = self
            .state
            .symbol_id(name)
            .ok_or_else(|| VmError::UnboundVariable { symbol: name.to_string(), at })?;
        let callee = guard
            .chain
            .lookup(id)
            .ok_or_else(|| VmError::UnboundVariable { symbol: name.to_string(), at })?;
        if !matches!(callee, Value::PageAddr(_) | Value::Closure(_)) {
            return Err(VmError::NotCallable { kind: kind_name(callee.kind()), at });
        }

        let watermark = guard.frames.len();
        let return_ip = guard.ip;
        let outcome =
            interpreter::funcall::perform_call(&mut guard, &self.state, callee, args, return_ip)?;
        let guard = self.settle_native_call(guard, outcome)?;
        let mut guard = self.drive(guard, ExitCondition::Watermark(watermark))?;
        let result = guard.current_frame_mut().pop_or_nil();
        drop(guard);
        Ok(result)
    }

    /// `resolve(value, args…)` (spec.md §4.6): like `call`, but the callee
    /// is supplied directly and `ip`/`pp` are saved and restored, so a
    /// native procedure can invoke a script function without losing the
    /// VM's place.
    pub fn resolve(&self, callee: Value, args: Vec<Value>) -> VmResult<Value> {
        let mut guard = self.lock.lock();
        if !callee.is_callable() {
            let at = guard.location();
            return Err(VmError::NotCallable { kind: kind_name(callee.kind()), at });
        }

        let saved_page = guard.page;
        let saved_ip = guard.ip;
        let watermark = guard.frames.len();
        let return_ip = guard.ip;
        let outcome =
            interpreter::funcall::perform_call(&mut guard, &self.state, callee, args, return_ip)?;
        let guard = self.settle_native_call(guard, outcome)?;
        let drive_result = self.drive(guard, ExitCondition::Watermark(watermark));
        match drive_result {
            Ok(mut guard) => {
                let result = guard.current_frame_mut().pop_or_nil();
                guard.page = saved_page;
                guard.ip = saved_ip;
                Ok(result)
            }
            Err(e) => Err(e),
        }
    }

    /// Runs `perform_call`'s `InvokeNative` outcome (a `CProc` invoked
    /// directly by `call`/`resolve`, not through the dispatch loop) with
    /// the same drop-lock/re-acquire discipline as `drive`.
    fn settle_native_call<'a>(
        &'a self,
        guard: crate::reentrant_lock::ReentrantGuard<'a, VmInner>,
        outcome: StepOutcome,
    ) -> VmResult<crate::reentrant_lock::ReentrantGuard<'a, VmInner>> {
        match outcome {
            StepOutcome::InvokeNative { proc, args, resume_ip } => {
                drop(guard);
                let result = proc.call(&args, self)?;
                let mut guard = self.lock.lock();
                guard.current_frame_mut().push(result);
                guard.set_ip(resume_ip);
                Ok(guard)
            }
            _ => Ok(guard),
        }
    }

    /// Drives the dispatch loop (spec.md §4.5) until `exit` is satisfied.
    /// Holds the host lock for the whole run, except for the window around
    /// a native-procedure call, which it makes with the lock released
    /// (spec.md §9).
    fn drive<'a>(
        &'a self,
        mut guard: crate::reentrant_lock::ReentrantGuard<'a, VmInner>,
        exit: ExitCondition,
    ) -> VmResult<crate::reentrant_lock::ReentrantGuard<'a, VmInner>> {
        loop {
            // Checked before stepping: a native call settled by
            // `settle_native_call` before entering `drive` may already have
            // left `frames.len()` at the watermark without pushing a frame,
            // and stepping first would run one extra instruction.
            if let ExitCondition::Watermark(w) = exit {
                if guard.frames.len() == w {
                    return Ok(guard);
                }
            }
            let outcome = interpreter::step(&mut guard, &self.state, &self.builtins)?;
            match outcome {
                StepOutcome::Halted => return Ok(guard),
                StepOutcome::Continue => {}
                StepOutcome::InvokeNative { proc, args, resume_ip } => {
                    drop(guard);
                    let result = proc.call(&args, self)?;
                    guard = self.lock.lock();
                    guard.current_frame_mut().push(result);
                    guard.set_ip(resume_ip);
                }
            }
        }
    }
}

impl VmHandle for Vm {
    fn resolve(&self, callee: Value, args: Vec<Value>) -> VmResult<Value> {
        Vm::resolve(self, callee, args)
    }
}
