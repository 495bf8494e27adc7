// Copyright (c) 2026 ArkVM contributors, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::number::Number;
use crate::{PageAddr, SymbolId, VmError, VmResult};

/// A single binding in a [`ScopeData`]: a symbol id, its current value,
/// and whether `STORE` is allowed to mutate it (spec.md §4.3: `LET` binds
/// immutably, `MUT` binds mutably).
#[derive(Debug, Clone)]
pub struct Binding {
    pub id: SymbolId,
    pub value: Value,
    pub mutable: bool,
}

/// A lexical scope: a small associative map from symbol id to [`Value`]
/// (spec.md §3 "Scope"). Implemented as a flat vector rather than a hash
/// map — spec.md §4.2 notes most scopes hold no more than a handful of
/// bindings (function parameters plus a few `let`s).
#[derive(Debug, Default)]
pub struct ScopeData {
    bindings: Vec<Binding>,
}

impl ScopeData {
    pub fn new() -> Self {
        ScopeData { bindings: Vec::new() }
    }

    pub fn get(&self, id: SymbolId) -> Option<Value> {
        self.bindings.iter().find(|b| b.id == id).map(|b| b.value.clone())
    }

    pub fn contains(&self, id: SymbolId) -> bool {
        self.bindings.iter().any(|b| b.id == id)
    }

    /// `LET`/`MUT`: create a new binding. Returns `false` if `id` is
    /// already bound in this exact scope (the caller raises
    /// `Redefinition`, per spec.md §9's "shadow across scopes,
    /// redefinition-error within one scope" resolution).
    pub fn define(&mut self, id: SymbolId, value: Value, mutable: bool) -> bool {
        if self.contains(id) {
            return false;
        }
        self.bindings.push(Binding { id, value, mutable });
        true
    }

    /// `STORE`: mutate an existing binding in this exact scope. Returns
    /// `None` if `id` is not bound here (the caller continues the walk up
    /// the chain); returns `Some(false)` if bound but immutable.
    pub fn store(&mut self, id: SymbolId, value: Value) -> Option<bool> {
        let binding = self.bindings.iter_mut().find(|b| b.id == id)?;
        if !binding.mutable {
            return Some(false);
        }
        binding.value = value;
        Some(true)
    }
}

/// A shared, lexically-scoped binding environment (spec.md §3 "Scope" /
/// §9 design note). `Arc` is required so a [`Value::Closure`] can retain
/// the scope after its owning [`Frame`](crate) has returned; the `Mutex`
/// is required for `Arc<T>` to be `Sync`, but is never contended, since
/// only the thread currently holding the VM's re-entrant host lock ever
/// touches a `Scope`.
pub type Scope = Arc<Mutex<ScopeData>>;

pub fn new_scope() -> Scope {
    Arc::new(Mutex::new(ScopeData::new()))
}

/// A native procedure exposed to script code as a [`Value::CProc`]
/// (spec.md §3, §6 "Native procedure ABI").
pub struct NativeProcedure {
    pub name: String,
    #[allow(clippy::type_complexity)]
    func: Box<dyn Fn(&[Value], &dyn VmHandle) -> VmResult<Value> + Send + Sync>,
}

impl NativeProcedure {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value], &dyn VmHandle) -> VmResult<Value> + Send + Sync + 'static,
    {
        NativeProcedure { name: name.into(), func: Box::new(func) }
    }

    pub fn call(&self, args: &[Value], vm: &dyn VmHandle) -> VmResult<Value> {
        (self.func)(args, vm)
    }
}

impl fmt::Debug for NativeProcedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeProcedure").field("name", &self.name).finish()
    }
}

/// The handle a native procedure receives alongside its arguments
/// (spec.md §6: "A native procedure receives an ordered sequence of
/// Values and a VM handle"). Implemented by `ark_vm_runtime::Vm`; kept as
/// a trait here so this crate does not need to depend on the runtime
/// crate that implements it.
pub trait VmHandle {
    /// Invoke a script function (a `PageAddr` or `Closure`) from host
    /// code, per spec.md §4.6 `resolve`. Native procedures must use this
    /// rather than any top-level `run`/`call` entry point, which would
    /// deadlock or corrupt state (spec.md §6).
    fn resolve(&self, callee: Value, args: Vec<Value>) -> VmResult<Value>;
}

/// The captured environment of a closure: a snapshot of the scope chain
/// as it existed when `SAVE_ENV` ran, paired with the page it wraps
/// (spec.md §3 "Closure").
#[derive(Debug, Clone)]
pub struct ClosureData {
    pub captured_chain: Vec<Scope>,
    pub page: PageAddr,
}

/// The tagged union at the center of the VM (spec.md §3, §4.1).
///
/// `List`, `String` and `Closure` share their payload through `Arc` so
/// that copying a `Value` is O(1) (spec.md §4.1); all other kinds are
/// by-value. `List`/`String` are immutable once built — the core
/// instruction set has no opcode that mutates either in place, only
/// `Scope` bindings are mutated (by `STORE`) — so no interior mutability
/// is needed for them.
#[derive(Clone)]
pub enum Value {
    Nil,
    True,
    False,
    Undefined,
    Number(Number),
    String(Arc<str>),
    List(Arc<Vec<Value>>),
    PageAddr(PageAddr),
    CProc(Arc<NativeProcedure>),
    Closure(Arc<ClosureData>),
    User(Arc<dyn Any + Send + Sync>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Nil,
    True,
    False,
    Undefined,
    Number,
    String,
    List,
    PageAddr,
    CProc,
    Closure,
    User,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
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
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Nil => ValueKind::Nil,
            Value::True => ValueKind::True,
            Value::False => ValueKind::False,
            Value::Undefined => ValueKind::Undefined,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::PageAddr(_) => ValueKind::PageAddr,
            Value::CProc(_) => ValueKind::CProc,
            Value::Closure(_) => ValueKind::Closure,
            Value::User(_) => ValueKind::User,
        }
    }

    /// The truth rule of spec.md §4.3 `POP_JUMP_IF_TRUE`: `False`, `Nil`,
    /// an empty `List`, an empty `String` and a zero `Number` are false;
    /// everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::False | Value::Nil => false,
            Value::Number(n) => !n.is_zero(),
            Value::String(s) => !s.is_empty(),
            Value::List(l) => !l.is_empty(),
            _ => true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::PageAddr(_) | Value::Closure(_) | Value::CProc(_))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::True => write!(f, "True"),
            Value::False => write!(f, "False"),
            Value::Undefined => write!(f, "Undefined"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::List(l) => f.debug_list().entries(l.iter()).finish(),
            Value::PageAddr(p) => write!(f, "PageAddr({p})"),
            Value::CProc(p) => write!(f, "CProc({})", p.name),
            Value::Closure(c) => write!(f, "Closure(page={})", c.page),
            Value::User(_) => write!(f, "User(..)"),
        }
    }
}

impl PartialEq for Value {
    /// Natural equality within a kind (spec.md §4.1); `Closure`/`CProc`
    /// compare by identity (pointer equality of the shared payload).
    /// Mixed-kind comparisons are simply unequal here — callers that need
    /// the spec's "mixed-kind comparisons fail with a type error" for
    /// ordering use [`Value::compare`] instead.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil)
            | (Value::True, Value::True)
            | (Value::False, Value::False)
            | (Value::Undefined, Value::Undefined) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::PageAddr(a), Value::PageAddr(b)) => a == b,
            (Value::CProc(a), Value::CProc(b)) => Arc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// Ordering comparison used by native comparison procedures; fails
    /// with `TypeError` on mismatched kinds (spec.md §4.1).
    pub fn compare(&self, other: &Self, at: crate::Location) -> VmResult<std::cmp::Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b).ok_or_else(|| {
                VmError::TypeError { message: "un-orderable numbers (NaN)".into(), at }
            }),
            (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = x.compare(y, at)?;
                    if ord != std::cmp::Ordering::Equal {
                        return Ok(ord);
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            _ => Err(VmError::TypeError {
                message: format!("cannot compare {} with {}", self.kind(), other.kind()),
                at,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Location;

    fn loc() -> Location {
        Location::new(0, 0)
    }

    #[test]
    fn falsy_values_match_the_truth_rule_of_pop_jump_if_true() {
        assert!(!Value::False.is_truthy());
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Number(Number::Integer(0)).is_truthy());
        assert!(!Value::String(Arc::from("")).is_truthy());
        assert!(!Value::List(Arc::new(vec![])).is_truthy());
    }

    #[test]
    fn truthy_values_match_the_truth_rule() {
        assert!(Value::True.is_truthy());
        assert!(Value::Number(Number::Integer(1)).is_truthy());
        assert!(Value::String(Arc::from("x")).is_truthy());
        assert!(Value::List(Arc::new(vec![Value::Nil])).is_truthy());
        assert!(Value::Undefined.is_truthy());
    }

    #[test]
    fn copying_a_shared_value_is_cheap_and_equal() {
        let list = Value::List(Arc::new(vec![Value::Number(Number::Integer(1))]));
        let copy = list.clone();
        assert_eq!(list, copy);
    }

    #[test]
    fn closures_compare_by_identity_not_structure() {
        let a = Value::Closure(Arc::new(ClosureData { captured_chain: vec![], page: 3 }));
        let b = Value::Closure(Arc::new(ClosureData { captured_chain: vec![], page: 3 }));
        assert_ne!(a, b);
        let a_again = a.clone();
        assert_eq!(a, a_again);
    }

    #[test]
    fn mixed_kind_equality_is_simply_false() {
        assert_ne!(Value::Nil, Value::Number(Number::Integer(0)));
    }

    #[test]
    fn mixed_kind_ordering_is_a_type_error() {
        let err = Value::Number(Number::Integer(1)).compare(&Value::Nil, loc());
        assert!(matches!(err, Err(VmError::TypeError { .. })));
    }

    #[test]
    fn list_ordering_is_lexicographic() {
        let a = Value::List(Arc::new(vec![Value::Number(Number::Integer(1))]));
        let b = Value::List(Arc::new(vec![
            Value::Number(Number::Integer(1)),
            Value::Number(Number::Integer(2)),
        ]));
        assert_eq!(a.compare(&b, loc()).unwrap(), std::cmp::Ordering::Less);
    }

    #[test]
    fn scope_data_rejects_redefinition_in_the_same_scope() {
        let mut scope = ScopeData::new();
        assert!(scope.define(0, Value::Nil, false));
        assert!(!scope.define(0, Value::True, false));
    }

    #[test]
    fn scope_data_store_rejects_mutation_of_an_immutable_binding() {
        let mut scope = ScopeData::new();
        scope.define(0, Value::Nil, false);
        assert_eq!(scope.store(0, Value::True), Some(false));
    }

    #[test]
    fn scope_data_store_updates_a_mutable_binding() {
        let mut scope = ScopeData::new();
        scope.define(0, Value::Nil, true);
        assert_eq!(scope.store(0, Value::True), Some(true));
        assert_eq!(scope.get(0), Some(Value::True));
    }

    #[test]
    fn scope_data_store_on_an_unbound_id_returns_none() {
        let mut scope = ScopeData::new();
        assert_eq!(scope.store(5, Value::Nil), None);
    }
}
