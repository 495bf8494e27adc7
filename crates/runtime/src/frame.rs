// Copyright (c) 2026 ArkVM contributors, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

use ark_vm_types::{Location, PageAddr, Value, VmError, VmResult};

/// An activation record (spec.md §3 "Frame"): the saved caller position,
/// the page this frame is executing, its own operand stack, and the count
/// of extra scopes it has pushed beyond its base scope.
pub struct Frame {
    pub return_page: PageAddr,
    pub return_ip: usize,
    pub page: PageAddr,
    pub scope_count_to_delete: usize,
    operand_stack: Vec<Value>,
}

impl Frame {
    pub fn new(page: PageAddr, return_page: PageAddr, return_ip: usize) -> Self {
        Frame { return_page, return_ip, page, scope_count_to_delete: 0, operand_stack: Vec::new() }
    }

    pub fn push(&mut self, value: Value) {
        self.operand_stack.push(value);
    }

    pub fn pop(&mut self, at: Location) -> VmResult<Value> {
        self.operand_stack.pop().ok_or(VmError::StackUnderflow { at })
    }

    pub fn top(&self, at: Location) -> VmResult<&Value> {
        self.operand_stack.last().ok_or(VmError::StackUnderflow { at })
    }

    pub fn stack_size(&self) -> usize {
        self.operand_stack.len()
    }

    /// `RET`'s forgiving pop: an empty operand stack yields `Nil` rather
    /// than `StackUnderflow` (spec.md §4.4: "if the popped frame's operand
    /// stack is non-empty, its top value is pushed... otherwise Nil").
    pub fn pop_or_nil(&mut self) -> Value {
        self.operand_stack.pop().unwrap_or(Value::Nil)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_pop_is_lifo() {
        use ark_vm_types::Number;
        let mut frame = Frame::new(0, 0, 0);
        frame.push(Value::Number(Number::Integer(1)));
        frame.push(Value::Number(Number::Integer(2)));
        assert_eq!(frame.pop(Location::new(0, 0)).unwrap(), Value::Number(Number::Integer(2)));
        assert_eq!(frame.pop(Location::new(0, 0)).unwrap(), Value::Number(Number::Integer(1)));
    }

    #[test]
    fn popping_an_empty_stack_is_a_stack_underflow() {
        let mut frame = Frame::new(0, 0, 0);
        assert!(matches!(frame.pop(Location::new(0, 0)), Err(VmError::StackUnderflow { .. })));
    }

    #[test]
    fn pop_or_nil_yields_nil_on_an_empty_stack() {
        let mut frame = Frame::new(0, 0, 0);
        assert_eq!(frame.pop_or_nil(), Value::Nil);
    }

    #[test]
    fn pop_or_nil_yields_the_top_value_when_present() {
        let mut frame = Frame::new(0, 0, 0);
        frame.push(Value::True);
        assert_eq!(frame.pop_or_nil(), Value::True);
    }

    #[test]
    fn new_frame_starts_with_a_zero_scope_count_to_delete() {
        let frame = Frame::new(2, 0, 5);
        assert_eq!(frame.scope_count_to_delete, 0);
        assert_eq!(frame.return_page, 0);
        assert_eq!(frame.return_ip, 5);
        assert_eq!(frame.stack_size(), 0);
    }
}
