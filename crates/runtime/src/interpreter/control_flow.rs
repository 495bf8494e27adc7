// Copyright (c) 2026 ArkVM contributors, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

use ark_vm_types::{VmError, VmResult};

use crate::state::State;
use crate::vm::{StepOutcome, VmInner};

fn validate_target(inner: &VmInner, state: &State, target: u16) -> VmResult<()> {
    let len = state.page_len(inner.page)?;
    if target as usize >= len {
        return Err(VmError::PageOutOfRange { page: inner.page, at: inner.location() });
    }
    Ok(())
}

/// `JUMP p` (spec.md §4.3): unconditional transfer within the current
/// page.
pub(crate) fn jump(inner: &mut VmInner, state: &State, target: u16) -> VmResult<StepOutcome> {
    validate_target(inner, state, target)?;
    inner.set_ip(target as usize);
    Ok(StepOutcome::Continue)
}

/// `POP_JUMP_IF_TRUE p` (spec.md §4.3): pop one value, and jump only if it
/// is truthy under the spec's truth rule.
pub(crate) fn pop_jump_if_true(
    inner: &mut VmInner,
    state: &State,
    target: u16,
    next_ip: usize,
) -> VmResult<StepOutcome> {
    let at = inner.location();
    let value = inner.current_frame_mut().pop(at)?;
    if value.is_truthy() {
        validate_target(inner, state, target)?;
        inner.set_ip(target as usize);
    } else {
        inner.set_ip(next_ip);
    }
    Ok(StepOutcome::Continue)
}
