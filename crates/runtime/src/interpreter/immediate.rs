// Copyright (c) 2026 ArkVM contributors, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

use ark_vm_types::VmResult;

use crate::state::State;
use crate::vm::{StepOutcome, VmInner};

/// `LOAD_CONST k` (spec.md §4.3): push `constants[k]`.
pub(crate) fn load_const(
    inner: &mut VmInner,
    state: &State,
    k: u16,
    next_ip: usize,
) -> VmResult<StepOutcome> {
    let value = state.constant(k)?;
    inner.current_frame_mut().push(value);
    inner.set_ip(next_ip);
    Ok(StepOutcome::Continue)
}
