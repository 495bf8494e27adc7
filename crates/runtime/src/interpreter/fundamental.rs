// Copyright (c) 2026 ArkVM contributors, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

use ark_vm_types::VmResult;

use crate::vm::{StepOutcome, VmInner};

pub(crate) fn nop(inner: &mut VmInner, next_ip: usize) -> VmResult<StepOutcome> {
    inner.set_ip(next_ip);
    Ok(StepOutcome::Continue)
}

pub(crate) fn halt() -> VmResult<StepOutcome> {
    Ok(StepOutcome::Halted)
}
