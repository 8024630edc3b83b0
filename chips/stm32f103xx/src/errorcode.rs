// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Standard error enum for clock operations

use core::convert::Infallible;

/// Errors returned by the clock controller.
///
/// The discriminants match the kernel-wide error numbering so a board can pass them through
/// unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(usize)]
pub enum ErrorCode {
    /// Generic failure condition. Produced for an unrecognized bus identifier.
    FAIL = 0,
    /// Underlying system is busy; a bounded wait for a ready flag ran out of attempts
    BUSY = 1,
    /// An invalid parameter was passed
    INVAL = 5,
}

impl From<ErrorCode> for usize {
    fn from(err: ErrorCode) -> usize {
        err as usize
    }
}

// Lets already-typed arguments go through the same `TryInto` path as raw identifiers.
impl From<Infallible> for ErrorCode {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
