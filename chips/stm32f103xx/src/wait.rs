// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Ready-flag polling policies.
//!
//! The clock drivers never select an oscillator before its ready flag reads 1. How long they are
//! willing to poll for it is decided by a [WaitStrategy]:
//!
//! + [SpinWait] polls forever. This is what the hardware expects at boot: an oscillator that
//!   never stabilizes leaves the chip on its reset clock.
//! + [BoundedWait] gives up after a fixed number of polls and reports [ErrorCode::BUSY].

use crate::ErrorCode;

/// Policy used to wait for a ready flag.
pub trait WaitStrategy {
    /// Poll `ready` until it returns `true`.
    ///
    /// # Errors
    ///
    /// + [Err]\([ErrorCode::BUSY]\): the strategy gave up before `ready` returned `true`
    fn wait_until(&self, ready: &dyn Fn() -> bool) -> Result<(), ErrorCode>;
}

/// Unbounded busy wait
#[derive(Clone, Copy, Debug, Default)]
pub struct SpinWait;

impl WaitStrategy for SpinWait {
    fn wait_until(&self, ready: &dyn Fn() -> bool) -> Result<(), ErrorCode> {
        while !ready() {
            core::hint::spin_loop();
        }
        Ok(())
    }
}

/// Busy wait that gives up after a fixed number of polls.
#[derive(Clone, Copy, Debug)]
pub struct BoundedWait {
    attempts: usize,
}

impl BoundedWait {
    /// Poll at most `attempts` times.
    pub const fn new(attempts: usize) -> Self {
        Self { attempts }
    }

    pub const fn attempts(&self) -> usize {
        self.attempts
    }
}

impl WaitStrategy for BoundedWait {
    fn wait_until(&self, ready: &dyn Fn() -> bool) -> Result<(), ErrorCode> {
        for _ in 0..self.attempts {
            if ready() {
                return Ok(());
            }
        }

        warn!("ready flag still low after {} polls", self.attempts);
        Err(ErrorCode::BUSY)
    }
}
