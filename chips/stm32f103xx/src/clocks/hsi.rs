// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! HSI (high-speed internal) clock driver for the STM32F103. [^doc_ref]
//!
//! # Usage
//!
//! First, get a reference to the [Hsi] struct:
//! ```rust,ignore
//! let hsi = &clocks.hsi;
//! ```
//!
//! ## Start the clock
//!
//! ```rust,ignore
//! hsi.enable(&SpinWait)?;
//! ```
//!
//! ## Get the frequency of the clock
//! ```rust,ignore
//! let hsi_frequency_hz = hsi.get_frequency_hz().unwrap();
//! ```
//!
//! [^doc_ref]: See 7.2.2 in RM0008.

use crate::rcc::Rcc;
use crate::wait::WaitStrategy;
use crate::ErrorCode;

/// HSI frequency in Hz
pub const HSI_FREQUENCY_HZ: u32 = 8_000_000;

/// Main HSI clock structure
pub struct Hsi<'a> {
    rcc: &'a Rcc<'a>,
}

impl<'a> Hsi<'a> {
    pub(in crate::clocks) fn new(rcc: &'a Rcc<'a>) -> Self {
        Self { rcc }
    }

    /// Start the HSI clock and wait for it to stabilize.
    ///
    /// # Errors
    ///
    /// + [Err]\([ErrorCode::BUSY]\): `wait` gave up before the HSI clock was ready.
    pub fn enable(&self, wait: &dyn WaitStrategy) -> Result<(), ErrorCode> {
        self.rcc.enable_hsi_clock();
        trace!("HSION set, waiting for HSIRDY");

        wait.wait_until(&|| self.rcc.is_ready_hsi_clock())
    }

    /// Check whether the HSI clock is enabled or not.
    pub fn is_enabled(&self) -> bool {
        self.rcc.is_enabled_hsi_clock()
    }

    /// Check whether the HSI oscillator is stable.
    pub fn is_ready(&self) -> bool {
        self.rcc.is_ready_hsi_clock()
    }

    /// Get the frequency in Hz of the HSI clock.
    ///
    /// # Returns
    ///
    /// + [Some]\(frequency_hz\): if the HSI clock is enabled.
    /// + [None]: if the HSI clock is disabled.
    pub fn get_frequency_hz(&self) -> Option<u32> {
        if self.is_enabled() {
            Some(HSI_FREQUENCY_HZ)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rcc::RccRegister;
    use crate::sim::SimulatedRcc;
    use crate::wait::{BoundedWait, SpinWait};

    #[test]
    fn enabled_at_reset() {
        let sim = SimulatedRcc::new();
        let rcc = Rcc::new(&sim);
        let hsi = Hsi::new(&rcc);

        assert!(hsi.is_enabled());
        assert!(hsi.is_ready());
        assert_eq!(Some(HSI_FREQUENCY_HZ), hsi.get_frequency_hz());
    }

    #[test]
    fn enable_from_off() {
        let sim = SimulatedRcc::new();
        sim.preset(RccRegister::CR, 0);
        let rcc = Rcc::new(&sim);
        let hsi = Hsi::new(&rcc);

        assert_eq!(None, hsi.get_frequency_hz());
        assert_eq!(Ok(()), hsi.enable(&SpinWait));
        assert!(hsi.is_ready());
        assert_eq!(Some(8_000_000), hsi.get_frequency_hz());
    }

    #[test]
    fn unstable_oscillator() {
        let sim = SimulatedRcc::new();
        sim.preset(RccRegister::CR, 0);
        sim.stall(crate::rcc::SysClockSource::HSI);
        let rcc = Rcc::new(&sim);
        let hsi = Hsi::new(&rcc);

        assert_eq!(Err(ErrorCode::BUSY), hsi.enable(&BoundedWait::new(5)));
        assert!(hsi.is_enabled());
        assert!(!hsi.is_ready());
    }
}
