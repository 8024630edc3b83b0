// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! HSE (high-speed external) clock driver for the STM32F103. [^doc_ref]
//!
//! The HSE runs either from a crystal/ceramic resonator ([HseMode::Crystal]) or from an external
//! clock signal fed to OSC_IN ([HseMode::Rc]), in which case the oscillator is bypassed.
//!
//! # Usage
//!
//! ```rust,ignore
//! let hse = &clocks.hse;
//! hse.enable(HseMode::Crystal, &SpinWait)?;
//! let hse_frequency_hz = hse.get_frequency_hz().unwrap();
//! ```
//!
//! [^doc_ref]: See 7.2.1 in RM0008.

use crate::config::HseMode;
use crate::rcc::Rcc;
use crate::wait::WaitStrategy;
use crate::ErrorCode;

/// Main HSE clock structure
pub struct Hse<'a> {
    rcc: &'a Rcc<'a>,
    hse_frequency_hz: Option<u32>,
}

impl<'a> Hse<'a> {
    // The frequency is a board property: `None` when the board does not describe an HSE.
    pub(in crate::clocks) fn new(rcc: &'a Rcc<'a>, hse_frequency_hz: Option<u32>) -> Self {
        Self {
            rcc,
            hse_frequency_hz,
        }
    }

    /// Start the HSE clock and wait for it to stabilize.
    ///
    /// The bypass bit is written before HSEON, as it can only be changed while the HSE is off.
    ///
    /// # Errors
    ///
    /// + [Err]\([ErrorCode::BUSY]\): `wait` gave up before the HSE clock was ready.
    pub fn enable(&self, mode: HseMode, wait: &dyn WaitStrategy) -> Result<(), ErrorCode> {
        match mode {
            HseMode::Rc => self.rcc.enable_hse_clock_bypass(),
            HseMode::Crystal => self.rcc.disable_hse_clock_bypass(),
        }

        self.rcc.enable_hse_clock();
        trace!("HSEON set ({:?}), waiting for HSERDY", mode);

        wait.wait_until(&|| self.rcc.is_ready_hse_clock())
    }

    /// Check whether the HSE clock is enabled or not.
    pub fn is_enabled(&self) -> bool {
        self.rcc.is_enabled_hse_clock()
    }

    /// Check whether the HSE oscillator is stable.
    pub fn is_ready(&self) -> bool {
        self.rcc.is_ready_hse_clock()
    }

    /// Mode the HSE is currently configured for.
    pub fn get_mode(&self) -> HseMode {
        if self.rcc.is_enabled_hse_clock_bypass() {
            HseMode::Rc
        } else {
            HseMode::Crystal
        }
    }

    /// Get the frequency in Hz of the HSE clock.
    ///
    /// # Returns
    ///
    /// + [Some]\(frequency_hz\): if the HSE clock is enabled and its frequency is known.
    /// + [None]: otherwise.
    pub fn get_frequency_hz(&self) -> Option<u32> {
        if self.is_enabled() {
            self.hse_frequency_hz
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rcc::SysClockSource;
    use crate::sim::SimulatedRcc;
    use crate::wait::{BoundedWait, SpinWait};

    #[test]
    fn disabled_at_reset() {
        let sim = SimulatedRcc::new();
        let rcc = Rcc::new(&sim);
        let hse = Hse::new(&rcc, Some(8_000_000));

        assert!(!hse.is_enabled());
        assert_eq!(None, hse.get_frequency_hz());
    }

    #[test]
    fn crystal_and_rc_modes() {
        let sim = SimulatedRcc::new();
        let rcc = Rcc::new(&sim);
        let hse = Hse::new(&rcc, Some(8_000_000));

        assert_eq!(Ok(()), hse.enable(HseMode::Rc, &SpinWait));
        assert_eq!(HseMode::Rc, hse.get_mode());
        assert_eq!(Some(8_000_000), hse.get_frequency_hz());

        assert_eq!(Ok(()), hse.enable(HseMode::Crystal, &SpinWait));
        assert_eq!(HseMode::Crystal, hse.get_mode());
        assert!(hse.is_ready());
    }

    #[test]
    fn unstable_oscillator() {
        let sim = SimulatedRcc::new();
        sim.stall(SysClockSource::HSE);
        let rcc = Rcc::new(&sim);
        let hse = Hse::new(&rcc, None);

        assert_eq!(Err(ErrorCode::BUSY), hse.enable(HseMode::Crystal, &BoundedWait::new(3)));
        assert!(hse.is_enabled());
        assert!(!hse.is_ready());
        assert_eq!(None, hse.get_frequency_hz());
    }
}
