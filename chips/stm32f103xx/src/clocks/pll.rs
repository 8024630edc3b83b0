// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Phase-locked loop (PLL) clock driver for the STM32F103. [^doc_ref]
//!
//! The PLL multiplies its input clock by a factor between 2 and 16. The input is either HSI/2
//! or HSE (optionally divided by 2, this driver always leaves it undivided).
//!
//! Source and multiplier can only be changed while the PLL is off. Once the PLL is enabled the
//! hardware ignores writes to them.
//!
//! # Usage
//!
//! ```rust,ignore
//! let pll = &clocks.pll;
//! pll.set_multiplier(PllMultiplier::new(9).unwrap());
//! pll.set_source(PllSource::Hsi);
//! pll.enable(&SpinWait)?;
//! ```
//!
//! [^doc_ref]: See 7.2.3 in RM0008.

use crate::clocks::hsi::HSI_FREQUENCY_HZ;
use crate::config::{HseMode, PllMultiplier, PllSource};
use crate::rcc::{Rcc, CFGR};
use crate::wait::WaitStrategy;
use crate::ErrorCode;

/// Main PLL clock structure.
pub struct Pll<'a> {
    rcc: &'a Rcc<'a>,
    hse_frequency_hz: Option<u32>,
}

impl<'a> Pll<'a> {
    pub(in crate::clocks) fn new(rcc: &'a Rcc<'a>, hse_frequency_hz: Option<u32>) -> Self {
        Self {
            rcc,
            hse_frequency_hz,
        }
    }

    /// Program the multiplication factor.
    ///
    /// The PLLMUL field is written one bit at a time, from its least significant bit up.
    pub fn set_multiplier(&self, multiplier: PllMultiplier) {
        if self.is_enabled() {
            warn!("PLL already running, multiplier x{} ignored", multiplier.get());
        }

        let bits = multiplier.field_value();
        for bit in 0..CFGR::PLLMUL.mask.count_ones() as usize {
            self.rcc.set_pll_multiplier_bit(bit, bits >> bit & 1);
        }
    }

    /// Select the PLL input clock.
    ///
    /// The input oscillator itself must be started separately.
    pub fn set_source(&self, source: PllSource) {
        if self.is_enabled() {
            warn!("PLL already running, source {:?} ignored", source);
        }

        match source {
            PllSource::Hsi => self.rcc.set_pll_clocks_source_hsi(),
            PllSource::Hse(_) => {
                self.rcc.set_pll_clocks_source_hse();
                self.rcc.set_hse_pll_divider(false);
            }
        }
    }

    /// Start the PLL clock and wait for it to lock.
    ///
    /// # Errors
    ///
    /// + [Err]\([ErrorCode::BUSY]\): `wait` gave up before the PLL was locked.
    pub fn enable(&self, wait: &dyn WaitStrategy) -> Result<(), ErrorCode> {
        self.rcc.enable_pll_clock();
        trace!("PLLON set, waiting for PLLRDY");

        wait.wait_until(&|| self.rcc.is_locked_pll_clock())
    }

    /// Check whether the PLL clock is enabled or not.
    pub fn is_enabled(&self) -> bool {
        self.rcc.is_enabled_pll_clock()
    }

    /// Check whether the PLL output is stable.
    pub fn is_locked(&self) -> bool {
        self.rcc.is_locked_pll_clock()
    }

    /// Currently selected input clock
    pub fn get_source(&self) -> PllSource {
        if !self.rcc.is_hse_pll_clocks_source() {
            PllSource::Hsi
        } else if self.rcc.is_enabled_hse_clock_bypass() {
            PllSource::Hse(HseMode::Rc)
        } else {
            PllSource::Hse(HseMode::Crystal)
        }
    }

    /// Currently programmed multiplication factor
    pub fn get_multiplier(&self) -> PllMultiplier {
        PllMultiplier::from_field_value(self.rcc.get_pll_multiplier_field())
    }

    /// Get the frequency in Hz of the PLL clock.
    ///
    /// # Returns
    ///
    /// + [Some]\(frequency_hz\): if the PLL clock is enabled and its input frequency is known.
    /// + [None]: otherwise.
    pub fn get_frequency_hz(&self) -> Option<u32> {
        if !self.is_enabled() {
            return None;
        }

        let input_frequency_hz = match self.get_source() {
            PllSource::Hsi => HSI_FREQUENCY_HZ / 2,
            PllSource::Hse(_) if self.rcc.is_hse_pll_divided() => self.hse_frequency_hz? / 2,
            PllSource::Hse(_) => self.hse_frequency_hz?,
        };

        Some(input_frequency_hz * self.get_multiplier().get() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rcc::{RccRegister, SysClockSource};
    use crate::sim::SimulatedRcc;
    use crate::wait::{BoundedWait, SpinWait};

    fn multiplier(value: u8) -> PllMultiplier {
        PllMultiplier::new(value).unwrap()
    }

    #[test]
    fn multiplier_is_written_bit_by_bit() {
        let sim = SimulatedRcc::new();
        let rcc = Rcc::new(&sim);
        let pll = Pll::new(&rcc, None);

        pll.set_multiplier(multiplier(9));

        let writes: usize = sim
            .trace()
            .filter(|access| access.is_write_to(RccRegister::CFGR))
            .count();
        assert_eq!(4, writes);
        assert_eq!(0b0111 << 18, sim.value(RccRegister::CFGR));
        assert_eq!(multiplier(9), pll.get_multiplier());
    }

    #[test]
    fn multiplier_overwrites_previous_value() {
        let sim = SimulatedRcc::new();
        let rcc = Rcc::new(&sim);
        let pll = Pll::new(&rcc, None);

        pll.set_multiplier(multiplier(16));
        pll.set_multiplier(multiplier(3));

        assert_eq!(0b0001 << 18, sim.value(RccRegister::CFGR));
        assert_eq!(multiplier(3), pll.get_multiplier());
    }

    #[test]
    fn hse_source_is_undivided() {
        let sim = SimulatedRcc::new();
        sim.preset(RccRegister::CFGR, 1 << 17);
        let rcc = Rcc::new(&sim);
        let pll = Pll::new(&rcc, Some(8_000_000));

        pll.set_source(PllSource::Hse(HseMode::Crystal));

        assert_eq!(1 << 16, sim.value(RccRegister::CFGR));
        assert_eq!(PllSource::Hse(HseMode::Crystal), pll.get_source());
    }

    #[test]
    fn frequency_from_hsi() {
        let sim = SimulatedRcc::new();
        let rcc = Rcc::new(&sim);
        let pll = Pll::new(&rcc, None);

        pll.set_multiplier(multiplier(9));
        pll.set_source(PllSource::Hsi);
        assert_eq!(None, pll.get_frequency_hz());

        assert_eq!(Ok(()), pll.enable(&SpinWait));
        assert!(pll.is_locked());
        assert_eq!(Some(36_000_000), pll.get_frequency_hz());
    }

    #[test]
    fn frequency_from_divided_hse() {
        let sim = SimulatedRcc::new();
        let rcc = Rcc::new(&sim);
        let pll = Pll::new(&rcc, Some(16_000_000));

        pll.set_multiplier(multiplier(9));
        pll.set_source(PllSource::Hse(HseMode::Crystal));
        rcc.set_hse_pll_divider(true);
        assert_eq!(Ok(()), pll.enable(&SpinWait));

        assert_eq!(Some(72_000_000), pll.get_frequency_hz());
    }

    #[test]
    fn configuration_is_ignored_while_running() {
        let sim = SimulatedRcc::new();
        let rcc = Rcc::new(&sim);
        let pll = Pll::new(&rcc, Some(8_000_000));

        pll.set_multiplier(multiplier(9));
        pll.set_source(PllSource::Hsi);
        assert_eq!(Ok(()), pll.enable(&SpinWait));

        pll.set_multiplier(multiplier(4));
        pll.set_source(PllSource::Hse(HseMode::Crystal));

        assert_eq!(multiplier(9), pll.get_multiplier());
        assert_eq!(PllSource::Hsi, pll.get_source());
        assert_eq!(Some(36_000_000), pll.get_frequency_hz());
    }

    #[test]
    fn lock_timeout() {
        let sim = SimulatedRcc::new();
        sim.stall(SysClockSource::PLL);
        let rcc = Rcc::new(&sim);
        let pll = Pll::new(&rcc, None);

        assert_eq!(Err(ErrorCode::BUSY), pll.enable(&BoundedWait::new(4)));
        assert!(pll.is_enabled());
        assert!(!pll.is_locked());
    }
}
