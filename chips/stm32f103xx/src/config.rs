// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Board clock configuration.
//!
//! A board describes its clock tree once, in a `const` item:
//!
//! ```rust,ignore
//! use stm32f103xx::config::{ClockConfig, HseMode};
//!
//! const CLOCK_CONFIG: ClockConfig = ClockConfig::pll_from_hse(HseMode::Crystal, 8_000_000, 9);
//! ```
//!
//! The constructors are `const fn`s that panic on values the chip cannot run with: a PLL
//! multiplier outside [2, 16], an HSE frequency outside the range of its mode ([4, 16] MHz for a
//! crystal, [1, 25] MHz for an external clock), or a system clock above 72 MHz. Inside a `const` item the panic is a compilation error.

use crate::clocks::hsi::HSI_FREQUENCY_HZ;

/// Maximum system clock frequency of the STM32F103
pub const SYS_CLOCK_FREQUENCY_LIMIT_HZ: u32 = 72_000_000;

/// Lowest supported HSE crystal frequency
pub const HSE_FREQUENCY_MIN_HZ: u32 = 4_000_000;
/// Highest supported HSE crystal frequency
pub const HSE_FREQUENCY_MAX_HZ: u32 = 16_000_000;

/// Lowest supported external clock frequency with HSEBYP set
pub const HSE_BYPASS_FREQUENCY_MIN_HZ: u32 = 1_000_000;
/// Highest supported external clock frequency with HSEBYP set
pub const HSE_BYPASS_FREQUENCY_MAX_HZ: u32 = 25_000_000;

/// HSE operating mode
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HseMode {
    /// Crystal or ceramic resonator on OSC_IN/OSC_OUT (HSEBYP cleared)
    Crystal,
    /// External clock or RC circuit on OSC_IN (HSEBYP set)
    Rc,
}

/// PLL input clock
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllSource {
    /// HSI divided by 2
    Hsi,
    /// HSE, undivided
    Hse(HseMode),
}

/// PLL multiplication factor, from 2 to 16.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllMultiplier(u8);

impl PllMultiplier {
    pub const MIN: u8 = 2;
    pub const MAX: u8 = 16;

    pub const fn new(multiplier: u8) -> Option<Self> {
        if multiplier < Self::MIN || multiplier > Self::MAX {
            None
        } else {
            Some(Self(multiplier))
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    // CFGR.PLLMUL encoding: 0b0000 is x2, 0b1110 and 0b1111 are both x16
    pub(crate) const fn field_value(self) -> u32 {
        (self.0 - Self::MIN) as u32
    }

    pub(crate) const fn from_field_value(bits: u32) -> Self {
        match bits & 0b1111 {
            0b1111 => Self(Self::MAX),
            bits => Self(bits as u8 + Self::MIN),
        }
    }
}

/// System clock source together with its settings
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SysClockConfig {
    Hsi,
    Hse(HseMode),
    Pll {
        source: PllSource,
        multiplier: PllMultiplier,
    },
}

/// Clock tree of a board.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockConfig {
    sys_clock: SysClockConfig,
    hse_frequency_hz: Option<u32>,
}

/// PLL fed by HSI/2 and multiplied by 9: a 36 MHz system clock.
pub const DEFAULT_CLOCK_CONFIG: ClockConfig = ClockConfig::pll_from_hsi(9);

impl ClockConfig {
    /// Run directly from the internal 8 MHz oscillator.
    pub const fn hsi() -> Self {
        Self {
            sys_clock: SysClockConfig::Hsi,
            hse_frequency_hz: None,
        }
    }

    /// Run directly from the external oscillator.
    pub const fn hse(mode: HseMode, frequency_hz: u32) -> Self {
        Self {
            sys_clock: SysClockConfig::Hse(mode),
            hse_frequency_hz: Some(check_hse_frequency(mode, frequency_hz)),
        }
    }

    /// Run from the PLL fed by HSI/2.
    pub const fn pll_from_hsi(multiplier: u8) -> Self {
        let multiplier = check_multiplier(multiplier);
        check_sys_clock_frequency(HSI_FREQUENCY_HZ / 2 * multiplier.get() as u32);
        Self {
            sys_clock: SysClockConfig::Pll {
                source: PllSource::Hsi,
                multiplier,
            },
            hse_frequency_hz: None,
        }
    }

    /// Run from the PLL fed by the external oscillator.
    pub const fn pll_from_hse(mode: HseMode, frequency_hz: u32, multiplier: u8) -> Self {
        let frequency_hz = check_hse_frequency(mode, frequency_hz);
        let multiplier = check_multiplier(multiplier);
        check_sys_clock_frequency(frequency_hz * multiplier.get() as u32);
        Self {
            sys_clock: SysClockConfig::Pll {
                source: PllSource::Hse(mode),
                multiplier,
            },
            hse_frequency_hz: Some(frequency_hz),
        }
    }

    pub const fn sys_clock(&self) -> SysClockConfig {
        self.sys_clock
    }

    /// Frequency of the external oscillator, if the configuration uses it
    pub const fn hse_frequency_hz(&self) -> Option<u32> {
        self.hse_frequency_hz
    }

    /// System clock frequency this configuration produces.
    pub const fn sys_clock_frequency_hz(&self) -> u32 {
        let hse_frequency_hz = match self.hse_frequency_hz {
            Some(frequency_hz) => frequency_hz,
            None => 0,
        };
        match self.sys_clock {
            SysClockConfig::Hsi => HSI_FREQUENCY_HZ,
            SysClockConfig::Hse(_) => hse_frequency_hz,
            SysClockConfig::Pll {
                source: PllSource::Hsi,
                multiplier,
            } => HSI_FREQUENCY_HZ / 2 * multiplier.get() as u32,
            SysClockConfig::Pll {
                source: PllSource::Hse(_),
                multiplier,
            } => hse_frequency_hz * multiplier.get() as u32,
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        DEFAULT_CLOCK_CONFIG
    }
}

const fn check_multiplier(multiplier: u8) -> PllMultiplier {
    match PllMultiplier::new(multiplier) {
        Some(multiplier) => multiplier,
        None => panic!("PLL multiplier must be between 2 and 16"),
    }
}

const fn check_hse_frequency(mode: HseMode, frequency_hz: u32) -> u32 {
    match mode {
        HseMode::Crystal => {
            if frequency_hz < HSE_FREQUENCY_MIN_HZ || frequency_hz > HSE_FREQUENCY_MAX_HZ {
                panic!("HSE frequency must be between 4 MHz and 16 MHz with a crystal");
            }
        }
        HseMode::Rc => {
            if frequency_hz < HSE_BYPASS_FREQUENCY_MIN_HZ
                || frequency_hz > HSE_BYPASS_FREQUENCY_MAX_HZ
            {
                panic!("HSE frequency must be between 1 MHz and 25 MHz in bypass mode");
            }
        }
    }
    frequency_hz
}

const fn check_sys_clock_frequency(frequency_hz: u32) {
    if frequency_hz > SYS_CLOCK_FREQUENCY_LIMIT_HZ {
        panic!("system clock frequency exceeds 72 MHz");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_runs_pll_from_hsi_times_nine() {
        assert_eq!(
            SysClockConfig::Pll {
                source: PllSource::Hsi,
                multiplier: PllMultiplier(9),
            },
            DEFAULT_CLOCK_CONFIG.sys_clock()
        );
        assert_eq!(36_000_000, DEFAULT_CLOCK_CONFIG.sys_clock_frequency_hz());
        assert_eq!(None, DEFAULT_CLOCK_CONFIG.hse_frequency_hz());
        assert_eq!(DEFAULT_CLOCK_CONFIG, ClockConfig::default());
    }

    #[test]
    fn multiplier_encoding() {
        assert_eq!(None, PllMultiplier::new(1));
        assert_eq!(None, PllMultiplier::new(17));
        assert_eq!(Some(0b0000), PllMultiplier::new(2).map(PllMultiplier::field_value));
        assert_eq!(Some(0b0111), PllMultiplier::new(9).map(PllMultiplier::field_value));
        assert_eq!(Some(0b1110), PllMultiplier::new(16).map(PllMultiplier::field_value));

        assert_eq!(9, PllMultiplier::from_field_value(0b0111).get());
        assert_eq!(16, PllMultiplier::from_field_value(0b1110).get());
        assert_eq!(16, PllMultiplier::from_field_value(0b1111).get());
    }

    #[test]
    fn frequencies() {
        assert_eq!(8_000_000, ClockConfig::hsi().sys_clock_frequency_hz());
        assert_eq!(
            12_000_000,
            ClockConfig::hse(HseMode::Crystal, 12_000_000).sys_clock_frequency_hz()
        );
        assert_eq!(
            72_000_000,
            ClockConfig::pll_from_hse(HseMode::Rc, 8_000_000, 9).sys_clock_frequency_hz()
        );
        assert_eq!(64_000_000, ClockConfig::pll_from_hsi(16).sys_clock_frequency_hz());
    }

    #[test]
    #[should_panic(expected = "PLL multiplier")]
    fn multiplier_out_of_range() {
        let _ = ClockConfig::pll_from_hsi(17);
    }

    #[test]
    #[should_panic(expected = "HSE frequency")]
    fn hse_frequency_out_of_range() {
        let _ = ClockConfig::hse(HseMode::Crystal, 25_000_000);
    }

    #[test]
    fn bypass_accepts_external_clock_up_to_25_mhz() {
        let config = ClockConfig::hse(HseMode::Rc, 25_000_000);
        assert_eq!(Some(25_000_000), config.hse_frequency_hz());
        assert_eq!(25_000_000, config.sys_clock_frequency_hz());
        assert_eq!(
            Some(1_000_000),
            ClockConfig::hse(HseMode::Rc, 1_000_000).hse_frequency_hz()
        );
        assert_eq!(
            50_000_000,
            ClockConfig::pll_from_hse(HseMode::Rc, 25_000_000, 2).sys_clock_frequency_hz()
        );
    }

    #[test]
    #[should_panic(expected = "bypass mode")]
    fn bypass_frequency_out_of_range() {
        let _ = ClockConfig::hse(HseMode::Rc, 26_000_000);
    }

    #[test]
    #[should_panic(expected = "72 MHz")]
    fn sys_clock_too_fast() {
        let _ = ClockConfig::pll_from_hse(HseMode::Crystal, 16_000_000, 9);
    }
}
