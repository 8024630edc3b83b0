// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! STM32F103 clock driver
//!
//! [Clocks] brings up the system clock described by a [ClockConfig] and gates the clocks of
//! the peripherals on the AHB, APB1 and APB2 buses. For in-detail documentation of the
//! oscillators, check the [Hsi], [Hse] and [Pll] drivers.
//!
//! # Usage [^usage_note]
//!
//! ```rust,ignore
//! const CLOCK_CONFIG: ClockConfig = ClockConfig::pll_from_hse(HseMode::Crystal, 8_000_000, 9);
//!
//! let mmio = MmioRcc::new();
//! let rcc = Rcc::new(&mmio);
//! let clocks = Clocks::new(&rcc, CLOCK_CONFIG);
//!
//! clocks.initialize_system_clock();
//! clocks.enable_peripheral(Bus::APB2, PeripheralClockType::APB2(PCLK2::IOPA).peripheral_id());
//! ```
//!
//! The system clock is initialized once, at boot. Peripheral clocks can be switched any number
//! of times afterwards.
//!
//! # Concurrency
//!
//! Every operation is a plain read-modify-write of an RCC register. Nothing here masks
//! interrupts: if an interrupt handler also gates clocks on a bus, the caller must keep it from
//! running in the middle of an enable or disable on the same bus.
//!
//! [^usage_note]: For the purpose of brevity, any error checking has been removed.

use crate::clocks::hse::Hse;
use crate::clocks::hsi::Hsi;
use crate::clocks::phclk::{Bus, PeripheralClock, PeripheralClockType, PeripheralId};
use crate::clocks::pll::Pll;
use crate::config::{ClockConfig, PllMultiplier, PllSource, SysClockConfig};
use crate::rcc::Rcc;
use crate::rcc::SysClockSource;
use crate::wait::{SpinWait, WaitStrategy};
use crate::ErrorCode;

/// Main struct for configuring on-board clocks.
pub struct Clocks<'a, W: WaitStrategy = SpinWait> {
    rcc: &'a Rcc<'a>,
    config: ClockConfig,
    wait: W,
    /// High speed internal clock
    pub hsi: Hsi<'a>,
    /// High speed external clock
    pub hse: Hse<'a>,
    /// Phase-locked loop clock
    pub pll: Pll<'a>,
}

impl<'a> Clocks<'a, SpinWait> {
    /// Clock driver that waits for oscillators as long as they need.
    pub fn new(rcc: &'a Rcc<'a>, config: ClockConfig) -> Self {
        Self::with_wait_strategy(rcc, config, SpinWait)
    }
}

impl<'a, W: WaitStrategy> Clocks<'a, W> {
    pub fn with_wait_strategy(rcc: &'a Rcc<'a>, config: ClockConfig, wait: W) -> Self {
        Self {
            rcc,
            config,
            wait,
            hsi: Hsi::new(rcc),
            hse: Hse::new(rcc, config.hse_frequency_hz()),
            pll: Pll::new(rcc, config.hse_frequency_hz()),
        }
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    /// Bring up the configured system clock source and switch the system clock to it.
    ///
    /// Each oscillator is switched on and polled until its ready flag is set; only then is it
    /// used, either as the PLL input or as the system clock. For a PLL configuration the
    /// multiplier is programmed first, then the input oscillator is started, then the PLL.
    ///
    /// Meant to be called once, right after reset.
    ///
    /// # Errors
    ///
    /// + [Err]\([ErrorCode::BUSY]\): the wait strategy gave up on an oscillator. The system clock
    /// source is left unchanged.
    pub fn initialize_system_clock(&self) -> Result<(), ErrorCode> {
        debug!("initializing system clock: {:?}", self.config.sys_clock());

        let source = match self.config.sys_clock() {
            SysClockConfig::Hsi => {
                self.hsi.enable(&self.wait)?;
                SysClockSource::HSI
            }
            SysClockConfig::Hse(mode) => {
                self.hse.enable(mode, &self.wait)?;
                SysClockSource::HSE
            }
            SysClockConfig::Pll { source, multiplier } => {
                self.pll.set_multiplier(multiplier);
                match source {
                    PllSource::Hsi => self.hsi.enable(&self.wait)?,
                    PllSource::Hse(mode) => self.hse.enable(mode, &self.wait)?,
                }
                self.pll.set_source(source);
                self.pll.enable(&self.wait)?;
                SysClockSource::PLL
            }
        };

        self.rcc.set_sys_clock_source(source);
        debug!("system clock switched to {:?}", source);

        Ok(())
    }

    // Bus first: an unknown bus is reported as such even when the peripheral is out of range
    fn resolve<B, P>(bus: B, peripheral: P) -> Result<(Bus, PeripheralId), ErrorCode>
    where
        B: TryInto<Bus>,
        B::Error: Into<ErrorCode>,
        P: TryInto<PeripheralId>,
        P::Error: Into<ErrorCode>,
    {
        let bus = bus.try_into().map_err(Into::<ErrorCode>::into)?;
        let peripheral = peripheral.try_into().map_err(Into::<ErrorCode>::into)?;
        Ok((bus, peripheral))
    }

    /// Start the clock of a peripheral.
    ///
    /// Sets bit `peripheral` of the enable register of `bus`, leaving every other bit as it was.
    /// Enabling a running clock does nothing.
    ///
    /// # Errors
    ///
    /// + [Err]\([ErrorCode::FAIL]\): `bus` is not a known bus. No register is accessed.
    /// + [Err]\([ErrorCode::INVAL]\): `peripheral` is above 31. No register is accessed.
    pub fn enable_peripheral<B, P>(&self, bus: B, peripheral: P) -> Result<(), ErrorCode>
    where
        B: TryInto<Bus>,
        B::Error: Into<ErrorCode>,
        P: TryInto<PeripheralId>,
        P::Error: Into<ErrorCode>,
    {
        let (bus, peripheral) = Self::resolve(bus, peripheral)?;
        self.rcc.enable_peripheral_clock(bus, peripheral);
        trace!("{:?} peripheral {} clock on", bus, peripheral.bit());
        Ok(())
    }

    /// Stop the clock of a peripheral.
    ///
    /// # Errors
    ///
    /// Same as [Clocks::enable_peripheral].
    pub fn disable_peripheral<B, P>(&self, bus: B, peripheral: P) -> Result<(), ErrorCode>
    where
        B: TryInto<Bus>,
        B::Error: Into<ErrorCode>,
        P: TryInto<PeripheralId>,
        P::Error: Into<ErrorCode>,
    {
        let (bus, peripheral) = Self::resolve(bus, peripheral)?;
        self.rcc.disable_peripheral_clock(bus, peripheral);
        trace!("{:?} peripheral {} clock off", bus, peripheral.bit());
        Ok(())
    }

    /// Check whether the clock of a peripheral is running.
    pub fn is_peripheral_enabled<B, P>(&self, bus: B, peripheral: P) -> Result<bool, ErrorCode>
    where
        B: TryInto<Bus>,
        B::Error: Into<ErrorCode>,
        P: TryInto<PeripheralId>,
        P::Error: Into<ErrorCode>,
    {
        let (bus, peripheral) = Self::resolve(bus, peripheral)?;
        Ok(self.rcc.is_enabled_peripheral_clock(bus, peripheral))
    }

    /// Clock gate of a named peripheral, for its driver.
    pub fn peripheral_clock(&self, clock: PeripheralClockType) -> PeripheralClock<'a> {
        PeripheralClock::new(clock, self.rcc)
    }

    /// Get the current system clock source
    pub fn get_sys_clock_source(&self) -> SysClockSource {
        self.rcc.get_sys_clock_source()
    }

    /// Get the current PLL input clock
    pub fn get_pll_source(&self) -> PllSource {
        self.pll.get_source()
    }

    /// Get the current PLL multiplication factor
    pub fn get_pll_multiplier(&self) -> PllMultiplier {
        self.pll.get_multiplier()
    }

    /// Get the current system clock frequency in Hz, computed from the RCC registers.
    ///
    /// # Returns
    ///
    /// + [Some]\(frequency_hz\): if the system clock source is running and its frequency known.
    /// + [None]: otherwise, e.g. an HSE-based clock with no HSE frequency in the configuration.
    pub fn get_sys_clock_frequency_hz(&self) -> Option<u32> {
        match self.get_sys_clock_source() {
            SysClockSource::HSI => self.hsi.get_frequency_hz(),
            SysClockSource::HSE => self.hse.get_frequency_hz(),
            SysClockSource::PLL => self.pll.get_frequency_hz(),
        }
    }
}
