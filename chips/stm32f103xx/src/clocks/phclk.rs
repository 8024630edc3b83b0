// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Peripheral clock gating.
//!
//! Each peripheral of the STM32F103 has one enable bit in the enable register of the bus it sits
//! on: AHBENR, APB1ENR or APB2ENR. Enabling or disabling a peripheral clock is a read-modify-write
//! of that single bit; the other bits of the register and the other buses are left untouched.
//!
//! Drivers usually hold a [PeripheralClock] for their peripheral and use it through
//! [ClockInterface]:
//!
//! ```rust,ignore
//! let usart1_clock = PeripheralClock::new(PeripheralClockType::APB2(PCLK2::USART1), &rcc);
//! usart1_clock.enable();
//! ```

use crate::rcc::{Rcc, RccRegister, AHBENR, APB1ENR, APB2ENR};
use crate::ErrorCode;

/// Generic operations that clock-like things are expected to support.
pub trait ClockInterface {
    fn is_enabled(&self) -> bool;
    fn enable(&self);
    fn disable(&self);
}

/// Buses with a peripheral clock enable register
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bus {
    AHB = 0,
    APB1 = 1,
    APB2 = 2,
}

impl Bus {
    /// Register holding the enable bits of this bus
    pub const fn enable_register(self) -> RccRegister {
        match self {
            Bus::AHB => RccRegister::AHBENR,
            Bus::APB1 => RccRegister::APB1ENR,
            Bus::APB2 => RccRegister::APB2ENR,
        }
    }
}

impl TryFrom<u8> for Bus {
    type Error = ErrorCode;

    fn try_from(bus: u8) -> Result<Self, Self::Error> {
        match bus {
            0 => Ok(Bus::AHB),
            1 => Ok(Bus::APB1),
            2 => Ok(Bus::APB2),
            _ => {
                warn!("unknown bus {}", bus);
                Err(ErrorCode::FAIL)
            }
        }
    }
}

/// Bit position of a peripheral in its bus enable register, from 0 to 31.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeripheralId(u8);

impl PeripheralId {
    pub const fn new(bit: u8) -> Option<Self> {
        if bit < 32 {
            Some(Self(bit))
        } else {
            None
        }
    }

    pub const fn bit(self) -> u8 {
        self.0
    }

    pub(crate) const fn mask(self) -> u32 {
        1 << self.0
    }
}

impl TryFrom<u8> for PeripheralId {
    type Error = ErrorCode;

    fn try_from(bit: u8) -> Result<Self, Self::Error> {
        PeripheralId::new(bit).ok_or_else(|| {
            warn!("peripheral bit {} out of range", bit);
            ErrorCode::INVAL
        })
    }
}

/// Bus + clock name for the peripherals
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeripheralClockType {
    AHB(HCLK),
    APB1(PCLK1),
    APB2(PCLK2),
}

/// Peripherals clocked by HCLK
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HCLK {
    DMA1,
    DMA2,
    SRAM,
    FLITF,
    CRC,
    FSMC,
    SDIO,
}

/// Peripherals clocked by PCLK1
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PCLK1 {
    TIM2,
    TIM3,
    TIM4,
    TIM5,
    TIM6,
    TIM7,
    WWDG,
    SPI2,
    SPI3,
    USART2,
    USART3,
    UART4,
    UART5,
    I2C1,
    I2C2,
    USB,
    CAN,
    BKP,
    PWR,
    DAC,
}

/// Peripherals clocked by PCLK2
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PCLK2 {
    AFIO,
    IOPA,
    IOPB,
    IOPC,
    IOPD,
    IOPE,
    IOPF,
    IOPG,
    ADC1,
    ADC2,
    TIM1,
    SPI1,
    TIM8,
    USART1,
    ADC3,
}

impl PeripheralClockType {
    pub const fn bus(self) -> Bus {
        match self {
            PeripheralClockType::AHB(_) => Bus::AHB,
            PeripheralClockType::APB1(_) => Bus::APB1,
            PeripheralClockType::APB2(_) => Bus::APB2,
        }
    }

    pub const fn peripheral_id(self) -> PeripheralId {
        let shift = match self {
            PeripheralClockType::AHB(ref v) => match v {
                HCLK::DMA1 => AHBENR::DMA1EN.shift,
                HCLK::DMA2 => AHBENR::DMA2EN.shift,
                HCLK::SRAM => AHBENR::SRAMEN.shift,
                HCLK::FLITF => AHBENR::FLITFEN.shift,
                HCLK::CRC => AHBENR::CRCEN.shift,
                HCLK::FSMC => AHBENR::FSMCEN.shift,
                HCLK::SDIO => AHBENR::SDIOEN.shift,
            },
            PeripheralClockType::APB1(ref v) => match v {
                PCLK1::TIM2 => APB1ENR::TIM2EN.shift,
                PCLK1::TIM3 => APB1ENR::TIM3EN.shift,
                PCLK1::TIM4 => APB1ENR::TIM4EN.shift,
                PCLK1::TIM5 => APB1ENR::TIM5EN.shift,
                PCLK1::TIM6 => APB1ENR::TIM6EN.shift,
                PCLK1::TIM7 => APB1ENR::TIM7EN.shift,
                PCLK1::WWDG => APB1ENR::WWDGEN.shift,
                PCLK1::SPI2 => APB1ENR::SPI2EN.shift,
                PCLK1::SPI3 => APB1ENR::SPI3EN.shift,
                PCLK1::USART2 => APB1ENR::USART2EN.shift,
                PCLK1::USART3 => APB1ENR::USART3EN.shift,
                PCLK1::UART4 => APB1ENR::UART4EN.shift,
                PCLK1::UART5 => APB1ENR::UART5EN.shift,
                PCLK1::I2C1 => APB1ENR::I2C1EN.shift,
                PCLK1::I2C2 => APB1ENR::I2C2EN.shift,
                PCLK1::USB => APB1ENR::USBEN.shift,
                PCLK1::CAN => APB1ENR::CANEN.shift,
                PCLK1::BKP => APB1ENR::BKPEN.shift,
                PCLK1::PWR => APB1ENR::PWREN.shift,
                PCLK1::DAC => APB1ENR::DACEN.shift,
            },
            PeripheralClockType::APB2(ref v) => match v {
                PCLK2::AFIO => APB2ENR::AFIOEN.shift,
                PCLK2::IOPA => APB2ENR::IOPAEN.shift,
                PCLK2::IOPB => APB2ENR::IOPBEN.shift,
                PCLK2::IOPC => APB2ENR::IOPCEN.shift,
                PCLK2::IOPD => APB2ENR::IOPDEN.shift,
                PCLK2::IOPE => APB2ENR::IOPEEN.shift,
                PCLK2::IOPF => APB2ENR::IOPFEN.shift,
                PCLK2::IOPG => APB2ENR::IOPGEN.shift,
                PCLK2::ADC1 => APB2ENR::ADC1EN.shift,
                PCLK2::ADC2 => APB2ENR::ADC2EN.shift,
                PCLK2::TIM1 => APB2ENR::TIM1EN.shift,
                PCLK2::SPI1 => APB2ENR::SPI1EN.shift,
                PCLK2::TIM8 => APB2ENR::TIM8EN.shift,
                PCLK2::USART1 => APB2ENR::USART1EN.shift,
                PCLK2::ADC3 => APB2ENR::ADC3EN.shift,
            },
        };
        // Every enable field sits below bit 32
        PeripheralId(shift as u8)
    }
}

/// Clock gate of one named peripheral
pub struct PeripheralClock<'a> {
    pub clock: PeripheralClockType,
    rcc: &'a Rcc<'a>,
}

impl<'a> PeripheralClock<'a> {
    pub const fn new(clock: PeripheralClockType, rcc: &'a Rcc<'a>) -> Self {
        Self { clock, rcc }
    }
}

impl ClockInterface for PeripheralClock<'_> {
    fn is_enabled(&self) -> bool {
        self.rcc
            .is_enabled_peripheral_clock(self.clock.bus(), self.clock.peripheral_id())
    }

    fn enable(&self) {
        self.rcc
            .enable_peripheral_clock(self.clock.bus(), self.clock.peripheral_id());
    }

    fn disable(&self) {
        self.rcc
            .disable_peripheral_clock(self.clock.bus(), self.clock.peripheral_id());
    }
}
