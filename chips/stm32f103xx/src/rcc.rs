// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Reset and clock control (RCC) register map. [^doc_ref]
//!
//! The register block is reached through [RegisterBank], one 32-bit register per access.
//! [MmioRcc] is the chip's memory-mapped block; [crate::sim::SimulatedRcc] stands in for it in
//! tests. [Rcc] is the typed view the clock drivers use: every method is a single
//! read-modify-write of one register.
//!
//! [^doc_ref]: See 7.3 in RM0008.

use tock_registers::fields::{Field, FieldValue};
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::registers::ReadWrite;
use tock_registers::{register_bitfields, LocalRegisterCopy};

use crate::clocks::phclk::{Bus, PeripheralId};
use crate::static_ref::StaticRef;

/// Reset and clock control
#[repr(C)]
struct RccRegisters {
    /// clock control register
    cr: ReadWrite<u32, CR::Register>,
    /// clock configuration register
    cfgr: ReadWrite<u32, CFGR::Register>,
    /// clock interrupt register
    cir: ReadWrite<u32, CIR::Register>,
    /// APB2 peripheral reset register
    apb2rstr: ReadWrite<u32, APB2RSTR::Register>,
    /// APB1 peripheral reset register
    apb1rstr: ReadWrite<u32, APB1RSTR::Register>,
    /// AHB peripheral clock enable register
    ahbenr: ReadWrite<u32, AHBENR::Register>,
    /// APB2 peripheral clock enable register
    apb2enr: ReadWrite<u32, APB2ENR::Register>,
    /// APB1 peripheral clock enable register
    apb1enr: ReadWrite<u32, APB1ENR::Register>,
    /// Backup domain control register
    bdcr: ReadWrite<u32, BDCR::Register>,
    /// clock control & status register
    csr: ReadWrite<u32, CSR::Register>,
}

const _: () = assert!(core::mem::size_of::<RccRegisters>() == 0x28);

register_bitfields![u32,
    pub CR [
        /// PLL clock ready flag
        PLLRDY OFFSET(25) NUMBITS(1) [],
        /// PLL enable
        PLLON OFFSET(24) NUMBITS(1) [],
        /// Clock security system enable
        CSSON OFFSET(19) NUMBITS(1) [],
        /// HSE clock bypass
        HSEBYP OFFSET(18) NUMBITS(1) [],
        /// HSE clock ready flag
        HSERDY OFFSET(17) NUMBITS(1) [],
        /// HSE clock enable
        HSEON OFFSET(16) NUMBITS(1) [],
        /// Internal high-speed clock calibration
        HSICAL OFFSET(8) NUMBITS(8) [],
        /// Internal high-speed clock trimming
        HSITRIM OFFSET(3) NUMBITS(5) [],
        /// Internal high-speed clock ready flag
        HSIRDY OFFSET(1) NUMBITS(1) [],
        /// Internal high-speed clock enable
        HSION OFFSET(0) NUMBITS(1) []
    ],
    pub CFGR [
        /// Microcontroller clock output
        MCO OFFSET(24) NUMBITS(3) [],
        /// USB prescaler
        USBPRE OFFSET(22) NUMBITS(1) [],
        /// PLL multiplication factor
        PLLMUL OFFSET(18) NUMBITS(4) [],
        /// HSE divider for PLL entry
        PLLXTPRE OFFSET(17) NUMBITS(1) [
            DivideBy1 = 0,
            DivideBy2 = 1
        ],
        /// PLL entry clock source
        PLLSRC OFFSET(16) NUMBITS(1) [
            HSI_DIV2 = 0,
            HSE = 1
        ],
        /// ADC prescaler
        ADCPRE OFFSET(14) NUMBITS(2) [],
        /// APB high-speed prescaler (APB2)
        PPRE2 OFFSET(11) NUMBITS(3) [],
        /// APB low-speed prescaler (APB1)
        PPRE1 OFFSET(8) NUMBITS(3) [],
        /// AHB prescaler
        HPRE OFFSET(4) NUMBITS(4) [],
        /// System clock switch status
        SWS OFFSET(2) NUMBITS(2) [],
        /// System clock switch
        SW OFFSET(0) NUMBITS(2) [
            HSI = 0b00,
            HSE = 0b01,
            PLL = 0b10
        ]
    ],
    pub CIR [
        /// Clock security system interrupt clear
        CSSC OFFSET(23) NUMBITS(1) [],
        /// PLL ready interrupt clear
        PLLRDYC OFFSET(20) NUMBITS(1) [],
        /// HSE ready interrupt clear
        HSERDYC OFFSET(19) NUMBITS(1) [],
        /// HSI ready interrupt clear
        HSIRDYC OFFSET(18) NUMBITS(1) [],
        /// LSE ready interrupt clear
        LSERDYC OFFSET(17) NUMBITS(1) [],
        /// LSI ready interrupt clear
        LSIRDYC OFFSET(16) NUMBITS(1) [],
        /// PLL ready interrupt enable
        PLLRDYIE OFFSET(12) NUMBITS(1) [],
        /// HSE ready interrupt enable
        HSERDYIE OFFSET(11) NUMBITS(1) [],
        /// HSI ready interrupt enable
        HSIRDYIE OFFSET(10) NUMBITS(1) [],
        /// LSE ready interrupt enable
        LSERDYIE OFFSET(9) NUMBITS(1) [],
        /// LSI ready interrupt enable
        LSIRDYIE OFFSET(8) NUMBITS(1) [],
        /// Clock security system interrupt flag
        CSSF OFFSET(7) NUMBITS(1) [],
        /// PLL ready interrupt flag
        PLLRDYF OFFSET(4) NUMBITS(1) [],
        /// HSE ready interrupt flag
        HSERDYF OFFSET(3) NUMBITS(1) [],
        /// HSI ready interrupt flag
        HSIRDYF OFFSET(2) NUMBITS(1) [],
        /// LSE ready interrupt flag
        LSERDYF OFFSET(1) NUMBITS(1) [],
        /// LSI ready interrupt flag
        LSIRDYF OFFSET(0) NUMBITS(1) []
    ],
    pub APB2RSTR [
        /// ADC3 interface reset
        ADC3RST OFFSET(15) NUMBITS(1) [],
        /// USART1 reset
        USART1RST OFFSET(14) NUMBITS(1) [],
        /// TIM8 timer reset
        TIM8RST OFFSET(13) NUMBITS(1) [],
        /// SPI1 reset
        SPI1RST OFFSET(12) NUMBITS(1) [],
        /// TIM1 timer reset
        TIM1RST OFFSET(11) NUMBITS(1) [],
        /// ADC2 interface reset
        ADC2RST OFFSET(10) NUMBITS(1) [],
        /// ADC1 interface reset
        ADC1RST OFFSET(9) NUMBITS(1) [],
        /// IO port G reset
        IOPGRST OFFSET(8) NUMBITS(1) [],
        /// IO port F reset
        IOPFRST OFFSET(7) NUMBITS(1) [],
        /// IO port E reset
        IOPERST OFFSET(6) NUMBITS(1) [],
        /// IO port D reset
        IOPDRST OFFSET(5) NUMBITS(1) [],
        /// IO port C reset
        IOPCRST OFFSET(4) NUMBITS(1) [],
        /// IO port B reset
        IOPBRST OFFSET(3) NUMBITS(1) [],
        /// IO port A reset
        IOPARST OFFSET(2) NUMBITS(1) [],
        /// Alternate function IO reset
        AFIORST OFFSET(0) NUMBITS(1) []
    ],
    pub APB1RSTR [
        /// DAC interface reset
        DACRST OFFSET(29) NUMBITS(1) [],
        /// Power interface reset
        PWRRST OFFSET(28) NUMBITS(1) [],
        /// Backup interface reset
        BKPRST OFFSET(27) NUMBITS(1) [],
        /// CAN reset
        CANRST OFFSET(25) NUMBITS(1) [],
        /// USB reset
        USBRST OFFSET(23) NUMBITS(1) [],
        /// I2C2 reset
        I2C2RST OFFSET(22) NUMBITS(1) [],
        /// I2C1 reset
        I2C1RST OFFSET(21) NUMBITS(1) [],
        /// UART5 reset
        UART5RST OFFSET(20) NUMBITS(1) [],
        /// UART4 reset
        UART4RST OFFSET(19) NUMBITS(1) [],
        /// USART3 reset
        USART3RST OFFSET(18) NUMBITS(1) [],
        /// USART2 reset
        USART2RST OFFSET(17) NUMBITS(1) [],
        /// SPI3 reset
        SPI3RST OFFSET(15) NUMBITS(1) [],
        /// SPI2 reset
        SPI2RST OFFSET(14) NUMBITS(1) [],
        /// Window watchdog reset
        WWDGRST OFFSET(11) NUMBITS(1) [],
        /// TIM7 timer reset
        TIM7RST OFFSET(5) NUMBITS(1) [],
        /// TIM6 timer reset
        TIM6RST OFFSET(4) NUMBITS(1) [],
        /// TIM5 timer reset
        TIM5RST OFFSET(3) NUMBITS(1) [],
        /// TIM4 timer reset
        TIM4RST OFFSET(2) NUMBITS(1) [],
        /// TIM3 timer reset
        TIM3RST OFFSET(1) NUMBITS(1) [],
        /// TIM2 timer reset
        TIM2RST OFFSET(0) NUMBITS(1) []
    ],
    pub AHBENR [
        /// SDIO clock enable
        SDIOEN OFFSET(10) NUMBITS(1) [],
        /// FSMC clock enable
        FSMCEN OFFSET(8) NUMBITS(1) [],
        /// CRC clock enable
        CRCEN OFFSET(6) NUMBITS(1) [],
        /// FLITF clock enable during sleep mode
        FLITFEN OFFSET(4) NUMBITS(1) [],
        /// SRAM interface clock enable during sleep mode
        SRAMEN OFFSET(2) NUMBITS(1) [],
        /// DMA2 clock enable
        DMA2EN OFFSET(1) NUMBITS(1) [],
        /// DMA1 clock enable
        DMA1EN OFFSET(0) NUMBITS(1) []
    ],
    pub APB2ENR [
        /// ADC3 interface clock enable
        ADC3EN OFFSET(15) NUMBITS(1) [],
        /// USART1 clock enable
        USART1EN OFFSET(14) NUMBITS(1) [],
        /// TIM8 timer clock enable
        TIM8EN OFFSET(13) NUMBITS(1) [],
        /// SPI1 clock enable
        SPI1EN OFFSET(12) NUMBITS(1) [],
        /// TIM1 timer clock enable
        TIM1EN OFFSET(11) NUMBITS(1) [],
        /// ADC2 interface clock enable
        ADC2EN OFFSET(10) NUMBITS(1) [],
        /// ADC1 interface clock enable
        ADC1EN OFFSET(9) NUMBITS(1) [],
        /// IO port G clock enable
        IOPGEN OFFSET(8) NUMBITS(1) [],
        /// IO port F clock enable
        IOPFEN OFFSET(7) NUMBITS(1) [],
        /// IO port E clock enable
        IOPEEN OFFSET(6) NUMBITS(1) [],
        /// IO port D clock enable
        IOPDEN OFFSET(5) NUMBITS(1) [],
        /// IO port C clock enable
        IOPCEN OFFSET(4) NUMBITS(1) [],
        /// IO port B clock enable
        IOPBEN OFFSET(3) NUMBITS(1) [],
        /// IO port A clock enable
        IOPAEN OFFSET(2) NUMBITS(1) [],
        /// Alternate function IO clock enable
        AFIOEN OFFSET(0) NUMBITS(1) []
    ],
    pub APB1ENR [
        /// DAC interface clock enable
        DACEN OFFSET(29) NUMBITS(1) [],
        /// Power interface clock enable
        PWREN OFFSET(28) NUMBITS(1) [],
        /// Backup interface clock enable
        BKPEN OFFSET(27) NUMBITS(1) [],
        /// CAN clock enable
        CANEN OFFSET(25) NUMBITS(1) [],
        /// USB clock enable
        USBEN OFFSET(23) NUMBITS(1) [],
        /// I2C2 clock enable
        I2C2EN OFFSET(22) NUMBITS(1) [],
        /// I2C1 clock enable
        I2C1EN OFFSET(21) NUMBITS(1) [],
        /// UART5 clock enable
        UART5EN OFFSET(20) NUMBITS(1) [],
        /// UART4 clock enable
        UART4EN OFFSET(19) NUMBITS(1) [],
        /// USART3 clock enable
        USART3EN OFFSET(18) NUMBITS(1) [],
        /// USART2 clock enable
        USART2EN OFFSET(17) NUMBITS(1) [],
        /// SPI3 clock enable
        SPI3EN OFFSET(15) NUMBITS(1) [],
        /// SPI2 clock enable
        SPI2EN OFFSET(14) NUMBITS(1) [],
        /// Window watchdog clock enable
        WWDGEN OFFSET(11) NUMBITS(1) [],
        /// TIM7 timer clock enable
        TIM7EN OFFSET(5) NUMBITS(1) [],
        /// TIM6 timer clock enable
        TIM6EN OFFSET(4) NUMBITS(1) [],
        /// TIM5 timer clock enable
        TIM5EN OFFSET(3) NUMBITS(1) [],
        /// TIM4 timer clock enable
        TIM4EN OFFSET(2) NUMBITS(1) [],
        /// TIM3 timer clock enable
        TIM3EN OFFSET(1) NUMBITS(1) [],
        /// TIM2 timer clock enable
        TIM2EN OFFSET(0) NUMBITS(1) []
    ],
    pub BDCR [
        /// Backup domain software reset
        BDRST OFFSET(16) NUMBITS(1) [],
        /// RTC clock enable
        RTCEN OFFSET(15) NUMBITS(1) [],
        /// RTC clock source selection
        RTCSEL OFFSET(8) NUMBITS(2) [],
        /// External low-speed oscillator bypass
        LSEBYP OFFSET(2) NUMBITS(1) [],
        /// External low-speed oscillator ready
        LSERDY OFFSET(1) NUMBITS(1) [],
        /// External low-speed oscillator enable
        LSEON OFFSET(0) NUMBITS(1) []
    ],
    pub CSR [
        /// Low-power reset flag
        LPWRRSTF OFFSET(31) NUMBITS(1) [],
        /// Window watchdog reset flag
        WWDGRSTF OFFSET(30) NUMBITS(1) [],
        /// Independent watchdog reset flag
        IWDGRSTF OFFSET(29) NUMBITS(1) [],
        /// Software reset flag
        SFTRSTF OFFSET(28) NUMBITS(1) [],
        /// POR/PDR reset flag
        PORRSTF OFFSET(27) NUMBITS(1) [],
        /// PIN reset flag
        PINRSTF OFFSET(26) NUMBITS(1) [],
        /// Remove reset flag
        RMVF OFFSET(24) NUMBITS(1) [],
        /// Internal low-speed oscillator ready
        LSIRDY OFFSET(1) NUMBITS(1) [],
        /// Internal low-speed oscillator enable
        LSION OFFSET(0) NUMBITS(1) []
    ]
];

/// Base address of the RCC register block
pub const RCC_BASE_ADDRESS: usize = 0x4002_1000;

const RCC_BASE: StaticRef<RccRegisters> =
    unsafe { StaticRef::new(RCC_BASE_ADDRESS as *const RccRegisters) };

/// Names of the RCC registers, in address order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RccRegister {
    CR,
    CFGR,
    CIR,
    APB2RSTR,
    APB1RSTR,
    AHBENR,
    APB2ENR,
    APB1ENR,
    BDCR,
    CSR,
}

impl RccRegister {
    /// Every register of the block, in address order
    pub const ALL: [RccRegister; 10] = [
        RccRegister::CR,
        RccRegister::CFGR,
        RccRegister::CIR,
        RccRegister::APB2RSTR,
        RccRegister::APB1RSTR,
        RccRegister::AHBENR,
        RccRegister::APB2ENR,
        RccRegister::APB1ENR,
        RccRegister::BDCR,
        RccRegister::CSR,
    ];

    /// Position of the register in [RccRegister::ALL]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Byte offset from [RCC_BASE_ADDRESS]
    pub const fn offset(self) -> usize {
        self.index() * 4
    }
}

/// Word-level access to the RCC register block.
///
/// Every call must reach the backing store: implementations must not cache, merge or reorder
/// accesses. There is no locking; see [crate::clocks] for the caller's obligations.
pub trait RegisterBank {
    /// Read the current value of `register`.
    fn read(&self, register: RccRegister) -> u32;

    /// Overwrite `register` with `value`.
    fn write(&self, register: RccRegister, value: u32);
}

/// The chip's memory-mapped RCC block.
pub struct MmioRcc {
    registers: StaticRef<RccRegisters>,
}

impl MmioRcc {
    pub const fn new() -> MmioRcc {
        MmioRcc {
            registers: RCC_BASE,
        }
    }
}

impl RegisterBank for MmioRcc {
    fn read(&self, register: RccRegister) -> u32 {
        let regs = &*self.registers;
        match register {
            RccRegister::CR => regs.cr.get(),
            RccRegister::CFGR => regs.cfgr.get(),
            RccRegister::CIR => regs.cir.get(),
            RccRegister::APB2RSTR => regs.apb2rstr.get(),
            RccRegister::APB1RSTR => regs.apb1rstr.get(),
            RccRegister::AHBENR => regs.ahbenr.get(),
            RccRegister::APB2ENR => regs.apb2enr.get(),
            RccRegister::APB1ENR => regs.apb1enr.get(),
            RccRegister::BDCR => regs.bdcr.get(),
            RccRegister::CSR => regs.csr.get(),
        }
    }

    fn write(&self, register: RccRegister, value: u32) {
        let regs = &*self.registers;
        match register {
            RccRegister::CR => regs.cr.set(value),
            RccRegister::CFGR => regs.cfgr.set(value),
            RccRegister::CIR => regs.cir.set(value),
            RccRegister::APB2RSTR => regs.apb2rstr.set(value),
            RccRegister::APB1RSTR => regs.apb1rstr.set(value),
            RccRegister::AHBENR => regs.ahbenr.set(value),
            RccRegister::APB2ENR => regs.apb2enr.set(value),
            RccRegister::APB1ENR => regs.apb1enr.set(value),
            RccRegister::BDCR => regs.bdcr.set(value),
            RccRegister::CSR => regs.csr.set(value),
        }
    }
}

/// Typed access to the RCC registers used by the clock drivers.
pub struct Rcc<'a> {
    bank: &'a dyn RegisterBank,
}

impl<'a> Rcc<'a> {
    pub const fn new(bank: &'a dyn RegisterBank) -> Self {
        Self { bank }
    }

    fn cr(&self) -> LocalRegisterCopy<u32, CR::Register> {
        LocalRegisterCopy::new(self.bank.read(RccRegister::CR))
    }

    fn modify_cr(&self, field: FieldValue<u32, CR::Register>) {
        let mut cr = self.cr();
        cr.modify(field);
        self.bank.write(RccRegister::CR, cr.get());
    }

    fn cfgr(&self) -> LocalRegisterCopy<u32, CFGR::Register> {
        LocalRegisterCopy::new(self.bank.read(RccRegister::CFGR))
    }

    fn modify_cfgr(&self, field: FieldValue<u32, CFGR::Register>) {
        let mut cfgr = self.cfgr();
        cfgr.modify(field);
        self.bank.write(RccRegister::CFGR, cfgr.get());
    }

    /* HSI clock */

    pub(crate) fn enable_hsi_clock(&self) {
        self.modify_cr(CR::HSION::SET);
    }

    pub(crate) fn is_enabled_hsi_clock(&self) -> bool {
        self.cr().is_set(CR::HSION)
    }

    // Indicates whether the HSI oscillator is stable
    pub(crate) fn is_ready_hsi_clock(&self) -> bool {
        self.cr().is_set(CR::HSIRDY)
    }

    /* HSE clock */

    pub(crate) fn enable_hse_clock_bypass(&self) {
        self.modify_cr(CR::HSEBYP::SET);
    }

    pub(crate) fn disable_hse_clock_bypass(&self) {
        self.modify_cr(CR::HSEBYP::CLEAR);
    }

    pub(crate) fn is_enabled_hse_clock_bypass(&self) -> bool {
        self.cr().is_set(CR::HSEBYP)
    }

    pub(crate) fn enable_hse_clock(&self) {
        self.modify_cr(CR::HSEON::SET);
    }

    pub(crate) fn is_enabled_hse_clock(&self) -> bool {
        self.cr().is_set(CR::HSEON)
    }

    // Indicates whether the HSE oscillator is stable
    pub(crate) fn is_ready_hse_clock(&self) -> bool {
        self.cr().is_set(CR::HSERDY)
    }

    /* PLL clock */

    pub(crate) fn enable_pll_clock(&self) {
        self.modify_cr(CR::PLLON::SET);
    }

    pub(crate) fn is_enabled_pll_clock(&self) -> bool {
        self.cr().is_set(CR::PLLON)
    }

    // The PLL clock is locked when its signal is stable
    pub(crate) fn is_locked_pll_clock(&self) -> bool {
        self.cr().is_set(CR::PLLRDY)
    }

    pub(crate) fn set_pll_clocks_source_hsi(&self) {
        self.modify_cfgr(CFGR::PLLSRC::HSI_DIV2);
    }

    pub(crate) fn set_pll_clocks_source_hse(&self) {
        self.modify_cfgr(CFGR::PLLSRC::HSE);
    }

    pub(crate) fn is_hse_pll_clocks_source(&self) -> bool {
        self.cfgr().is_set(CFGR::PLLSRC)
    }

    pub(crate) fn set_hse_pll_divider(&self, divide_by_2: bool) {
        if divide_by_2 {
            self.modify_cfgr(CFGR::PLLXTPRE::DivideBy2);
        } else {
            self.modify_cfgr(CFGR::PLLXTPRE::DivideBy1);
        }
    }

    pub(crate) fn is_hse_pll_divided(&self) -> bool {
        self.cfgr().is_set(CFGR::PLLXTPRE)
    }

    // Writes a single bit of the PLLMUL field. `bit` counts from the field's least
    // significant bit and must be below `CFGR::PLLMUL`'s width.
    pub(crate) fn set_pll_multiplier_bit(&self, bit: usize, value: u32) {
        let field = Field::<u32, CFGR::Register>::new(1, CFGR::PLLMUL.shift + bit);
        self.modify_cfgr(field.val(value & 1));
    }

    // Raw content of the 4-bit PLLMUL field
    pub(crate) fn get_pll_multiplier_field(&self) -> u32 {
        self.cfgr().read(CFGR::PLLMUL)
    }

    /* System clock */

    // The source must be enabled and ready
    pub(crate) fn set_sys_clock_source(&self, source: SysClockSource) {
        self.modify_cfgr(CFGR::SW.val(source as u32));
    }

    pub(crate) fn get_sys_clock_source(&self) -> SysClockSource {
        match self.cfgr().read(CFGR::SWS) {
            0b00 => SysClockSource::HSI,
            0b01 => SysClockSource::HSE,
            _ => SysClockSource::PLL,
        }
    }

    /* Peripheral clocks */

    pub(crate) fn enable_peripheral_clock(&self, bus: Bus, peripheral: PeripheralId) {
        let register = bus.enable_register();
        let value = self.bank.read(register);
        self.bank.write(register, value | peripheral.mask());
    }

    pub(crate) fn disable_peripheral_clock(&self, bus: Bus, peripheral: PeripheralId) {
        let register = bus.enable_register();
        let value = self.bank.read(register);
        self.bank.write(register, value & !peripheral.mask());
    }

    pub(crate) fn is_enabled_peripheral_clock(&self, bus: Bus, peripheral: PeripheralId) -> bool {
        self.bank.read(bus.enable_register()) & peripheral.mask() != 0
    }
}

/// Clock sources for the system clock (CFGR.SW / CFGR.SWS encoding)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SysClockSource {
    HSI = 0b00,
    HSE = 0b01,
    PLL = 0b10,
}
