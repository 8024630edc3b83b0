// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! In-memory model of the RCC register block.
//!
//! [SimulatedRcc] implements [RegisterBank] on plain memory so the clock drivers can run on a
//! host. It models the parts of the hardware the drivers depend on:
//!
//! + registers start at their reset values,
//! + the ready flags and HSICAL in CR are owned by the "hardware": a write cannot change them,
//! + an oscillator becomes ready as soon as it is switched on, unless it was [stalled],
//! + CFGR.SWS follows CFGR.SW once the selected source is ready,
//! + PLLSRC, PLLXTPRE and PLLMUL keep their value while CR.PLLON is set.
//!
//! Every access made through [RegisterBank] is recorded, in order, in a fixed-depth trace.
//!
//! [stalled]: SimulatedRcc::stall

use core::cell::Cell;

use tock_registers::fields::Field;
use tock_registers::{LocalRegisterCopy, RegisterLongName};

use crate::rcc::{RccRegister, RegisterBank, SysClockSource, CFGR, CR};

/// Number of accesses the trace keeps. Later accesses are counted but not recorded.
pub const TRACE_DEPTH: usize = 128;

/// Reset values, see 7.3 in RM0008
const RESET_VALUES: [u32; 10] = [
    0x0000_0083, // CR: HSI on and ready
    0x0000_0000, // CFGR
    0x0000_0000, // CIR
    0x0000_0000, // APB2RSTR
    0x0000_0000, // APB1RSTR
    0x0000_0014, // AHBENR: SRAM and FLITF clocked in sleep mode
    0x0000_0000, // APB2ENR
    0x0000_0000, // APB1ENR
    0x0000_0000, // BDCR
    0x0C00_0000, // CSR: PIN and POR reset flags
];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessKind {
    Read,
    Write,
}

/// One recorded register access
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Access {
    pub kind: AccessKind,
    pub register: RccRegister,
    /// Value returned by a read, or value passed to a write
    pub value: u32,
}

impl Access {
    pub fn is_read_of(&self, register: RccRegister) -> bool {
        self.kind == AccessKind::Read && self.register == register
    }

    pub fn is_write_to(&self, register: RccRegister) -> bool {
        self.kind == AccessKind::Write && self.register == register
    }

    /// Whether the access carried `field` with every bit set.
    pub fn has_set<R: RegisterLongName>(&self, field: Field<u32, R>) -> bool {
        LocalRegisterCopy::<u32, R>::new(self.value).is_set(field)
    }

    /// Content of `field` in the accessed value.
    pub fn field<R: RegisterLongName>(&self, field: Field<u32, R>) -> u32 {
        LocalRegisterCopy::<u32, R>::new(self.value).read(field)
    }
}

/// Host-side RCC register block.
pub struct SimulatedRcc {
    registers: [Cell<u32>; 10],
    reads: [Cell<usize>; 10],
    writes: [Cell<usize>; 10],
    stalled: Cell<u8>,
    trace: [Cell<Option<Access>>; TRACE_DEPTH],
    recorded: Cell<usize>,
}

impl Default for SimulatedRcc {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRcc {
    /// A register block right after reset.
    pub fn new() -> Self {
        Self {
            registers: core::array::from_fn(|index| Cell::new(RESET_VALUES[index])),
            reads: core::array::from_fn(|_| Cell::new(0)),
            writes: core::array::from_fn(|_| Cell::new(0)),
            stalled: Cell::new(0),
            trace: core::array::from_fn(|_| Cell::new(None)),
            recorded: Cell::new(0),
        }
    }

    /// Keep the ready flag of `source` low from now on, whatever is written to CR.
    ///
    /// A flag that is already high is lowered.
    pub fn stall(&self, source: SysClockSource) {
        self.stalled.set(self.stalled.get() | 1 << source as u8);
        self.update_ready_flags();
    }

    /// Undo [SimulatedRcc::stall].
    pub fn release(&self, source: SysClockSource) {
        self.stalled.set(self.stalled.get() & !(1 << source as u8));
        self.update_ready_flags();
    }

    fn is_stalled(&self, source: SysClockSource) -> bool {
        self.stalled.get() & 1 << source as u8 != 0
    }

    /// Overwrite a register without side effects and without recording the access.
    pub fn preset(&self, register: RccRegister, value: u32) {
        self.registers[register.index()].set(value);
    }

    /// Current content of a register. Not recorded.
    pub fn value(&self, register: RccRegister) -> u32 {
        self.registers[register.index()].get()
    }

    /// Recorded accesses, oldest first
    pub fn trace(&self) -> impl Iterator<Item = Access> + '_ {
        self.trace.iter().map_while(Cell::get)
    }

    /// Total number of accesses since the last [SimulatedRcc::clear_trace], including those
    /// past [TRACE_DEPTH].
    pub fn access_count(&self) -> usize {
        self.recorded.get()
    }

    pub fn read_count(&self, register: RccRegister) -> usize {
        self.reads[register.index()].get()
    }

    pub fn write_count(&self, register: RccRegister) -> usize {
        self.writes[register.index()].get()
    }

    /// Forget every recorded access and reset the counters.
    pub fn clear_trace(&self) {
        self.trace.iter().for_each(|entry| entry.set(None));
        self.reads.iter().for_each(|count| count.set(0));
        self.writes.iter().for_each(|count| count.set(0));
        self.recorded.set(0);
    }

    fn record(&self, access: Access) {
        let position = self.recorded.get();
        if let Some(entry) = self.trace.get(position) {
            entry.set(Some(access));
        }
        self.recorded.set(position + 1);

        let counters = match access.kind {
            AccessKind::Read => &self.reads,
            AccessKind::Write => &self.writes,
        };
        let counter = &counters[access.register.index()];
        counter.set(counter.get() + 1);
    }

    fn cr(&self) -> LocalRegisterCopy<u32, CR::Register> {
        LocalRegisterCopy::new(self.value(RccRegister::CR))
    }

    fn is_ready(&self, source: SysClockSource) -> bool {
        let cr = self.cr();
        match source {
            SysClockSource::HSI => cr.is_set(CR::HSIRDY),
            SysClockSource::HSE => cr.is_set(CR::HSERDY),
            SysClockSource::PLL => cr.is_set(CR::PLLRDY),
        }
    }

    // Ready flags follow their enable bit unless the source is stalled
    fn update_ready_flags(&self) {
        let mut cr = self.cr();
        for (source, enable, ready) in [
            (SysClockSource::HSI, CR::HSION, CR::HSIRDY),
            (SysClockSource::HSE, CR::HSEON, CR::HSERDY),
            (SysClockSource::PLL, CR::PLLON, CR::PLLRDY),
        ] {
            if cr.is_set(enable) && !self.is_stalled(source) {
                cr.modify(ready.val(1));
            } else {
                cr.modify(ready.val(0));
            }
        }
        self.preset(RccRegister::CR, cr.get());
    }

    fn write_cr(&self, value: u32) {
        let hardware_owned = (CR::HSIRDY::SET + CR::HSERDY::SET + CR::PLLRDY::SET + CR::HSICAL::SET)
            .mask();
        let current = self.value(RccRegister::CR);
        self.preset(
            RccRegister::CR,
            (value & !hardware_owned) | (current & hardware_owned),
        );
        self.update_ready_flags();
    }

    fn write_cfgr(&self, value: u32) {
        let current = self.value(RccRegister::CFGR);
        let mut cfgr = LocalRegisterCopy::<u32, CFGR::Register>::new(value);
        let status = LocalRegisterCopy::<u32, CFGR::Register>::new(current).read(CFGR::SWS);

        if self.cr().is_set(CR::PLLON) {
            let locked = (CFGR::PLLSRC::SET + CFGR::PLLXTPRE::SET + CFGR::PLLMUL::SET).mask();
            cfgr.set((value & !locked) | (current & locked));
        }
        let selected = match cfgr.read(CFGR::SW) {
            0b00 => Some(SysClockSource::HSI),
            0b01 => Some(SysClockSource::HSE),
            0b10 => Some(SysClockSource::PLL),
            _ => None,
        };

        match selected {
            Some(source) if self.is_ready(source) => cfgr.modify(CFGR::SWS.val(source as u32)),
            _ => cfgr.modify(CFGR::SWS.val(status)),
        }
        self.preset(RccRegister::CFGR, cfgr.get());
    }
}

impl RegisterBank for SimulatedRcc {
    fn read(&self, register: RccRegister) -> u32 {
        let value = self.value(register);
        self.record(Access {
            kind: AccessKind::Read,
            register,
            value,
        });
        value
    }

    fn write(&self, register: RccRegister, value: u32) {
        self.record(Access {
            kind: AccessKind::Write,
            register,
            value,
        });
        match register {
            RccRegister::CR => self.write_cr(value),
            RccRegister::CFGR => self.write_cfgr(value),
            _ => self.preset(register, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_state() {
        let sim = SimulatedRcc::new();
        assert_eq!(0x0000_0083, sim.value(RccRegister::CR));
        assert_eq!(0x0000_0014, sim.value(RccRegister::AHBENR));
        assert_eq!(0, sim.value(RccRegister::CFGR));
        assert_eq!(0, sim.access_count());
    }

    #[test]
    fn ready_flags_cannot_be_written() {
        let sim = SimulatedRcc::new();
        sim.preset(RccRegister::CR, 0);

        sim.write(RccRegister::CR, 1 << 17 | 1 << 25);
        assert_eq!(0, sim.value(RccRegister::CR));

        sim.write(RccRegister::CR, 1 << 16);
        assert_eq!(1 << 16 | 1 << 17, sim.value(RccRegister::CR));
    }

    #[test]
    fn stalled_source_never_gets_ready() {
        let sim = SimulatedRcc::new();
        sim.stall(SysClockSource::PLL);

        sim.write(RccRegister::CR, sim.value(RccRegister::CR) | 1 << 24);
        assert_eq!(0, sim.value(RccRegister::CR) & 1 << 25);

        sim.release(SysClockSource::PLL);
        assert_ne!(0, sim.value(RccRegister::CR) & 1 << 25);
    }

    #[test]
    fn switch_status_follows_ready_source() {
        let sim = SimulatedRcc::new();

        // HSE is off: the switch is requested but not taken
        sim.write(RccRegister::CFGR, 0b01);
        assert_eq!(0b01, sim.value(RccRegister::CFGR));

        sim.write(RccRegister::CR, sim.value(RccRegister::CR) | 1 << 16);
        sim.write(RccRegister::CFGR, 0b01);
        assert_eq!(0b0101, sim.value(RccRegister::CFGR));
    }

    #[test]
    fn pll_configuration_is_locked_while_running() {
        let sim = SimulatedRcc::new();
        let pll_configuration = 0b1111 << 18 | 1 << 17 | 1 << 16;

        sim.write(RccRegister::CFGR, 0b0111 << 18);
        sim.write(RccRegister::CR, sim.value(RccRegister::CR) | 1 << 24);

        // PLLMUL, PLLXTPRE and PLLSRC keep their value, SW still goes through
        sim.write(RccRegister::CFGR, pll_configuration | 0b10);
        assert_eq!(0b0111 << 18 | 0b1010, sim.value(RccRegister::CFGR));

        sim.write(RccRegister::CR, sim.value(RccRegister::CR) & !(1 << 24));
        sim.write(RccRegister::CFGR, pll_configuration);
        assert_eq!(pll_configuration, sim.value(RccRegister::CFGR));
    }

    #[test]
    fn accesses_are_recorded_in_order() {
        let sim = SimulatedRcc::new();
        let value = sim.read(RccRegister::APB2ENR);
        sim.write(RccRegister::APB2ENR, value | 1 << 2);

        let mut trace = sim.trace();
        assert_eq!(
            Some(Access {
                kind: AccessKind::Read,
                register: RccRegister::APB2ENR,
                value: 0,
            }),
            trace.next()
        );
        assert_eq!(
            Some(Access {
                kind: AccessKind::Write,
                register: RccRegister::APB2ENR,
                value: 1 << 2,
            }),
            trace.next()
        );
        assert_eq!(None, trace.next());
        assert_eq!(1, sim.read_count(RccRegister::APB2ENR));
        assert_eq!(1, sim.write_count(RccRegister::APB2ENR));

        sim.clear_trace();
        assert_eq!(0, sim.trace().count());
        assert_eq!(0, sim.write_count(RccRegister::APB2ENR));
    }

    #[test]
    fn trace_depth_is_bounded() {
        let sim = SimulatedRcc::new();
        for _ in 0..TRACE_DEPTH + 10 {
            sim.read(RccRegister::CSR);
        }
        assert_eq!(TRACE_DEPTH, sim.trace().count());
        assert_eq!(TRACE_DEPTH + 10, sim.access_count());
    }
}
