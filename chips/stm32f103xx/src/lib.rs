// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Clock tree controller for the STM32F103 MCU.
//!
//! STM32F103: <https://www.st.com/en/microcontrollers-microprocessors/stm32f103.html>

#![no_std]

// Must stay first: the logging macros are only visible to modules declared after it.
mod fmt;

pub mod clocks;
pub mod config;
pub mod errorcode;
pub mod rcc;
pub mod sim;
pub mod static_ref;
pub mod wait;

pub use crate::errorcode::ErrorCode;
