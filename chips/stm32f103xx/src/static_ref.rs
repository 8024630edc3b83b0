// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Safe handle to a memory-mapped register block.

use core::ops::Deref;

/// Address of a register block that lives for the whole program.
///
/// Dereferencing yields a `&'static T`, so the unsafe part is confined to [StaticRef::new].
#[derive(Debug)]
pub struct StaticRef<T> {
    ptr: *const T,
}

impl<T> StaticRef<T> {
    /// ## Safety
    ///
    /// `ptr` must point to a valid `T` for the rest of the program, and no other Rust value may
    /// overlap it.
    pub const unsafe fn new(ptr: *const T) -> StaticRef<T> {
        StaticRef { ptr }
    }
}

impl<T> Clone for StaticRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StaticRef<T> {}

impl<T: 'static> Deref for StaticRef<T> {
    type Target = T;
    fn deref(&self) -> &'static T {
        // SAFETY: `new` requires the pointer to reference static memory.
        unsafe { &*self.ptr }
    }
}
