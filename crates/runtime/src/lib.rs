//! Delta runtime library.
//!
//! C-ABI `std*` wrappers the compiler registers in its function table
//! and the emitted IR references by name. Built as a staticlib and
//! linked into native output by the driver; the exported names are the
//! contract, so they keep the camelCase spelling Delta programs use.

#![allow(non_snake_case)]

pub mod io;
pub mod rand;
pub mod time;
pub mod window;
