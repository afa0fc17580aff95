//! Monitor and control of the "SMC" board-management CPLD found on
//! belgite-class network switches.
//!
//! The CPLD hangs off the LPC bus as a window of byte-wide registers: board
//! revision and scratchpad bytes, packed LED control fields, PSU status
//! bits, per-port SFP signals, and the reset lines for the peripherals
//! around the switch ASIC. This crate is the logic beneath a sysfs-style
//! attribute surface: a mutex-guarded register bus, the LED state codecs,
//! and typed accessors for the PSU, SFP, and reset signals.
//!
//! All hardware access goes through the [`transport::LpcBus`] trait, so the
//! whole crate is testable against the simulated register file in
//! [`transport::mock`] without a board attached.

pub mod blocks;
pub mod core;
pub mod prelude;
pub mod transport;
