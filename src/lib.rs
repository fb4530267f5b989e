//! # rfhid
//!
//! A portable, no_std Rust firmware core for USB dongles that replay 433 MHz
//! weather sensor transmissions, such as Oregon Scientific, AcuRite and Ambient
//! Weather thermometers, through a cheap OOK transmitter module.
//!
//! The host sends a raw message and a protocol number in a HID output report.
//! The dongle line-codes the message with the protocol's symbols, prefixes its
//! preamble, and clocks the result out one bit per timer tick:
//! - a table-driven [`protocol`] catalog of symbols, preambles and bit timings
//! - an incremental [`encoder`] that builds one output byte at a time, cheap
//!   enough to run from a busy main loop
//! - a [`ShiftRegister`](shifter::ShiftRegister) abstraction over the serial
//!   shift hardware, with a bit-banged [`SoftShifter`](shifter::SoftShifter)
//!   on top of `embedded-hal`
//! - HID report framing in [`hid`], and the main loop glue in [`dongle`]
//!
//! ## Crate features
//! | Feature               | Description |
//! |-----------------------|-------------|
//! | `std`                 | Disables `#![no_std]` support |
//! | `delay-loop`          | Uses `embedded_hal::delay::DelayNs` for bit timing |
//! | `timer-isr` (default) | Uses `critical_section::with` to share the driver with a timer ISR |
//! | `defmt-0-3`           | Uses `defmt` logging |
//! | `log`                 | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rfhid::dongle::Dongle;
//! use rfhid::shifter::SoftShifter;
//!
//! let mut dongle = Dongle::new(SoftShifter::new(data_pin));
//! loop {
//!     // SET_REPORT: dongle.set_report(..) then dongle.write(..) per packet
//!     if let Some(report) = dongle.poll(usb_interrupt_ready())? {
//!         usb_send_interrupt(&report);
//!     }
//! }
//! ```
//!
//! The shift clock is then driven from a timer compare interrupt programmed
//! with the protocol's tick period:
//!
//! ```rust,ignore
//! #[interrupt]
//! fn TIMER1_COMPA() {
//!     soft_shift_tick!().ok();
//! }
//! ```
//!
//! Or, without interrupts, use `run_transmit_blocking()` with a `DelayNs` implementation:
//!
//! ```rust,ignore
//! rfhid::timer::run_transmit_blocking(&mut driver, &mut delay)?;
//! ```
//!
//! ## Integration Notes
//!
//! - Tick periods are timer compare values for a 16.5 MHz core and a /64
//!   prescaler, see [`timer`]
//! - The main loop must call `periodic()` several times per tick period
//! - Only one transmission is in flight at a time; new reports are refused
//!   until the completion report has been sent
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(any(feature = "std", test)), no_std)]

#[cfg(feature = "timer-isr")]
pub use critical_section;

pub use heapless;

#[macro_use]
mod fmt;

pub mod consts;
pub mod dongle;
pub mod driver;
pub mod encoder;
pub mod hid;
pub mod message;
pub mod protocol;
pub mod shifter;
pub mod timer;
