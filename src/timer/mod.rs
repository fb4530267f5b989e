//! Timer and tick-loop utilities for the transmitter.
//!
//! Every protocol is clocked out at its own bit rate. The rate is expressed as a
//! *tick period*: the compare value of an 8-bit CTC timer fed from the core clock
//! through [`TIMER_PRESCALER`]. The helpers here compute those compare values at
//! compile time, and convert them back into wall-clock time for software timing.
//!
//! Two ways of driving the transmitter are provided:
//! - `timer-isr`: globals protected by `critical_section` plus macros for use from
//!   interrupt handlers
//! - `delay-loop`: a blocking loop built on `embedded_hal::delay::DelayNs`
//!
//! Tick periods used by the built-in catalog, for a 16.5 MHz core and a /64 prescaler:
//!
//! | Bit timing | Compare value | Period    |
//! |------------|---------------|-----------|
//! |   1368 Hz  |           188 | 729.2 µs  |
//! |   2048 Hz  |           126 | 488.7 µs  |
//! |     500 µs |           129 | 500.4 µs  |
//! |   4800 Hz  |            54 | 209.5 µs  |

use crate::consts::{F_CPU, TIMER_PRESCALER};

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg(feature = "delay-loop")]
pub use delay::*;

#[cfg(feature = "timer-isr")]
mod isr;
#[cfg(feature = "timer-isr")]
pub use isr::*;

#[cfg(feature = "timer-isr")]
mod macros;

/// 1,000,000 microseconds = 1 second
pub const MICROSECONDS_PER_SECOND: u64 = 1_000_000;
/// 1,000,000,000 nanoseconds = 1 second
pub const NANOSECONDS_PER_SECOND: u64 = 1_000_000_000;

/// Compile-time compare value for a bit rate given in Hz.
///
/// # Arguments
/// - `f_cpu`: CPU frequency in Hz
/// - `prescaler`: timer prescaler (e.g., 8, 64, 256)
/// - `hz`: desired tick frequency
///
/// # Returns
/// The compare value, rounded to the nearest integer and saturated to `u8`.
pub const fn const_hz_to_ticks(f_cpu: u32, prescaler: u32, hz: u32) -> u8 {
    let divisor = prescaler as u64 * hz as u64;
    if divisor == 0 {
        return u8::MAX;
    }
    saturate((f_cpu as u64 + divisor / 2) / divisor)
}

/// Compile-time compare value for a bit time given in microseconds.
///
/// # Arguments
/// - `f_cpu`: CPU frequency in Hz
/// - `prescaler`: timer prescaler (e.g., 8, 64, 256)
/// - `us`: desired tick interval in microseconds
///
/// # Returns
/// The compare value, rounded to the nearest integer and saturated to `u8`.
pub const fn const_us_to_ticks(f_cpu: u32, prescaler: u32, us: u32) -> u8 {
    let divisor = prescaler as u64 * MICROSECONDS_PER_SECOND;
    saturate((us as u64 * f_cpu as u64 + divisor / 2) / divisor)
}

/// [`const_hz_to_ticks`] for the dongle's own clock.
pub const fn hz_to_ticks(hz: u32) -> u8 {
    const_hz_to_ticks(F_CPU, TIMER_PRESCALER, hz)
}

/// [`const_us_to_ticks`] for the dongle's own clock.
pub const fn us_to_ticks(us: u32) -> u8 {
    const_us_to_ticks(F_CPU, TIMER_PRESCALER, us)
}

/// Duration of one tick period in nanoseconds.
///
/// Used to pace software shifting with a delay provider.
pub const fn tick_period_ns(tick_period: u8) -> u32 {
    let ns = tick_period as u64 * TIMER_PRESCALER as u64 * NANOSECONDS_PER_SECOND / F_CPU as u64;
    if ns > u32::MAX as u64 {
        u32::MAX
    } else {
        ns as u32
    }
}

const fn saturate(value: u64) -> u8 {
    if value > u8::MAX as u64 {
        u8::MAX
    } else {
        value as u8
    }
}
