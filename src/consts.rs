//! Constants shared by the encoder, the HID report layer and the timer helpers.
//!
//! ## Key Concepts
//!
//! - **Message capacity**: the host may send at most 16 message bytes (128 bits).
//! - **Report framing**: every output report starts with a report id, a protocol
//!   selector and a bit length, followed by the message bytes.
//! - **Timer clock**: tick periods are compare values for an 8-bit timer running
//!   from the core clock through a fixed prescaler.

/// Maximum number of message bytes held by the transmitter.
pub const MESSAGE_MAX_LEN: u8 = 16;

/// See [`MESSAGE_MAX_LEN`](crate::consts::MESSAGE_MAX_LEN)
pub const MESSAGE_MAX_LEN_USIZE: usize = MESSAGE_MAX_LEN as usize;

/// Maximum number of message bits. Longer bit lengths are clamped to this value.
pub const MESSAGE_MAX_BITS: u8 = MESSAGE_MAX_LEN * 8;

/// Number of framing bytes that precede the message in an output report:
/// report id, protocol selector and bit length.
pub const REPORT_HEADER_LEN: u8 = 3;

/// HID report type value for output reports (`wValue` high byte of SET_REPORT).
pub const REPORT_TYPE_OUTPUT: u8 = 2;

/// HID report type value for feature reports.
pub const REPORT_TYPE_FEATURE: u8 = 3;

/// Report id of the output report carrying a message.
pub const MESSAGE_REPORT_ID: u8 = 1;

/// Report id of the two byte status / completion report.
pub const STATUS_REPORT_ID: u8 = 2;

/// Bit set in the status byte while a transmission is pending.
pub const STATUS_PENDING: u8 = 0x80;

/// Core clock of the reference dongle (internal RC oscillator tuned for USB).
pub const F_CPU: u32 = 16_500_000;

/// Prescaler between the core clock and the bit timer.
///
/// Bit times range from ~207 µs to ~731 µs, which fits an 8-bit compare
/// register at /64 (3.879 µs per count).
pub const TIMER_PRESCALER: u32 = 64;
