//! Lazy bitstream encoder for the serial shift peripheral.
//!
//! The [`Encoder`] turns a [`Message`] and a [`ProtocolDescriptor`] into the
//! byte stream the shift hardware clocks out onto the radio data pin. It never
//! computes the stream up front. Instead, every call to
//! [`work_step()`](Encoder::work_step) does one small, bounded piece of work
//! towards the next output byte, so it can run from a polling loop without ever
//! delaying the bit-clock interrupt.
//!
//! ## Producer / consumer protocol
//!
//! ```text
//!   background loop                      shift hardware (drained)
//!   ---------------                      ------------------------
//!   work_step()  -- builds byte -->  [output, needed]  <-- take_byte()
//! ```
//!
//! `needed` counts the bits still missing from the output byte. When it
//! reaches zero the byte is ready ([`is_ready()`](Encoder::is_ready)), and
//! [`take_byte()`](Encoder::take_byte) hands it over and asks for a new one.
//!
//! ## Stream layout
//!
//! 1. **Preamble**: the protocol's preamble bytes, verbatim, one whole byte per step.
//! 2. **Payload**: every message bit, MSB first, replaced by the zero or one
//!    symbol of the protocol and shifted in MSB first, one output bit per step.
//! 3. **Flush**: `needed + 8` zero bits, completing the byte in progress and
//!    adding one full zero byte so the last real bit leaves the hardware.
//! 4. **Done**: a final zero byte. Once it is taken, [`is_complete()`](Encoder::is_complete)
//!    tells the hardware to stop its clock.

use crate::message::Message;
use crate::protocol::{CATALOG, Catalog, Symbol};

/// Phase of the current transmission.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Phase {
    /// Nothing has been started since power-up.
    #[default]
    Idle,
    /// Preamble bytes are being emitted.
    Preamble,
    /// Message bits are being expanded into symbols.
    Payload,
    /// Trailing zeros are being shifted in.
    Flush,
    /// The last byte has been produced; the hardware should stop once it is taken.
    Done,
}

/// The incremental protocol encoder.
///
/// There is one transmission in flight per encoder, and the encoder owns the
/// message while it is being sent. `Encoder` is neither `Clone` nor `Copy`;
/// the interrupt handler and the background loop share one instance (see
/// [`crate::timer`] for the `critical_section` helpers).
#[derive(Debug)]
pub struct Encoder {
    catalog: &'static Catalog,
    phase: Phase,

    /// Symbols of the selected protocol.
    zero: Symbol,
    one: Symbol,

    /// Next preamble byte and how many are left.
    preamble_pos: u8,
    preamble_remaining: u8,

    /// Symbol currently being shifted into the output byte.
    pattern: u8,
    pattern_len: u8,

    message: Message,
    /// Index of the next message byte to fetch.
    msg_pos: u8,
    /// Number of message bits consumed so far.
    msg_bit: u8,
    /// Message byte being consumed, shifted so the next bit is the MSB.
    msg_byte: u8,

    output: u8,
    needed: u8,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    /// Creates an idle encoder using the built-in [`CATALOG`].
    pub fn new() -> Self {
        Self::with_catalog(&CATALOG)
    }

    /// Creates an idle encoder using a custom protocol catalog.
    pub const fn with_catalog(catalog: &'static Catalog) -> Self {
        Self {
            catalog,
            phase: Phase::Idle,
            zero: Symbol::new(0, 0),
            one: Symbol::new(0, 0),
            preamble_pos: 0,
            preamble_remaining: 0,
            pattern: 0,
            pattern_len: 0,
            message: Message::EMPTY,
            msg_pos: 0,
            msg_bit: 0,
            msg_byte: 0,
            output: 0,
            needed: 0,
        }
    }

    /// Arms the encoder for a new transmission.
    ///
    /// `protocol` is wrapped into the catalog, so any selector is valid.
    ///
    /// # Returns
    /// The tick period the shift clock must be programmed with before it is
    /// enabled.
    ///
    /// # Notes
    /// Must only be called once the previous transmission has fully drained and
    /// the shift clock is stopped. The encoder does not check this.
    pub fn start(&mut self, protocol: u8, message: Message) -> u8 {
        let descriptor = self.catalog.descriptor_for(protocol);

        self.zero = descriptor.zero;
        self.one = descriptor.one;
        self.pattern_len = 0;
        self.preamble_pos = descriptor.preamble_offset;
        self.preamble_remaining = descriptor.preamble_len;
        self.message = message;
        self.msg_pos = 0;
        self.msg_bit = 0;
        self.needed = 8;
        self.phase = if descriptor.preamble_len == 0 {
            Phase::Payload
        } else {
            Phase::Preamble
        };

        debug!(
            "rf start: protocol {}, {} bits, tick period {}",
            protocol,
            message.bit_len(),
            descriptor.tick_period
        );
        descriptor.tick_period
    }

    /// Performs one bounded step of work towards the next output byte.
    ///
    /// Exactly one of the following happens, in priority order:
    /// 1. The output byte is already complete: nothing.
    /// 2. Preamble bytes remain: the next one becomes the output byte.
    /// 3. A symbol is in progress: its next bit is shifted into the output byte.
    /// 4. The flush is over: the output byte becomes zero and the encoder is done.
    /// 5. The message is exhausted: a zero pattern of `needed + 8` bits starts the flush.
    /// 6. Otherwise the next message bit selects the symbol to shift in.
    pub fn work_step(&mut self) {
        if self.needed == 0 {
            return;
        }

        match self.phase {
            Phase::Preamble => {
                // Preamble goes an entire byte at a time
                self.preamble_remaining -= 1;
                self.output = self.catalog.preamble_byte(self.preamble_pos);
                self.preamble_pos += 1;
                self.needed = 0;
                if self.preamble_remaining == 0 {
                    self.phase = Phase::Payload;
                }
            }
            _ if self.pattern_len != 0 => {
                self.output = (self.output << 1) | (self.pattern >> 7);
                self.pattern <<= 1;
                self.pattern_len -= 1;
                self.needed -= 1;
            }
            Phase::Flush | Phase::Done | Phase::Idle => {
                self.output = 0;
                self.needed = 0;
                if self.phase == Phase::Flush {
                    trace!("rf flush complete");
                    self.phase = Phase::Done;
                }
            }
            Phase::Payload if self.msg_bit == self.message.bit_len() => {
                // Finish this byte, then one more so the last bit fully leaves the hardware
                self.pattern_len = self.needed + 8;
                self.pattern = 0;
                self.phase = Phase::Flush;
            }
            Phase::Payload => {
                if self.msg_bit % 8 == 0 {
                    self.msg_byte = self.message.byte(self.msg_pos);
                    self.msg_pos += 1;
                }
                self.msg_bit += 1;

                let symbol = if self.msg_byte & 0x80 != 0 {
                    self.one
                } else {
                    self.zero
                };
                self.pattern = symbol.bits;
                self.pattern_len = symbol.len;
                self.msg_byte <<= 1;
            }
        }
    }

    /// Hands the current output byte to the shift hardware and requests the next one.
    ///
    /// # Notes
    /// Must only be called when [`is_ready()`](Encoder::is_ready) is `true`.
    /// Taking a byte earlier returns whatever has been built so far (an
    /// underrun); this is a timing fault of the caller and is only checked in
    /// debug builds.
    pub fn take_byte(&mut self) -> u8 {
        debug_assert!(self.needed == 0, "output byte taken before it was complete");
        self.needed = 8;
        self.output
    }

    /// Whether the output byte is complete and may be taken.
    pub fn is_ready(&self) -> bool {
        self.needed == 0
    }

    /// Whether the final byte has been produced.
    ///
    /// The hardware checks this right after [`take_byte()`](Encoder::take_byte);
    /// when it is `true` the byte just taken was the last one. An encoder that
    /// was never started also reports complete.
    pub fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Done | Phase::Idle)
    }

    /// The current transmission phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of message bits consumed so far.
    pub fn bits_sent(&self) -> u8 {
        self.msg_bit
    }
}
