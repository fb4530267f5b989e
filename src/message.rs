//! The raw message handed to the encoder.
//!
//! A message is an opaque bit string of at most [`MESSAGE_MAX_BITS`] bits,
//! consumed MSB first, byte by byte. The encoder never looks at what the bits
//! mean: checksums, parity and sensor ids are all built by the host.

use crate::consts::{MESSAGE_MAX_BITS, MESSAGE_MAX_LEN_USIZE};

/// A fixed-capacity message buffer and the number of bits to send from it.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Message {
    bytes: [u8; MESSAGE_MAX_LEN_USIZE],
    bit_len: u8,
}

impl Message {
    /// A message with no bits to send.
    pub const EMPTY: Message = Message {
        bytes: [0; MESSAGE_MAX_LEN_USIZE],
        bit_len: 0,
    };

    /// Creates a message from `bytes`, sending `bit_len` bits of it.
    ///
    /// Bytes past the buffer capacity are ignored, and `bit_len` is clamped to
    /// [`MESSAGE_MAX_BITS`]. Bits beyond the end of `bytes` are sent as zeros.
    pub fn new(bytes: &[u8], bit_len: u8) -> Self {
        let mut buf = [0u8; MESSAGE_MAX_LEN_USIZE];
        let len = bytes.len().min(MESSAGE_MAX_LEN_USIZE);
        buf[..len].copy_from_slice(&bytes[..len]);
        Self {
            bytes: buf,
            bit_len: bit_len.min(MESSAGE_MAX_BITS),
        }
    }

    /// Creates a message sending every bit of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let bits = bytes.len().min(MESSAGE_MAX_LEN_USIZE) * 8;
        Self::new(bytes, bits as u8)
    }

    /// Number of bits to transmit.
    pub fn bit_len(&self) -> u8 {
        self.bit_len
    }

    /// The whole backing buffer.
    pub fn as_bytes(&self) -> &[u8; MESSAGE_MAX_LEN_USIZE] {
        &self.bytes
    }

    /// The byte at `index`, or zero past the end of the buffer.
    pub(crate) fn byte(&self, index: u8) -> u8 {
        self.bytes.get(index as usize).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_len_clamped() {
        let msg = Message::new(&[0xff; 16], 200);
        assert_eq!(msg.bit_len(), 128);

        let msg = Message::new(&[0xff; 16], 128);
        assert_eq!(msg.bit_len(), 128);
    }

    #[test]
    fn test_oversized_buffer_truncated() {
        let mut bytes = [0u8; 20];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        let msg = Message::from_bytes(&bytes);
        assert_eq!(msg.bit_len(), 128);
        assert_eq!(msg.as_bytes()[15], 15);
        assert_eq!(msg.byte(16), 0);
    }

    #[test]
    fn test_short_buffer_zero_filled() {
        let msg = Message::new(&[0xa5], 24);
        assert_eq!(msg.bit_len(), 24);
        assert_eq!(msg.byte(0), 0xa5);
        assert_eq!(msg.byte(1), 0);
        assert_eq!(msg.byte(2), 0);
    }

    #[test]
    fn test_empty() {
        let msg = Message::default();
        assert_eq!(msg.bit_len(), 0);
        assert_eq!(Message::from_bytes(&[]).bit_len(), 0);
    }
}
