//! HID report handling for the host interface.
//!
//! The host talks to the dongle with plain HID class requests; no USB stack
//! is pulled in here, only the report framing. A USB driver forwards the
//! relevant control requests to [`HidReports`]:
//!
//! | Request      | Report | Payload                                             |
//! |--------------|--------|-----------------------------------------------------|
//! | SET_REPORT   | output | `[1, protocol, bit_length, message...]`             |
//! | GET_REPORT   | id 2   | `[2, pending << 7 \| protocol]`                     |
//! | interrupt IN | id 2   | `[2, 0]`, once per finished transmission            |
//!
//! Output reports larger than one USB packet arrive in several
//! [`write()`](HidReports::write) calls; only the first carries the three byte
//! header. At most [`MESSAGE_MAX_LEN`] message bytes are kept.
//!
//! While a transmission is pending, new output reports are refused, so the
//! encoder is never re-armed under the running shift clock.

use heapless::Vec;
use thiserror::Error;

use crate::consts::{
    MESSAGE_MAX_LEN, MESSAGE_MAX_LEN_USIZE, REPORT_HEADER_LEN, REPORT_TYPE_FEATURE,
    REPORT_TYPE_OUTPUT, STATUS_PENDING, STATUS_REPORT_ID,
};
use crate::message::Message;

/// Errors raised while handling host reports.
#[derive(Error, PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum HidError {
    /// The previous message is still being transmitted.
    #[error("transmission pending, report rejected")]
    TransmitPending,
    /// The first packet of an output report is shorter than its header.
    #[error("output report shorter than its header")]
    Truncated,
    /// Writes to this report type are not supported (input reports).
    #[error("unsupported report type {0}")]
    UnsupportedReport(u8),
}

/// A complete message received from the host.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct TransmitRequest {
    /// Protocol selector, as sent by the host (not yet wrapped).
    pub protocol: u8,
    /// The message, with its bit length already clamped.
    pub message: Message,
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
enum Transfer {
    /// No report in progress, or a feature report; data is accepted and ignored.
    Idle,
    /// An output report is being received.
    Output,
    /// An output report arrived while busy; its remaining packets are refused.
    Refused,
    /// A report type this device does not accept.
    Unsupported(u8),
}

/// Host report state machine.
#[derive(Debug)]
pub struct HidReports {
    transfer: Transfer,
    expected_len: u8,
    header_seen: bool,
    protocol: u8,
    bit_len: u8,
    buf: Vec<u8, MESSAGE_MAX_LEN_USIZE>,
    pending: bool,
}

impl Default for HidReports {
    fn default() -> Self {
        Self::new()
    }
}

impl HidReports {
    /// Creates an idle report handler.
    pub const fn new() -> Self {
        Self {
            transfer: Transfer::Idle,
            expected_len: 0,
            header_seen: false,
            protocol: 0,
            bit_len: 0,
            buf: Vec::new(),
            pending: false,
        }
    }

    /// Handles the setup stage of a SET_REPORT request.
    ///
    /// # Arguments
    /// - `report_type`: high byte of `wValue` (2 = output, 3 = feature)
    /// - `w_length`: total length of the report, header included
    pub fn set_report(&mut self, report_type: u8, w_length: u16) {
        let payload = w_length.saturating_sub(REPORT_HEADER_LEN as u16);
        self.expected_len = payload.min(MESSAGE_MAX_LEN as u16) as u8;
        self.header_seen = false;
        self.buf.clear();
        self.transfer = match report_type {
            REPORT_TYPE_OUTPUT => Transfer::Output,
            REPORT_TYPE_FEATURE => Transfer::Idle,
            _ => Transfer::Unsupported(report_type),
        };
    }

    /// Handles one data packet of a SET_REPORT request.
    ///
    /// # Returns
    /// - `Ok(Some(request))` once the whole message has arrived
    /// - `Ok(None)` if more packets are expected, or the data was ignored
    ///
    /// # Errors
    /// - [`HidError::TransmitPending`] if a transmission is still running
    /// - [`HidError::Truncated`] if the first packet cannot hold the header
    /// - [`HidError::UnsupportedReport`] for reports other than output or feature reports
    pub fn write(&mut self, data: &[u8]) -> Result<Option<TransmitRequest>, HidError> {
        match self.transfer {
            Transfer::Idle => return Ok(None),
            Transfer::Refused => return Err(HidError::TransmitPending),
            Transfer::Unsupported(report_type) => {
                return Err(HidError::UnsupportedReport(report_type));
            }
            Transfer::Output => {}
        }

        if self.pending {
            warn!("hid output report refused: transmission pending");
            self.transfer = Transfer::Refused;
            return Err(HidError::TransmitPending);
        }

        let mut data = data;
        if !self.header_seen {
            let [_report_id, protocol, bit_len, rest @ ..] = data else {
                self.transfer = Transfer::Idle;
                return Err(HidError::Truncated);
            };
            self.protocol = *protocol;
            self.bit_len = *bit_len;
            self.header_seen = true;
            data = rest;
        }

        // Don't read past the end of the message buffer
        let limit = (self.expected_len as usize).min(self.buf.capacity());
        let take = data.len().min(limit.saturating_sub(self.buf.len()));
        let stored = self.buf.extend_from_slice(&data[..take]);
        debug_assert!(stored.is_ok(), "message buffer overflow");

        if self.buf.len() < self.expected_len as usize {
            return Ok(None);
        }

        self.transfer = Transfer::Idle;
        self.pending = true;
        debug!(
            "hid message: protocol {}, {} bytes, {} bits",
            self.protocol,
            self.buf.len(),
            self.bit_len
        );
        Ok(Some(TransmitRequest {
            protocol: self.protocol,
            message: Message::new(&self.buf, self.bit_len),
        }))
    }

    /// Answers a GET_REPORT request.
    ///
    /// Only the status report exists: `[2, pending << 7 | protocol]`.
    ///
    /// `protocol` is the selector byte of the last output report as the host
    /// sent it (low 7 bits), not wrapped into the catalog. Firmware that
    /// consumed the selector while starting reported `0x80` during a
    /// transmission; host tools written for it should mask the low bits off.
    pub fn get_report(&self, report_id: u8) -> Option<[u8; 2]> {
        if report_id != STATUS_REPORT_ID {
            return None;
        }
        let pending = if self.pending { STATUS_PENDING } else { 0 };
        Some([STATUS_REPORT_ID, pending | (self.protocol & !STATUS_PENDING)])
    }

    /// Produces the completion report once the pending transmission stopped.
    ///
    /// `transmitting` is the state of the shift clock. Returns `Some` exactly
    /// once per accepted message.
    pub fn poll_completion(&mut self, transmitting: bool) -> Option<[u8; 2]> {
        if !self.pending || transmitting {
            return None;
        }
        self.pending = false;
        Some([STATUS_REPORT_ID, 0])
    }

    /// Whether an accepted message has not finished transmitting yet.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Drops the pending flag without reporting completion, e.g. when the
    /// message could not be started.
    pub fn abort(&mut self) {
        self.pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_packet_report() {
        let mut hid = HidReports::new();
        hid.set_report(REPORT_TYPE_OUTPUT, 6);
        let request = hid.write(&[1, 8, 17, 0xc1, 0x55, 0x00]).unwrap().unwrap();
        assert_eq!(request.protocol, 8);
        assert_eq!(request.message, Message::new(&[0xc1, 0x55, 0x00], 17));
        assert!(hid.is_pending());
    }

    #[test]
    fn test_chunked_report() {
        // 3 header bytes + 8 message bytes, split in 8 byte USB packets
        let mut hid = HidReports::new();
        hid.set_report(REPORT_TYPE_OUTPUT, 11);
        assert_eq!(hid.write(&[1, 8, 57, 0xc4, 0x12, 0x44, 0x31, 0x0a]), Ok(None));
        let request = hid.write(&[0x1c, 0x7f, 0x00]).unwrap().unwrap();
        assert_eq!(
            request.message,
            Message::new(&[0xc4, 0x12, 0x44, 0x31, 0x0a, 0x1c, 0x7f, 0x00], 57)
        );
        assert_eq!(request.message.bit_len(), 57);
    }

    #[test]
    fn test_oversized_report_clamped() {
        let mut hid = HidReports::new();
        hid.set_report(REPORT_TYPE_OUTPUT, 3 + 20);
        let mut first = [0xffu8; 8];
        first[0] = 1;
        first[1] = 0;
        first[2] = 250;
        assert_eq!(hid.write(&first), Ok(None));
        assert_eq!(hid.write(&[0xff; 8]), Ok(None));
        let request = hid.write(&[0xff; 8]).unwrap().unwrap();
        assert_eq!(request.message.bit_len(), 128);
        assert_eq!(request.message.as_bytes(), &[0xff; 16]);
    }

    #[test]
    fn test_oversized_single_packet_clamped() {
        let mut hid = HidReports::new();
        hid.set_report(REPORT_TYPE_OUTPUT, 3 + 24);
        let mut report = [0u8; 27];
        report[..3].copy_from_slice(&[1, 4, 200]);
        for (i, byte) in report[3..].iter_mut().enumerate() {
            *byte = i as u8;
        }
        let request = hid.write(&report).unwrap().unwrap();
        let expected: [u8; 16] = core::array::from_fn(|i| i as u8);
        assert_eq!(request.message.as_bytes(), &expected);
        assert_eq!(request.message.bit_len(), 128);
        // Trailing packets of the same transfer are ignored
        assert_eq!(hid.write(&[0xff; 8]), Ok(None));
    }

    #[test]
    fn test_status_reports_raw_selector() {
        let mut hid = HidReports::new();
        hid.set_report(REPORT_TYPE_OUTPUT, 4);
        let _ = hid.write(&[1, 0x8b, 8, 0x12]).unwrap();
        // Selector 0x8b is sent as protocol 0x8b % 9, but reported masked
        assert_eq!(hid.get_report(STATUS_REPORT_ID), Some([2, 0x80 | 0x0b]));
    }

    #[test]
    fn test_header_only_report() {
        let mut hid = HidReports::new();
        hid.set_report(REPORT_TYPE_OUTPUT, 3);
        let request = hid.write(&[1, 2, 0]).unwrap().unwrap();
        assert_eq!(request.protocol, 2);
        assert_eq!(request.message.bit_len(), 0);
    }

    #[test]
    fn test_truncated_header() {
        let mut hid = HidReports::new();
        hid.set_report(REPORT_TYPE_OUTPUT, 8);
        assert_eq!(hid.write(&[1, 2]), Err(HidError::Truncated));
        assert!(!hid.is_pending());
        // The rest of the transfer is ignored
        assert_eq!(hid.write(&[0; 6]), Ok(None));
    }

    #[test]
    fn test_refused_while_pending() {
        let mut hid = HidReports::new();
        hid.set_report(REPORT_TYPE_OUTPUT, 4);
        assert!(hid.write(&[1, 0, 8, 0xaa]).unwrap().is_some());

        hid.set_report(REPORT_TYPE_OUTPUT, 12);
        assert_eq!(hid.write(&[1, 1, 8, 0, 0, 0, 0, 0]), Err(HidError::TransmitPending));
        assert_eq!(hid.write(&[0; 4]), Err(HidError::TransmitPending));
        assert_eq!(hid.get_report(STATUS_REPORT_ID), Some([2, 0x80]));
    }

    #[test]
    fn test_feature_report_ignored() {
        let mut hid = HidReports::new();
        hid.set_report(REPORT_TYPE_FEATURE, 8);
        assert_eq!(hid.write(&[1, 2, 8, 0, 0, 0, 0, 0]), Ok(None));
        assert!(!hid.is_pending());
    }

    #[test]
    fn test_unsupported_report_type() {
        let mut hid = HidReports::new();
        hid.set_report(1, 8);
        assert_eq!(hid.write(&[0; 8]), Err(HidError::UnsupportedReport(1)));
    }

    #[test]
    fn test_data_without_setup_ignored() {
        let mut hid = HidReports::new();
        assert_eq!(hid.write(&[1, 2, 3]), Ok(None));
        assert!(!hid.is_pending());
    }

    #[test]
    fn test_status_report() {
        let mut hid = HidReports::new();
        assert_eq!(hid.get_report(1), None);
        assert_eq!(hid.get_report(STATUS_REPORT_ID), Some([2, 0]));

        hid.set_report(REPORT_TYPE_OUTPUT, 4);
        let _ = hid.write(&[1, 5, 8, 0x12]).unwrap();
        assert_eq!(hid.get_report(STATUS_REPORT_ID), Some([2, 0x85]));
    }

    #[test]
    fn test_completion_reported_once() {
        let mut hid = HidReports::new();
        assert_eq!(hid.poll_completion(false), None);

        hid.set_report(REPORT_TYPE_OUTPUT, 4);
        let _ = hid.write(&[1, 5, 8, 0x12]).unwrap();
        assert_eq!(hid.poll_completion(true), None);
        assert_eq!(hid.poll_completion(false), Some([2, 0]));
        assert_eq!(hid.poll_completion(false), None);
        assert_eq!(hid.get_report(STATUS_REPORT_ID), Some([2, 5]));
    }

    #[test]
    fn test_abort_clears_pending() {
        let mut hid = HidReports::new();
        hid.set_report(REPORT_TYPE_OUTPUT, 4);
        let _ = hid.write(&[1, 5, 8, 0x12]).unwrap();
        hid.abort();
        assert!(!hid.is_pending());
        assert_eq!(hid.poll_completion(false), None);
    }
}
