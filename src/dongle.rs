//! The complete dongle: host reports in, radio bytes out.
//!
//! [`Dongle`] wires [`HidReports`] to an [`RfDriver`] the way the firmware main
//! loop does:
//!
//! ```text
//! loop {
//!     usb_poll();                        // forwards SET/GET_REPORT to the dongle
//!     let ready = usb_interrupt_ready();
//!     if let Some(report) = dongle.poll(ready)? {
//!         usb_send_interrupt(&report);   // tells the host the message is out
//!     }
//! }
//! ```

use thiserror::Error;

use crate::driver::{RfDriver, RfError};
use crate::hid::{HidError, HidReports};
use crate::shifter::ShiftRegister;

/// Errors raised by [`Dongle`].
#[derive(Error, PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum DongleError<E> {
    /// The host report could not be accepted.
    #[error(transparent)]
    Hid(#[from] HidError),
    /// The radio could not be started or stopped.
    #[error("radio error: {0}")]
    Rf(RfError<E>),
}

impl<E> From<RfError<E>> for DongleError<E> {
    fn from(err: RfError<E>) -> Self {
        DongleError::Rf(err)
    }
}

/// HID report handling and the radio driver, owned together.
#[derive(Debug)]
pub struct Dongle<S>
where
    S: ShiftRegister,
{
    hid: HidReports,
    rf: RfDriver<S>,
}

impl<S> Dongle<S>
where
    S: ShiftRegister,
{
    /// Creates an idle dongle transmitting through `shifter`.
    pub fn new(shifter: S) -> Self {
        Self::with_driver(RfDriver::new(shifter))
    }

    /// Creates an idle dongle around an existing driver.
    pub fn with_driver(rf: RfDriver<S>) -> Self {
        Self {
            hid: HidReports::new(),
            rf,
        }
    }

    /// Setup stage of a SET_REPORT request. See [`HidReports::set_report`].
    pub fn set_report(&mut self, report_type: u8, w_length: u16) {
        self.hid.set_report(report_type, w_length);
    }

    /// Data stage of a SET_REPORT request.
    ///
    /// Starts the radio as soon as the last packet of an output report arrives.
    ///
    /// # Returns
    /// `true` when this packet completed the report and the transmission started.
    ///
    /// # Errors
    /// - [`DongleError::Hid`] if the report was refused
    /// - [`DongleError::Rf`] if the radio could not be started; the report is dropped
    pub fn write(&mut self, data: &[u8]) -> Result<bool, DongleError<S::Error>> {
        let Some(request) = self.hid.write(data)? else {
            return Ok(false);
        };
        if let Err(err) = self.rf.start(request.protocol, request.message) {
            self.hid.abort();
            return Err(err.into());
        }
        Ok(true)
    }

    /// Answers a GET_REPORT request. See [`HidReports::get_report`].
    pub fn get_report(&self, report_id: u8) -> Option<[u8; 2]> {
        self.hid.get_report(report_id)
    }

    /// One pass of the firmware main loop.
    ///
    /// Advances the radio by one step and, when `interrupt_ready` says the
    /// interrupt endpoint is free, returns the completion report of a finished
    /// transmission.
    ///
    /// # Errors
    /// [`DongleError::Rf`] if the shift hardware failed.
    pub fn poll(
        &mut self,
        interrupt_ready: bool,
    ) -> Result<Option<[u8; 2]>, DongleError<S::Error>> {
        self.rf.periodic()?;
        if !interrupt_ready {
            return Ok(None);
        }
        Ok(self.hid.poll_completion(self.rf.is_transmitting()))
    }

    /// The radio driver.
    pub fn rf(&self) -> &RfDriver<S> {
        &self.rf
    }

    /// Exclusive access to the radio driver, e.g. for the shift clock interrupt.
    pub fn rf_mut(&mut self) -> &mut RfDriver<S> {
        &mut self.rf
    }
}
