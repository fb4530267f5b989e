//! Transmission driver: glue between the encoder and the shift hardware.
//!
//! This module provides [`RfDriver`], which owns an [`Encoder`] and a
//! [`ShiftRegister`] and moves bytes from one to the other. It is the only
//! place that knows the order in which the two must be driven:
//!
//! - [`start()`](RfDriver::start) arms the encoder and starts the bit clock with
//!   the protocol's tick period.
//! - [`periodic()`](RfDriver::periodic) is called from the main loop as often
//!   as possible. Each call performs one encoder step, hands a finished byte to
//!   the hardware when it has drained, and stops the clock after the final byte.
//!
//! ## Example
//!
//! ```rust
//! # use embedded_hal_mock::eh1::digital::{Mock as Pin, State as PinState, Transaction as PinTransaction};
//! use rfhid::driver::RfDriver;
//! use rfhid::message::Message;
//! use rfhid::protocol::Protocol;
//! use rfhid::shifter::SoftShifter;
//!
//! # let pin = Pin::new(&[PinTransaction::set(PinState::Low)]);
//! let mut driver = RfDriver::new(SoftShifter::new(pin));
//! driver
//!     .start(Protocol::AcuritePwm.selector(), Message::new(&[0xc4, 0x12], 16))
//!     .unwrap();
//! assert!(driver.is_transmitting());
//! driver.periodic().unwrap(); // Called from the main loop
//! // ... SoftShifter::tick() is called from the timer interrupt
//! # driver.release().release().done();
//! ```

use core::convert::Infallible;

use thiserror::Error;

use crate::encoder::{Encoder, Phase};
use crate::message::Message;
use crate::shifter::ShiftRegister;

/// Errors raised by [`RfDriver`].
#[derive(Error, PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum RfError<E> {
    /// A transmission is still being clocked out.
    #[error("a transmission is already in progress")]
    Busy,
    /// The shift hardware reported an error.
    #[error("shift hardware error: {0:?}")]
    Shift(E),
}

/// Drives an [`Encoder`] into a [`ShiftRegister`].
///
/// ## Notes
///
/// - Only one transmission may be in flight; [`start()`](RfDriver::start)
///   returns [`RfError::Busy`] while the bit clock runs.
/// - If the shift hardware is serviced from an interrupt, keep the driver in a
///   `critical_section::Mutex` (see [`crate::timer`]).
#[derive(Debug)]
pub struct RfDriver<S>
where
    S: ShiftRegister,
{
    encoder: Encoder,
    shifter: S,
    /// Counter of completed transmissions.
    pub tx_good: u16,
}

impl<S> RfDriver<S>
where
    S: ShiftRegister,
{
    /// Creates an idle driver using the built-in protocol catalog.
    pub fn new(shifter: S) -> Self {
        Self::with_encoder(Encoder::new(), shifter)
    }

    /// Creates an idle driver around an existing encoder.
    pub fn with_encoder(encoder: Encoder, shifter: S) -> Self {
        Self {
            encoder,
            shifter,
            tx_good: 0,
        }
    }

    /// Starts transmitting `message` with the protocol selected by `protocol`.
    ///
    /// # Returns
    /// The tick period the bit clock was started with.
    ///
    /// # Errors
    /// - [`RfError::Busy`] if the previous transmission has not finished
    /// - [`RfError::Shift`] if the hardware failed to start
    pub fn start(&mut self, protocol: u8, message: Message) -> Result<u8, RfError<S::Error>> {
        if self.shifter.is_running() {
            warn!("rf start rejected: transmission in progress");
            return Err(RfError::Busy);
        }
        let tick_period = self.encoder.start(protocol, message);
        self.shifter.begin(tick_period).map_err(RfError::Shift)?;
        Ok(tick_period)
    }

    /// Advances the transmission by one step.
    ///
    /// Must be called much more often than once per tick period, so that the
    /// next byte is always complete before the hardware drains.
    ///
    /// # Errors
    /// [`RfError::Shift`] if the hardware failed to stop.
    pub fn periodic(&mut self) -> Result<(), RfError<S::Error>> {
        self.encoder.work_step();

        if !self.encoder.is_ready() || !self.shifter.is_drained() {
            return Ok(());
        }

        self.shifter.load(self.encoder.take_byte());
        if self.encoder.is_complete() {
            self.shifter.halt().map_err(RfError::Shift)?;
            self.tx_good = self.tx_good.wrapping_add(1);
            info!("rf transmission complete");
        }
        Ok(())
    }

    /// Whether the bit clock is running.
    pub fn is_transmitting(&self) -> bool {
        self.shifter.is_running()
    }

    /// Non-blocking wait for the current transmission to finish.
    ///
    /// Use with `nb::block!` to busy-wait.
    pub fn poll_done(&self) -> nb::Result<(), Infallible> {
        if self.is_transmitting() {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(())
        }
    }

    /// Phase of the encoder.
    pub fn phase(&self) -> Phase {
        self.encoder.phase()
    }

    /// Shared access to the shift hardware.
    pub fn shifter(&self) -> &S {
        &self.shifter
    }

    /// Exclusive access to the shift hardware, e.g. to call `SoftShifter::tick()`.
    pub fn shifter_mut(&mut self) -> &mut S {
        &mut self.shifter
    }

    /// Consumes the driver and returns the shift hardware.
    pub fn release(self) -> S {
        self.shifter
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::protocol::{CATALOG, PROTOCOLS, Protocol};
    use crate::shifter::SoftShifter;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    /// A shift register that drains instantly and records every loaded byte.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingShifter {
        pub(crate) bytes: Vec<u8>,
        pub(crate) tick_period: Option<u8>,
        pub(crate) running: bool,
        pub(crate) halts: u8,
    }

    impl ShiftRegister for RecordingShifter {
        type Error = Infallible;

        fn begin(&mut self, tick_period: u8) -> Result<(), Self::Error> {
            self.tick_period = Some(tick_period);
            self.running = true;
            Ok(())
        }

        fn is_drained(&self) -> bool {
            self.running
        }

        fn load(&mut self, byte: u8) {
            self.bytes.push(byte);
        }

        fn halt(&mut self) -> Result<(), Self::Error> {
            self.running = false;
            self.halts += 1;
            Ok(())
        }

        fn is_running(&self) -> bool {
            self.running
        }
    }

    fn run_to_completion<S: ShiftRegister>(driver: &mut RfDriver<S>)
    where
        S::Error: core::fmt::Debug,
    {
        for _ in 0..10_000 {
            if !driver.is_transmitting() {
                return;
            }
            driver.periodic().unwrap();
        }
        panic!("transmission never completed");
    }

    #[test]
    fn test_idle_driver() {
        let mut driver = RfDriver::new(RecordingShifter::default());
        assert!(!driver.is_transmitting());
        assert_eq!(driver.poll_done(), Ok(()));
        driver.periodic().unwrap();
        assert!(driver.shifter().bytes.is_empty());
        assert_eq!(driver.phase(), Phase::Idle);
    }

    #[test]
    fn test_start_programs_tick_period() {
        let mut driver = RfDriver::new(RecordingShifter::default());
        let ticks = driver
            .start(Protocol::OregonScientific10.selector(), Message::default())
            .unwrap();
        assert_eq!(ticks, 188);
        assert_eq!(driver.shifter().tick_period, Some(188));
        assert!(driver.is_transmitting());
        assert_eq!(driver.poll_done(), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn test_start_while_busy_rejected() {
        let mut driver = RfDriver::new(RecordingShifter::default());
        let _ = driver.start(0, Message::default()).unwrap();
        assert_eq!(driver.start(1, Message::default()), Err(RfError::Busy));
        assert_eq!(driver.shifter().tick_period, Some(188));
    }

    #[test]
    fn test_stream_and_single_completion() {
        let message = Message::new(&[0x4e, 0x81, 0xf0], 20);
        for (i, descriptor) in PROTOCOLS.iter().enumerate() {
            let mut driver = RfDriver::new(RecordingShifter::default());
            let _ = driver.start(i as u8, message).unwrap();
            run_to_completion(&mut driver);

            let shifter = driver.shifter();
            assert_eq!(shifter.halts, 1);
            assert_eq!(driver.tx_good, 1);
            assert_eq!(driver.phase(), Phase::Done);

            let preamble = CATALOG.preamble(descriptor);
            assert_eq!(&shifter.bytes[..preamble.len()], preamble);
            // Flush byte(s) and the done byte close every stream
            assert_eq!(shifter.bytes[shifter.bytes.len() - 1], 0);
            assert_eq!(shifter.bytes[shifter.bytes.len() - 2], 0);

            // Nothing more happens once stopped
            for _ in 0..32 {
                driver.periodic().unwrap();
            }
            assert_eq!(driver.shifter().halts, 1);
        }
    }

    #[test]
    fn test_restart_after_completion() {
        let mut driver = RfDriver::new(RecordingShifter::default());
        let _ = driver.start(2, Message::new(&[0xff], 8)).unwrap();
        run_to_completion(&mut driver);
        let first = driver.shifter().bytes.len();

        let _ = driver.start(2, Message::new(&[0xff], 8)).unwrap();
        run_to_completion(&mut driver);
        assert_eq!(driver.shifter().bytes.len(), first * 2);
        assert_eq!(driver.tx_good, 2);
        assert_eq!(driver.shifter().halts, 2);
    }

    static EXAMPLE_PROTOCOLS: [crate::protocol::ProtocolDescriptor; 1] =
        [crate::protocol::ProtocolDescriptor {
            zero: crate::protocol::Symbol::new(4, 0b0011_0000),
            one: crate::protocol::Symbol::new(4, 0b1100_0000),
            preamble_offset: 0,
            preamble_len: 2,
            tick_period: 100,
        }];
    static EXAMPLE_PREAMBLES: [u8; 2] = [0xaa, 0x55];
    static EXAMPLE_CATALOG: crate::protocol::Catalog =
        crate::protocol::Catalog::new(&EXAMPLE_PROTOCOLS, &EXAMPLE_PREAMBLES);

    #[test]
    fn test_pin_waveform() {
        let mut expected = vec![PinTransaction::set(PinState::Low)];
        for byte in [0xaa, 0x55, 0xc3, 0xc0] {
            for i in 0..8 {
                expected.push(PinTransaction::set(if byte & (0x80 >> i) != 0 {
                    PinState::High
                } else {
                    PinState::Low
                }));
            }
        }
        // First bit of the trailing zero byte, then the pin is idled by halt()
        expected.push(PinTransaction::set(PinState::Low));
        expected.push(PinTransaction::set(PinState::Low));
        let pin = PinMock::new(&expected);

        let encoder = Encoder::with_catalog(&EXAMPLE_CATALOG);
        let mut driver = RfDriver::with_encoder(encoder, SoftShifter::new(pin));
        assert_eq!(driver.start(0, Message::new(&[0b1010_0000], 3)).unwrap(), 100);
        assert_eq!(driver.shifter().tick_period(), 100);

        let mut ticks = 0;
        while driver.is_transmitting() {
            for _ in 0..4 {
                driver.periodic().unwrap();
            }
            if !driver.is_transmitting() {
                break;
            }
            driver.shifter_mut().tick().unwrap();
            ticks += 1;
        }
        assert_eq!(ticks, 33);
        assert_eq!(driver.tx_good, 1);
        driver.release().release().done();
    }
}
