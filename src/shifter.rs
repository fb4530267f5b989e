//! Serial shift hardware abstraction.
//!
//! The encoder produces whole bytes; something has to clock them out bit by
//! bit at the protocol's tick period. On the reference dongle this is a USI
//! peripheral in three-wire mode clocked by a timer compare match: it has a
//! data register that shifts one bit per tick, a buffer register that is
//! copied into the data register every eighth tick, and an overflow flag that
//! announces the buffer may be refilled.
//!
//! [`ShiftRegister`] captures that behavior. [`SoftShifter`] implements it in
//! software on top of any `embedded-hal` [`OutputPin`], for targets without a
//! suitable peripheral.

use embedded_hal::digital::{OutputPin, PinState};

/// A double-buffered, MSB-first serial shift peripheral.
pub trait ShiftRegister {
    /// Error raised by the underlying hardware.
    type Error;

    /// Programs the bit clock with `tick_period` and starts shifting.
    ///
    /// After `begin` the peripheral must report [`is_drained()`](ShiftRegister::is_drained)
    /// so the first byte can be loaded.
    fn begin(&mut self, tick_period: u8) -> Result<(), Self::Error>;

    /// Whether the buffer register has been consumed and needs a new byte.
    fn is_drained(&self) -> bool;

    /// Loads the next byte into the buffer register and clears the drained flag.
    fn load(&mut self, byte: u8);

    /// Stops the bit clock and idles the output.
    fn halt(&mut self) -> Result<(), Self::Error>;

    /// Whether the bit clock is running.
    fn is_running(&self) -> bool;
}

/// A bit-banged [`ShiftRegister`] driving an [`OutputPin`].
///
/// [`tick()`](SoftShifter::tick) must be called once per tick period, usually
/// from a timer interrupt programmed with [`tick_period()`](SoftShifter::tick_period).
///
/// # Example
///
/// ```rust
/// # use embedded_hal_mock::eh1::digital::{Mock as Pin, State as PinState, Transaction as PinTransaction};
/// use rfhid::shifter::{ShiftRegister, SoftShifter};
///
/// # let pin = Pin::new(&[PinTransaction::set(PinState::Low), PinTransaction::set(PinState::High)]);
/// let mut shifter = SoftShifter::new(pin);
/// shifter.begin(126).unwrap();
/// shifter.load(0x80);
/// shifter.tick().unwrap(); // first bit of 0x80 is on the pin
/// # shifter.release().done();
/// ```
#[derive(Debug)]
pub struct SoftShifter<P>
where
    P: OutputPin,
{
    pin: P,
    /// Byte being shifted out, next bit in the MSB.
    data: u8,
    /// Byte waiting to be shifted out.
    buffer: u8,
    /// Bits of `data` not yet on the pin.
    remaining: u8,
    drained: bool,
    running: bool,
    tick_period: u8,
}

impl<P> SoftShifter<P>
where
    P: OutputPin,
{
    /// Creates a stopped shifter on `pin`.
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            data: 0,
            buffer: 0,
            remaining: 0,
            drained: false,
            running: false,
            tick_period: 0,
        }
    }

    /// Shifts one bit onto the pin.
    ///
    /// Every eighth call moves the buffered byte into the data register and
    /// marks the buffer drained. If the buffer was not refilled in time, the
    /// previous byte is sent again (an underrun).
    pub fn tick(&mut self) -> Result<(), P::Error> {
        if !self.running {
            return Ok(());
        }
        if self.remaining == 0 {
            if self.drained {
                warn!("rf shift underrun");
            }
            self.data = self.buffer;
            self.remaining = 8;
            self.drained = true;
        }
        self.pin.set_state(PinState::from(self.data & 0x80 != 0))?;
        self.data <<= 1;
        self.remaining -= 1;
        Ok(())
    }

    /// Timer compare value programmed by the last [`begin()`](ShiftRegister::begin).
    pub fn tick_period(&self) -> u8 {
        self.tick_period
    }

    /// Consumes the shifter and returns the pin.
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P> ShiftRegister for SoftShifter<P>
where
    P: OutputPin,
{
    type Error = P::Error;

    fn begin(&mut self, tick_period: u8) -> Result<(), Self::Error> {
        self.pin.set_low()?;
        self.data = 0;
        self.buffer = 0;
        self.remaining = 0;
        self.drained = true;
        self.running = true;
        self.tick_period = tick_period;
        Ok(())
    }

    fn is_drained(&self) -> bool {
        self.running && self.drained
    }

    fn load(&mut self, byte: u8) {
        self.buffer = byte;
        self.drained = false;
    }

    fn halt(&mut self) -> Result<(), Self::Error> {
        self.running = false;
        self.pin.set_low()
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    fn bit_transactions(byte: u8) -> Vec<PinTransaction> {
        (0..8)
            .map(|i| {
                PinTransaction::set(if byte & (0x80 >> i) != 0 {
                    PinState::High
                } else {
                    PinState::Low
                })
            })
            .collect()
    }

    #[test]
    fn test_stopped_shifter_does_nothing() {
        let pin = PinMock::new(&[]);
        let mut shifter = SoftShifter::new(pin);
        assert!(!shifter.is_running());
        assert!(!shifter.is_drained());
        shifter.tick().unwrap();
        shifter.release().done();
    }

    #[test]
    fn test_shifts_msb_first_with_buffering() {
        let mut expected = vec![PinTransaction::set(PinState::Low)];
        expected.extend(bit_transactions(0xa5));
        expected.extend(bit_transactions(0x3c));
        let pin = PinMock::new(&expected);

        let mut shifter = SoftShifter::new(pin);
        shifter.begin(54).unwrap();
        assert_eq!(shifter.tick_period(), 54);
        assert!(shifter.is_drained());

        shifter.load(0xa5);
        assert!(!shifter.is_drained());
        shifter.tick().unwrap();
        // 0xa5 moved into the data register, buffer free again
        assert!(shifter.is_drained());
        shifter.load(0x3c);
        for _ in 0..7 {
            shifter.tick().unwrap();
            assert!(!shifter.is_drained());
        }
        for _ in 0..8 {
            shifter.tick().unwrap();
        }
        assert!(shifter.is_drained());
        shifter.release().done();
    }

    #[test]
    fn test_underrun_repeats_last_byte() {
        let mut expected = vec![PinTransaction::set(PinState::Low)];
        expected.extend(bit_transactions(0xf0));
        expected.extend(bit_transactions(0xf0));
        let pin = PinMock::new(&expected);

        let mut shifter = SoftShifter::new(pin);
        shifter.begin(54).unwrap();
        shifter.load(0xf0);
        for _ in 0..16 {
            shifter.tick().unwrap();
        }
        shifter.release().done();
    }

    #[test]
    fn test_halt_idles_pin() {
        let pin = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::Low),
        ]);
        let mut shifter = SoftShifter::new(pin);
        shifter.begin(129).unwrap();
        assert!(shifter.is_running());
        shifter.halt().unwrap();
        assert!(!shifter.is_running());
        assert!(!shifter.is_drained());
        shifter.tick().unwrap();
        shifter.release().done();
    }
}
