use crate::driver::{RfDriver, RfError};
use crate::shifter::SoftShifter;
use crate::timer::tick_period_ns;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

/// Encoder steps run between two bits on the pin.
///
/// The slowest protocols need 12 steps per output byte; the shifter gives 8
/// tick periods per byte.
pub const STEPS_PER_TICK: u8 = 4;

/// Clocks out the current transmission with a blocking delay loop.
///
/// This is a simple timing loop for use in environments where interrupts are
/// unavailable or undesired. Each iteration runs [`STEPS_PER_TICK`] encoder
/// steps, shifts one bit onto the pin, and sleeps for one tick period.
///
/// Returns as soon as the driver reports the transmission finished. Returns
/// immediately if nothing was started.
///
/// # Arguments
/// - `driver`: A driver on which `start()` has been called.
/// - `delay`: A delay provider implementing `DelayNs`, typically from the HAL.
///
/// # Example
/// ```rust
/// # use embedded_hal_mock::eh1::delay::NoopDelay;
/// # use embedded_hal_mock::eh1::digital::{Mock as Pin, State as PinState, Transaction as PinTransaction};
/// use rfhid::driver::RfDriver;
/// use rfhid::message::Message;
/// use rfhid::shifter::SoftShifter;
/// use rfhid::timer::run_transmit_blocking;
///
/// # let pin = Pin::new(&[]);
/// let mut driver = RfDriver::new(SoftShifter::new(pin));
/// # let mut delay = NoopDelay::new();
/// run_transmit_blocking(&mut driver, &mut delay).unwrap(); // nothing started, returns at once
/// # driver.release().release().done();
/// ```
///
/// # Notes
/// - Software timing drifts with interrupt latency; prefer a hardware timer
///   for receivers with tight tolerances.
pub fn run_transmit_blocking<D, P>(
    driver: &mut RfDriver<SoftShifter<P>>,
    delay: &mut D,
) -> Result<(), RfError<P::Error>>
where
    D: DelayNs,
    P: OutputPin,
{
    let period_ns = tick_period_ns(driver.shifter().tick_period());
    while driver.poll_done().is_err() {
        for _ in 0..STEPS_PER_TICK {
            driver.periodic()?;
        }
        if driver.poll_done().is_ok() {
            break;
        }
        driver.shifter_mut().tick().map_err(RfError::Shift)?;
        delay.delay_ns(period_ns);
    }
    Ok(())
}
