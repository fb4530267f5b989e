use crate::driver::{RfDriver, RfError};
use crate::shifter::{ShiftRegister, SoftShifter};
use core::cell::RefCell;
use critical_section::Mutex;
use embedded_hal::digital::OutputPin;

/// A driver shared between the main loop and the shift clock interrupt.
pub type GlobalRfDriver<S> = Mutex<RefCell<Option<RfDriver<S>>>>;

/// Used to initialize the global static `RfDriver` for use with
/// `critical_section`.
///
/// # Returns
/// * An empty mutable ref-cell
///
/// # Example
/// ```rust
/// use rfhid::shifter::SoftShifter;
/// use rfhid::timer::{global_rf_driver_init, GlobalRfDriver};
/// # type PB1 = embedded_hal_mock::eh1::digital::Mock;
///
/// static RF_DRIVER: GlobalRfDriver<SoftShifter<PB1>> = global_rf_driver_init();
/// ```
pub const fn global_rf_driver_init<S: ShiftRegister>() -> GlobalRfDriver<S> {
    Mutex::new(RefCell::new(None))
}

/// Installs a fresh driver around `shifter` in the global slot.
///
/// Any previous driver is dropped.
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     global_rf_driver_setup(&RF_DRIVER, SoftShifter::new(data_pin));
/// }
/// ```
pub fn global_rf_driver_setup<S: ShiftRegister>(
    global_driver: &'static GlobalRfDriver<S>,
    shifter: S,
) {
    critical_section::with(|cs| {
        let _ = global_driver
            .borrow(cs)
            .replace(Some(RfDriver::new(shifter)));
    });
}

/// Runs one [`RfDriver::periodic`] step on the global driver.
///
/// Does nothing until [`global_rf_driver_setup`] has been called.
///
/// # Errors
/// Whatever [`RfDriver::periodic`] reports.
pub fn global_rf_periodic<S: ShiftRegister>(
    global_driver: &'static GlobalRfDriver<S>,
) -> Result<(), RfError<S::Error>> {
    critical_section::with(|cs| match global_driver.borrow(cs).borrow_mut().as_mut() {
        Some(driver) => driver.periodic(),
        None => Ok(()),
    })
}

/// Shifts one bit out of the global driver's [`SoftShifter`].
///
/// Call from the timer compare interrupt programmed with the protocol's tick
/// period.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIMER1_COMPA() {
///     let _ = global_soft_shifter_tick(&RF_DRIVER);
/// }
/// ```
///
/// # Errors
/// The pin's error, if setting it failed.
pub fn global_soft_shifter_tick<P: OutputPin>(
    global_driver: &'static GlobalRfDriver<SoftShifter<P>>,
) -> Result<(), P::Error> {
    critical_section::with(|cs| match global_driver.borrow(cs).borrow_mut().as_mut() {
        Some(driver) => driver.shifter_mut().tick(),
        None => Ok(()),
    })
}
