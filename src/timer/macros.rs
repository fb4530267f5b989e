/// Declares a static global `RF_DRIVER` instance protected by a `critical_section` mutex.
///
/// This macro creates a `static` singleton `RF_DRIVER` suitable for use in
/// interrupt-based environments, where both the main loop and the shift clock
/// ISR need to safely access the shared driver state.
///
/// # Arguments
/// - `$shifter`: The concrete shift hardware type (must implement `ShiftRegister`)
///
/// # Example
/// ```rust
/// use rfhid::shifter::SoftShifter;
/// # type PB1 = embedded_hal_mock::eh1::digital::Mock;
///
/// rfhid::init_rf_driver!(SoftShifter<PB1>);
/// ```
#[macro_export]
macro_rules! init_rf_driver {
    ( $shifter:ty ) => {
        pub static RF_DRIVER: $crate::timer::GlobalRfDriver<$shifter> =
            $crate::critical_section::Mutex::new(core::cell::RefCell::new(None));
    };
}

/// Installs a new driver around `$shifter` in the global `RF_DRIVER`.
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     setup_rf_driver!(SoftShifter::new(data_pin));
/// }
/// ```
///
/// # Notes
/// - Requires `init_rf_driver!` to have been used earlier.
#[macro_export]
macro_rules! setup_rf_driver {
    ( $shifter:expr ) => {
        $crate::critical_section::with(|cs| {
            let _ = RF_DRIVER
                .borrow(cs)
                .replace(Some($crate::driver::RfDriver::new($shifter)));
        })
    };
}

/// Calls `periodic()` on the global `RF_DRIVER` if it has been set up.
///
/// Evaluates to the `Result` of the step, or `Ok(())` before setup.
///
/// # Example
/// ```rust,ignore
/// loop {
///     usb_poll();
///     rf_periodic!().ok();
/// }
/// ```
#[macro_export]
macro_rules! rf_periodic {
    () => {
        $crate::critical_section::with(|cs| match RF_DRIVER.borrow(cs).borrow_mut().as_mut() {
            Some(driver) => driver.periodic(),
            None => Ok(()),
        })
    };
}

/// Shifts one bit out of a `SoftShifter` held by the global `RF_DRIVER`.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIMER1_COMPA() {
///     soft_shift_tick!().ok();
/// }
/// ```
///
/// # Notes
/// - Silently does nothing if the driver hasn't been set up yet.
#[macro_export]
macro_rules! soft_shift_tick {
    () => {
        $crate::critical_section::with(|cs| match RF_DRIVER.borrow(cs).borrow_mut().as_mut() {
            Some(driver) => driver.shifter_mut().tick(),
            None => Ok(()),
        })
    };
}

#[cfg(test)]
mod tests {
    use crate::driver::tests::RecordingShifter;
    use crate::message::Message;

    crate::init_rf_driver!(RecordingShifter);

    #[test]
    fn test_macros_drive_global_driver() {
        rf_periodic!().unwrap();
        setup_rf_driver!(RecordingShifter::default());

        let started = critical_section::with(|cs| {
            RF_DRIVER
                .borrow(cs)
                .borrow_mut()
                .as_mut()
                .map(|driver| driver.start(3, Message::new(&[0xf0], 4)).is_ok())
        });
        assert_eq!(started, Some(true));

        while critical_section::with(|cs| {
            RF_DRIVER
                .borrow(cs)
                .borrow()
                .as_ref()
                .is_some_and(|driver| driver.is_transmitting())
        }) {
            rf_periodic!().unwrap();
        }
        let sent = critical_section::with(|cs| {
            RF_DRIVER.borrow(cs).borrow().as_ref().map(|driver| driver.tx_good)
        });
        assert_eq!(sent, Some(1));
    }
}
