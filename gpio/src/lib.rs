//! Register-level drivers for a matrix keypad and an HD44780 character display.
//!
//! Both peripherals are driven through [Register] handles: 8-bit direction, output, input and
//! pull-configuration registers addressed one bit per pin. See [keypad] for the scanner and
//! [lcd::hd44780] for the display.

pub mod delay;
pub mod keypad;
pub mod lcd;
pub mod register;

#[cfg(test)]
pub(crate) mod mock;

use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("register already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

/// Number of pins addressable through a single register.
pub const PINS_PER_REGISTER: u8 = 8;

/// A handle to an 8-bit hardware register, one bit per pin.
///
/// A component owns the handles it was constructed with for its whole lifetime. To let two roles
/// share one physical register (for example display data and control lines on the same port),
/// lend it by reference: `&R` is a [Register] too.
pub trait Register: Debug {
    /// Reads the whole register.
    fn read(&self) -> GpioResult<u8>;

    /// Writes the whole register.
    fn write(&self, value: u8) -> GpioResult<()>;

    /// Reads the state of a single pin.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if `pin` is outside the register.
    fn read_bit(&self, pin: u8) -> GpioResult<bool> {
        let mask = pin_mask(pin)?;
        Ok(self.read()? & mask != 0)
    }

    /// Sets a single pin high, leaving the others untouched.
    fn set_bit(&self, pin: u8) -> GpioResult<()> {
        let mask = pin_mask(pin)?;
        let value = self.read()?;
        self.write(value | mask)
    }

    /// Sets a single pin low, leaving the others untouched.
    fn clear_bit(&self, pin: u8) -> GpioResult<()> {
        let mask = pin_mask(pin)?;
        let value = self.read()?;
        self.write(value & !mask)
    }

    /// Sets a single pin to the given level.
    fn write_bit(&self, pin: u8, high: bool) -> GpioResult<()> {
        if high {
            self.set_bit(pin)
        } else {
            self.clear_bit(pin)
        }
    }
}

impl<T: Register + ?Sized> Register for &T {
    fn read(&self) -> GpioResult<u8> {
        (**self).read()
    }

    fn write(&self, value: u8) -> GpioResult<()> {
        (**self).write(value)
    }
}

/// Gets the single-bit mask of a pin.
///
/// # Errors
/// - `GpioError::InvalidArgument` if `pin` is not below [PINS_PER_REGISTER].
pub fn pin_mask(pin: u8) -> GpioResult<u8> {
    if pin >= PINS_PER_REGISTER {
        return Err(GpioError::InvalidArgument);
    }
    Ok(1 << pin)
}

/// Checks that every pin fits in a register and none is listed twice.
pub(crate) fn validate_pins(pins: &[u8]) -> GpioResult<()> {
    let mut seen = 0u8;
    for &pin in pins {
        let mask = pin_mask(pin)?;
        if seen & mask != 0 {
            return Err(GpioError::InvalidArgument);
        }
        seen |= mask;
    }
    Ok(())
}

/// A source of fixed, blocking waits.
pub trait Delay {
    /// Blocks for the given number of microseconds.
    fn delay_us(&mut self, us: u32);

    /// Blocks for the given number of milliseconds.
    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(1000);
        }
    }
}

impl<T: Delay + ?Sized> Delay for &mut T {
    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{EventLog, MockRegister};

    #[test]
    fn test_bit_helpers() {
        let log = EventLog::new();
        let reg = MockRegister::new("port", log.clone(), 0b1000_0000);

        reg.set_bit(0).unwrap();
        reg.set_bit(3).unwrap();
        assert_eq!(reg.value(), 0b1000_1001);

        reg.clear_bit(7).unwrap();
        assert_eq!(reg.value(), 0b0000_1001);

        reg.write_bit(3, false).unwrap();
        reg.write_bit(1, true).unwrap();
        assert_eq!(reg.value(), 0b0000_0011);

        assert!(reg.read_bit(1).unwrap());
        assert!(!reg.read_bit(2).unwrap());
    }

    #[test]
    fn test_pin_out_of_range() {
        let log = EventLog::new();
        let reg = MockRegister::new("port", log, 0);

        assert_eq!(reg.set_bit(8), Err(GpioError::InvalidArgument));
        assert_eq!(reg.read_bit(200), Err(GpioError::InvalidArgument));
        assert_eq!(reg.value(), 0);
    }

    #[test]
    fn test_borrowed_register() {
        let log = EventLog::new();
        let reg = MockRegister::new("port", log, 0);

        let a = &reg;
        let b = &reg;
        a.set_bit(2).unwrap();
        b.set_bit(5).unwrap();
        assert_eq!(reg.value(), 0b0010_0100);
    }

    #[test]
    fn test_validate_pins() {
        assert_eq!(validate_pins(&[0, 1, 2, 7]), Ok(()));
        assert_eq!(validate_pins(&[0, 1, 1]), Err(GpioError::InvalidArgument));
        assert_eq!(validate_pins(&[0, 8]), Err(GpioError::InvalidArgument));
    }

    #[derive(Default)]
    struct MicrosecondDelay {
        calls: Vec<u32>,
    }

    impl Delay for MicrosecondDelay {
        fn delay_us(&mut self, us: u32) {
            self.calls.push(us);
        }
    }

    fn wait_through<D: Delay>(mut delay: D, ms: u32) {
        delay.delay_ms(ms);
        delay.delay_us(7);
    }

    #[test]
    fn test_delay_ms_in_microseconds() {
        let mut delay = MicrosecondDelay::default();

        delay.delay_ms(3);
        assert_eq!(delay.calls, vec![1000, 1000, 1000]);

        delay.calls.clear();
        delay.delay_ms(0);
        assert!(delay.calls.is_empty());
    }

    #[test]
    fn test_borrowed_delay() {
        let mut delay = MicrosecondDelay::default();

        wait_through(&mut delay, 2);
        assert_eq!(delay.calls, vec![1000, 1000, 7]);
    }
}
