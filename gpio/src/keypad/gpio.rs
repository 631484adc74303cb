use crate::keypad::{KEYPAD_COLUMNS, KEYPAD_ROWS, Keypad, KeypadConfig, PressDetection};
use crate::{GpioResult, Register};
use log::{debug, trace};
use std::fmt::{Debug, Formatter};

/// The registers a [GpioKeypad] drives.
///
/// Rows are outputs on one port, columns are pulled-up inputs on another. On ports where the
/// output register also enables the pull-up (as on AVR), pass the column port's output register
/// as `column_pull`.
#[derive(Debug)]
pub struct KeypadRegisters<R> {
    pub column_direction: R,
    pub column_input: R,
    pub column_pull: R,
    pub row_direction: R,
    pub row_output: R,
}

/// A 4x6 matrix keypad scanned through GPIO registers.
///
/// Rows are active-low: a row is selected by driving it low while the others stay high, and a
/// closed contact pulls its column low against the pull-up.
pub struct GpioKeypad<R: Register, K> {
    registers: KeypadRegisters<R>,
    config: KeypadConfig<K>,
    detection: PressDetection,
}

impl<R: Register, K> Debug for GpioKeypad<R, K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GpioKeypad(rows {:?} @ {:?}, cols {:?} @ {:?}, {:?})",
            self.config.row_pins(),
            self.registers.row_output,
            self.config.column_pins(),
            self.registers.column_input,
            self.detection,
        )
    }
}

impl<R: Register, K: Copy> GpioKeypad<R, K> {
    /// Takes ownership of the registers and configures the pins.
    ///
    /// Every column becomes an input with its pull-up enabled, every row an output driven high.
    pub fn new(registers: KeypadRegisters<R>, config: KeypadConfig<K>) -> GpioResult<Self> {
        for &pin in config.column_pins() {
            registers.column_direction.clear_bit(pin)?;
            registers.column_pull.set_bit(pin)?;
        }

        for &pin in config.row_pins() {
            registers.row_direction.set_bit(pin)?;
            registers.row_output.set_bit(pin)?;
        }

        debug!("Keypad configured: rows {:?}, cols {:?}", config.row_pins(), config.column_pins());

        Ok(GpioKeypad {
            registers,
            config,
            detection: PressDetection::default(),
        })
    }

    pub fn with_press_detection(mut self, detection: PressDetection) -> Self {
        self.detection = detection;
        self
    }

    /// Drives every row line inactive (high).
    pub fn release_rows(&self) -> GpioResult<()> {
        for &pin in self.config.row_pins() {
            self.registers.row_output.set_bit(pin)?;
        }
        Ok(())
    }

    /// Deactivates all rows, then activates only the given one.
    fn select_row(&self, row: usize) -> GpioResult<()> {
        self.release_rows()?;
        self.registers.row_output.clear_bit(self.config.row_pins()[row])
    }

    /// Checks whether the column reads closed on the currently selected row.
    fn is_pressed(&self, column: usize) -> GpioResult<bool> {
        let pin = self.config.column_pins()[column];

        match self.detection {
            PressDetection::Sample => Ok(!self.registers.column_input.read_bit(pin)?),
            PressDetection::WaitForRelease => {
                let mut pressed = false;
                while !self.registers.column_input.read_bit(pin)? {
                    pressed = true;
                    std::hint::spin_loop();
                }
                Ok(pressed)
            }
        }
    }
}

impl<R: Register, K: Copy + Debug> Keypad for GpioKeypad<R, K> {
    type Key = K;

    fn scan(&self) -> GpioResult<Option<K>> {
        for row in 0..KEYPAD_ROWS {
            self.select_row(row)?;

            for column in 0..KEYPAD_COLUMNS {
                if self.is_pressed(column)? {
                    let key = self.config.key_at(row, column).copied();
                    trace!("Closed contact at ({}, {})", row, column);
                    debug!("Key pressed: {:?}", key);
                    return Ok(key);
                }
            }
        }

        Ok(None)
    }
}
