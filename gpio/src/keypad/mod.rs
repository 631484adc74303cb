mod gpio;

use crate::{GpioResult, validate_pins};
use std::fmt::Debug;
pub use gpio::*;

/// Number of row lines of the keypad matrix.
pub const KEYPAD_ROWS: usize = 4;
/// Number of column lines of the keypad matrix.
pub const KEYPAD_COLUMNS: usize = 6;

/// The `Keypad` trait defines the interface for keypad input devices.
pub trait Keypad: Debug {
    type Key;

    /// Scans the whole matrix once and returns the first closed key, if any.
    fn scan(&self) -> GpioResult<Option<Self::Key>>;

    /// Scans the matrix and stores the detected key in `key`.
    ///
    /// When nothing is pressed `key` is left as it was, so the caller has to reset it between
    /// reads if it wants to tell a new press from a stale one. Returns whether `key` was written.
    fn read(&self, key: &mut Self::Key) -> GpioResult<bool> {
        match self.scan()? {
            Some(found) => {
                *key = found;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// How a column line is checked for a closed contact.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum PressDetection {
    /// Reads the column once and reports what it sees.
    #[default]
    Sample,
    /// Keeps re-reading the column while it reads closed and reports a press only once the key
    /// has been released. A held key blocks the scan until it is let go.
    WaitForRelease,
}

/// Pin assignment and legend of a 4x6 keypad.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeypadConfig<K> {
    row_pins: [u8; KEYPAD_ROWS],
    column_pins: [u8; KEYPAD_COLUMNS],
    key_map: [[K; KEYPAD_COLUMNS]; KEYPAD_ROWS],
}

impl<K> KeypadConfig<K> {
    /// Creates a keypad configuration.
    ///
    /// `key_map[r][c]` is reported when row `r` is driven and column `c` reads closed.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if a pin does not fit in a register, or a row or column pin
    ///   is listed twice.
    pub fn new(
        row_pins: [u8; KEYPAD_ROWS],
        column_pins: [u8; KEYPAD_COLUMNS],
        key_map: [[K; KEYPAD_COLUMNS]; KEYPAD_ROWS],
    ) -> GpioResult<Self> {
        validate_pins(&row_pins)?;
        validate_pins(&column_pins)?;
        Ok(KeypadConfig { row_pins, column_pins, key_map })
    }

    pub fn row_pins(&self) -> &[u8; KEYPAD_ROWS] {
        &self.row_pins
    }

    pub fn column_pins(&self) -> &[u8; KEYPAD_COLUMNS] {
        &self.column_pins
    }

    /// Gets the symbol at the given matrix position.
    pub fn key_at(&self, row: usize, column: usize) -> Option<&K> {
        self.key_map.get(row)?.get(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GpioError;

    const MAP: [[char; KEYPAD_COLUMNS]; KEYPAD_ROWS] = [
        ['C', '7', '8', '9', 'X', '/'],
        ['S', '4', '5', '6', '-', 'M'],
        ['%', '1', '2', '3', '+', 'N'],
        ['R', '0', '.', '=', '+', 'P'],
    ];

    #[test]
    fn test_config_accepts_valid_pins() {
        let config = KeypadConfig::new([0, 1, 2, 3], [0, 1, 2, 3, 4, 5], MAP).unwrap();
        assert_eq!(config.key_at(0, 0), Some(&'C'));
        assert_eq!(config.key_at(3, 5), Some(&'P'));
        assert_eq!(config.key_at(4, 0), None);
        assert_eq!(config.key_at(0, 6), None);
    }

    #[test]
    fn test_config_rejects_duplicate_pins() {
        assert_eq!(
            KeypadConfig::new([0, 1, 1, 3], [0, 1, 2, 3, 4, 5], MAP),
            Err(GpioError::InvalidArgument)
        );
        assert_eq!(
            KeypadConfig::new([0, 1, 2, 3], [0, 1, 2, 3, 4, 0], MAP),
            Err(GpioError::InvalidArgument)
        );
    }

    #[test]
    fn test_config_rejects_out_of_range_pins() {
        assert_eq!(
            KeypadConfig::new([0, 1, 2, 8], [0, 1, 2, 3, 4, 5], MAP),
            Err(GpioError::InvalidArgument)
        );
        assert_eq!(
            KeypadConfig::new([0, 1, 2, 3], [0, 1, 2, 3, 4, 9], MAP),
            Err(GpioError::InvalidArgument)
        );
    }

    #[test]
    fn test_rows_and_columns_may_share_indices() {
        // Rows and columns live on different ports.
        assert!(KeypadConfig::new([0, 1, 2, 3], [3, 2, 1, 0, 4, 5], MAP).is_ok());
    }
}
