//! Text output on top of an [HD44780Driver].
//!
//! The driver keeps no cursor state: every positioning call computes the address from the row
//! and column it is given. [CharacterDisplay::print_string] wraps to the second row at a fixed
//! column index ([DisplayLayout::wrap_column](super::driver::DisplayLayout::wrap_column)),
//! whatever column the string started at.

use crate::lcd::hd44780::driver::HD44780Driver;
use crate::{GpioError, GpioResult};
use log::warn;

/// Maximum number of digits [format_number] keeps after the decimal point.
pub const MAX_FRACTION_DIGITS: usize = 5;

/// Formats a number in fixed-point notation.
///
/// At most [MAX_FRACTION_DIGITS] digits are kept after the point, trailing zeros and a trailing
/// point are dropped, and negative zero prints as `0`. Non-finite values print as `NaN`, `inf`
/// and `-inf`.
pub fn format_number(number: f64) -> String {
    if !number.is_finite() {
        return number.to_string();
    }

    let mut text = format!("{:.*}", MAX_FRACTION_DIGITS, number);
    if text.contains('.') {
        let len = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(len);
    }
    if text == "-0" {
        text.remove(0);
    }
    text
}

pub trait CharacterDisplay: HD44780Driver {
    /// Prints a character code at the cursor.
    fn print_character(&mut self, code: u8) -> GpioResult<()> {
        self.send_data(code)
    }

    /// Moves the cursor, then prints a character code.
    fn print_character_to(&mut self, code: u8, row: usize, col: usize) -> GpioResult<()> {
        self.move_cursor_to(row, col)?;
        self.print_character(code)
    }

    /// Prints a string from the cursor.
    ///
    /// Characters from index `wrap_column` on are each placed explicitly on row 1, at column
    /// `index - wrap_column`. Non-ASCII characters are printed as `?`.
    fn print_string(&mut self, text: &str) -> GpioResult<()> {
        let wrap = self.layout().wrap_column as usize;
        for (i, c) in text.chars().enumerate() {
            if i >= wrap {
                self.move_cursor_to(1, i - wrap)?;
            }
            self.print_character(ascii_or_placeholder(c))?;
        }
        Ok(())
    }

    /// Moves the cursor once, then prints a string as [Self::print_string] does.
    fn print_string_to(&mut self, text: &str, row: usize, col: usize) -> GpioResult<()> {
        self.move_cursor_to(row, col)?;
        self.print_string(text)
    }

    /// Moves the cursor to the given position.
    ///
    /// Positions outside the display are ignored: nothing is sent and `Ok` is returned. Use
    /// [Self::set_cursor] to have them rejected instead.
    fn move_cursor_to(&mut self, row: usize, col: usize) -> GpioResult<()> {
        match self.layout().cursor_command(row, col) {
            Some(command) => self.send_command(command),
            None => {
                warn!("Cursor position ({}, {}) is off the display, ignored", row, col);
                Ok(())
            }
        }
    }

    /// Moves the cursor to the given position.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the position is outside the display.
    fn set_cursor(&mut self, row: usize, col: usize) -> GpioResult<()> {
        let command = self
            .layout()
            .cursor_command(row, col)
            .ok_or(GpioError::InvalidArgument)?;
        self.send_command(command)
    }

    /// Moves the cursor to the start of the second row.
    fn new_line(&mut self) -> GpioResult<()> {
        self.move_cursor_to(1, 0)
    }

    /// Clears the display, then returns the cursor home.
    fn clear(&mut self) -> GpioResult<()> {
        self.clear_display()?;
        self.return_home()
    }

    /// Prints an integer in decimal at the cursor.
    fn print_integer(&mut self, number: i64) -> GpioResult<()> {
        self.print_ascii(&number.to_string())
    }

    /// Prints a number at the cursor, formatted by [format_number].
    fn print_number(&mut self, number: f64) -> GpioResult<()> {
        self.print_ascii(&format_number(number))
    }

    /// Moves the cursor once, then prints a number as [Self::print_number] does.
    fn print_number_to(&mut self, number: f64, row: usize, col: usize) -> GpioResult<()> {
        self.move_cursor_to(row, col)?;
        self.print_number(number)
    }

    /// Prints characters one after another, without wrapping.
    fn print_ascii(&mut self, text: &str) -> GpioResult<()> {
        for c in text.chars() {
            self.print_character(ascii_or_placeholder(c))?;
        }
        Ok(())
    }
}

impl<T: ?Sized + HD44780Driver> CharacterDisplay for T {}

fn ascii_or_placeholder(c: char) -> u8 {
    if c.is_ascii() {
        c as u8
    } else {
        warn!("Non-ASCII character: {}", c);
        b'?'
    }
}
