mod gpio;

use crate::{GpioError, GpioResult};
pub use gpio::*;
use std::fmt::Debug;

/// Clear display command.
pub const CLEAR_DISPLAY: u8 = 0b00000001;
/// Return home command.
pub const RETURN_HOME: u8 = 0b00000010;
/// First command of the bootstrap: switches an 8-bit powered-up controller into 4-bit mode.
pub const ENTER_4BIT_MODE: u8 = 0b00000010;

/// Wait after power-on before the first command, in ms.
pub const POWER_ON_SETTLE_MS: u32 = 20;
/// Wait after each bootstrap command, in ms.
pub const COMMAND_SETTLE_MS: u32 = 1;
/// Wait after clear display and return home, in ms.
pub const HOME_SETTLE_MS: u32 = 2;
/// Wait on each edge of the enable pulse, in ms.
pub const ENABLE_PULSE_MS: u32 = 1;

/// Column index from which [print_string](super::display::CharacterDisplay::print_string)
/// continues on the second row.
///
/// This is 20 even on 16-column modules; override it through [DisplayLayout::wrap_column].
pub const WRAP_COLUMN: u8 = 20;

/// DDRAM addressing of the display.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DisplayLayout {
    /// Set-DDRAM-address command of the first column of each row.
    pub row_addresses: [u8; 4],
    /// Number of addressable columns per row.
    pub columns: u8,
    /// Column index at which string output continues on row 1.
    pub wrap_column: u8,
}

impl DisplayLayout {
    pub const DEFAULT: DisplayLayout = DisplayLayout {
        row_addresses: [0x80, 0xC0, 0x94, 0xD4],
        columns: 20,
        wrap_column: WRAP_COLUMN,
    };

    /// Gets the cursor command for the position, if the position is on the display.
    ///
    /// The column is OR-ed into the row base rather than added to it.
    pub fn cursor_command(&self, row: usize, col: usize) -> Option<u8> {
        let base = *self.row_addresses.get(row)?;
        if col >= self.columns as usize {
            return None;
        }
        Some(base | col as u8)
    }

    pub fn with_wrap_column(mut self, wrap_column: u8) -> Self {
        self.wrap_column = wrap_column;
        self
    }
}

impl Default for DisplayLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

pub trait HD44780Driver: Debug {
    /// Configures the bus and runs the bootstrap sequence. Has to be called once, before
    /// anything else.
    fn init(&mut self) -> GpioResult<()>;

    /// Gets the addressing used for cursor positioning.
    fn layout(&self) -> &DisplayLayout;

    /// Blocks for the given number of milliseconds, using the driver's delay.
    fn wait_ms(&mut self, ms: u32);

    /// Clears the display and sets the cursor to the home position.
    fn clear_display(&mut self) -> GpioResult<()> {
        self.send_command(CLEAR_DISPLAY)?;
        self.wait_ms(HOME_SETTLE_MS);
        Ok(())
    }

    /// Sets the cursor to the home position.
    fn return_home(&mut self) -> GpioResult<()> {
        self.send_command(RETURN_HOME)?;
        self.wait_ms(HOME_SETTLE_MS);
        Ok(())
    }

    /// Sets the display to the specified entry mode.
    fn set_entry_mode(&mut self, cursor_direction: CursorDirection, shift: bool) -> GpioResult<()> {
        let mut command = 0b00000100;
        if cursor_direction == CursorDirection::Right {
            command |= 0b00000010;
        }
        if shift {
            command |= 0b00000001;
        }
        self.send_command(command)
    }

    /// Sets the display on/off, cursor on/off, and blinking on/off.
    fn set_display_control(
        &mut self,
        display_on: bool,
        cursor_on: bool,
        blink_on: bool,
    ) -> GpioResult<()> {
        let mut command = 0b00001000;
        if display_on {
            command |= 0b00000100;
        }
        if cursor_on {
            command |= 0b00000010;
        }
        if blink_on {
            command |= 0b00000001;
        }
        self.send_command(command)
    }

    /// Moves the cursor or shifts the display.
    fn cursor_shift(&mut self, display_shift: bool, direction: CursorDirection) -> GpioResult<()> {
        let mut command = 0b00010000;
        if display_shift {
            command |= 0b00001000;
        }
        if direction == CursorDirection::Right {
            command |= 0b00000100;
        }
        self.send_command(command)
    }

    /// Sets the function set.
    ///
    /// `data_length` selects the 8-bit bus, `two_lines` the 2-line mode and `font` the 5x10 font.
    fn function_set(&mut self, data_length: bool, two_lines: bool, font: bool) -> GpioResult<()> {
        let mut command = 0b00100000;
        if data_length {
            command |= 0b00010000;
        }
        if two_lines {
            command |= 0b00001000;
        }
        if font {
            command |= 0b00000100;
        }
        self.send_command(command)
    }

    /// Sets the CGRAM address.
    fn set_cgram_address(&mut self, address: u8) -> GpioResult<()> {
        if address > 0b00111111 {
            return Err(GpioError::InvalidArgument);
        }
        let command = 0b01000000 | address;
        self.send_command(command)
    }

    /// Sets the DDRAM address.
    fn set_ddram_address(&mut self, address: u8) -> GpioResult<()> {
        if address > 0b01111111 {
            return Err(GpioError::InvalidArgument);
        }
        let command = 0b10000000 | address;
        self.send_command(command)
    }

    // Low-level commands, implemented by the driver implementation.

    /// Sends a command to the HD44780 controller.
    /// Sets the RS pin to 0 (command).
    fn send_command(&mut self, command: u8) -> GpioResult<()>;

    /// Sends data to the HD44780 controller.
    /// Sets the RS pin to 1 (data).
    fn send_data(&mut self, data: u8) -> GpioResult<()>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing/reading data.
    Left,
    /// Moves the cursor to the right after writing/reading data.
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_command() {
        let layout = DisplayLayout::DEFAULT;

        assert_eq!(layout.cursor_command(0, 0), Some(0x80));
        assert_eq!(layout.cursor_command(1, 4), Some(0xC4));
        assert_eq!(layout.cursor_command(2, 5), Some(0x95));
        assert_eq!(layout.cursor_command(3, 19), Some(0xD7));
    }

    #[test]
    fn test_cursor_command_out_of_range() {
        let layout = DisplayLayout::DEFAULT;

        assert_eq!(layout.cursor_command(4, 0), None);
        assert_eq!(layout.cursor_command(0, 20), None);
        assert_eq!(layout.cursor_command(usize::MAX, usize::MAX), None);
    }

    #[test]
    fn test_wrap_column_override() {
        let layout = DisplayLayout::default().with_wrap_column(16);
        assert_eq!(layout.wrap_column, 16);
        assert_eq!(layout.columns, 20);
        assert_eq!(DisplayLayout::default().wrap_column, WRAP_COLUMN);
    }
}
