//! The control loop: reads the keypad and echoes keys to the display.

use log::debug;
use padlcd_gpio::GpioResult;
use padlcd_gpio::keypad::{Keypad, PressDetection};
use padlcd_gpio::lcd::hd44780::display::CharacterDisplay;
use padlcd_gpio::lcd::hd44780::driver::HD44780Driver;

/// Value of the key slot when no key has been reported.
const NO_KEY: char = '\0';

/// Title line of the start screen.
const TITLE: &str = "calculator; OP[ , ]";

/// The main app state struct.
pub struct App<'a> {
    keypad: &'a dyn Keypad<Key = char>,
    lcd: &'a mut dyn HD44780Driver,
    /// With sampled detection a held key is seen on every poll; it is echoed once per press.
    echo_once: bool,
    held: Option<char>,
}

impl<'a> App<'a> {
    pub fn new(
        keypad: &'a dyn Keypad<Key = char>,
        lcd: &'a mut dyn HD44780Driver,
        detection: PressDetection,
    ) -> App<'a> {
        App {
            keypad,
            lcd,
            echo_once: detection == PressDetection::Sample,
            held: None,
        }
    }

    /// Draws the title and the operator markers, then parks the cursor on the second row.
    pub fn draw_start_screen(&mut self) -> GpioResult<()> {
        self.lcd.return_home()?;
        self.lcd.print_string_to(TITLE, 0, 0)?;
        self.lcd.print_character_to(b'*', 0, 15)?;
        self.lcd.print_character_to(b'+', 0, 17)?;
        self.lcd.move_cursor_to(1, 0)
    }

    /// Polls the keypad once and prints a newly pressed key.
    pub fn update(&mut self) -> GpioResult<()> {
        let mut key = NO_KEY;
        self.keypad.read(&mut key)?;

        if key == NO_KEY {
            self.held = None;
            return Ok(());
        }

        if self.echo_once && self.held == Some(key) {
            return Ok(());
        }
        self.held = Some(key);

        debug!("Echoing key {:?}", key);
        let mut buffer = [0u8; 4];
        self.lcd.print_ascii(key.encode_utf8(&mut buffer))
    }
}
