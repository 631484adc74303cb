//! HD44780 LCD module.
//!
//! [driver] holds the controller instruction set ([driver::HD44780Driver]) and its implementation
//! over GPIO registers in 4-bit mode ([driver::GpioHD44780Driver]). [display] builds cursor
//! addressing, string and number output on top of any driver.

pub mod display;
pub mod driver;
