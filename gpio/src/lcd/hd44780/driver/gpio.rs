use crate::lcd::hd44780::driver::{
    COMMAND_SETTLE_MS, CLEAR_DISPLAY, CursorDirection, DisplayLayout, ENABLE_PULSE_MS, ENTER_4BIT_MODE,
    HD44780Driver, POWER_ON_SETTLE_MS,
};
use crate::{Delay, GpioResult, Register, validate_pins};
use log::{debug, trace};
use std::fmt::{Debug, Formatter};

/// The registers a [GpioHD44780Driver] drives.
///
/// Data and control lines may share a port: pass the same register by reference to both roles.
#[derive(Debug)]
pub struct DisplayRegisters<R> {
    pub data_direction: R,
    pub data_output: R,
    pub control_direction: R,
    pub control_output: R,
}

/// Pin assignment of the 4-bit bus.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DisplayPins {
    /// `data[i]` carries bit `i` of each nibble, that is D4..D7 of the display.
    pub data: [u8; 4],
    pub rs: u8,
    pub rw: u8,
    pub en: u8,
}

impl DisplayPins {
    /// Creates the pin assignment from the data pins and the control pins ordered RS, RW, EN.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if a pin does not fit in a register, or a data or control
    ///   pin is listed twice.
    pub fn new(data: [u8; 4], control: [u8; 3]) -> GpioResult<Self> {
        validate_pins(&data)?;
        validate_pins(&control)?;
        let [rs, rw, en] = control;
        Ok(DisplayPins { data, rs, rw, en })
    }

    /// Same as [Self::new], for data and control lines wired to the same port: no pin may carry
    /// both a data and a control line.
    pub fn new_shared_port(data: [u8; 4], control: [u8; 3]) -> GpioResult<Self> {
        let pins = Self::new(data, control)?;
        let [d0, d1, d2, d3] = data;
        let [rs, rw, en] = control;
        validate_pins(&[d0, d1, d2, d3, rs, rw, en])?;
        Ok(pins)
    }
}

/// HD44780 driver over GPIO registers, write-only, using the 4-bit bus.
///
/// The busy flag is never read. Every transfer pulses E twice, with [ENABLE_PULSE_MS] on each
/// edge, which is more than any regular instruction needs.
pub struct GpioHD44780Driver<R: Register, D: Delay> {
    registers: DisplayRegisters<R>,
    pins: DisplayPins,
    delay: D,
    layout: DisplayLayout,
}

impl<R: Register, D: Delay> Debug for GpioHD44780Driver<R, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GpioHD44780Driver(data {:?} @ {:?}, RS {} RW {} EN {} @ {:?})",
            self.pins.data,
            self.registers.data_output,
            self.pins.rs,
            self.pins.rw,
            self.pins.en,
            self.registers.control_output,
        )
    }
}

impl<R: Register, D: Delay> GpioHD44780Driver<R, D> {
    /// Creates a new driver. Nothing is written until [HD44780Driver::init].
    pub fn new(registers: DisplayRegisters<R>, pins: DisplayPins, delay: D) -> Self {
        GpioHD44780Driver {
            registers,
            pins,
            delay,
            layout: DisplayLayout::DEFAULT,
        }
    }

    pub fn with_layout(mut self, layout: DisplayLayout) -> Self {
        self.layout = layout;
        self
    }

    fn pulse_e(&mut self) -> GpioResult<()> {
        self.registers.control_output.set_bit(self.pins.en)?;
        self.delay.delay_ms(ENABLE_PULSE_MS);
        self.registers.control_output.clear_bit(self.pins.en)?;
        self.delay.delay_ms(ENABLE_PULSE_MS);
        Ok(())
    }

    /// Presents a nibble on the data pins, one pin write per bit.
    fn write_nibble(&mut self, nibble: u8) -> GpioResult<()> {
        for (i, &pin) in self.pins.data.iter().enumerate() {
            self.registers.data_output.write_bit(pin, nibble & (1 << i) != 0)?;
        }
        Ok(())
    }

    fn send(&mut self, data: u8, rs: bool) -> GpioResult<()> {
        trace!("Sending data: {:08b}, RS: {}", data, rs);

        self.registers.control_output.write_bit(self.pins.rs, rs)?;
        self.registers.control_output.clear_bit(self.pins.rw)?;

        let high_nibble = (data >> 4) & 0x0F;
        let low_nibble = data & 0x0F;

        trace!("Writing HN: {:04b}", high_nibble);
        self.write_nibble(high_nibble)?;
        self.pulse_e()?;

        trace!("Writing LN: {:04b}", low_nibble);
        self.write_nibble(low_nibble)?;
        self.pulse_e()?;

        Ok(())
    }
}

impl<R: Register, D: Delay> HD44780Driver for GpioHD44780Driver<R, D> {
    fn init(&mut self) -> GpioResult<()> {
        for &pin in &self.pins.data {
            self.registers.data_direction.set_bit(pin)?;
        }
        for pin in [self.pins.rs, self.pins.rw, self.pins.en] {
            self.registers.control_direction.set_bit(pin)?;
        }
        debug!("Display pins configured as outputs");

        self.delay.delay_ms(POWER_ON_SETTLE_MS);

        // 4-bit mode, 2 lines, 5x8 dots
        self.send_command(ENTER_4BIT_MODE)?;
        self.delay.delay_ms(COMMAND_SETTLE_MS);
        self.function_set(false, true, false)?;
        self.delay.delay_ms(COMMAND_SETTLE_MS);
        self.set_display_control(true, true, false)?;
        self.delay.delay_ms(COMMAND_SETTLE_MS);
        self.set_entry_mode(CursorDirection::Right, false)?;
        self.delay.delay_ms(COMMAND_SETTLE_MS);
        self.send_command(CLEAR_DISPLAY)?;
        self.delay.delay_ms(COMMAND_SETTLE_MS);

        debug!("Display initialized");
        Ok(())
    }

    fn layout(&self) -> &DisplayLayout {
        &self.layout
    }

    fn wait_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    fn send_command(&mut self, command: u8) -> GpioResult<()> {
        self.send(command, false)
    }

    fn send_data(&mut self, data: u8) -> GpioResult<()> {
        self.send(data, true)
    }
}
