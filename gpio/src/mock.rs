//! Recording peripherals for the unit tests.

use crate::lcd::hd44780::driver::{DisplayPins, DisplayRegisters, GpioHD44780Driver};
use crate::{Delay, GpioResult, Register};
use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Event {
    Write { register: &'static str, value: u8 },
    DelayUs(u32),
}

/// Shared, ordered log of everything the mocks saw.
#[derive(Clone, Debug, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn writes_to(&self, register: &str) -> Vec<u8> {
        self.0
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Write { register: r, value } if *r == register => Some(*value),
                _ => None,
            })
            .collect()
    }
}

/// A register backed by a shared cell. Clones see the same value.
///
/// When a reader is installed, reads come from it instead of the stored value, which lets a test
/// model input pins that depend on other registers.
#[derive(Clone)]
pub struct MockRegister {
    name: &'static str,
    log: EventLog,
    value: Rc<Cell<u8>>,
    reader: Option<Rc<dyn Fn() -> u8>>,
}

impl MockRegister {
    pub fn new(name: &'static str, log: EventLog, initial: u8) -> Self {
        MockRegister {
            name,
            log,
            value: Rc::new(Cell::new(initial)),
            reader: None,
        }
    }

    pub fn with_reader(name: &'static str, log: EventLog, reader: impl Fn() -> u8 + 'static) -> Self {
        MockRegister {
            reader: Some(Rc::new(reader)),
            ..Self::new(name, log, 0)
        }
    }

    pub fn value(&self) -> u8 {
        self.value.get()
    }
}

impl Debug for MockRegister {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockRegister({}={:08b})", self.name, self.value.get())
    }
}

impl Register for MockRegister {
    fn read(&self) -> GpioResult<u8> {
        Ok(match &self.reader {
            Some(reader) => reader(),
            None => self.value.get(),
        })
    }

    fn write(&self, value: u8) -> GpioResult<()> {
        self.value.set(value);
        self.log.push(Event::Write { register: self.name, value });
        Ok(())
    }
}

/// A delay that only records how long it was asked to wait.
#[derive(Debug)]
pub struct MockDelay {
    log: EventLog,
}

impl MockDelay {
    pub fn new(log: EventLog) -> Self {
        MockDelay { log }
    }
}

impl Delay for MockDelay {
    fn delay_us(&mut self, us: u32) {
        self.log.push(Event::DelayUs(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.log.push(Event::DelayUs(ms * 1000));
    }
}

/// What the display saw: a latched byte or an idle wait between transfers.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BusStep {
    Command(u8),
    Data(u8),
    DelayUs(u32),
}

/// Wiring of the display bus, used to decode the register writes.
#[derive(Copy, Clone, Debug)]
pub struct BusWiring {
    pub data_register: &'static str,
    pub data_pins: [u8; 4],
    pub control_register: &'static str,
    pub rs: u8,
    pub en: u8,
}

impl BusWiring {
    /// Replays the log the way an HD44780 in 4-bit mode would see it.
    ///
    /// A nibble is latched on every falling edge of EN, bit `i` taken from `data_pins[i]`. Two
    /// nibbles make a byte, high nibble first. Waits are reported only while the bus is idle
    /// (EN low, no half-sent byte), with consecutive waits merged.
    pub fn decode(&self, events: &[Event]) -> Vec<BusStep> {
        let mut data = 0u8;
        let mut control = 0u8;
        let mut pending: Option<u8> = None;
        let mut steps = Vec::new();

        for event in events {
            match *event {
                Event::Write { register, value } => {
                    let en_before = control & (1 << self.en) != 0;
                    if register == self.data_register {
                        data = value;
                    }
                    if register == self.control_register {
                        control = value;
                    }
                    let en_after = control & (1 << self.en) != 0;

                    if en_before && !en_after {
                        let nibble = self.nibble(data);
                        match pending.take() {
                            None => pending = Some(nibble),
                            Some(high) => {
                                let byte = (high << 4) | nibble;
                                if control & (1 << self.rs) != 0 {
                                    steps.push(BusStep::Data(byte));
                                } else {
                                    steps.push(BusStep::Command(byte));
                                }
                            }
                        }
                    }
                }
                Event::DelayUs(us) => {
                    let idle = pending.is_none() && control & (1 << self.en) == 0;
                    if !idle {
                        continue;
                    }
                    if let Some(BusStep::DelayUs(previous)) = steps.last_mut() {
                        *previous += us;
                    } else {
                        steps.push(BusStep::DelayUs(us));
                    }
                }
            }
        }

        steps
    }

    /// Same as [Self::decode], without the waits.
    pub fn transfers(&self, events: &[Event]) -> Vec<BusStep> {
        self.decode(events)
            .into_iter()
            .filter(|step| !matches!(step, BusStep::DelayUs(_)))
            .collect()
    }

    fn nibble(&self, data: u8) -> u8 {
        self.data_pins
            .iter()
            .enumerate()
            .fold(0, |nibble, (i, &pin)| {
                if data & (1 << pin) != 0 { nibble | (1 << i) } else { nibble }
            })
    }
}

/// Wiring used by [mock_display].
pub const WIRING: BusWiring = BusWiring {
    data_register: "data_output",
    data_pins: [6, 4, 2, 0],
    control_register: "control_output",
    rs: 5,
    en: 7,
};

/// A display on two separate ports, data on scattered pins, control on RS=5, RW=6, EN=7.
pub fn mock_display(log: &EventLog) -> GpioHD44780Driver<MockRegister, MockDelay> {
    let registers = DisplayRegisters {
        data_direction: MockRegister::new("data_direction", log.clone(), 0),
        data_output: MockRegister::new("data_output", log.clone(), 0),
        control_direction: MockRegister::new("control_direction", log.clone(), 0),
        control_output: MockRegister::new("control_output", log.clone(), 0),
    };
    let pins = DisplayPins::new(WIRING.data_pins, [WIRING.rs, 6, WIRING.en]).unwrap();
    GpioHD44780Driver::new(registers, pins, MockDelay::new(log.clone()))
}
