mod app;
mod config;

use crate::app::App;
use crate::config::Config;
use dotenv::dotenv;
use log::{debug, info};
use padlcd_gpio::delay::SpinDelay;
use padlcd_gpio::keypad::{GpioKeypad, KeypadConfig, KeypadRegisters};
use padlcd_gpio::lcd::hd44780::driver::{DisplayLayout, DisplayRegisters, GpioHD44780Driver, HD44780Driver};
use padlcd_gpio::register::{MappedRegister, RegisterBlock};
use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;
use sysinfo::System;

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    const UNKNOWN_STR: &str = "???";

    info!("padlcd starting...");
    info!(
        "Host {} ({}, kernel {}), architecture {}",
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR),
        System::long_os_version().as_deref().unwrap_or(UNKNOWN_STR),
        System::kernel_version().as_deref().unwrap_or(UNKNOWN_STR),
        System::cpu_arch(),
    );

    debug!("Trying to load config...");
    let config = if let Some(config) = Config::try_load()? {
        info!("Config loaded.");
        config
    } else {
        info!("Config not found. Using default");
        let config = Config::default();
        config.save()?;
        info!("Default config saved to {}.", Config::path().display());
        config
    };

    info!("Keypad @ rows: {:?}, cols: {:?}", config.keypad.row_pins, config.keypad.column_pins);
    info!(
        "LCD @ data: {:?}, RS/RW/EN: {:?}",
        config.display.data_pins, config.display.control_pins
    );

    debug!("Mapping registers...");
    let block = RegisterBlock::map(&config.memory.device, config.memory.base, config.memory.len)?;
    let mut registers: BTreeMap<usize, MappedRegister> = BTreeMap::new();
    for offset in config.register_offsets() {
        registers.insert(offset, block.register(offset)?);
    }
    let register = |offset: usize| {
        registers
            .get(&offset)
            .ok_or_else(|| eyre::eyre!("Register {:#x} was not mapped", offset))
    };
    debug!("{:?} mapped.", block);

    debug!("Initializing keypad driver...");
    let keypad_config = KeypadConfig::new(
        config.keypad.row_pins,
        config.keypad.column_pins,
        config.keypad.key_map()?,
    )?;
    let keypad = GpioKeypad::new(
        KeypadRegisters {
            column_direction: register(config.keypad.column_direction)?,
            column_input: register(config.keypad.column_input)?,
            column_pull: register(config.keypad.column_pull)?,
            row_direction: register(config.keypad.row_direction)?,
            row_output: register(config.keypad.row_output)?,
        },
        keypad_config,
    )?
    .with_press_detection(config.keypad.press_detection());
    debug!("{:?} initialized.", keypad);

    debug!("Initializing LCD driver...");
    let mut lcd = GpioHD44780Driver::new(
        DisplayRegisters {
            data_direction: register(config.display.data_direction)?,
            data_output: register(config.display.data_output)?,
            control_direction: register(config.display.control_direction)?,
            control_output: register(config.display.control_output)?,
        },
        config.display.pins()?,
        SpinDelay::new(),
    )
    .with_layout(DisplayLayout::DEFAULT.with_wrap_column(config.display.wrap_column));
    lcd.init()?;
    debug!("{:?} initialized.", lcd);

    let mut app = App::new(&keypad, &mut lcd, config.keypad.press_detection());
    app.draw_start_screen()?;

    info!("Starting main loop...");
    let poll_interval = Duration::from_millis(config.poll_interval_ms);
    loop {
        app.update()?;
        thread::sleep(poll_interval);
    }
}
