use eyre::WrapErr;
use padlcd_gpio::GpioResult;
use padlcd_gpio::keypad::{KEYPAD_COLUMNS, KEYPAD_ROWS, PressDetection};
use padlcd_gpio::lcd::hd44780::driver::DisplayPins;
use serde::{Deserialize, Serialize};
use std::env::var_os;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Where the register window lives in physical memory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MemoryConfig {
    pub device: String,
    pub base: u64,
    pub len: usize,
}

/// Keypad wiring. Register fields are offsets into the mapped window.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct KeypadConfig {
    pub column_direction: usize,
    pub column_input: usize,
    pub column_pull: usize,
    pub row_direction: usize,
    pub row_output: usize,
    pub row_pins: [u8; KEYPAD_ROWS],
    pub column_pins: [u8; KEYPAD_COLUMNS],
    /// One string per row, one character per column.
    pub legend: [String; KEYPAD_ROWS],
    /// Block while a key is held and report it on release.
    pub wait_for_release: bool,
}

/// Display wiring. Register fields are offsets into the mapped window.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub data_direction: usize,
    pub data_output: usize,
    pub control_direction: usize,
    pub control_output: usize,
    pub data_pins: [u8; 4],
    /// RS, RW, EN.
    pub control_pins: [u8; 3],
    pub wrap_column: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub memory: MemoryConfig,
    pub keypad: KeypadConfig,
    pub display: DisplayConfig,
    pub poll_interval_ms: u64,
}

impl Config {
    /// Path of the config file: `CONFIG_FILE`, or `config.json`.
    pub fn path() -> PathBuf {
        var_os("CONFIG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.json"))
    }

    /// Loads the config file, or `None` if it does not exist.
    pub fn try_load() -> eyre::Result<Option<Self>> {
        Self::load_from(&Self::path())
    }

    /// A file that exists but cannot be read or parsed is an error, never `None`.
    pub fn load_from(path: &Path) -> eyre::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(path).wrap_err_with(|| format!("Cannot open {}", path.display()))?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)
            .wrap_err_with(|| format!("Invalid config in {}", path.display()))?;
        Ok(Some(config))
    }

    pub fn save(&self) -> std::io::Result<()> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Every register offset in use, each listed once.
    pub fn register_offsets(&self) -> Vec<usize> {
        let mut offsets = vec![
            self.keypad.column_direction,
            self.keypad.column_input,
            self.keypad.column_pull,
            self.keypad.row_direction,
            self.keypad.row_output,
            self.display.data_direction,
            self.display.data_output,
            self.display.control_direction,
            self.display.control_output,
        ];
        offsets.sort_unstable();
        offsets.dedup();
        offsets
    }
}

impl KeypadConfig {
    /// Parses the legend into a key map.
    pub fn key_map(&self) -> eyre::Result<[[char; KEYPAD_COLUMNS]; KEYPAD_ROWS]> {
        let mut map = [['\0'; KEYPAD_COLUMNS]; KEYPAD_ROWS];
        for (row, line) in self.legend.iter().enumerate() {
            let keys: Vec<char> = line.chars().collect();
            map[row] = keys.try_into().map_err(|keys: Vec<char>| {
                eyre::eyre!(
                    "Keypad legend row {} has {} keys, expected {}",
                    row,
                    keys.len(),
                    KEYPAD_COLUMNS
                )
            })?;
        }
        Ok(map)
    }

    pub fn press_detection(&self) -> PressDetection {
        if self.wait_for_release {
            PressDetection::WaitForRelease
        } else {
            PressDetection::Sample
        }
    }
}

impl DisplayConfig {
    /// Validates the pins, across both roles when data and control share the output port.
    pub fn pins(&self) -> GpioResult<DisplayPins> {
        if self.data_output == self.control_output {
            DisplayPins::new_shared_port(self.data_pins, self.control_pins)
        } else {
            DisplayPins::new(self.data_pins, self.control_pins)
        }
    }
}

// ATmega32 data-space addresses of the I/O ports.
const DDRA: usize = 0x3A;
const PORTA: usize = 0x3B;
const PINB: usize = 0x36;
const DDRB: usize = 0x37;
const PORTB: usize = 0x38;
const DDRC: usize = 0x34;
const PORTC: usize = 0x35;

impl Default for MemoryConfig {
    fn default() -> Self {
        MemoryConfig {
            device: "/dev/mem".to_string(),
            base: 0,
            len: 0x60,
        }
    }
}

impl Default for KeypadConfig {
    fn default() -> Self {
        // Rows on PA0..PA3, columns on PB0..PB5 with the PORTB pull-ups.
        KeypadConfig {
            column_direction: DDRB,
            column_input: PINB,
            column_pull: PORTB,
            row_direction: DDRA,
            row_output: PORTA,
            row_pins: [0, 1, 2, 3],
            column_pins: [0, 1, 2, 3, 4, 5],
            legend: [
                "C789X/".to_string(),
                "S456-M".to_string(),
                "%123+N".to_string(),
                "R0.=+P".to_string(),
            ],
            wait_for_release: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        // Everything on port C: data on PC0..PC3, RS/RW/EN on PC5..PC7.
        DisplayConfig {
            data_direction: DDRC,
            data_output: PORTC,
            control_direction: DDRC,
            control_output: PORTC,
            data_pins: [0, 1, 2, 3],
            control_pins: [5, 6, 7],
            wrap_column: padlcd_gpio::lcd::hd44780::driver::WRAP_COLUMN,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            memory: MemoryConfig::default(),
            keypad: KeypadConfig::default(),
            display: DisplayConfig::default(),
            poll_interval_ms: 10,
        }
    }
}
