// Character display abstraction and the HD44780 1602 driver (PCF8574 I2C backpack)

use embedded_hal::{
    delay::DelayNs,
    i2c::{Error as _, I2c},
};

use crate::error::DisplayError;

pub const COLUMNS: usize = 16;
pub const ROWS: usize = 2;

/// A two row character display. Obtaining one means it is already initialized.
pub trait CharacterDisplay {
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Writes `text` starting at `column` on `row`. Overlong text is the device's problem.
    fn write(&mut self, column: u8, row: u8, text: &str) -> Result<(), DisplayError>;
}

impl<T: CharacterDisplay + ?Sized> CharacterDisplay for Box<T> {
    fn clear(&mut self) -> Result<(), DisplayError> {
        (**self).clear()
    }

    fn write(&mut self, column: u8, row: u8, text: &str) -> Result<(), DisplayError> {
        (**self).write(column, row, text)
    }
}

// PCF8574 pins
const RS: u8 = 0x01;
const ENABLE: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

// HD44780 commands
const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE: u8 = 0x06; // increment, no shift
const CMD_DISPLAY_ON: u8 = 0x0c; // cursor and blink off
const CMD_FUNCTION_SET: u8 = 0x28; // 4-bit, 2 lines, 5x8
const CMD_SET_DDRAM: u8 = 0x80;

const ROW_OFFSETS: [u8; ROWS] = [0x00, 0x40];

pub struct Lcd1602<I, D> {
    i2c: I,
    delay: D,
    address: u8,
}

impl<I: I2c, D: DelayNs> Lcd1602<I, D> {
    /// Runs the 4-bit initialization handshake and leaves the display blank.
    pub fn init(i2c: I, delay: D, address: u8) -> Result<Lcd1602<I, D>, DisplayError> {
        let mut lcd = Lcd1602 {
            i2c,
            delay,
            address,
        };

        lcd.delay.delay_ms(50);
        lcd.write_nibble(0x03, 0)?;
        lcd.delay.delay_us(4500);
        lcd.write_nibble(0x03, 0)?;
        lcd.delay.delay_us(4500);
        lcd.write_nibble(0x03, 0)?;
        lcd.delay.delay_us(150);
        lcd.write_nibble(0x02, 0)?;

        lcd.command(CMD_FUNCTION_SET)?;
        lcd.command(CMD_DISPLAY_ON)?;
        lcd.clear()?;
        lcd.command(CMD_ENTRY_MODE)?;

        Ok(lcd)
    }

    fn command(&mut self, cmd: u8) -> Result<(), DisplayError> {
        self.write_byte(cmd, 0)
    }

    fn write_byte(&mut self, value: u8, mode: u8) -> Result<(), DisplayError> {
        self.write_nibble(value >> 4, mode)?;
        self.write_nibble(value & 0x0f, mode)
    }

    fn write_nibble(&mut self, nibble: u8, mode: u8) -> Result<(), DisplayError> {
        let data = (nibble << 4) | mode | BACKLIGHT;
        self.expander_write(data)?;
        self.expander_write(data | ENABLE)?;
        self.delay.delay_us(1);
        self.expander_write(data & !ENABLE)?;
        self.delay.delay_us(50);
        Ok(())
    }

    fn expander_write(&mut self, data: u8) -> Result<(), DisplayError> {
        self.i2c
            .write(self.address, &[data])
            .map_err(|e| DisplayError::Bus(e.kind()))
    }
}

impl<I: I2c, D: DelayNs> CharacterDisplay for Lcd1602<I, D> {
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.command(CMD_CLEAR)?;
        self.delay.delay_ms(2);
        Ok(())
    }

    fn write(&mut self, column: u8, row: u8, text: &str) -> Result<(), DisplayError> {
        let offset = *ROW_OFFSETS
            .get(row as usize)
            .ok_or(DisplayError::Position { row })?;
        self.command(CMD_SET_DDRAM | column.wrapping_add(offset))?;

        for c in text.chars() {
            let byte = if c.is_ascii() && !c.is_ascii_control() {
                c as u8
            } else {
                b'?'
            };
            self.write_byte(byte, RS)?;
        }

        Ok(())
    }
}

#[cfg(target_os = "linux")]
pub fn open_lcd(
    bus: &str,
    address: u8,
) -> Result<Lcd1602<linux_embedded_hal::I2cdev, linux_embedded_hal::Delay>, DisplayError> {
    let i2c = linux_embedded_hal::I2cdev::new(bus).map_err(|e| DisplayError::Open {
        path: bus.to_owned(),
        reason: e.to_string(),
    })?;

    Lcd1602::init(i2c, linux_embedded_hal::Delay, address)
}

#[cfg(not(target_os = "linux"))]
pub fn open_lcd(_bus: &str, _address: u8) -> Result<Box<dyn CharacterDisplay>, DisplayError> {
    Err(DisplayError::Unsupported(
        "the I2C LCD needs Linux, use FLIGHT_DISPLAY=terminal",
    ))
}
