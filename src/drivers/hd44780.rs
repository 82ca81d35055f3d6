//! HD44780 character LCD in 4-bit parallel mode.
//!
//! Write-only: the R/W line is tied to ground, so busy polling is replaced by
//! the worst-case execution delays from the datasheet.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};

use crate::domain::ports::GlyphSink;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE: u8 = 0x04;
const CMD_DISPLAY_CONTROL: u8 = 0x08;
const CMD_FUNCTION_SET: u8 = 0x20;
const CMD_SET_DDRAM_ADDR: u8 = 0x80;

const ENTRY_INCREMENT: u8 = 0x02;
const DISPLAY_ON: u8 = 0x04;
const FUNCTION_TWO_LINES: u8 = 0x08;

/// DDRAM address of the first column of each row.
const ROW_OFFSETS: [u8; 2] = [0x00, 0x40];
const COLUMNS: u8 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LcdError<E> {
    Pin(E),
    /// Cursor position outside the display memory
    OutOfRange,
}

impl<E> From<E> for LcdError<E> {
    fn from(e: E) -> Self {
        LcdError::Pin(e)
    }
}

pub struct Hd44780<P, D> {
    rs: P,
    en: P,
    /// D4 to D7
    data: [P; 4],
    delay: D,
}

impl<P: OutputPin, D: DelayNs> Hd44780<P, D> {
    pub fn new(rs: P, en: P, data: [P; 4], delay: D) -> Self {
        Self { rs, en, data, delay }
    }

    /// Reset into 4-bit mode: two lines, 5x8 font, display on, cursor off.
    pub fn init(&mut self) -> Result<(), LcdError<P::Error>> {
        self.delay.delay_ms(50);
        self.rs.set_low()?;
        self.en.set_low()?;

        // Function set to 8-bit three times, then switch to 4-bit
        self.write_nibble(0x3)?;
        self.delay.delay_us(4500);
        self.write_nibble(0x3)?;
        self.delay.delay_us(4500);
        self.write_nibble(0x3)?;
        self.delay.delay_us(150);
        self.write_nibble(0x2)?;

        self.command(CMD_FUNCTION_SET | FUNCTION_TWO_LINES)?;
        self.command(CMD_DISPLAY_CONTROL | DISPLAY_ON)?;
        self.clear()?;
        self.command(CMD_ENTRY_MODE | ENTRY_INCREMENT)
    }

    fn command(&mut self, cmd: u8) -> Result<(), LcdError<P::Error>> {
        self.write_byte(cmd, PinState::Low)
    }

    fn write_byte(&mut self, byte: u8, rs: PinState) -> Result<(), LcdError<P::Error>> {
        self.rs.set_state(rs)?;
        self.write_nibble(byte >> 4)?;
        self.write_nibble(byte & 0x0F)
    }

    fn write_nibble(&mut self, nibble: u8) -> Result<(), LcdError<P::Error>> {
        for (bit, pin) in self.data.iter_mut().enumerate() {
            pin.set_state(PinState::from(nibble & (1 << bit) != 0))?;
        }
        self.en.set_high()?;
        self.delay.delay_us(1);
        self.en.set_low()?;
        // Longest regular instruction takes 37 us
        self.delay.delay_us(50);
        Ok(())
    }
}

impl<P: OutputPin, D: DelayNs> GlyphSink for Hd44780<P, D> {
    type Error = LcdError<P::Error>;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.command(CMD_CLEAR)?;
        self.delay.delay_ms(2);
        Ok(())
    }

    fn set_cursor(&mut self, column: u8, row: u8) -> Result<(), Self::Error> {
        let offset = ROW_OFFSETS
            .get(usize::from(row))
            .ok_or(LcdError::OutOfRange)?;
        if column >= COLUMNS {
            return Err(LcdError::OutOfRange);
        }
        self.command(CMD_SET_DDRAM_ADDR | (offset + column))
    }

    fn write_glyph(&mut self, glyph: u8) -> Result<(), Self::Error> {
        self.write_byte(glyph, PinState::High)
    }
}
