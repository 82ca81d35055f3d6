use core::fmt::Debug;

/// Character display addressed by column and row.
pub trait GlyphSink {
    type Error: Debug;

    /// Blank the whole display and home the cursor.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Move the cursor to `column` on `row`, both zero based.
    fn set_cursor(&mut self, column: u8, row: u8) -> Result<(), Self::Error>;

    /// Write one glyph at the cursor and advance it.
    fn write_glyph(&mut self, glyph: u8) -> Result<(), Self::Error>;
}

impl<S: GlyphSink + ?Sized> GlyphSink for &mut S {
    type Error = S::Error;

    fn clear(&mut self) -> Result<(), Self::Error> {
        (**self).clear()
    }

    fn set_cursor(&mut self, column: u8, row: u8) -> Result<(), Self::Error> {
        (**self).set_cursor(column, row)
    }

    fn write_glyph(&mut self, glyph: u8) -> Result<(), Self::Error> {
        (**self).write_glyph(glyph)
    }
}
