//! Two line character display.
//!
//! [`DisplayFrame`] is the pure layout of a payload onto the grid. Frames
//! from the bus and from the button are posted to [`DisplayService`] and
//! drawn by the single [`DisplayWriter`], so they never interleave.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::config;
use crate::domain::ports::GlyphSink;

pub const LINE_WIDTH: usize = config::DISPLAY.columns;
pub const LINE_COUNT: usize = config::DISPLAY.rows;

const PAD: u8 = b' ';

/// Every cell of the display after a render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFrame {
    lines: [[u8; LINE_WIDTH]; LINE_COUNT],
}

impl DisplayFrame {
    pub const fn blank() -> Self {
        Self {
            lines: [[PAD; LINE_WIDTH]; LINE_COUNT],
        }
    }

    /// Lay out a payload.
    ///
    /// The first newline splits the top line from the bottom one. Each line
    /// ends at a NUL or newline, is cut at [`LINE_WIDTH`] and padded with
    /// spaces.
    pub fn render(payload: &[u8]) -> Self {
        let (top, bottom) = match payload.iter().position(|&b| b == b'\n') {
            Some(pos) => (&payload[..pos], &payload[pos + 1..]),
            None => (payload, &[][..]),
        };
        let mut frame = Self::blank();
        fill_line(&mut frame.lines[0], top);
        fill_line(&mut frame.lines[1], bottom);
        frame
    }

    pub fn with_lines(top: &str, bottom: &str) -> Self {
        let mut frame = Self::blank();
        fill_line(&mut frame.lines[0], top.as_bytes());
        fill_line(&mut frame.lines[1], bottom.as_bytes());
        frame
    }

    pub fn line(&self, row: usize) -> &[u8; LINE_WIDTH] {
        &self.lines[row]
    }

    pub fn lines(&self) -> &[[u8; LINE_WIDTH]; LINE_COUNT] {
        &self.lines
    }
}

impl Default for DisplayFrame {
    fn default() -> Self {
        Self::blank()
    }
}

fn fill_line(line: &mut [u8; LINE_WIDTH], segment: &[u8]) {
    let text = segment.iter().take_while(|&&b| b != 0 && b != b'\n');
    for (cell, &glyph) in line.iter_mut().zip(text) {
        *cell = glyph;
    }
}

/// Latest frame waiting to be drawn.
///
/// Renderers only swap the pending frame, so posting never waits on the
/// display. A newer frame replaces one that was not drawn yet.
pub struct DisplayService {
    pending: Signal<CriticalSectionRawMutex, DisplayFrame>,
}

impl DisplayService {
    pub const fn new() -> Self {
        Self {
            pending: Signal::new(),
        }
    }

    pub fn render(&self, payload: &[u8]) {
        self.show(DisplayFrame::render(payload));
    }

    pub fn show_lines(&self, top: &str, bottom: &str) {
        self.show(DisplayFrame::with_lines(top, bottom));
    }

    pub fn show(&self, frame: DisplayFrame) {
        self.pending.signal(frame);
    }
}

impl Default for DisplayService {
    fn default() -> Self {
        Self::new()
    }
}

/// Sole owner of the glyph sink.
///
/// Frames are written one at a time with no lock held, so a slow display
/// never stalls the contexts posting to [`DisplayService`].
pub struct DisplayWriter<S> {
    sink: S,
}

impl<S: GlyphSink> DisplayWriter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Draw the pending frame, if any. Returns `true` if one was drawn.
    pub fn flush(&mut self, display: &DisplayService) -> bool {
        match display.pending.try_take() {
            Some(frame) => {
                self.draw(frame);
                true
            }
            None => false,
        }
    }

    /// Draw frames as they are posted.
    pub async fn run(&mut self, display: &DisplayService) -> ! {
        loop {
            let frame = display.pending.wait().await;
            self.draw(frame);
        }
    }

    fn draw(&mut self, frame: DisplayFrame) {
        if let Err(e) = self.write(&frame) {
            panic!("display: failed to write frame: {:?}", e);
        }
    }

    /// Write a whole frame, addressing column 0 of every line first.
    #[allow(clippy::cast_possible_truncation)]
    fn write(&mut self, frame: &DisplayFrame) -> Result<(), S::Error> {
        for (row, line) in frame.lines().iter().enumerate() {
            self.sink.set_cursor(0, row as u8)?;
            for &glyph in line {
                self.sink.write_glyph(glyph)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use core::cell::Cell;
    use core::convert::Infallible;
    use core::time::Duration;
    use std::sync::mpsc;
    use std::thread;
    use std::vec::Vec;

    use proptest::prelude::*;

    use super::*;

    fn line(text: &str) -> [u8; LINE_WIDTH] {
        let mut out = [b' '; LINE_WIDTH];
        out[..text.len()].copy_from_slice(text.as_bytes());
        out
    }

    #[test]
    fn empty_payload_is_blank() {
        assert_eq!(DisplayFrame::render(b""), DisplayFrame::blank());
    }

    #[test]
    fn newline_splits_lines() {
        let frame = DisplayFrame::render(b"A\nB");
        assert_eq!(frame.line(0), &line("A"));
        assert_eq!(frame.line(1), &line("B"));
    }

    #[test]
    fn single_line_payload_leaves_bottom_blank() {
        let frame = DisplayFrame::render(b"Hello");
        assert_eq!(frame.line(0), &line("Hello"));
        assert_eq!(frame.line(1), &line(""));
    }

    #[test]
    fn long_segments_are_truncated() {
        let frame = DisplayFrame::render(b"0123456789abcdefXYZ\nshort");
        assert_eq!(frame.line(0), b"0123456789abcdef");
        assert_eq!(frame.line(1), &line("short"));
    }

    #[test]
    fn only_first_newline_splits() {
        let frame = DisplayFrame::render(b"one\ntwo\nthree");
        assert_eq!(frame.line(0), &line("one"));
        assert_eq!(frame.line(1), &line("two"));
    }

    #[test]
    fn nul_terminates_a_segment() {
        let frame = DisplayFrame::render(b"ab\0cd\nef\0gh");
        assert_eq!(frame.line(0), &line("ab"));
        assert_eq!(frame.line(1), &line("ef"));
    }

    /// Records every glyph and checks that other contexts can enter a
    /// critical section while it is being written.
    #[derive(Default)]
    struct ContendedSink {
        glyphs: Vec<u8>,
        cursor_moves: Vec<(u8, u8)>,
        blocked: Cell<usize>,
    }

    impl ContendedSink {
        fn other_context_can_run(&self) {
            let (tx, rx) = mpsc::channel();
            thread::spawn(move || {
                critical_section::with(|_| ());
                let _ = tx.send(());
            });
            if rx.recv_timeout(Duration::from_secs(2)).is_err() {
                self.blocked.set(self.blocked.get() + 1);
            }
        }
    }

    impl GlyphSink for ContendedSink {
        type Error = Infallible;

        fn clear(&mut self) -> Result<(), Infallible> {
            Ok(())
        }

        fn set_cursor(&mut self, column: u8, row: u8) -> Result<(), Infallible> {
            self.cursor_moves.push((column, row));
            Ok(())
        }

        fn write_glyph(&mut self, glyph: u8) -> Result<(), Infallible> {
            self.other_context_can_run();
            self.glyphs.push(glyph);
            Ok(())
        }
    }

    #[test]
    fn frames_are_written_outside_critical_sections() {
        let display = DisplayService::new();
        let mut writer = DisplayWriter::new(ContendedSink::default());

        display.render(b"Hello\nWorld!");
        assert!(writer.flush(&display));

        assert_eq!(writer.sink.blocked.get(), 0);
        assert_eq!(writer.sink.glyphs.len(), LINE_COUNT * LINE_WIDTH);
        assert_eq!(writer.sink.cursor_moves, [(0, 0), (0, 1)]);
    }

    #[test]
    fn newest_pending_frame_wins() {
        let display = DisplayService::new();
        let mut writer = DisplayWriter::new(ContendedSink::default());

        display.render(b"first");
        display.show_lines("second", "frame");
        assert!(writer.flush(&display));
        assert!(!writer.flush(&display));

        let expected: Vec<u8> = DisplayFrame::with_lines("second", "frame")
            .lines()
            .concat();
        assert_eq!(writer.sink.glyphs, expected);
        assert_eq!(writer.sink.cursor_moves.len(), LINE_COUNT);
    }

    proptest! {
        #[test]
        fn render_is_total_and_idempotent(payload in proptest::collection::vec(any::<u8>(), 0..64)) {
            let frame = DisplayFrame::render(&payload);
            prop_assert_eq!(&frame, &DisplayFrame::render(&payload));

            let top: Vec<u8> = payload
                .iter()
                .copied()
                .take_while(|&b| b != b'\n' && b != 0)
                .take(LINE_WIDTH)
                .collect();
            prop_assert_eq!(&frame.line(0)[..top.len()], top.as_slice());
            prop_assert!(frame.line(0)[top.len()..].iter().all(|&b| b == b' '));
        }
    }
}
