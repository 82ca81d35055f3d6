//! Streaming writer for application images.
//!
//! Chunks arrive in arbitrary sizes while the flash only accepts word
//! aligned writes, so a partial word is kept between calls and padded with
//! `0xFF` (the erased value) when the image ends. Sectors are erased right
//! before the first write that reaches them.

use embedded_storage::nor_flash::NorFlash;
use log::{debug, info};

use crate::domain::ports::FirmwareError;

/// First byte of every ESP application image.
pub const IMAGE_MAGIC: u8 = 0xE9;

const ALIGN: usize = 4;
const ALIGN_U32: u32 = 4;

const fn align_up(value: u32, to: u32) -> u32 {
    value.div_ceil(to) * to
}

#[derive(Debug)]
pub struct FirmwareImageWriter {
    capacity: u32,
    expected: Option<u32>,
    received: u32,
    written: u32,
    erased: u32,
    tail: [u8; ALIGN],
    tail_len: usize,
    last_decile: u8,
}

impl FirmwareImageWriter {
    /// Start writing at offset 0 of `flash`.
    ///
    /// Fails early when the announced length does not fit.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new<F: NorFlash>(flash: &F, expected: Option<u32>) -> Result<Self, FirmwareError> {
        let capacity = u32::try_from(flash.capacity()).unwrap_or(u32::MAX);
        if expected.is_some_and(|len| len > capacity) {
            return Err(FirmwareError::ImageTooLarge);
        }
        Ok(Self {
            capacity,
            expected,
            received: 0,
            written: 0,
            erased: 0,
            tail: [0xFF; ALIGN],
            tail_len: 0,
            last_decile: 0,
        })
    }

    /// Progress in percent, if the image length was announced.
    pub fn progress(&self) -> Option<u8> {
        let total = self.expected.filter(|&len| len > 0)?;
        #[allow(clippy::cast_possible_truncation)]
        Some((u64::from(self.received) * 100 / u64::from(total)) as u8)
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn write<F: NorFlash>(&mut self, flash: &mut F, data: &[u8]) -> Result<(), FirmwareError> {
        if data.is_empty() {
            return Ok(());
        }
        if self.received == 0 && data[0] != IMAGE_MAGIC {
            return Err(FirmwareError::InvalidImage);
        }

        let len = u32::try_from(data.len()).map_err(|_| FirmwareError::ImageTooLarge)?;
        let received = self
            .received
            .checked_add(len)
            .ok_or(FirmwareError::ImageTooLarge)?;
        if received > self.capacity {
            return Err(FirmwareError::ImageTooLarge);
        }
        if let Some(expected) = self.expected.filter(|&expected| received > expected) {
            return Err(FirmwareError::SizeMismatch { expected, received });
        }

        self.erase_until(flash, align_up(received, ALIGN_U32))?;
        self.received = received;

        let mut idx = 0;

        // Complete partial word
        if self.tail_len > 0 {
            let take = (ALIGN - self.tail_len).min(data.len());
            self.tail[self.tail_len..self.tail_len + take].copy_from_slice(&data[..take]);
            self.tail_len += take;
            idx += take;

            if self.tail_len == ALIGN {
                self.flush_tail(flash)?;
            }
        }

        // Write aligned bulk
        let rem = &data[idx..];
        let aligned_len = rem.len() & !(ALIGN - 1);
        if aligned_len > 0 {
            flash
                .write(self.written, &rem[..aligned_len])
                .map_err(|_| FirmwareError::Write)?;
            self.written += aligned_len as u32;
        }

        // Keep trailing bytes
        let tail_bytes = &rem[aligned_len..];
        if !tail_bytes.is_empty() {
            self.tail[..tail_bytes.len()].copy_from_slice(tail_bytes);
            self.tail_len = tail_bytes.len();
        }

        self.report_progress();
        Ok(())
    }

    /// Flush the last partial word and check the received length.
    ///
    /// Returns the image length in bytes.
    pub fn finish<F: NorFlash>(&mut self, flash: &mut F) -> Result<u32, FirmwareError> {
        if self.received == 0 {
            return Err(FirmwareError::InvalidImage);
        }
        if let Some(expected) = self.expected.filter(|&expected| expected != self.received) {
            return Err(FirmwareError::SizeMismatch {
                expected,
                received: self.received,
            });
        }
        if self.tail_len > 0 {
            self.tail[self.tail_len..].fill(0xFF);
            self.flush_tail(flash)?;
        }
        info!(
            "ota: image complete, {} bytes received, {} bytes written",
            self.received, self.written
        );
        Ok(self.received)
    }

    fn flush_tail<F: NorFlash>(&mut self, flash: &mut F) -> Result<(), FirmwareError> {
        flash
            .write(self.written, &self.tail)
            .map_err(|_| FirmwareError::Write)?;
        self.written += ALIGN_U32;
        self.tail_len = 0;
        self.tail.fill(0xFF);
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn erase_until<F: NorFlash>(&mut self, flash: &mut F, end: u32) -> Result<(), FirmwareError> {
        let sector = F::ERASE_SIZE as u32;
        while self.erased < end {
            let to = (self.erased + sector).min(align_up(self.capacity, sector));
            debug!("ota: erasing 0x{:X}..0x{:X}", self.erased, to);
            flash
                .erase(self.erased, to)
                .map_err(|_| FirmwareError::Erase)?;
            self.erased = to;
        }
        Ok(())
    }

    fn report_progress(&mut self) {
        let Some(percent) = self.progress() else {
            return;
        };
        let decile = percent / 10;
        if decile > self.last_decile {
            self.last_decile = decile;
            info!(
                "ota: progress {}% ({}/{} bytes)",
                percent,
                self.received,
                self.expected.unwrap_or_default()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec;
    use std::vec::Vec;

    use embedded_storage::nor_flash::{ErrorType, NorFlashErrorKind, ReadNorFlash};

    use super::*;

    /// NOR flash in RAM: writes may only clear bits of erased cells.
    struct RamFlash {
        cells: Vec<u8>,
        erased: Vec<bool>,
    }

    impl RamFlash {
        fn new(size: usize) -> Self {
            Self {
                cells: vec![0; size],
                erased: vec![false; size],
            }
        }
    }

    impl ErrorType for RamFlash {
        type Error = NorFlashErrorKind;
    }

    impl ReadNorFlash for RamFlash {
        const READ_SIZE: usize = 1;

        fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
            let start = offset as usize;
            let cells = self
                .cells
                .get(start..start + bytes.len())
                .ok_or(NorFlashErrorKind::OutOfBounds)?;
            bytes.copy_from_slice(cells);
            Ok(())
        }

        fn capacity(&self) -> usize {
            self.cells.len()
        }
    }

    impl NorFlash for RamFlash {
        const WRITE_SIZE: usize = 4;
        const ERASE_SIZE: usize = 64;

        fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
            let (from, to) = (from as usize, to as usize);
            if from % Self::ERASE_SIZE != 0 || to % Self::ERASE_SIZE != 0 {
                return Err(NorFlashErrorKind::NotAligned);
            }
            if to > self.cells.len() {
                return Err(NorFlashErrorKind::OutOfBounds);
            }
            self.cells[from..to].fill(0xFF);
            self.erased[from..to].fill(true);
            Ok(())
        }

        fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
            let start = offset as usize;
            if start % Self::WRITE_SIZE != 0 || bytes.len() % Self::WRITE_SIZE != 0 {
                return Err(NorFlashErrorKind::NotAligned);
            }
            if start + bytes.len() > self.cells.len() {
                return Err(NorFlashErrorKind::OutOfBounds);
            }
            for (i, &byte) in bytes.iter().enumerate() {
                if !self.erased[start + i] {
                    return Err(NorFlashErrorKind::Other);
                }
                self.cells[start + i] &= byte;
                self.erased[start + i] = false;
            }
            Ok(())
        }
    }

    fn image(len: usize) -> Vec<u8> {
        let mut data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        data[0] = IMAGE_MAGIC;
        data
    }

    #[test]
    fn odd_sized_chunks_land_contiguously() {
        let mut flash = RamFlash::new(1024);
        let data = image(203);
        let mut writer = FirmwareImageWriter::new(&flash, Some(203)).unwrap();

        for chunk in data.chunks(7) {
            writer.write(&mut flash, chunk).unwrap();
        }
        assert_eq!(writer.finish(&mut flash).unwrap(), 203);

        assert_eq!(&flash.cells[..203], data.as_slice());
        assert_eq!(&flash.cells[203..204], &[0xFF]);
    }

    #[test]
    fn erases_only_reached_sectors() {
        let mut flash = RamFlash::new(1024);
        let mut writer = FirmwareImageWriter::new(&flash, None).unwrap();

        writer.write(&mut flash, &image(100)).unwrap();
        writer.finish(&mut flash).unwrap();

        assert!(flash.erased[100..128].iter().all(|&e| e));
        assert!(flash.erased[128..].iter().all(|&e| !e));
    }

    #[test]
    fn rejects_foreign_images() {
        let mut flash = RamFlash::new(1024);
        let mut writer = FirmwareImageWriter::new(&flash, None).unwrap();
        assert_eq!(
            writer.write(&mut flash, b"<html>"),
            Err(FirmwareError::InvalidImage)
        );
    }

    #[test]
    fn rejects_images_larger_than_the_partition() {
        let flash = RamFlash::new(256);
        assert_eq!(
            FirmwareImageWriter::new(&flash, Some(257)).unwrap_err(),
            FirmwareError::ImageTooLarge
        );

        let mut flash = RamFlash::new(256);
        let mut writer = FirmwareImageWriter::new(&flash, None).unwrap();
        writer.write(&mut flash, &image(200)).unwrap();
        assert_eq!(
            writer.write(&mut flash, &[0; 100]),
            Err(FirmwareError::ImageTooLarge)
        );
    }

    #[test]
    fn truncated_download_is_reported() {
        let mut flash = RamFlash::new(1024);
        let mut writer = FirmwareImageWriter::new(&flash, Some(500)).unwrap();
        writer.write(&mut flash, &image(300)).unwrap();
        assert_eq!(
            writer.finish(&mut flash),
            Err(FirmwareError::SizeMismatch {
                expected: 500,
                received: 300
            })
        );
    }

    #[test]
    fn empty_download_is_not_an_image() {
        let mut flash = RamFlash::new(1024);
        let mut writer = FirmwareImageWriter::new(&flash, None).unwrap();
        assert_eq!(writer.finish(&mut flash), Err(FirmwareError::InvalidImage));
    }

    #[test]
    fn progress_follows_announced_length() {
        let mut flash = RamFlash::new(1024);
        let mut writer = FirmwareImageWriter::new(&flash, Some(400)).unwrap();
        assert_eq!(writer.progress(), Some(0));
        writer.write(&mut flash, &image(100)).unwrap();
        assert_eq!(writer.progress(), Some(25));

        let unknown = FirmwareImageWriter::new(&flash, None).unwrap();
        assert_eq!(unknown.progress(), None);
    }
}
