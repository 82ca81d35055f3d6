//! Firmware installation into the inactive OTA app slot.

use embedded_storage::nor_flash::{ErrorType, NorFlash, ReadNorFlash};
use esp_bootloader_esp_idf::ota::OtaImageState;
use esp_bootloader_esp_idf::ota_updater::OtaUpdater;
use esp_bootloader_esp_idf::partitions::{
    PARTITION_TABLE_MAX_LEN, PartitionType, read_partition_table,
};
use esp_storage::{FlashStorage, FlashStorageError};
use log::{debug, info, warn};

use the1602::core::flash::FirmwareImageWriter;
use the1602::domain::ports::{DeviceRestart, FirmwareError, FirmwareInstaller};

/// Location of the app slot that receives the next image.
#[derive(Debug, Clone, Copy)]
struct TargetSlot {
    offset: u32,
    len: u32,
}

/// The target slot seen as a zero based flash device.
struct SlotWindow<'a> {
    flash: &'a mut FlashStorage<'static>,
    slot: TargetSlot,
}

impl ErrorType for SlotWindow<'_> {
    type Error = FlashStorageError;
}

impl ReadNorFlash for SlotWindow<'_> {
    const READ_SIZE: usize = <FlashStorage<'static> as ReadNorFlash>::READ_SIZE;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        self.flash.read(self.slot.offset + offset, bytes)
    }

    fn capacity(&self) -> usize {
        self.slot.len as usize
    }
}

impl NorFlash for SlotWindow<'_> {
    const WRITE_SIZE: usize = <FlashStorage<'static> as NorFlash>::WRITE_SIZE;
    const ERASE_SIZE: usize = <FlashStorage<'static> as NorFlash>::ERASE_SIZE;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        self.flash
            .erase(self.slot.offset + from, self.slot.offset + to)
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        self.flash.write(self.slot.offset + offset, bytes)
    }
}

struct Session {
    slot: TargetSlot,
    writer: FirmwareImageWriter,
}

/// Streams an image into the next OTA slot and makes it the boot target.
pub(crate) struct EspFirmwareInstaller {
    flash: FlashStorage<'static>,
    session: Option<Session>,
}

impl EspFirmwareInstaller {
    pub(crate) fn new(flash: FlashStorage<'static>) -> Self {
        Self {
            flash,
            session: None,
        }
    }

    fn next_slot(&mut self) -> Result<TargetSlot, FirmwareError> {
        let mut buffer = [0u8; PARTITION_TABLE_MAX_LEN];
        let subtype = {
            let mut updater = OtaUpdater::new(&mut self.flash, &mut buffer)
                .map_err(|_| FirmwareError::InvalidPartitionTable)?;
            let (_, subtype) = updater
                .next_partition()
                .map_err(|_| FirmwareError::InvalidPartitionTable)?;
            subtype
        };

        let table = read_partition_table(&mut self.flash, &mut buffer)
            .map_err(|_| FirmwareError::InvalidPartitionTable)?;
        let entry = table
            .find_partition(PartitionType::App(subtype))
            .map_err(|_| FirmwareError::InvalidPartitionTable)?
            .ok_or(FirmwareError::InvalidPartitionTable)?;

        debug!(
            "ota: target partition {:?} at 0x{:X}, {} bytes",
            subtype,
            entry.offset(),
            entry.len()
        );
        Ok(TargetSlot {
            offset: entry.offset(),
            len: entry.len(),
        })
    }

    fn activate(&mut self) -> Result<(), FirmwareError> {
        let mut buffer = [0u8; PARTITION_TABLE_MAX_LEN];
        let mut updater = OtaUpdater::new(&mut self.flash, &mut buffer)
            .map_err(|_| FirmwareError::InvalidPartitionTable)?;
        updater
            .activate_next_partition()
            .and_then(|()| updater.set_current_ota_state(OtaImageState::New))
            .map_err(|_| FirmwareError::Activate)
    }
}

impl FirmwareInstaller for EspFirmwareInstaller {
    fn begin(&mut self, expected_len: Option<u32>) -> Result<(), FirmwareError> {
        let slot = self.next_slot()?;
        let window = SlotWindow {
            flash: &mut self.flash,
            slot,
        };
        let writer = FirmwareImageWriter::new(&window, expected_len)?;
        self.session = Some(Session { slot, writer });
        Ok(())
    }

    fn write_chunk(&mut self, data: &[u8]) -> Result<(), FirmwareError> {
        let session = self.session.as_mut().ok_or(FirmwareError::NoSession)?;
        let mut window = SlotWindow {
            flash: &mut self.flash,
            slot: session.slot,
        };
        session.writer.write(&mut window, data)
    }

    fn finalize(&mut self) -> Result<(), FirmwareError> {
        let mut session = self.session.take().ok_or(FirmwareError::NoSession)?;
        let mut window = SlotWindow {
            flash: &mut self.flash,
            slot: session.slot,
        };
        let size = session.writer.finish(&mut window)?;
        self.activate()?;
        info!("ota: image of {} bytes activated", size);
        Ok(())
    }

    fn abort(&mut self) {
        if self.session.take().is_some() {
            warn!("ota: update session aborted");
        }
    }
}

/// Confirm the running image so the bootloader keeps it.
///
/// Right after an update the image is `New`; without this call the
/// bootloader rolls back on the next reset.
pub(crate) fn mark_boot_valid(flash: &mut FlashStorage<'static>) {
    let mut buffer = [0u8; PARTITION_TABLE_MAX_LEN];
    let Ok(mut updater) = OtaUpdater::new(flash, &mut buffer) else {
        warn!("ota: no usable partition table, skipping boot check");
        return;
    };

    match updater.current_ota_state() {
        Ok(OtaImageState::New | OtaImageState::PendingVerify) => {
            if updater.set_current_ota_state(OtaImageState::Valid).is_ok() {
                info!("ota: marked current image as valid");
            } else {
                warn!("ota: failed to mark current image as valid");
            }
        }
        Ok(state) => debug!("ota: current image state: {:?}", state),
        Err(e) => debug!("ota: current image state unknown: {:?}", e),
    }
}

pub(crate) struct SoftwareRestart;

impl DeviceRestart for SoftwareRestart {
    fn restart(&mut self) {
        esp_hal::system::software_reset();
    }
}
