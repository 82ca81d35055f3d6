use embassy_net::Stack;
use esp_storage::FlashStorage;
use log::info;

use the1602::app::{FirmwareUsecases, OtaSlot};
use the1602::config::FIRMWARE;

use crate::infrastructure::services::{
    EspFirmwareInstaller, HttpFirmwareTransport, SoftwareRestart,
};

/// Runs one update per accepted trigger. Owns the flash for its lifetime.
#[embassy_executor::task]
pub(crate) async fn ota_task(
    stack: Stack<'static>,
    slot: &'static OtaSlot,
    flash: FlashStorage<'static>,
) {
    info!("ota: worker ready, source {}", FIRMWARE.url);
    let mut usecases = FirmwareUsecases::new(
        slot,
        FIRMWARE.url,
        HttpFirmwareTransport::new(stack),
        EspFirmwareInstaller::new(flash),
        SoftwareRestart,
    );
    usecases.run().await;
}
