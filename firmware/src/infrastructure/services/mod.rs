mod http_fetch;
mod ota;

pub(crate) use http_fetch::HttpFirmwareTransport;
pub(crate) use ota::{EspFirmwareInstaller, SoftwareRestart, mark_boot_valid};
