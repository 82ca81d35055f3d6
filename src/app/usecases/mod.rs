mod firmware;

pub use firmware::{FirmwareUsecases, OtaSlot};
