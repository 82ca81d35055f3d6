mod clock;
mod display;
mod usecases;

pub use clock::WallClock;
pub use display::{DisplayFrame, DisplayService, DisplayWriter, LINE_COUNT, LINE_WIDTH};
pub use usecases::{FirmwareUsecases, OtaSlot};
