use esp_hal::delay::Delay;
use esp_hal::gpio::{Level, Output, OutputConfig, OutputPin};

use the1602::drivers::Hd44780;

pub(crate) type Lcd = Hd44780<Output<'static>, Delay>;

pub(crate) fn output(pin: impl OutputPin + 'static) -> Output<'static> {
    Output::new(pin, Level::Low, OutputConfig::default())
}

/// Bring up the display in 4-bit mode.
///
/// A display that does not take the reset sequence is fatal.
pub(crate) fn init_lcd(
    rs: Output<'static>,
    en: Output<'static>,
    data: [Output<'static>; 4],
) -> Lcd {
    let mut lcd = Hd44780::new(rs, en, data, Delay::new());
    if let Err(e) = lcd.init() {
        panic!("display: failed to initialize: {:?}", e);
    }
    lcd
}
