use embassy_time::Ticker;
use esp_hal::gpio::Input;

use the1602::config::BUTTON;
use the1602::controllers::ButtonController;

use crate::controllers::BusPublisher;
pub(crate) type AppButton = ButtonController<'static, Input<'static>, BusPublisher>;

/// Samples the button at a fixed period.
#[embassy_executor::task]
pub(crate) async fn button_task(mut button: AppButton) {
    let mut ticker = Ticker::every(BUTTON.sample_period);
    loop {
        button.tick();
        ticker.next().await;
    }
}
