use the1602::app::{DisplayService, DisplayWriter};

use crate::infrastructure::drivers::Lcd;

/// Draws posted frames. The only context that touches the LCD.
#[embassy_executor::task]
pub(crate) async fn display_task(
    mut writer: DisplayWriter<Lcd>,
    display: &'static DisplayService,
) {
    writer.run(display).await;
}
