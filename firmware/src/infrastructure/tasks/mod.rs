mod button;
mod display;
mod mqtt_runtime;
mod network;
mod ota;
mod time_sync;

pub(crate) use button::button_task;
pub(crate) use display::display_task;
pub(crate) use mqtt_runtime::{MQTT_OUTBOX_DEPTH, mqtt_runtime_task, publisher};
pub(crate) use network::{network_runner_task, wifi_connection_task};
pub(crate) use ota::ota_task;
pub(crate) use time_sync::sync_time;
