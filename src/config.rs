use embassy_time::Duration;

pub struct DeviceConfig {
    pub id: &'static str,
    pub name: &'static str,
    pub hostname: &'static str,
    /// Root under which structured control topics live.
    pub topic_root: &'static str,
}

pub struct TopicsConfig {
    /// Flat topic carrying display text.
    pub display: &'static str,
    /// Structured control pattern that triggers an update.
    pub update: &'static [&'static str],
    /// Outbound button notification.
    pub button: &'static str,
    pub button_payload: &'static [u8],
}

pub struct DisplayConfig {
    pub columns: usize,
    pub rows: usize,
}

pub struct ButtonConfig {
    pub sample_period: Duration,
}

pub struct FirmwareConfig {
    pub url: &'static str,
}

pub struct TimeConfig {
    pub ntp_server: &'static str,
    pub ntp_port: u16,
    pub timeout: Duration,
}

pub const DEVICE: DeviceConfig = DeviceConfig {
    id: "the1602",
    name: "the1602",
    hostname: "the1602",
    topic_root: "devices/the1602",
};

pub const TOPICS: TopicsConfig = TopicsConfig {
    display: "devices/the1602",
    update: &["$update"],
    button: "devices/the1602/button",
    button_payload: b"pressed",
};

pub const DISPLAY: DisplayConfig = DisplayConfig {
    columns: 16,
    rows: 2,
};

pub const BUTTON: ButtonConfig = ButtonConfig {
    sample_period: Duration::from_millis(5),
};

pub const FIRMWARE: FirmwareConfig = FirmwareConfig {
    url: match option_env!("OTA_URL") {
        Some(url) => url,
        None => "http://raspberrypi.fritz.box:8032/esp32/1602RawIdf.bin",
    },
};

pub const TIME: TimeConfig = TimeConfig {
    ntp_server: "pool.ntp.org",
    ntp_port: 123,
    timeout: Duration::from_secs(5),
};

/// Bottom line shown while bringing up the network.
pub const STATUS_CONNECTING: &str = "Connecting..";
pub const STATUS_CONNECTED: &str = "Connected!";
pub const STATUS_TIME_SYNC: &str = "Syncing time..";
pub const STATUS_BUS: &str = "Joining bus..";
pub const STATUS_READY: &str = "Ready";

/// Frame shown after a debounced button press.
pub const BUTTON_ACK: &str = "Button pressed";
