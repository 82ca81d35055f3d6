//! Build-time settings of the ESP32 board.

pub(crate) struct WifiConfig {
    pub ssid: &'static str,
    pub password: &'static str,
}

pub(crate) struct MqttConfig {
    pub host: &'static str,
    pub port: u16,
}

pub(crate) struct FirmwareConfig {
    pub version: &'static str,
}

pub(crate) const WIFI: WifiConfig = WifiConfig {
    ssid: env!("WIFI_SSID"),
    password: env!("WIFI_PASSWORD"),
};

pub(crate) const MQTT: MqttConfig = MqttConfig {
    host: env!("MQTT_HOST"),
    port: 1883,
};

pub(crate) const FIRMWARE: FirmwareConfig = FirmwareConfig {
    version: env!("BUILD_VERSION"),
};

/// Local port the SNTP client binds to.
pub(crate) const SNTP_LOCAL_PORT: u16 = 50123;

macro_rules! lcd_gpio {
    ($p:expr) => {
        // RS, E, D4, D5, D6, D7
        (
            $p.GPIO13, $p.GPIO27, $p.GPIO26, $p.GPIO25, $p.GPIO33, $p.GPIO32,
        )
    };
}

macro_rules! button_gpio {
    ($p:expr) => {
        $p.GPIO0
    };
}
