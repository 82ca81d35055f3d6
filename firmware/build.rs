use chrono::Utc;

fn main() {
    // WIFI_SSID, WIFI_PASSWORD, MQTT_HOST and the optional OTA_URL may come
    // from a .env file next to the manifest.
    let _ = dotenv_build::output(dotenv_build::Config::default());

    let version = format!(
        "{}+{}",
        env!("CARGO_PKG_VERSION"),
        Utc::now().format("%Y%m%d%H%M")
    );
    println!("cargo:rustc-env=BUILD_VERSION={version}");
    println!("cargo:rustc-link-arg=-Tlinkall.x");

    println!("cargo:rerun-if-changed=build.rs");
    for var in ["WIFI_SSID", "WIFI_PASSWORD", "MQTT_HOST", "OTA_URL"] {
        println!("cargo:rerun-if-env-changed={var}");
    }
}
