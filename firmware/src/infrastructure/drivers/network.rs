use core::str::FromStr;

use embassy_net::{DhcpConfig, IpAddress, Runner, Stack, StackResources, dns::DnsQueryType};
use embassy_time::{Duration, Timer};
use esp_hal::peripherals::WIFI;
use esp_hal::rng::Rng;
use esp_radio::Controller as RadioController;
use esp_radio::wifi::{Config as WifiConfig, WifiController, WifiDevice};
use heapless::String;

use the1602::config::DEVICE;

use crate::mk_static;

/// Sockets: MQTT, firmware download, SNTP and DNS.
const MAX_SOCKETS: usize = 5;

pub(crate) fn init_network_stack(
    wifi_device: WIFI<'static>,
) -> (
    Stack<'static>,
    Runner<'static, WifiDevice<'static>>,
    WifiController<'static>,
) {
    let radio = match esp_radio::init() {
        Ok(radio) => radio,
        Err(e) => panic!("network: failed to initialize radio: {:?}", e),
    };
    let radio = &*mk_static!(RadioController<'static>, radio);
    let (controller, interfaces) =
        match esp_radio::wifi::new(radio, wifi_device, WifiConfig::default()) {
            Ok(wifi) => wifi,
            Err(e) => panic!("network: failed to initialize wifi: {:?}", e),
        };

    let mut dhcp_config = DhcpConfig::default();
    dhcp_config.hostname = String::from_str(DEVICE.hostname).ok();
    let net_config = embassy_net::Config::dhcpv4(dhcp_config);

    let resources = mk_static!(StackResources<MAX_SOCKETS>, StackResources::new());
    let (stack, runner) = embassy_net::new(interfaces.sta, net_config, resources, seed());

    (stack, runner, controller)
}

fn seed() -> u64 {
    let rng = Rng::new();
    u64::from(rng.random()) << 32 | u64::from(rng.random())
}

/// Wait until the link is up and DHCP handed out an address.
pub(crate) async fn wait_for_connection(stack: Stack<'_>) -> embassy_net::StaticConfigV4 {
    while !stack.is_link_up() {
        Timer::after(Duration::from_millis(100)).await;
    }
    loop {
        if let Some(config) = stack.config_v4() {
            return config;
        }
        Timer::after(Duration::from_millis(100)).await;
    }
}

/// Resolve an IPv4 literal or a DNS name.
pub(crate) async fn resolve_host(stack: Stack<'static>, host: &str) -> Option<IpAddress> {
    if let Ok(ip) = host.parse::<embassy_net::Ipv4Address>() {
        return Some(IpAddress::Ipv4(ip));
    }

    let addresses = stack.dns_query(host, DnsQueryType::A).await.ok()?;
    addresses.first().copied()
}
