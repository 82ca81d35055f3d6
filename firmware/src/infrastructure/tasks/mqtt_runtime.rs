//! Bus session task.
//!
//! Keeps one broker session alive and drives the registered `MqttModule`.

use embassy_net::Stack;
use embassy_net::tcp::TcpSocket;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Timer};
use log::{info, warn};
use myrtio_mqtt::runtime::{MqttModule, MqttRuntime, PublishRequestChannel, PublisherHandle};
use myrtio_mqtt::{MqttClient, MqttOptions, TcpTransport};

use the1602::config::DEVICE;

use crate::config::MqttConfig;
use crate::infrastructure::drivers::resolve_host;

pub(crate) const MQTT_OUTBOX_DEPTH: usize = 4;
const MQTT_MAX_TOPICS: usize = 8;
const MQTT_BUF_SIZE: usize = 1024;

static PUBLISH_CHANNEL: PublishRequestChannel<'static, MQTT_OUTBOX_DEPTH> = Channel::new();

/// Handle for queueing outbound messages from outside the session task.
pub(crate) fn publisher() -> PublisherHandle<'static, MQTT_OUTBOX_DEPTH> {
    PublisherHandle::new(PUBLISH_CHANNEL.sender())
}

#[embassy_executor::task]
pub(crate) async fn mqtt_runtime_task(
    stack: Stack<'static>,
    module: &'static mut dyn MqttModule,
    mqtt_config: MqttConfig,
) {
    info!("mqtt: starting runtime task, client id {}", DEVICE.id);
    loop {
        if run_mqtt_client(stack, module, &mqtt_config).await.is_err() {
            warn!("mqtt: connection lost, reconnecting in 2s...");
            Timer::after(Duration::from_secs(2)).await;
        }
    }
}

async fn run_mqtt_client(
    stack: Stack<'static>,
    module: &mut dyn MqttModule,
    mqtt_config: &MqttConfig,
) -> Result<(), ()> {
    let mut rx_buffer = [0u8; MQTT_BUF_SIZE];
    let mut tx_buffer = [0u8; MQTT_BUF_SIZE];

    let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
    socket.set_timeout(Some(Duration::from_secs(60)));

    let Some(broker_addr) = resolve_host(stack, mqtt_config.host).await else {
        warn!("mqtt: failed to resolve {}", mqtt_config.host);
        return Err(());
    };

    info!(
        "mqtt: connecting to broker {:?}:{}...",
        broker_addr, mqtt_config.port
    );
    if let Err(e) = socket.connect((broker_addr, mqtt_config.port)).await {
        socket.abort();
        warn!("mqtt: TCP connect failed: {:?}", e);
        return Err(());
    }
    info!("mqtt: TCP socket connected");

    let transport = TcpTransport::new(socket, Duration::from_secs(30));
    let options = MqttOptions::new(DEVICE.id).with_keep_alive(Duration::from_secs(15));
    let mqtt: MqttClient<_, MQTT_MAX_TOPICS, MQTT_BUF_SIZE> = MqttClient::new(transport, options);

    let mut runtime: MqttRuntime<
        '_,
        _,
        &mut dyn MqttModule,
        MQTT_MAX_TOPICS,
        MQTT_BUF_SIZE,
        MQTT_OUTBOX_DEPTH,
    > = MqttRuntime::new(mqtt, module, PUBLISH_CHANNEL.receiver());

    runtime.run().await.map_err(|e| {
        warn!("mqtt: runtime error: {:?}", e);
    })
}
