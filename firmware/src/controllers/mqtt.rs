use log::{info, warn};
use myrtio_mqtt::QoS;
use myrtio_mqtt::runtime::{MqttModule, Publish, PublishOutbox, PublisherHandle, TopicCollector};

use the1602::controllers::Controller;
use the1602::domain::entity::BootPhase;
use the1602::domain::ports::EventPublisher;

use crate::infrastructure::tasks::MQTT_OUTBOX_DEPTH;

/// Connects the broker session to the device controller.
pub(crate) struct BusModule {
    controller: &'static Controller<'static>,
    ready: bool,
}

impl BusModule {
    pub(crate) fn new(controller: &'static Controller<'static>) -> Self {
        Self {
            controller,
            ready: false,
        }
    }
}

impl MqttModule for BusModule {
    fn register(&self, collector: &mut dyn TopicCollector) {
        for topic in self.controller.subscriptions() {
            if !collector.add(&topic) {
                warn!("mqtt: no room to subscribe to {}", topic);
            }
        }
    }

    fn on_message(&mut self, msg: &Publish<'_>) {
        self.controller.on_message(msg.topic, msg.payload);
    }

    fn on_start(&mut self, _outbox: &mut dyn PublishOutbox) {
        info!("mqtt: session started");
        // Reconnects keep whatever the bus last showed
        if !self.ready {
            self.ready = true;
            self.controller.enter_phase(BootPhase::Ready);
        }
    }
}

/// Non-blocking publisher over the session outbox.
#[derive(Clone, Copy)]
pub(crate) struct BusPublisher(PublisherHandle<'static, MQTT_OUTBOX_DEPTH>);

impl BusPublisher {
    pub(crate) fn new(handle: PublisherHandle<'static, MQTT_OUTBOX_DEPTH>) -> Self {
        Self(handle)
    }
}

impl EventPublisher for BusPublisher {
    fn publish(&self, topic: &'static str, payload: &'static [u8]) -> bool {
        self.0.try_publish(topic, payload, QoS::AtMostOnce)
    }
}
