//! Composition root.
//!
//! [`Controller`] wires the topic router to the display and the OTA slot and
//! shows the boot progress. The button path runs on its own sampler and is
//! built separately with [`ButtonController`].

mod boot;
mod button;
mod ota;
mod router;

use alloc::string::String;

use crate::app::{DisplayService, OtaSlot};
use crate::config;
use crate::core::topic::Topic;
use crate::domain::entity::BootPhase;

pub use boot::status_text;
pub use button::ButtonController;
pub use ota::OtaController;
pub use router::{MessageHandler, TopicRouter};

/// Structured update trigger, relative to the device topic root.
pub const UPDATE_PATTERN: Topic<'static> = Topic::from_static(config::TOPICS.update);

pub struct Controller<'a> {
    display: &'a DisplayService,
    router: TopicRouter<'a>,
}

impl<'a> Controller<'a> {
    pub fn new(display: &'a DisplayService, slot: &'a OtaSlot) -> Self {
        let ota = OtaController::new(slot);
        let mut router = TopicRouter::new(config::DEVICE.topic_root);

        router.on_structured(UPDATE_PATTERN, move |_topic: &str, payload: &[u8]| {
            ota.on_trigger(payload);
        });
        router.on_flat(config::TOPICS.display, move |_topic: &str, payload: &[u8]| {
            display.render(payload);
        });

        Self { display, router }
    }

    /// Entry point for every message delivered by the bus session.
    ///
    /// Returns `true` if a handler ran.
    pub fn on_message(&self, topic: &str, payload: &[u8]) -> bool {
        self.router.dispatch(topic, payload)
    }

    pub fn subscriptions(&self) -> impl Iterator<Item = String> + '_ {
        self.router.subscriptions()
    }

    /// Show the boot progress on the bottom line.
    pub fn enter_phase(&self, phase: BootPhase) {
        boot::log_phase(phase);
        self.display.show_lines(config::DEVICE.name, status_text(phase));
    }
}
