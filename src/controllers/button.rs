use embedded_hal::digital::InputPin;
use log::{info, warn};

use crate::app::DisplayService;
use crate::config;
use crate::core::debounce::InputDebouncer;
use crate::domain::entity::ButtonPress;
use crate::domain::ports::EventPublisher;

/// Debounced button that reports presses on the bus and on the display.
pub struct ButtonController<'a, P, E> {
    debouncer: InputDebouncer<P>,
    display: &'a DisplayService,
    publisher: E,
}

impl<'a, P, E> ButtonController<'a, P, E>
where
    P: InputPin,
    E: EventPublisher,
{
    pub fn new(debouncer: InputDebouncer<P>, display: &'a DisplayService, publisher: E) -> Self {
        Self {
            debouncer,
            display,
            publisher,
        }
    }

    /// Take one sample. Called from the fixed-period sampler.
    pub fn tick(&mut self) -> Option<ButtonPress> {
        let press = match self.debouncer.tick() {
            Ok(press) => press?,
            Err(e) => panic!("button: failed to read input: {:?}", e),
        };
        self.on_press();
        Some(press)
    }

    fn on_press(&self) {
        info!("button: pressed");
        if !self
            .publisher
            .publish(config::TOPICS.button, config::TOPICS.button_payload)
        {
            warn!("button: publish queue full, event dropped");
        }
        self.display.show_lines(config::BUTTON_ACK, "");
    }
}
