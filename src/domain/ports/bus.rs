/// Outbound side of the message bus.
pub trait EventPublisher {
    /// Queue a message without waiting.
    ///
    /// Returns `false` if the message could not be queued.
    fn publish(&self, topic: &'static str, payload: &'static [u8]) -> bool;
}
