mod mqtt;

pub(crate) use mqtt::{BusModule, BusPublisher};
