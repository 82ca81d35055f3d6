mod lcd;
mod network;

pub(crate) use lcd::{Lcd, init_lcd, output};
pub(crate) use network::{init_network_stack, resolve_host, wait_for_connection};
