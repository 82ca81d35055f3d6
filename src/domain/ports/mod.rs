pub mod bus;
pub mod display;
pub mod firmware;

pub use bus::*;
pub use display::*;
pub use firmware::*;
