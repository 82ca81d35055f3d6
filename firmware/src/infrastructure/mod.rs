pub(crate) mod drivers;
pub(crate) mod services;
pub(crate) mod tasks;
