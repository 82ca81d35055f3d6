//! OTA Controller
//!
//! Turns update triggers from the bus into requests on the [`OtaSlot`]. The
//! download itself runs in the OTA worker.

use log::{debug, info};

use crate::app::OtaSlot;

#[derive(Clone, Copy)]
pub struct OtaController<'a> {
    slot: &'a OtaSlot,
}

impl<'a> OtaController<'a> {
    pub fn new(slot: &'a OtaSlot) -> Self {
        Self { slot }
    }

    /// Handle a message on the update topic.
    ///
    /// An empty payload clears a retained trigger and is not a request.
    /// Returns `true` if an update was started.
    pub fn on_trigger(&self, payload: &[u8]) -> bool {
        if payload.is_empty() {
            debug!("ota: empty trigger ignored");
            return false;
        }
        info!("ota: update triggered");
        self.slot.request_update()
    }
}
