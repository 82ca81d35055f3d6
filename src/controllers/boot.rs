use log::info;

use crate::config;
use crate::domain::entity::BootPhase;

/// Status line shown while the device is in `phase`.
pub fn status_text(phase: BootPhase) -> &'static str {
    match phase {
        BootPhase::Connecting => config::STATUS_CONNECTING,
        BootPhase::Connected => config::STATUS_CONNECTED,
        BootPhase::TimeSync => config::STATUS_TIME_SYNC,
        BootPhase::BusSession => config::STATUS_BUS,
        BootPhase::Ready => config::STATUS_READY,
    }
}

pub(crate) fn log_phase(phase: BootPhase) {
    info!("boot: {}", phase.as_str());
}
