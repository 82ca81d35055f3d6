use core::fmt;

/// State of the single firmware update slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtaState {
    Idle,
    Downloading,
    Installing,
    Failed,
    Rebooting,
}

impl OtaState {
    /// Whether a new update may start from this state.
    pub const fn accepts_trigger(self) -> bool {
        matches!(self, OtaState::Idle | OtaState::Failed)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            OtaState::Idle => "idle",
            OtaState::Downloading => "downloading",
            OtaState::Installing => "installing",
            OtaState::Failed => "failed",
            OtaState::Rebooting => "rebooting",
        }
    }
}

impl fmt::Display for OtaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A debounced press of the local button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonPress;

/// Bring-up phase of the device, in boot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BootPhase {
    Connecting,
    Connected,
    TimeSync,
    BusSession,
    Ready,
}

impl BootPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            BootPhase::Connecting => "connecting",
            BootPhase::Connected => "connected",
            BootPhase::TimeSync => "time sync",
            BootPhase::BusSession => "bus session",
            BootPhase::Ready => "ready",
        }
    }
}
