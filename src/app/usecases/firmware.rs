use core::cell::Cell;

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use embassy_sync::signal::Signal;
use log::{debug, error, info, warn};

use crate::domain::{
    entity::OtaState,
    ports::{DeviceRestart, FirmwareError, FirmwareInstaller, FirmwareTransport},
};

/// The single firmware update slot.
///
/// Triggers arrive from the message handling context and only flip the state
/// and wake the worker, so they never wait on the download.
pub struct OtaSlot {
    state: Mutex<CriticalSectionRawMutex, Cell<OtaState>>,
    request: Signal<CriticalSectionRawMutex, ()>,
}

impl OtaSlot {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(Cell::new(OtaState::Idle)),
            request: Signal::new(),
        }
    }

    pub fn state(&self) -> OtaState {
        self.state.lock(Cell::get)
    }

    /// Start an update unless one is already running.
    ///
    /// Returns `false` if the trigger was rejected.
    pub fn request_update(&self) -> bool {
        let previous = self.state.lock(|state| {
            let current = state.get();
            if current.accepts_trigger() {
                state.set(OtaState::Downloading);
            }
            current
        });

        if !previous.accepts_trigger() {
            warn!("ota: update already {}, ignoring trigger", previous);
            return false;
        }

        info!("ota: update requested (was {})", previous);
        self.request.signal(());
        true
    }

    /// Park until an update is requested.
    pub async fn wait_for_request(&self) {
        self.request.wait().await;
    }

    fn set_state(&self, next: OtaState) {
        self.state.lock(|state| state.set(next));
    }
}

impl Default for OtaSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Download, install and restart, driven by the OTA worker.
pub struct FirmwareUsecases<'a, T, I, R> {
    slot: &'a OtaSlot,
    url: &'a str,
    transport: T,
    installer: I,
    restart: R,
}

impl<'a, T, I, R> FirmwareUsecases<'a, T, I, R>
where
    T: FirmwareTransport,
    I: FirmwareInstaller,
    R: DeviceRestart,
{
    pub fn new(slot: &'a OtaSlot, url: &'a str, transport: T, installer: I, restart: R) -> Self {
        Self {
            slot,
            url,
            transport,
            installer,
            restart,
        }
    }

    /// Serve update requests forever.
    pub async fn run(&mut self) -> ! {
        loop {
            self.slot.wait_for_request().await;
            if let Err(e) = self.perform_update().await {
                debug!("ota: waiting for a new trigger after {}", e);
            }
        }
    }

    /// Run one update attempt. On success the device is restarted.
    pub async fn perform_update(&mut self) -> Result<(), FirmwareError> {
        info!("ota: fetching firmware from {}", self.url);

        match self.install().await {
            Ok(size) => {
                self.slot.set_state(OtaState::Rebooting);
                info!("ota: installed {} bytes, rebooting", size);
                self.restart.restart();
                Ok(())
            }
            Err(e) => {
                error!("ota: firmware upgrade failed: {}", e);
                self.installer.abort();
                self.slot.set_state(OtaState::Failed);
                Err(e)
            }
        }
    }

    async fn install(&mut self) -> Result<u32, FirmwareError> {
        let size = self.transport.fetch(self.url, &mut self.installer).await?;
        self.slot.set_state(OtaState::Installing);
        self.installer.finalize()?;
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use embassy_futures::block_on;
    use embassy_futures::select::select;

    use super::*;

    #[derive(Default)]
    struct Log {
        begun: Option<Option<u32>>,
        bytes: Vec<u8>,
        finalized: bool,
        aborted: bool,
        restarts: usize,
    }

    struct Installer<'l>(&'l core::cell::RefCell<Log>, Option<FirmwareError>);

    impl FirmwareInstaller for Installer<'_> {
        fn begin(&mut self, expected_len: Option<u32>) -> Result<(), FirmwareError> {
            self.0.borrow_mut().begun = Some(expected_len);
            Ok(())
        }

        fn write_chunk(&mut self, data: &[u8]) -> Result<(), FirmwareError> {
            self.0.borrow_mut().bytes.extend_from_slice(data);
            Ok(())
        }

        fn finalize(&mut self) -> Result<(), FirmwareError> {
            if let Some(e) = self.1 {
                return Err(e);
            }
            self.0.borrow_mut().finalized = true;
            Ok(())
        }

        fn abort(&mut self) {
            self.0.borrow_mut().aborted = true;
        }
    }

    struct Transport {
        fetches: Vec<std::string::String>,
        result: Result<&'static [u8], FirmwareError>,
    }

    impl FirmwareTransport for Transport {
        async fn fetch(
            &mut self,
            url: &str,
            installer: &mut dyn FirmwareInstaller,
        ) -> Result<u32, FirmwareError> {
            self.fetches.push(url.into());
            let body = self.result?;
            installer.begin(Some(u32::try_from(body.len()).unwrap()))?;
            for chunk in body.chunks(3) {
                installer.write_chunk(chunk)?;
            }
            Ok(u32::try_from(body.len()).unwrap())
        }
    }

    struct Restart<'l>(&'l core::cell::RefCell<Log>);

    impl DeviceRestart for Restart<'_> {
        fn restart(&mut self) {
            self.0.borrow_mut().restarts += 1;
        }
    }

    const URL: &str = "http://fw.local/fw.bin";

    #[test]
    fn trigger_moves_idle_slot_to_downloading() {
        let slot = OtaSlot::new();
        assert!(slot.request_update());
        assert_eq!(slot.state(), OtaState::Downloading);
    }

    #[test]
    fn trigger_while_in_flight_is_rejected() {
        let slot = OtaSlot::new();
        assert!(slot.request_update());
        assert!(!slot.request_update());

        slot.set_state(OtaState::Installing);
        assert!(!slot.request_update());
        slot.set_state(OtaState::Rebooting);
        assert!(!slot.request_update());
        assert_eq!(slot.state(), OtaState::Rebooting);
    }

    #[test]
    fn failed_slot_accepts_a_new_trigger() {
        let slot = OtaSlot::new();
        slot.set_state(OtaState::Failed);
        assert!(slot.request_update());
        assert_eq!(slot.state(), OtaState::Downloading);
    }

    #[test]
    fn successful_update_installs_and_restarts() {
        let log = core::cell::RefCell::new(Log::default());
        let slot = OtaSlot::new();
        slot.request_update();

        let transport = Transport {
            fetches: Vec::new(),
            result: Ok(b"\xE9firmware"),
        };
        let mut usecases =
            FirmwareUsecases::new(&slot, URL, transport, Installer(&log, None), Restart(&log));

        assert_eq!(block_on(usecases.perform_update()), Ok(()));
        assert_eq!(slot.state(), OtaState::Rebooting);
        assert_eq!(usecases.transport.fetches, [URL]);

        let log = log.borrow();
        assert_eq!(log.begun, Some(Some(9)));
        assert_eq!(log.bytes, b"\xE9firmware");
        assert!(log.finalized);
        assert!(!log.aborted);
        assert_eq!(log.restarts, 1);
    }

    #[test]
    fn transport_failure_leaves_slot_failed() {
        let log = core::cell::RefCell::new(Log::default());
        let slot = OtaSlot::new();
        slot.request_update();

        let transport = Transport {
            fetches: Vec::new(),
            result: Err(FirmwareError::Connect),
        };
        let mut usecases =
            FirmwareUsecases::new(&slot, URL, transport, Installer(&log, None), Restart(&log));

        assert_eq!(block_on(usecases.perform_update()), Err(FirmwareError::Connect));
        assert_eq!(slot.state(), OtaState::Failed);
        assert!(log.borrow().aborted);
        assert_eq!(log.borrow().restarts, 0);
    }

    #[test]
    fn install_failure_leaves_slot_failed() {
        let log = core::cell::RefCell::new(Log::default());
        let slot = OtaSlot::new();
        slot.request_update();

        let transport = Transport {
            fetches: Vec::new(),
            result: Ok(b"\xE9fw"),
        };
        let installer = Installer(&log, Some(FirmwareError::Activate));
        let mut usecases = FirmwareUsecases::new(&slot, URL, transport, installer, Restart(&log));

        assert_eq!(block_on(usecases.perform_update()), Err(FirmwareError::Activate));
        assert_eq!(slot.state(), OtaState::Failed);
        assert!(!log.borrow().finalized);
        assert!(log.borrow().aborted);
        assert_eq!(log.borrow().restarts, 0);
    }

    #[test]
    fn worker_keeps_serving_after_a_failure() {
        let log = core::cell::RefCell::new(Log::default());
        let slot = OtaSlot::new();
        let transport = Transport {
            fetches: Vec::new(),
            result: Err(FirmwareError::Connect),
        };
        let mut usecases =
            FirmwareUsecases::new(&slot, URL, transport, Installer(&log, None), Restart(&log));

        for attempt in 1..=2 {
            assert!(slot.request_update());
            // The worker parks again once the attempt fails
            block_on(select(usecases.run(), core::future::ready(())));
            assert_eq!(slot.state(), OtaState::Failed);
            assert_eq!(usecases.transport.fetches.len(), attempt);
        }
        assert_eq!(log.borrow().restarts, 0);
    }
}
