use core::fmt;

/// Error type for the firmware operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareError {
    /// The firmware source URL is not a plain `http://` URL
    InvalidUrl,
    /// The firmware host could not be resolved
    Resolve,
    Connect,
    /// The connection failed while sending or receiving
    Io,
    /// The server answered with something other than `200`
    HttpStatus(u16),
    MalformedResponse,
    InvalidPartitionTable,
    /// The image does not start with the application image magic byte
    InvalidImage,
    /// The image does not fit the target partition
    ImageTooLarge,
    /// The received length differs from the announced one
    SizeMismatch { expected: u32, received: u32 },
    Erase,
    Write,
    Activate,
    /// Installer call without a running session
    NoSession,
}

impl fmt::Display for FirmwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FirmwareError::InvalidUrl => f.write_str("invalid firmware url"),
            FirmwareError::Resolve => f.write_str("failed to resolve firmware host"),
            FirmwareError::Connect => f.write_str("failed to connect to firmware host"),
            FirmwareError::Io => f.write_str("connection error"),
            FirmwareError::HttpStatus(code) => write!(f, "unexpected HTTP status {code}"),
            FirmwareError::MalformedResponse => f.write_str("malformed HTTP response"),
            FirmwareError::InvalidPartitionTable => f.write_str("invalid partition table"),
            FirmwareError::InvalidImage => f.write_str("not an application image"),
            FirmwareError::ImageTooLarge => f.write_str("image does not fit the partition"),
            FirmwareError::SizeMismatch { expected, received } => {
                write!(f, "expected {expected} bytes, received {received}")
            }
            FirmwareError::Erase => f.write_str("flash erase failed"),
            FirmwareError::Write => f.write_str("flash write failed"),
            FirmwareError::Activate => f.write_str("failed to activate the new image"),
            FirmwareError::NoSession => f.write_str("no update session"),
        }
    }
}

/// Writes a firmware image into the inactive boot slot.
pub trait FirmwareInstaller {
    /// Start a session. `expected_len` is the announced image size, if any.
    fn begin(&mut self, expected_len: Option<u32>) -> Result<(), FirmwareError>;

    fn write_chunk(&mut self, data: &[u8]) -> Result<(), FirmwareError>;

    /// Verify the written image and make it the next boot target.
    fn finalize(&mut self) -> Result<(), FirmwareError>;

    /// Drop the running session, if any. The current image stays active.
    fn abort(&mut self);
}

/// Fetches a firmware image and streams it into an installer.
#[allow(async_fn_in_trait)]
pub trait FirmwareTransport {
    /// Download `url`, calling [`FirmwareInstaller::begin`] once the response
    /// is accepted and [`FirmwareInstaller::write_chunk`] for every body chunk.
    ///
    /// Returns the number of body bytes received.
    async fn fetch(
        &mut self,
        url: &str,
        installer: &mut dyn FirmwareInstaller,
    ) -> Result<u32, FirmwareError>;
}

/// Restarts the device into the active boot slot.
pub trait DeviceRestart {
    fn restart(&mut self);
}
