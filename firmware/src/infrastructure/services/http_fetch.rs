use embassy_net::Stack;
use embassy_net::tcp::TcpSocket;
use embassy_time::Duration;
use embedded_io_async::Write;
use heapless::String;
use log::{debug, info};

use the1602::core::net::http::{ResponseHead, find_head_end, write_get_request};
use the1602::core::net::url::HttpUrl;
use the1602::domain::ports::{FirmwareError, FirmwareInstaller, FirmwareTransport};

use crate::infrastructure::drivers::resolve_host;

const RX_BUFFER_SIZE: usize = 4096;
const TX_BUFFER_SIZE: usize = 512;
const HEAD_BUFFER_SIZE: usize = 1024;
const CHUNK_SIZE: usize = 1024;
const REQUEST_SIZE: usize = 256;

/// Downloads firmware over plain HTTP through the network stack.
pub(crate) struct HttpFirmwareTransport {
    stack: Stack<'static>,
}

impl HttpFirmwareTransport {
    pub(crate) fn new(stack: Stack<'static>) -> Self {
        Self { stack }
    }
}

impl FirmwareTransport for HttpFirmwareTransport {
    async fn fetch(
        &mut self,
        url: &str,
        installer: &mut dyn FirmwareInstaller,
    ) -> Result<u32, FirmwareError> {
        let url = HttpUrl::parse(url).map_err(|_| FirmwareError::InvalidUrl)?;
        let address = resolve_host(self.stack, url.host)
            .await
            .ok_or(FirmwareError::Resolve)?;

        let mut rx_buffer = [0u8; RX_BUFFER_SIZE];
        let mut tx_buffer = [0u8; TX_BUFFER_SIZE];
        let mut socket = TcpSocket::new(self.stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(Duration::from_secs(60)));

        debug!("ota: connecting to {:?}:{}", address, url.port);
        if let Err(e) = socket.connect((address, url.port)).await {
            socket.abort();
            debug!("ota: TCP connect failed: {:?}", e);
            return Err(FirmwareError::Connect);
        }

        let mut request = String::<REQUEST_SIZE>::new();
        write_get_request(&mut request, &url).map_err(|_| FirmwareError::InvalidUrl)?;
        socket
            .write_all(request.as_bytes())
            .await
            .map_err(|_| FirmwareError::Io)?;

        let received = stream_body(&mut socket, installer).await;
        socket.close();
        received
    }
}

/// Read the response head, then hand the body to `installer` as it arrives.
#[allow(clippy::cast_possible_truncation)]
async fn stream_body(
    socket: &mut TcpSocket<'_>,
    installer: &mut dyn FirmwareInstaller,
) -> Result<u32, FirmwareError> {
    let mut head = [0u8; HEAD_BUFFER_SIZE];
    let mut filled = 0;
    let head_end = loop {
        if filled == head.len() {
            return Err(FirmwareError::MalformedResponse);
        }
        let n = socket
            .read(&mut head[filled..])
            .await
            .map_err(|_| FirmwareError::Io)?;
        if n == 0 {
            return Err(FirmwareError::MalformedResponse);
        }
        filled += n;
        if let Some(end) = find_head_end(&head[..filled]) {
            break end;
        }
    };

    let response = ResponseHead::parse(&head[..head_end])
        .map_err(|_| FirmwareError::MalformedResponse)?;
    if !response.is_success() {
        return Err(FirmwareError::HttpStatus(response.status));
    }
    info!(
        "ota: server answered, content length {:?}",
        response.content_length
    );

    installer.begin(response.content_length)?;
    let mut received = 0u32;

    let leftover = &head[head_end..filled];
    if !leftover.is_empty() {
        installer.write_chunk(leftover)?;
        received += leftover.len() as u32;
    }

    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let n = socket
            .read(&mut chunk)
            .await
            .map_err(|_| FirmwareError::Io)?;
        if n == 0 {
            break;
        }
        installer.write_chunk(&chunk[..n])?;
        received += n as u32;
    }

    Ok(received)
}
