use embassy_net::Stack;
use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_time::{Instant, with_timeout};
use log::{info, warn};

use the1602::app::WallClock;
use the1602::config::TIME;
use the1602::core::net::sntp::{NTP_PACKET_LEN, build_request, parse_response};

use crate::config::SNTP_LOCAL_PORT;
use crate::infrastructure::drivers::resolve_host;

#[derive(Debug)]
pub(crate) enum TimeSyncError {
    Resolve,
    Socket,
    Timeout,
    Reply,
}

/// One SNTP round trip. On success the clock is anchored to the reply.
pub(crate) async fn sync_time(
    stack: Stack<'static>,
    clock: &WallClock,
) -> Result<u64, TimeSyncError> {
    let server = resolve_host(stack, TIME.ntp_server)
        .await
        .ok_or(TimeSyncError::Resolve)?;

    let mut rx_meta = [PacketMetadata::EMPTY; 2];
    let mut tx_meta = [PacketMetadata::EMPTY; 2];
    let mut rx_buffer = [0u8; 2 * NTP_PACKET_LEN];
    let mut tx_buffer = [0u8; 2 * NTP_PACKET_LEN];
    let mut socket = UdpSocket::new(
        stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );
    socket.bind(SNTP_LOCAL_PORT).map_err(|_| TimeSyncError::Socket)?;

    socket
        .send_to(&build_request(), (server, TIME.ntp_port))
        .await
        .map_err(|_| TimeSyncError::Socket)?;

    let mut reply = [0u8; NTP_PACKET_LEN];
    let (len, _) = with_timeout(TIME.timeout, socket.recv_from(&mut reply))
        .await
        .map_err(|_| TimeSyncError::Timeout)?
        .map_err(|_| TimeSyncError::Socket)?;

    let unix = parse_response(&reply[..len]).map_err(|e| {
        warn!("sntp: bad reply: {}", e);
        TimeSyncError::Reply
    })?;
    clock.set(unix, Instant::now());
    info!("sntp: synchronized, unix time {}", unix);
    Ok(unix)
}
