//! Minimal HTTP/1.0 client pieces used to download firmware.

use core::fmt::{self, Write};

use super::url::HttpUrl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    UnsupportedScheme,
    MalformedUrl,
    /// The status line or headers could not be parsed
    MalformedResponse,
    /// The response head does not fit the receive buffer
    HeadTooLarge,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpError::UnsupportedScheme => "unsupported URL scheme",
            HttpError::MalformedUrl => "malformed URL",
            HttpError::MalformedResponse => "malformed response",
            HttpError::HeadTooLarge => "response head too large",
        })
    }
}

/// Status and framing of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub content_length: Option<u32>,
}

impl ResponseHead {
    /// Parse the status line and headers, up to and including the blank line.
    pub fn parse(head: &[u8]) -> Result<Self, HttpError> {
        let text = core::str::from_utf8(head).map_err(|_| HttpError::MalformedResponse)?;
        let mut lines = text.split("\r\n");

        let status_line = lines.next().ok_or(HttpError::MalformedResponse)?;
        let mut parts = status_line.split_whitespace();
        let version = parts.next().ok_or(HttpError::MalformedResponse)?;
        if !version.starts_with("HTTP/1.") {
            return Err(HttpError::MalformedResponse);
        }
        let status = parts
            .next()
            .and_then(|code| code.parse().ok())
            .ok_or(HttpError::MalformedResponse)?;

        Ok(Self {
            status,
            content_length: find_content_length(lines),
        })
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Find the content length in the header lines.
///
/// Returns the content length if found, otherwise None.
fn find_content_length<'a>(lines: impl Iterator<Item = &'a str>) -> Option<u32> {
    lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
}

/// Position right after the `\r\n\r\n` that ends the response head.
pub fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

/// Write a `GET` request that closes the connection after the body.
pub fn write_get_request(writer: &mut impl Write, url: &HttpUrl<'_>) -> fmt::Result {
    write!(writer, "GET {} HTTP/1.0\r\n", url.path)?;
    if url.port == 80 {
        write!(writer, "Host: {}\r\n", url.host)?;
    } else {
        write!(writer, "Host: {}:{}\r\n", url.host, url.port)?;
    }
    write!(writer, "Connection: close\r\n\r\n")
}
