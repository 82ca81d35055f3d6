use super::http::HttpError;

const DEFAULT_PORT: u16 = 80;

/// A plain `http://host[:port]/path` URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpUrl<'a> {
    pub host: &'a str,
    pub port: u16,
    pub path: &'a str,
}

impl<'a> HttpUrl<'a> {
    pub fn parse(url: &'a str) -> Result<Self, HttpError> {
        let Some(rest) = url.strip_prefix("http://") else {
            return Err(if url.contains("://") {
                HttpError::UnsupportedScheme
            } else {
                HttpError::MalformedUrl
            });
        };

        let (authority, path) = match rest.find('/') {
            Some(pos) => rest.split_at(pos),
            None => (rest, "/"),
        };

        let (host, port) = match authority.split_once(':') {
            Some((host, port)) => {
                let port = port.parse().map_err(|_| HttpError::MalformedUrl)?;
                (host, port)
            }
            None => (authority, DEFAULT_PORT),
        };

        if host.is_empty() {
            return Err(HttpError::MalformedUrl);
        }

        Ok(Self { host, port, path })
    }
}
