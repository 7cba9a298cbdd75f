use thiserror::Error;

/// Upper bound on the size of a request head.
pub const MAX_HEAD_BYTES: usize = 8 * 1024;

const MAX_HEADERS: usize = 64;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("malformed request head: {0}")]
    Malformed(#[from] httparse::Error),
    #[error("request head exceeds {MAX_HEAD_BYTES} bytes")]
    TooLarge,
    #[error("connection closed before the request head was complete")]
    Incomplete,
}

/// Request method, as far as the dispatcher cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Head,
    Get,
    Other(String),
}

impl From<&str> for Method {
    fn from(value: &str) -> Self {
        match value {
            "HEAD" => Method::Head,
            "GET" => Method::Get,
            other => Method::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub target: String,
    pub version: u8,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// Parse a request head out of `buf`.
    ///
    /// Returns `Ok(None)` while the head is still incomplete. Any request body is ignored.
    pub fn parse(buf: &[u8]) -> Result<Option<Request>, RequestError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut req = httparse::Request::new(&mut headers);

        match req.parse(buf)? {
            httparse::Status::Partial => {
                if buf.len() > MAX_HEAD_BYTES {
                    return Err(RequestError::TooLarge);
                }
                Ok(None)
            }
            httparse::Status::Complete(len) => {
                if len > MAX_HEAD_BYTES {
                    return Err(RequestError::TooLarge);
                }

                let method = req.method.ok_or(httparse::Error::Token)?;
                let target = req.path.ok_or(httparse::Error::Token)?;
                let headers = req
                    .headers
                    .iter()
                    .map(|h| {
                        (
                            h.name.to_string(),
                            String::from_utf8_lossy(h.value).into_owned(),
                        )
                    })
                    .collect();

                Ok(Some(Request {
                    method: method.into(),
                    target: target.to_string(),
                    version: req.version.unwrap_or(1),
                    headers,
                }))
            }
        }
    }

    /// Request target without its query string.
    pub fn path(&self) -> &str {
        match self.target.split_once('?') {
            Some((path, _)) => path,
            None => &self.target,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::Head
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::Get
    }
}
