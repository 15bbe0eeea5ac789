//! Captured HTTP exchange model.
//!
//! An [`Exchange`] is the read-only view of one request/response pair handed
//! over by the capturing proxy. Header lists keep their original order, case,
//! and duplicates; lookups compare names case-insensitively.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single header as it appeared on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Render as `Name: value`, preserving the original case.
    pub fn render(&self) -> String {
        format!("{}: {}", self.name, self.value)
    }
}

/// Ordered header list with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderList(Vec<Header>);

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(Header::new(name, value));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.0.iter()
    }

    /// All occurrences of `name`, in wire order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Header> + 'a {
        self.0
            .iter()
            .filter(move |h| h.name.eq_ignore_ascii_case(name))
    }

    /// Value of the first occurrence of `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_all(name).next().is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Header>> for HeaderList {
    fn from(headers: Vec<Header>) -> Self {
        Self(headers)
    }
}

/// The request line: method, target URI and protocol version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLine {
    pub method: String,
    pub uri: String,
    #[serde(default = "default_protocol")]
    pub protocol: String,
}

fn default_protocol() -> String {
    "HTTP/1.1".to_string()
}

/// One captured request/response pair.
///
/// `response_headers` is `None` when the proxy could not parse the response
/// header block; detectors treat that as "nothing to report".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub request: RequestLine,
    #[serde(default)]
    pub request_headers: HeaderList,
    pub status: u16,
    #[serde(default)]
    pub response_headers: Option<HeaderList>,
    #[serde(default)]
    pub body: String,
}

impl Exchange {
    /// Create a `200 OK` exchange with empty headers and body.
    pub fn new(method: &str, uri: &str) -> Self {
        Self {
            request: RequestLine {
                method: method.to_string(),
                uri: uri.to_string(),
                protocol: default_protocol(),
            },
            request_headers: HeaderList::new(),
            status: 200,
            response_headers: Some(HeaderList::new()),
            body: String::new(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_request_header(mut self, name: &str, value: &str) -> Self {
        self.request_headers.push(name, value);
        self
    }

    pub fn with_response_header(mut self, name: &str, value: &str) -> Self {
        self.response_headers
            .get_or_insert_with(HeaderList::new)
            .push(name, value);
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    /// Drop the response header block entirely.
    pub fn without_response_headers(mut self) -> Self {
        self.response_headers = None;
        self
    }

    /// Response headers, or an empty list when they are missing.
    pub fn response_headers(&self) -> &HeaderList {
        static EMPTY: HeaderList = HeaderList(Vec::new());
        self.response_headers.as_ref().unwrap_or(&EMPTY)
    }

    /// Target host of the request, without port or user info.
    ///
    /// Taken from the URI authority; falls back to the `Host` request header
    /// for origin-form targets such as `/index.html`.
    pub fn host(&self) -> Option<String> {
        let from_uri = authority(&self.request.uri).map(strip_port);
        let host = match from_uri {
            Some(h) if !h.is_empty() => h,
            _ => strip_port(self.request_headers.first("Host")?.trim()),
        };
        if host.is_empty() {
            None
        } else {
            Some(host.to_string())
        }
    }

    /// Whether the response declares an HTML content type.
    pub fn is_html(&self) -> bool {
        self.response_headers()
            .first("Content-Type")
            .map(|ct| ct.to_ascii_lowercase().contains("html"))
            .unwrap_or(false)
    }
}

/// On-disk capture: a single exchange or an array of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum Capture {
    One(Box<Exchange>),
    Many(Vec<Exchange>),
}

/// Parse a JSON capture holding one exchange or an array of exchanges.
pub fn from_json(text: &str) -> Result<Vec<Exchange>> {
    Ok(match serde_json::from_str::<Capture>(text)? {
        Capture::One(exchange) => vec![*exchange],
        Capture::Many(exchanges) => exchanges,
    })
}

fn authority(uri: &str) -> Option<&str> {
    let (_, rest) = uri.split_once("://")?;
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..end];
    Some(match authority.rsplit_once('@') {
        Some((_, host)) => host,
        None => authority,
    })
}

fn strip_port(authority: &str) -> &str {
    if authority.starts_with('[') {
        // IPv6 literal: keep the brackets, drop anything after them
        return match authority.find(']') {
            Some(end) => &authority[..=end],
            None => authority,
        };
    }
    match authority.split_once(':') {
        Some((host, _)) => host,
        None => authority,
    }
}
