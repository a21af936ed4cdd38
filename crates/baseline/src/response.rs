use crate::error::ParseError;
use spray_core::ClientType;

/// What the transport layer hands over for one completed exchange.
pub trait Response {
    fn status_code(&self) -> u16;
    fn body(&self) -> &[u8];
    /// Declared content length. May differ from `body().len()` when the
    /// transport truncates.
    fn content_length(&self) -> usize;
    /// Status line and header block, including the terminating blank line.
    fn header(&self) -> &[u8];
    fn get_header(&self, name: &str) -> Option<&str>;
    fn client_type(&self) -> ClientType;
}

/// An HTTP/1.x response held as bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    status: u16,
    headers: Vec<(String, String)>,
    header: Vec<u8>,
    body: Vec<u8>,
    content_length: usize,
    client: ClientType,
}

impl RawResponse {
    /// Builds a response and renders its header block as `HTTP/1.1 <status>`
    /// followed by the given headers.
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Vec<u8>>) -> Self {
        Self::with_status_line(format!("HTTP/1.1 {}", status), status, headers, body.into())
    }

    /// Like `new` but with a caller-supplied status line, e.g. one carrying a
    /// reason phrase.
    pub fn with_status_line(status_line: String, status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        let mut header = status_line.into_bytes();
        header.extend_from_slice(b"\r\n");
        for (k, v) in &headers {
            header.extend_from_slice(k.as_bytes());
            header.extend_from_slice(b": ");
            header.extend_from_slice(v.as_bytes());
            header.extend_from_slice(b"\r\n");
        }
        header.extend_from_slice(b"\r\n");
        let content_length = declared_length(&headers).unwrap_or(body.len());
        RawResponse { status, headers, header, body, content_length, client: ClientType::Fast }
    }

    /// Parses a raw HTTP/1.x response. Accepts CRLF or bare LF line endings;
    /// input without a blank line is treated as headers only.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        if bytes.is_empty() {
            return Err(ParseError::Empty);
        }
        let split = find(bytes, b"\r\n\r\n")
            .map(|i| i + 4)
            .or_else(|| find(bytes, b"\n\n").map(|i| i + 2))
            .unwrap_or(bytes.len());
        let (header, body) = bytes.split_at(split);
        let text = String::from_utf8_lossy(header);
        let mut lines = text.lines();
        let status_line = lines.next().unwrap_or_default().trim();
        let mut parts = status_line.split_whitespace();
        match parts.next() {
            Some(v) if v.starts_with("HTTP/") => {}
            _ => return Err(ParseError::StatusLine(status_line.to_string())),
        }
        let code = parts.next().ok_or_else(|| ParseError::StatusLine(status_line.to_string()))?;
        let status: u16 = code.parse().map_err(|_| ParseError::StatusCode(code.to_string()))?;
        let headers: Vec<(String, String)> = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        let content_length = declared_length(&headers).unwrap_or(body.len());
        Ok(RawResponse {
            status,
            headers,
            header: header.to_vec(),
            body: body.to_vec(),
            content_length,
            client: ClientType::Fast,
        })
    }

    pub fn client(mut self, client: ClientType) -> Self {
        self.client = client;
        self
    }

    pub fn headers(&self) -> &[(String, String)] { &self.headers }
}

impl Response for RawResponse {
    fn status_code(&self) -> u16 { self.status }

    fn body(&self) -> &[u8] { &self.body }

    fn content_length(&self) -> usize { self.content_length }

    fn header(&self) -> &[u8] { &self.header }

    fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn client_type(&self) -> ClientType { self.client }
}

fn declared_length(headers: &[(String, String)]) -> Option<usize> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse().ok())
}

fn find(hay: &[u8], needle: &[u8]) -> Option<usize> {
    hay.windows(needle.len()).position(|w| w == needle)
}
