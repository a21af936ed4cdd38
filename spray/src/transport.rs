//! reqwest-backed transport producing `RawResponse`s.

use anyhow::Result;
use baseline::RawResponse;
use reqwest::{header::HOST, redirect::Policy, Client};
use spray_core::ClientType;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub timeout_ms: u64,
    pub user_agent: String,
    pub client: ClientType,
    /// Bodies past this many bytes are cut short (0 = no limit).
    pub max_body: usize,
}

#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    kind: ClientType,
    max_body: usize,
}

impl Transport {
    /// Redirects are never followed so `Location` stays observable.
    pub fn new(opts: &TransportOptions) -> Result<Self> {
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(Duration::from_millis(opts.timeout_ms))
            .user_agent(opts.user_agent.clone())
            .danger_accept_invalid_certs(true)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .build()?;
        Ok(Transport { client, kind: opts.client, max_body: opts.max_body })
    }

    /// `host` overrides the Host header; only honoured by the standard client.
    pub async fn fetch(&self, url: &str, host: Option<&str>) -> Result<RawResponse, reqwest::Error> {
        let mut req = self.client.get(url);
        if let (ClientType::Standard, Some(h)) = (self.kind, host) {
            req = req.header(HOST, h);
        }
        let mut resp = req.send().await?;
        let status_line = format!("{:?} {}", resp.version(), resp.status());
        let status = resp.status().as_u16();
        let headers: Vec<(String, String)> = resp
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).to_string()))
            .collect();
        let body = if over_limit(resp.content_length(), self.max_body) {
            // declared Content-Length already exceeds the limit; skip the body
            Vec::new()
        } else {
            read_capped(&mut resp, self.max_body).await?
        };
        Ok(RawResponse::with_status_line(status_line, status, headers, body).client(self.kind))
    }
}

fn over_limit(declared: Option<u64>, max_body: usize) -> bool {
    max_body > 0 && declared.is_some_and(|n| n > max_body as u64)
}

/// Reads at most `max_body + 1` bytes, enough for the caller to see the limit
/// was crossed.
async fn read_capped(resp: &mut reqwest::Response, max_body: usize) -> Result<Vec<u8>, reqwest::Error> {
    let mut body = Vec::new();
    while let Some(chunk) = resp.chunk().await? {
        body.extend_from_slice(&chunk);
        if max_body > 0 && body.len() > max_body {
            body.truncate(max_body + 1);
            break;
        }
    }
    Ok(body)
}

/// Short reason recorded on baselines for failed exchanges.
pub fn failure_reason(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection-refused"
    } else if e.is_body() || e.is_decode() {
        "body-error"
    } else {
        "request-error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_length_checked_against_limit() {
        assert!(over_limit(Some(4096), 1024));
        assert!(!over_limit(Some(1024), 1024));
        assert!(!over_limit(None, 1024));
        assert!(!over_limit(Some(u64::MAX), 0));
    }
}
