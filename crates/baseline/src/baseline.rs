use crate::response::Response;
use extractors::Extracteds;
use fingerprint::Frameworks;
use hashes::HashBundle;
use serde::{Deserialize, Serialize};
use url::Url;

/// Normalized snapshot of one HTTP exchange.
///
/// Byte fields (`body`, `header`, `raw`) are read-only and never serialized.
/// `raw` is always `header` followed by `body`. Title, frameworks, extracted
/// values and hashes stay empty until [`Baseline::collect`] runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Baseline {
    pub url: String,
    pub path: String,
    /// Only set for host-targeted exchanges.
    pub host: String,
    #[serde(skip)]
    pub(crate) body: Vec<u8>,
    pub body_length: usize,
    #[serde(skip)]
    pub(crate) header: Vec<u8>,
    #[serde(skip)]
    pub(crate) raw: Vec<u8>,
    pub header_length: usize,
    pub redirect_url: String,
    pub status: u16,
    /// Set by orchestration when the URL itself looks randomized.
    pub is_dynamic_url: bool,
    #[serde(rename = "spended")]
    pub spent_ms: u64,
    pub(crate) title: String,
    pub(crate) frameworks: Frameworks,
    #[serde(rename = "extracts")]
    pub(crate) extracteds: Extracteds,
    pub error: Option<String>,
    pub reason: Option<String>,
    #[serde(rename = "valid")]
    pub is_valid: bool,
    #[serde(rename = "fuzzy")]
    pub is_fuzzy: bool,
    #[serde(flatten)]
    pub(crate) hashes: Option<HashBundle>,
}

impl Baseline {
    /// Baseline for a completed exchange. Never fails: an unparsable URL
    /// only leaves `path` empty.
    pub fn new<R: Response + ?Sized>(url: &str, host: &str, resp: &R) -> Self {
        let mut bl = Self::skeleton(url, host, resp);
        bl.is_valid = true;
        bl.header = resp.header().to_vec();
        bl.header_length = bl.header.len();
        bl.raw = [bl.header.as_slice(), bl.body.as_slice()].concat();
        bl
    }

    /// Baseline for an exchange rejected by scan policy. The response's
    /// header block is not kept, so `raw` stays empty.
    pub fn invalid<R: Response + ?Sized>(url: &str, host: &str, resp: &R, reason: &str) -> Self {
        let mut bl = Self::skeleton(url, host, resp);
        bl.reason = Some(reason.to_string());
        bl
    }

    /// Baseline for an exchange that produced no response at all (timeout,
    /// refused connection). Body-derived fields are zero-valued.
    pub fn failed(url: &str, host: &str, reason: &str, error: impl Into<String>) -> Self {
        Baseline {
            url: url.to_string(),
            path: parse_path(url),
            host: host.to_string(),
            reason: Some(reason.to_string()),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    fn skeleton<R: Response + ?Sized>(url: &str, host: &str, resp: &R) -> Self {
        let body = resp.body().to_vec();
        Baseline {
            url: url.to_string(),
            path: parse_path(url),
            host: if resp.client_type().targets_host() { host.to_string() } else { String::new() },
            body,
            body_length: resp.content_length(),
            redirect_url: resp.get_header("Location").unwrap_or_default().to_string(),
            status: resp.status_code(),
            ..Default::default()
        }
    }

    pub fn body(&self) -> &[u8] { &self.body }

    pub fn header(&self) -> &[u8] { &self.header }

    pub fn raw(&self) -> &[u8] { &self.raw }

    pub fn title(&self) -> &str { &self.title }

    pub fn frameworks(&self) -> &Frameworks { &self.frameworks }

    pub fn extracteds(&self) -> &Extracteds { &self.extracteds }

    /// `None` until collected; distinct from the hashes of an empty input.
    pub fn hashes(&self) -> Option<&HashBundle> { self.hashes.as_ref() }

    pub fn is_collected(&self) -> bool { self.hashes.is_some() }

    pub fn with_spent(mut self, ms: u64) -> Self {
        self.spent_ms = ms;
        self
    }
}

fn parse_path(url: &str) -> String {
    Url::parse(url).map(|u| u.path().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::RawResponse;
    use spray_core::ClientType;

    fn resp() -> RawResponse {
        RawResponse::new(
            301,
            vec![("Location".into(), "https://t.example/admin/".into()), ("Server".into(), "nginx".into())],
            "<html>moved</html>",
        )
    }

    #[test]
    fn raw_is_header_then_body() {
        let r = resp();
        let bl = Baseline::new("https://t.example/admin", "vhost.example", &r);
        assert_eq!(bl.raw(), [r.header(), r.body()].concat().as_slice());
        assert_eq!(bl.raw().len(), bl.header_length + bl.body().len());
        assert_eq!(bl.body_length, bl.body().len());
        assert!(bl.is_valid);
        assert!(!bl.is_collected());
    }

    #[test]
    fn copies_status_path_and_redirect() {
        let bl = Baseline::new("https://t.example/admin?x=1", "", &resp());
        assert_eq!(bl.status, 301);
        assert_eq!(bl.path, "/admin");
        assert_eq!(bl.redirect_url, "https://t.example/admin/");
    }

    #[test]
    fn host_only_for_host_targeted_clients() {
        let fast = Baseline::new("https://t.example/", "vhost.example", &resp());
        assert_eq!(fast.host, "");
        let std = Baseline::new("https://t.example/", "vhost.example", &resp().client(ClientType::Standard));
        assert_eq!(std.host, "vhost.example");
    }

    #[test]
    fn bad_url_leaves_path_empty() {
        let bl = Baseline::new("not a url", "", &resp());
        assert_eq!(bl.path, "");
        assert_eq!(bl.url, "not a url");
    }

    #[test]
    fn body_length_keeps_declared_length() {
        let r = RawResponse::parse(b"HTTP/1.1 200 OK\r\nContent-Length: 4096\r\n\r\nshort").unwrap();
        let bl = Baseline::new("http://t/", "", &r);
        assert_eq!(bl.body_length, 4096);
        assert_eq!(bl.body().len(), 5);
    }

    #[test]
    fn invalid_keeps_response_fields_but_no_raw() {
        let bl = Baseline::invalid("https://t.example/x", "h", &resp().client(ClientType::Standard), "body-too-large");
        assert!(!bl.is_valid);
        assert_eq!(bl.reason.as_deref(), Some("body-too-large"));
        assert_eq!(bl.status, 301);
        assert_eq!(bl.body(), b"<html>moved</html>");
        assert_eq!(bl.host, "h");
        assert_eq!(bl.path, "/x");
        assert!(bl.header().is_empty() && bl.raw().is_empty());
        assert_eq!(bl.header_length, 0);
    }

    #[test]
    fn failed_has_zeroed_body_fields() {
        let bl = Baseline::failed("https://t.example/y", "", "timeout", "deadline elapsed").with_spent(5000);
        assert!(!bl.is_valid);
        assert_eq!(bl.status, 0);
        assert_eq!(bl.body_length, 0);
        assert!(bl.body().is_empty());
        assert_eq!(bl.error.as_deref(), Some("deadline elapsed"));
        assert_eq!(bl.spent_ms, 5000);
    }
}
