use crate::baseline::Baseline;
use std::fmt;
use tracing::warn;

/// Fields shown by the default one-line rendering.
pub const DEFAULT_PROBES: &[&str] = &["title", "frame"];

type Accessor = fn(&Baseline) -> String;

// Closed set of field keys understood by `get`. Aliases share an accessor.
static FIELDS: &[(&str, Accessor)] = &[
    ("url", |b: &Baseline| b.url.clone()),
    ("host", |b: &Baseline| b.host.clone()),
    ("title", |b: &Baseline| b.title.clone()),
    ("redirect", |b: &Baseline| b.redirect_url.clone()),
    ("md5", |b: &Baseline| b.hashes().map(|h| h.content_hash().to_string()).unwrap_or_default()),
    ("simhash", |b: &Baseline| b.hashes().and_then(|h| h.signature()).map(|s| s.to_string()).unwrap_or_default()),
    ("mmh3", |b: &Baseline| b.hashes().map(|h| h.body_mmh3.clone()).unwrap_or_default()),
    ("status", |b: &Baseline| b.status.to_string()),
    ("stat", |b: &Baseline| b.status.to_string()),
    ("spend", |b: &Baseline| b.spent_ms.to_string()),
    ("framework", |b: &Baseline| b.frameworks.to_string()),
    ("frame", |b: &Baseline| b.frameworks.to_string()),
];

/// Every key `Baseline::get` resolves.
pub static PROBE_KEYS: once_cell::sync::Lazy<Vec<&'static str>> =
    once_cell::sync::Lazy::new(|| FIELDS.iter().map(|(k, _)| *k).collect());

impl Baseline {
    /// Text of the field named `key`, or an empty string for unknown keys and
    /// signals not collected yet.
    pub fn get(&self, key: &str) -> String {
        FIELDS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, f)| f(self))
            .unwrap_or_default()
    }

    /// ` [value]` for a non-empty field, otherwise nothing.
    pub fn additional(&self, key: &str) -> String {
        match self.get(key) {
            v if v.is_empty() => String::new(),
            v => format!(" [{}]", v),
        }
    }

    /// One human-readable line: url, host, invalid reason, then either the
    /// error or status, length, redirect and the requested probes.
    pub fn format(&self, probes: &[&str]) -> String {
        let mut line = self.url.clone();
        if !self.host.is_empty() {
            line.push_str(&format!(" ({})", self.host));
        }
        if let Some(reason) = &self.reason {
            line.push_str(&format!(" ,{}", reason));
        }
        if let Some(err) = &self.error {
            line.push_str(&format!(" ,err: {}", err));
            return line;
        }
        line.push_str(&format!(" - {} - {}", self.status, self.body_length));
        if !self.redirect_url.is_empty() {
            line.push_str(&format!(" -> {}", self.redirect_url));
        }
        for p in probes {
            line.push_str(&self.additional(p));
        }
        line
    }

    /// JSON document of the non-byte fields; empty string if encoding fails.
    pub fn jsonify(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            warn!(url = %self.url, error = %e, "baseline serialization failed");
            String::new()
        })
    }

    /// Reads a document produced by `jsonify`. Byte fields come back empty.
    pub fn from_json(s: &str) -> Result<Baseline, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl fmt::Display for Baseline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(DEFAULT_PROBES))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::RawResponse;
    use spray_core::ClientType;

    fn collected() -> Baseline {
        let r = RawResponse::new(
            200,
            vec![("Server".into(), "nginx/1.18.0".into())],
            "<html><title>Dashboard</title>admin@corp.example</html>",
        )
        .client(ClientType::Standard);
        let mut bl = Baseline::new("https://10.0.0.1/dash", "intranet.corp", &r).with_spent(42);
        bl.collect();
        bl
    }

    #[test]
    fn get_resolves_known_keys() {
        let bl = collected();
        assert_eq!(bl.get("url"), "https://10.0.0.1/dash");
        assert_eq!(bl.get("host"), "intranet.corp");
        assert_eq!(bl.get("title"), "Dashboard");
        assert_eq!(bl.get("status"), "200");
        assert_eq!(bl.get("stat"), "200");
        assert_eq!(bl.get("spend"), "42");
        assert_eq!(bl.get("frame"), "nginx:1.18.0");
        assert_eq!(bl.get("framework"), bl.get("frame"));
        assert_eq!(bl.get("md5"), bl.hashes().unwrap().raw_md5);
        assert_eq!(bl.get("simhash").len(), 16);
        assert_eq!(bl.get("mmh3"), bl.hashes().unwrap().body_mmh3);
    }

    #[test]
    fn unknown_and_uncollected_keys_are_empty() {
        let bl = Baseline::new("http://t/", "", &RawResponse::new(404, vec![], "x"));
        assert_eq!(bl.get("unknown-key"), "");
        assert_eq!(bl.get("Status"), "");
        assert_eq!(bl.get("md5"), "");
        assert_eq!(bl.get("simhash"), "");
        assert_eq!(bl.get("status"), "404");
        let failed = Baseline::failed("http://t/", "", "timeout", "timed out");
        assert_eq!(failed.get("status"), "0");
        assert!(PROBE_KEYS.contains(&"redirect"));
        assert_eq!(PROBE_KEYS.len(), FIELDS.len());
    }

    #[test]
    fn format_renders_line() {
        let bl = collected();
        assert_eq!(
            bl.format(&["title", "frame", "nope"]),
            format!("https://10.0.0.1/dash (intranet.corp) - 200 - {} [Dashboard] [nginx:1.18.0]", bl.body_length)
        );
        assert_eq!(bl.to_string(), bl.format(DEFAULT_PROBES));
    }

    #[test]
    fn format_shows_redirect_and_reason() {
        let r = RawResponse::new(302, vec![("Location".into(), "/login".into())], "");
        let bl = Baseline::invalid("http://t/a", "", &r, "status-blocked");
        assert_eq!(bl.format(&[]), "http://t/a ,status-blocked - 302 - 0 -> /login");
    }

    #[test]
    fn error_terminates_line() {
        let bl = Baseline::failed("http://t/a", "", "timeout", "deadline elapsed");
        assert_eq!(bl.format(&["title"]), "http://t/a ,timeout ,err: deadline elapsed");
    }

    #[test]
    fn json_excludes_byte_fields() {
        let bl = collected();
        let v: serde_json::Value = serde_json::from_str(&bl.jsonify()).unwrap();
        let obj = v.as_object().unwrap();
        for k in ["body", "header", "raw"] {
            assert!(!obj.contains_key(k));
        }
        assert_eq!(obj["status"], 200);
        assert_eq!(obj["spended"], 42);
        assert_eq!(obj["valid"], true);
        assert_eq!(obj["host"], "intranet.corp");
        assert!(obj["raw_md5"].is_string());
        assert!(obj["extracts"]["mail"].is_array());
        assert!(obj["frameworks"]["nginx"].is_object());
    }

    #[test]
    fn json_round_trips_non_byte_fields() {
        let mut bl = collected();
        bl.is_fuzzy = true;
        bl.reason = Some("dup".into());
        let back = Baseline::from_json(&bl.jsonify()).unwrap();
        let mut expected = bl.clone();
        expected.body.clear();
        expected.header.clear();
        expected.raw.clear();
        assert_eq!(back, expected);
        assert_eq!(back.jsonify(), bl.jsonify());
    }

    #[test]
    fn uncollected_json_has_no_hashes() {
        let bl = Baseline::new("http://t/", "", &RawResponse::new(200, vec![], "x"));
        let v: serde_json::Value = serde_json::from_str(&bl.jsonify()).unwrap();
        assert!(v.get("body_md5").is_none());
        let back = Baseline::from_json(&bl.jsonify()).unwrap();
        assert!(back.hashes().is_none());
    }
}
