//! Content digests and near-duplicate signatures for HTTP responses.

mod simhash;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

pub use simhash::{simhash, simhash_distance, Simhash};

/// Which bytes feed the content hash and near-duplicate signature.
///
/// `Raw` includes the header block, so volatile headers (`Date`,
/// `Set-Cookie`) move the signature. `Body` ignores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashScope {
    #[default]
    Raw,
    Body,
}

pub fn md5_hex(data: &[u8]) -> String {
    let mut h = Md5::new();
    h.update(data);
    hex::encode(h.finalize())
}

/// 32-bit murmur3 (seed 0) rendered as a signed decimal, the form favicon and
/// body hashes are usually searched by.
pub fn mmh3(data: &[u8]) -> String {
    let mut r = data;
    let h = murmur3::murmur3_32(&mut r, 0).unwrap_or_default();
    (h as i32).to_string()
}

/// All digests computed for one response in a single pass over `raw`.
///
/// Signatures are `None` for parts without any tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashBundle {
    pub hash_scope: HashScope,
    pub body_md5: String,
    pub header_md5: String,
    pub raw_md5: String,
    #[serde(default)]
    pub body_simhash: Option<Simhash>,
    #[serde(default)]
    pub header_simhash: Option<Simhash>,
    #[serde(default)]
    pub raw_simhash: Option<Simhash>,
    pub body_mmh3: String,
}

impl HashBundle {
    /// `raw` is the header block followed by the body; `header_len` marks the
    /// split point and is clamped to `raw.len()`.
    pub fn new(raw: &[u8], header_len: usize, scope: HashScope) -> Self {
        let split = header_len.min(raw.len());
        let (header, body) = raw.split_at(split);
        HashBundle {
            hash_scope: scope,
            body_md5: md5_hex(body),
            header_md5: md5_hex(header),
            raw_md5: md5_hex(raw),
            body_simhash: simhash(body),
            header_simhash: simhash(header),
            raw_simhash: simhash(raw),
            body_mmh3: mmh3(body),
        }
    }

    /// Exact-equality digest for the configured scope.
    pub fn content_hash(&self) -> &str {
        match self.hash_scope {
            HashScope::Raw => &self.raw_md5,
            HashScope::Body => &self.body_md5,
        }
    }

    /// Near-duplicate signature for the configured scope.
    pub fn signature(&self) -> Option<Simhash> {
        match self.hash_scope {
            HashScope::Raw => self.raw_simhash,
            HashScope::Body => self.body_simhash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &[u8] = b"HTTP/1.1 200 OK\r\nServer: nginx\r\n\r\n<html>hello</html>";
    const HEADER_LEN: usize = 34;

    #[test]
    fn md5_known_vectors() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn mmh3_is_signed_decimal() {
        assert_eq!(mmh3(b""), "0");
        assert!(mmh3(b"hello").parse::<i32>().is_ok());
    }

    #[test]
    fn bundle_splits_header_and_body() {
        let b = HashBundle::new(RAW, HEADER_LEN, HashScope::Raw);
        assert_eq!(b.body_md5, md5_hex(b"<html>hello</html>"));
        assert_eq!(b.header_md5, md5_hex(&RAW[..HEADER_LEN]));
        assert_eq!(b.raw_md5, md5_hex(RAW));
        assert_eq!(b.content_hash(), b.raw_md5);
        assert_eq!(b.signature(), b.raw_simhash);
        assert_eq!(b.header_simhash, simhash(&RAW[..HEADER_LEN]));
        assert_ne!(b.header_simhash, b.body_simhash);
    }

    #[test]
    fn body_scope_ignores_headers() {
        let other = b"HTTP/1.1 200 OK\r\nServer: apache\r\n\r\n<html>hello</html>";
        let a = HashBundle::new(RAW, HEADER_LEN, HashScope::Body);
        let b = HashBundle::new(other, 35, HashScope::Body);
        assert_eq!(a.content_hash(), b.content_hash());
        assert_eq!(a.signature(), b.signature());
        assert_ne!(a.raw_md5, b.raw_md5);
    }

    #[test]
    fn oversized_header_len_is_clamped() {
        let b = HashBundle::new(b"abc", 10, HashScope::Raw);
        assert_eq!(b.body_md5, md5_hex(b""));
        assert_eq!(b.header_md5, md5_hex(b"abc"));
    }

    #[test]
    fn empty_input_still_yields_a_bundle() {
        let b = HashBundle::new(b"", 0, HashScope::Raw);
        assert_eq!(b.raw_md5, "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(b.signature(), None);
        assert_eq!(b.header_simhash, None);
    }

    #[test]
    fn json_uses_hex_signatures() {
        let b = HashBundle::new(RAW, HEADER_LEN, HashScope::Raw);
        let v = serde_json::to_value(&b).unwrap();
        assert_eq!(v["hash_scope"], "raw");
        assert_eq!(v["raw_simhash"].as_str().unwrap().len(), 16);
        assert_eq!(v["header_simhash"].as_str().unwrap().len(), 16);
        let back: HashBundle = serde_json::from_value(v).unwrap();
        assert_eq!(back, b);
    }
}
