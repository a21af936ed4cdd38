use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// 64-bit SimHash. Inputs sharing most of their tokens land a small Hamming
/// distance apart. Inputs without tokens have no signature at all, so the
/// zero value is an ordinary signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Simhash(u64);

impl Simhash {
    pub const fn from_bits(bits: u64) -> Self { Simhash(bits) }

    pub fn bits(&self) -> u64 { self.0 }

    pub fn distance(&self, other: &Simhash) -> u32 { (self.0 ^ other.0).count_ones() }
}

impl fmt::Display for Simhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for Simhash {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s, 16).map(Simhash)
    }
}

impl From<Simhash> for String {
    fn from(s: Simhash) -> Self { s.to_string() }
}

impl TryFrom<String> for Simhash {
    type Error = ParseIntError;

    fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

/// Tokens are lowercased alphanumeric runs of two or more characters, each
/// weighted by how often it occurs. `None` when `data` has no tokens.
pub fn simhash(data: &[u8]) -> Option<Simhash> {
    let text = String::from_utf8_lossy(data).to_lowercase();
    let mut weights = [0i64; 64];
    let mut seen = false;
    for tok in text.split(|c: char| !c.is_alphanumeric()) {
        if tok.chars().count() < 2 {
            continue;
        }
        seen = true;
        let h = token_hash(tok.as_bytes());
        for (i, w) in weights.iter_mut().enumerate() {
            if (h >> i) & 1 == 1 { *w += 1; } else { *w -= 1; }
        }
    }
    if !seen {
        return None;
    }
    let mut out = 0u64;
    for (i, w) in weights.iter().enumerate() {
        if *w > 0 { out |= 1u64 << i; }
    }
    Some(Simhash(out))
}

pub fn simhash_distance(a: &Simhash, b: &Simhash) -> u32 {
    a.distance(b)
}

fn token_hash(tok: &[u8]) -> u64 {
    let mut r = tok;
    murmur3::murmur3_x64_128(&mut r, 0).unwrap_or_default() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(volatile: &str) -> String {
        let mut s = String::from("<html><body>");
        for _ in 0..51 {
            s.push_str("sorry the requested page could not be found here ");
        }
        s.push_str(volatile);
        s.push_str("</body></html>");
        s
    }

    #[test]
    fn identical_input_has_zero_distance() {
        let a = simhash(b"<html>hello world</html>").unwrap();
        let b = simhash(b"<html>hello world</html>").unwrap();
        assert_eq!(simhash_distance(&a, &b), 0);
    }

    #[test]
    fn volatile_token_does_not_move_dominant_template() {
        let a = simhash(page("csrf a81f2c9d").as_bytes()).unwrap();
        let b = simhash(page("csrf 77be01aa").as_bytes()).unwrap();
        assert_eq!(a.distance(&b), 0);
    }

    #[test]
    fn unrelated_pages_are_far_apart() {
        let a: String = (0..120).map(|i| format!("alpha{} ", i)).collect();
        let b: String = (0..120).map(|i| format!("omega{} ", i)).collect();
        let (a, b) = (simhash(a.as_bytes()).unwrap(), simhash(b.as_bytes()).unwrap());
        assert!(a.distance(&b) > 8);
    }

    #[test]
    fn tokenless_input_has_no_signature() {
        assert_eq!(simhash(b""), None);
        assert_eq!(simhash(b"a b c ! ?"), None);
        assert!(simhash(b"hello").is_some());
    }

    #[test]
    fn zero_signature_is_an_ordinary_value() {
        let zero = Simhash::from_bits(0);
        assert_eq!(zero.distance(&zero), 0);
        assert_eq!(zero.distance(&Simhash::from_bits(0b111)), 3);
        let back: Simhash = zero.to_string().parse().unwrap();
        assert_eq!(back, zero);
    }

    #[test]
    fn hex_rendering_parses_back() {
        let s = simhash(b"some content here").unwrap();
        let back: Simhash = s.to_string().parse().unwrap();
        assert_eq!(back, s);
        assert_eq!(Simhash::from_bits(0xff).to_string(), "00000000000000ff");
    }
}
