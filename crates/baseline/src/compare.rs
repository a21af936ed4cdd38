use crate::baseline::Baseline;
use hashes::{md5_hex, simhash_distance};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Body sizes closer than this count as the same page shape.
pub const LENGTH_TOLERANCE: usize = 16;

/// Fuzzy threshold used when none is configured.
pub const DEFAULT_DISTANCE: u32 = 5;

/// Outcome of comparing a candidate against a reference baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Same logical page.
    Identical,
    /// Same shape but not provably the same content; needs another signal.
    Ambiguous,
    /// Distinct content.
    Different,
}

impl Baseline {
    /// Cheap same/different judgment of `other` against `self` as reference.
    ///
    /// `self` must have been collected; otherwise its body hash is unknown
    /// and the same-size branch can never return `Identical`.
    pub fn compare(&self, other: &Baseline) -> Verdict {
        if !other.redirect_url.is_empty() && self.redirect_url == other.redirect_url {
            return Verdict::Identical;
        }

        if self.body_length.abs_diff(other.body_length) < LENGTH_TOLERANCE {
            let Some(hashes) = self.hashes() else {
                warn!(url = %self.url, "compare against uncollected baseline");
                return Verdict::Different;
            };
            if hashes.body_md5 == md5_hex(&other.body) {
                Verdict::Identical
            } else {
                // same size, different bytes: csrf tokens, timestamps and the like
                Verdict::Ambiguous
            }
        } else if echoes_path(other) {
            Verdict::Ambiguous
        } else {
            Verdict::Different
        }
    }

    /// True when the near-duplicate signatures are closer than `distance`.
    /// Uncollected or tokenless signatures never match.
    pub fn fuzzy_compare(&self, other: &Baseline, distance: u32) -> bool {
        let (Some(a), Some(b)) = (self.hashes(), other.hashes()) else {
            warn!(base = %self.url, candidate = %other.url, "fuzzy compare before collect");
            return false;
        };
        let (Some(sa), Some(sb)) = (a.signature(), b.signature()) else {
            return false;
        };
        simhash_distance(&sa, &sb) < distance
    }
}

/// Error templates that print the requested path vary in length with it.
/// An empty path is trivially contained in any body.
fn echoes_path(bl: &Baseline) -> bool {
    if bl.path.is_empty() {
        return true;
    }
    bl.body.windows(bl.path.len()).any(|w| w == bl.path.as_bytes())
}

/// Comparison settings shared by every worker of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparator {
    distance: u32,
}

impl Default for Comparator {
    fn default() -> Self { Comparator { distance: DEFAULT_DISTANCE } }
}

impl Comparator {
    pub fn new(distance: u32) -> Self { Comparator { distance } }

    pub fn distance(&self) -> u32 { self.distance }

    pub fn compare(&self, base: &Baseline, candidate: &Baseline) -> Verdict {
        base.compare(candidate)
    }

    pub fn fuzzy_compare(&self, base: &Baseline, candidate: &Baseline) -> bool {
        base.fuzzy_compare(candidate, self.distance)
    }
}
