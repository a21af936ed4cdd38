//! Response baselines: normalization, signal collection, comparison and
//! presentation of single HTTP exchanges.

mod baseline;
mod collect;
mod compare;
mod error;
mod present;
mod response;

pub use baseline::Baseline;
pub use collect::Collector;
pub use compare::{Comparator, Verdict, DEFAULT_DISTANCE, LENGTH_TOLERANCE};
pub use error::ParseError;
pub use present::{DEFAULT_PROBES, PROBE_KEYS};
pub use response::{RawResponse, Response};

pub use extractors::{Extracteds, Extractor, Extractors};
pub use fingerprint::{FingerEngine, FingerRule, Framework, Frameworks, Source};
pub use hashes::{HashBundle, HashScope, Simhash};
pub use spray_core::ClientType;
