use crate::baseline::Baseline;
use extractors::Extractors;
use fingerprint::{match_title, FingerEngine};
use hashes::{HashBundle, HashScope};
use once_cell::sync::Lazy;
use tracing::debug;

static DEFAULT_COLLECTOR: Lazy<Collector> = Lazy::new(Collector::default);

/// Everything `collect` needs: hash scope, extractor registry and
/// fingerprint rules. Built once per scan and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct Collector {
    pub scope: HashScope,
    pub extractors: Extractors,
    pub engine: FingerEngine,
}

impl Collector {
    pub fn new(scope: HashScope, extractors: Extractors, engine: FingerEngine) -> Self {
        Collector { scope, extractors, engine }
    }

    pub fn with_scope(scope: HashScope) -> Self {
        Collector { scope, ..Default::default() }
    }
}

impl Baseline {
    /// Computes title, hashes, extracted values and frameworks with the
    /// built-in rules and raw-scope hashing.
    pub fn collect(&mut self) {
        self.collect_with(&DEFAULT_COLLECTOR);
    }

    /// Pure function of `raw` and `body`; calling it again yields the same
    /// values.
    pub fn collect_with(&mut self, c: &Collector) {
        self.title = if self.body.is_empty() {
            String::new()
        } else {
            match_title(&String::from_utf8_lossy(&self.body))
        };
        self.hashes = Some(HashBundle::new(&self.raw, self.header.len(), c.scope));
        let text = String::from_utf8_lossy(&self.raw);
        self.extracteds = c.extractors.extract(&text);
        self.frameworks = c.engine.detect(&text);
        debug!(
            url = %self.url,
            title = %self.title,
            frameworks = self.frameworks.len(),
            extracts = self.extracteds.len(),
            "collected baseline signals"
        );
    }
}
