//! Named pattern extractors run over response text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Values pulled out of one response, keyed by extractor name. Only
/// extractors that matched something appear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extracteds(BTreeMap<String, Vec<String>>);

impl Extracteds {
    pub fn get(&self, name: &str) -> Option<&[String]> { self.0.get(name).map(Vec::as_slice) }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

#[derive(Debug, Clone)]
pub struct Extractor {
    pub name: String,
    pattern: Regex,
}

impl Extractor {
    /// With a capture group, group 1 is the extracted value; otherwise the
    /// whole match is.
    pub fn new(name: &str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Extractor { name: name.to_string(), pattern: Regex::new(pattern)? })
    }

    /// Distinct values in first-seen order.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for caps in self.pattern.captures_iter(text) {
            let Some(m) = caps.get(1).or_else(|| caps.get(0)) else { continue };
            let v = m.as_str();
            if !v.is_empty() && seen.insert(v) {
                out.push(v.to_string());
            }
        }
        out
    }
}

const BUILTIN: &[(&str, &str)] = &[
    ("url", r#"https?://[A-Za-z0-9.\-]+(?::\d+)?(?:/[^\s"'<>()]*)?"#),
    ("ip", r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b"),
    ("mail", r"\b[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}\b"),
    ("js", r#"(?i)src\s*=\s*["']([^"']+\.js)(?:\?[^"']*)?["']"#),
    ("jwt", r"\beyJ[A-Za-z0-9_\-]+\.eyJ[A-Za-z0-9_\-]+\.[A-Za-z0-9_\-]*"),
    ("path", r#"["'](/[A-Za-z0-9_\-]+(?:/[A-Za-z0-9_\-.]+)+)["']"#),
];

/// Registry of extractors. Each runs independently, so order does not
/// affect the output.
#[derive(Debug, Clone)]
pub struct Extractors {
    list: Vec<Extractor>,
}

impl Default for Extractors {
    fn default() -> Self { Self::builtin() }
}

impl Extractors {
    pub fn new() -> Self { Extractors { list: Vec::new() } }

    pub fn builtin() -> Self {
        let list = BUILTIN.iter().filter_map(|(n, p)| Extractor::new(n, p).ok()).collect();
        Extractors { list }
    }

    /// Adds an extractor, replacing any registered under the same name.
    pub fn register(&mut self, e: Extractor) {
        self.list.retain(|x| x.name != e.name);
        self.list.push(e);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> { self.list.iter().map(|e| e.name.as_str()) }

    pub fn len(&self) -> usize { self.list.len() }

    pub fn is_empty(&self) -> bool { self.list.is_empty() }

    pub fn extract(&self, text: &str) -> Extracteds {
        let mut out = BTreeMap::new();
        for e in &self.list {
            let vals = e.extract(text);
            if !vals.is_empty() {
                out.insert(e.name.clone(), vals);
            }
        }
        Extracteds(out)
    }
}
