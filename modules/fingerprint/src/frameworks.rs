use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Part of the response a fingerprint was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Header,
    Body,
    Title,
}

/// One technology hit. Two hits are the same framework when their names match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Framework {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub from: Source,
}

impl Framework {
    pub fn new(name: impl Into<String>, from: Source) -> Self {
        Framework { name: name.into(), version: None, from }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

impl PartialEq for Framework {
    fn eq(&self, other: &Self) -> bool { self.name == other.name }
}

impl Eq for Framework {}

impl Hash for Framework {
    fn hash<H: Hasher>(&self, state: &mut H) { self.name.hash(state) }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}:{}", self.name, v),
            None => f.write_str(&self.name),
        }
    }
}

/// Set of frameworks keyed by name, iterated in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frameworks(BTreeMap<String, Framework>);

impl Frameworks {
    pub fn new() -> Self { Self::default() }

    /// Adds a hit. A repeated name keeps the first hit, only filling in a
    /// version it was missing.
    pub fn insert(&mut self, fw: Framework) {
        match self.0.get_mut(&fw.name) {
            Some(existing) => {
                if existing.version.is_none() && fw.version.is_some() {
                    existing.version = fw.version;
                }
            }
            None => {
                self.0.insert(fw.name.clone(), fw);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Framework> { self.0.get(name) }

    pub fn contains(&self, name: &str) -> bool { self.0.contains_key(name) }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &Framework> { self.0.values() }
}

impl FromIterator<Framework> for Frameworks {
    fn from_iter<I: IntoIterator<Item = Framework>>(iter: I) -> Self {
        let mut out = Frameworks::new();
        for fw in iter { out.insert(fw); }
        out
    }
}

impl fmt::Display for Frameworks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|fw| fw.to_string()).collect();
        f.write_str(&parts.join("||"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_by_name_fills_missing_version() {
        let mut set = Frameworks::new();
        set.insert(Framework::new("nginx", Source::Body));
        set.insert(Framework::new("nginx", Source::Header).with_version("1.18.0"));
        set.insert(Framework::new("nginx", Source::Header).with_version("1.20.0"));
        assert_eq!(set.len(), 1);
        let fw = set.get("nginx").unwrap();
        assert_eq!(fw.version.as_deref(), Some("1.18.0"));
        assert_eq!(fw.from, Source::Body);
    }

    #[test]
    fn equality_ignores_version() {
        let a = Framework::new("php", Source::Header).with_version("8.1");
        let b = Framework::new("php", Source::Body);
        assert_eq!(a, b);
    }

    #[test]
    fn display_joins_in_name_order() {
        let set: Frameworks = vec![
            Framework::new("wordpress", Source::Body),
            Framework::new("nginx", Source::Header).with_version("1.18.0"),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.to_string(), "nginx:1.18.0||wordpress");
        assert_eq!(Frameworks::new().to_string(), "");
    }

    #[test]
    fn serializes_as_map_by_name() {
        let set: Frameworks = vec![Framework::new("react", Source::Body)].into_iter().collect();
        let v = serde_json::to_value(&set).unwrap();
        assert_eq!(v["react"]["from"], "body");
        assert!(v["react"].get("version").is_none());
        let back: Frameworks = serde_json::from_value(v).unwrap();
        assert_eq!(back, set);
    }
}
