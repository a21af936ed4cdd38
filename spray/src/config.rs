use anyhow::{Context, Result};
use baseline::HashScope;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize, Clone)]
pub struct FuzzyConfig {
    pub distance: Option<u32>,
    pub hash_scope: Option<HashScope>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct ProbeConfig {
    pub mode: Option<String>,
    pub timeout_ms: Option<u64>,
    pub concurrency: Option<usize>,
    pub collect_concurrency: Option<usize>,
    pub max_body: Option<usize>,
    pub black_status: Option<Vec<u16>>,
    pub probes: Option<Vec<String>>,
    pub format: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    pub fuzzy: Option<FuzzyConfig>,
    pub probe: Option<ProbeConfig>,
}

impl Config {
    pub fn distance(&self) -> Option<u32> { self.fuzzy.as_ref().and_then(|f| f.distance) }

    pub fn hash_scope(&self) -> Option<HashScope> { self.fuzzy.as_ref().and_then(|f| f.hash_scope) }
}

/// Loads `path`, or `./spray.yaml` when no path is given and it exists.
pub fn load_config(path: Option<&Path>) -> Result<Option<Config>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = Path::new("spray.yaml");
            if p.exists() { p.to_path_buf() } else { return Ok(None); }
        }
    };
    let s = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let cfg = parse_config(&s).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(cfg))
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(serde_yaml::from_str(s)?)
}
