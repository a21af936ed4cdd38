//! Core utilities and shared types for the spray engine.

pub mod gate;

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use gate::CollectGate;

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown spray mode: {0}")]
    UnknownMode(String),
    #[error("unknown client type: {0}")]
    UnknownClient(String),
}

/// What a scan sprays candidates into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SprayMod {
    #[default]
    Path,
    Host,
    Param,
    Custom,
}

impl SprayMod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SprayMod::Path => "path",
            SprayMod::Host => "host",
            SprayMod::Param => "param",
            SprayMod::Custom => "custom",
        }
    }

    /// Client a mode needs. Host spraying rewrites the Host header, which only
    /// the standard client supports.
    pub fn client_type(&self) -> ClientType {
        match self {
            SprayMod::Host => ClientType::Standard,
            _ => ClientType::Fast,
        }
    }
}

impl FromStr for SprayMod {
    type Err = CoreError;

    // param/custom are reserved and not selectable by name yet
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "path" => Ok(SprayMod::Path),
            "host" => Ok(SprayMod::Host),
            other => Err(CoreError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for SprayMod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport flavour that produced a response.
///
/// `Standard` exchanges target a host explicitly (virtual-host probing), so
/// their baselines carry the host; `Fast` exchanges never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientType {
    #[default]
    Fast,
    Standard,
}

impl ClientType {
    pub fn targets_host(&self) -> bool {
        matches!(self, ClientType::Standard)
    }
}

impl FromStr for ClientType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(ClientType::Fast),
            "standard" | "std" => Ok(ClientType::Standard),
            other => Err(CoreError::UnknownClient(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!version().is_empty());
    }

    #[test]
    fn parse_modes() {
        assert_eq!("path".parse::<SprayMod>().unwrap(), SprayMod::Path);
        assert_eq!(" HOST ".parse::<SprayMod>().unwrap(), SprayMod::Host);
        assert_eq!(
            "param".parse::<SprayMod>(),
            Err(CoreError::UnknownMode("param".into()))
        );
    }

    #[test]
    fn only_host_mode_targets_host() {
        assert!(SprayMod::Host.client_type().targets_host());
        assert!(!SprayMod::Path.client_type().targets_host());
        assert_eq!("std".parse::<ClientType>().unwrap(), ClientType::Standard);
    }
}
